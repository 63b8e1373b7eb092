//! Integration tests that drive the compiled binary

mod cli_test;
