//! Fast concrete validation that runs before the solver

pub mod random;

pub use random::{quick_refute, RandomInputConfig};
