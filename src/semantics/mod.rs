//! Concrete and symbolic semantics of the word opcodes, plus the
//! equivalence-check adapter around the SMT solver

pub mod concrete;
pub mod equivalence;
pub mod smt;

// Re-export main functionality
pub use equivalence::{check_equivalence, Counterexample, VerificationResult};
pub use smt::SolverConfig;
