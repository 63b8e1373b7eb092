//! Word-level expression IR: opcode tags, expression trees, and constructors

pub mod expr;
pub mod ops;
pub mod types;

pub use expr::Expr;
pub use types::{OpKind, Sort};
