//! SMT encoding of word expressions
//!
//! One `Encoder` lives for exactly one rule check; it owns the mapping from
//! variable names to solver constants so that every mention of a name inside
//! one check denotes the same bit-vector.

use crate::ir::expr::Expr;
use crate::ir::types::OpKind;
use ruint::aliases::U256;
use std::collections::HashMap;
use std::time::Duration;
use z3::ast::{Ast, Bool, BV};
use z3::{Model, Params, Solver};

/// Configuration for the SMT solver
#[derive(Debug, Clone)]
pub struct SolverConfig {
    /// Timeout for SMT solving (None means no timeout)
    pub timeout: Option<Duration>,
}

impl Default for SolverConfig {
    fn default() -> Self {
        Self {
            timeout: Some(Duration::from_secs(30)),
        }
    }
}

impl SolverConfig {
    /// Create a config with no timeout
    pub fn no_timeout() -> Self {
        Self { timeout: None }
    }

    /// Create a config with a specific timeout in seconds
    pub fn with_timeout_secs(secs: u64) -> Self {
        Self {
            timeout: Some(Duration::from_secs(secs)),
        }
    }

    /// Create a config with a specific timeout
    #[allow(dead_code)]
    pub fn with_timeout(timeout: Duration) -> Self {
        Self {
            timeout: Some(timeout),
        }
    }
}

/// Create a Z3 solver with the given configuration
pub fn create_solver_with_config(cfg: &SolverConfig) -> Solver {
    let solver = Solver::new();
    if let Some(timeout) = cfg.timeout {
        let mut params = Params::new();
        params.set_u32("timeout", timeout.as_millis() as u32);
        solver.set_params(&params);
    }
    solver
}

/// Bit-vector constant for a 256-bit word value, trimmed to `width` bits
pub fn literal(value: U256, width: u32) -> BV {
    let limbs = value.as_limbs();
    // Assemble from 64-bit limbs, least significant first; concat puts the
    // receiver in the high bits
    let mut bv = BV::from_u64(limbs[0], 64);
    for limb in &limbs[1..] {
        bv = BV::from_u64(*limb, 64).concat(&bv);
    }
    if width < 256 {
        bv.extract(width - 1, 0)
    } else {
        bv
    }
}

/// Read a word value out of a model as four 64-bit limbs
pub fn model_value(model: &Model, bv: &BV, width: u32) -> Option<U256> {
    let value = model.eval(bv, true)?;
    let mut limbs = [0u64; 4];
    for (k, limb) in limbs.iter_mut().enumerate() {
        let low = (k as u32) * 64;
        if low >= width {
            break;
        }
        let high = (low + 63).min(width - 1);
        let chunk = value.extract(high, low).simplify();
        *limb = chunk.as_u64()?;
    }
    Some(U256::from_limbs(limbs))
}

/// Expression encoder scoped to a single solver session
pub struct Encoder {
    vars: HashMap<String, BV>,
}

impl Encoder {
    pub fn new() -> Self {
        Encoder {
            vars: HashMap::new(),
        }
    }

    /// Solver constant for a named symbolic word; idempotent by name
    pub fn variable(&mut self, name: &str, width: u32) -> BV {
        self.vars
            .entry(name.to_string())
            .or_insert_with(|| BV::new_const(name, width))
            .clone()
    }

    fn pair(&mut self, args: &[Expr]) -> (BV, BV) {
        (self.encode_word(&args[0]), self.encode_word(&args[1]))
    }

    /// Encode a word-sorted expression as a bit-vector term
    ///
    /// Callers validate sorts first; a boolean-sorted node here is an
    /// internal invariant violation.
    pub fn encode_word(&mut self, expr: &Expr) -> BV {
        match expr {
            Expr::Var { name, width } => self.variable(name, *width),
            Expr::Lit { value, width } => literal(*value, *width),
            Expr::Op { op, args } => match op {
                OpKind::And => {
                    let (a, b) = self.pair(args);
                    a.bvand(&b)
                }
                OpKind::Or => {
                    let (a, b) = self.pair(args);
                    a.bvor(&b)
                }
                OpKind::Xor => {
                    let (a, b) = self.pair(args);
                    a.bvxor(&b)
                }
                OpKind::Not => self.encode_word(&args[0]).bvnot(),
                OpKind::Add => {
                    let (a, b) = self.pair(args);
                    a.bvadd(&b)
                }
                OpKind::Sub => {
                    let (a, b) = self.pair(args);
                    a.bvsub(&b)
                }
                OpKind::Mul => {
                    let (a, b) = self.pair(args);
                    a.bvmul(&b)
                }
                // SMT-LIB defines the shifts by multiplication/division
                // modulo 2^width, so amounts >= width already give zero
                OpKind::Shl => {
                    let (shift, value) = self.pair(args);
                    value.bvshl(&shift)
                }
                OpKind::Shr => {
                    let (shift, value) = self.pair(args);
                    value.bvlshr(&shift)
                }
                OpKind::Byte => {
                    let index = self.encode_word(&args[0]);
                    let value = self.encode_word(&args[1]);
                    byte_extract(&index, &value, expr.width())
                }
                OpKind::Ult | OpKind::Eq => {
                    unreachable!("boolean-sorted operator in word position")
                }
            },
        }
    }

    /// Encode a boolean-sorted expression (a constraint) as a solver Bool
    pub fn encode_bool(&mut self, expr: &Expr) -> Bool {
        match expr {
            Expr::Op { op: OpKind::Ult, args } => {
                let (a, b) = self.pair(args);
                a.bvult(&b)
            }
            Expr::Op { op: OpKind::Eq, args } => {
                let (a, b) = self.pair(args);
                a.eq(b)
            }
            _ => unreachable!("word-sorted expression in boolean position"),
        }
    }
}

/// Big-endian byte `index` of `value`, zero once `index` is past the last byte
fn byte_extract(index: &BV, value: &BV, width: u32) -> BV {
    let bytes = width / 8;
    let in_range = index.bvult(&BV::from_u64(bytes as u64, width));
    // Bit offset of big-endian byte `index` is 8 * (bytes - 1 - index); the
    // subtraction may wrap for out-of-range indices, but the ite guards that
    let offset = BV::from_u64((bytes.max(1) - 1) as u64, width)
        .bvsub(index)
        .bvmul(&BV::from_u64(8, width));
    let low_byte = value.bvlshr(&offset).bvand(&BV::from_u64(0xff, width));
    in_range.ite(&low_byte, &BV::from_u64(0, width))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ir::expr::Expr;
    use crate::ir::ops::{add, byte, shl};
    use z3::SatResult;

    fn assert_always_equal(mut encoder: Encoder, lhs: &Expr, rhs: &Expr) {
        let solver = Solver::new();
        let a = encoder.encode_word(lhs);
        let b = encoder.encode_word(rhs);
        solver.assert(a.eq(b).not());
        assert_eq!(solver.check(), SatResult::Unsat);
    }

    #[test]
    fn test_add_commutes() {
        let x = Expr::var("x", 256);
        let y = Expr::var("y", 256);
        assert_always_equal(
            Encoder::new(),
            &add(x.clone(), y.clone()),
            &add(y, x),
        );
    }

    #[test]
    fn test_shl_saturates_past_width() {
        let x = Expr::var("x", 256);
        assert_always_equal(
            Encoder::new(),
            &shl(Expr::lit_u64(300, 256), x),
            &Expr::lit_u64(0, 256),
        );
    }

    #[test]
    fn test_byte_past_width_is_zero() {
        let x = Expr::var("x", 256);
        assert_always_equal(
            Encoder::new(),
            &byte(Expr::lit_u64(32, 256), x),
            &Expr::lit_u64(0, 256),
        );
    }

    #[test]
    fn test_byte_zero_is_most_significant() {
        let value = Expr::lit(U256::from(0xabu64) << 248, 256);
        assert_always_equal(
            Encoder::new(),
            &byte(Expr::lit_u64(0, 256), value),
            &Expr::lit_u64(0xab, 256),
        );
    }

    #[test]
    fn test_literal_limb_assembly() {
        let value = U256::from_limbs([1, 2, 3, 4]);
        let solver = Solver::new();
        let expected = BV::from_u64(4, 64)
            .concat(&BV::from_u64(3, 64))
            .concat(&BV::from_u64(2, 64))
            .concat(&BV::from_u64(1, 64));
        solver.assert(literal(value, 256).eq(expected).not());
        assert_eq!(solver.check(), SatResult::Unsat);
    }

    #[test]
    fn test_same_name_encodes_same_constant() {
        let mut encoder = Encoder::new();
        let solver = Solver::new();
        let a = encoder.variable("x", 256);
        let b = encoder.variable("x", 256);
        solver.assert(a.eq(b).not());
        assert_eq!(solver.check(), SatResult::Unsat);
    }
}
