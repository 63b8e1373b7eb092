//! Concrete interpreter for word expressions
//!
//! Mirrors the solver encoding bit for bit; used to replay counterexample
//! models and for the quick validation tier.

use crate::ir::expr::{width_mask, Expr};
use crate::ir::types::OpKind;
use ruint::aliases::U256;
use std::collections::HashMap;

/// Concrete valuation of the free variables, by name
pub type Assignment = HashMap<String, U256>;

fn lookup(env: &Assignment, name: &str) -> U256 {
    *env.get(name)
        .unwrap_or_else(|| panic!("no value assigned to variable {}", name))
}

/// Evaluate a word-sorted expression under a concrete assignment
pub fn eval_word(expr: &Expr, env: &Assignment) -> U256 {
    match expr {
        Expr::Var { name, .. } => lookup(env, name),
        Expr::Lit { value, .. } => *value,
        Expr::Op { op, args } => {
            let width = expr.width();
            let mask = width_mask(width);
            match op {
                OpKind::And => eval_word(&args[0], env) & eval_word(&args[1], env),
                OpKind::Or => eval_word(&args[0], env) | eval_word(&args[1], env),
                OpKind::Xor => eval_word(&args[0], env) ^ eval_word(&args[1], env),
                OpKind::Not => !eval_word(&args[0], env) & mask,
                OpKind::Add => {
                    eval_word(&args[0], env).wrapping_add(eval_word(&args[1], env)) & mask
                }
                OpKind::Sub => {
                    eval_word(&args[0], env).wrapping_sub(eval_word(&args[1], env)) & mask
                }
                OpKind::Mul => {
                    eval_word(&args[0], env).wrapping_mul(eval_word(&args[1], env)) & mask
                }
                OpKind::Shl => {
                    let shift = eval_word(&args[0], env);
                    let value = eval_word(&args[1], env);
                    if shift >= U256::from(width) {
                        U256::ZERO
                    } else {
                        (value << shift.as_limbs()[0] as usize) & mask
                    }
                }
                OpKind::Shr => {
                    let shift = eval_word(&args[0], env);
                    let value = eval_word(&args[1], env);
                    if shift >= U256::from(width) {
                        U256::ZERO
                    } else {
                        value >> shift.as_limbs()[0] as usize
                    }
                }
                OpKind::Byte => {
                    let index = eval_word(&args[0], env);
                    let value = eval_word(&args[1], env);
                    let bytes = (width / 8) as usize;
                    if index >= U256::from(bytes) {
                        U256::ZERO
                    } else {
                        // A narrower word occupies the tail of the 32-byte
                        // big-endian rendering
                        let be = value.to_be_bytes::<32>();
                        let index = index.as_limbs()[0] as usize;
                        U256::from(be[32 - bytes + index])
                    }
                }
                OpKind::Ult | OpKind::Eq => {
                    unreachable!("boolean-sorted operator in word position")
                }
            }
        }
    }
}

/// Evaluate a boolean-sorted expression (a constraint) under an assignment
pub fn eval_bool(expr: &Expr, env: &Assignment) -> bool {
    match expr {
        Expr::Op { op: OpKind::Ult, args } => {
            eval_word(&args[0], env) < eval_word(&args[1], env)
        }
        Expr::Op { op: OpKind::Eq, args } => {
            eval_word(&args[0], env) == eval_word(&args[1], env)
        }
        _ => unreachable!("word-sorted expression in boolean position"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ir::ops::*;

    fn env(pairs: &[(&str, U256)]) -> Assignment {
        pairs
            .iter()
            .map(|(n, v)| (n.to_string(), *v))
            .collect()
    }

    fn x() -> Expr {
        Expr::var("X", 256)
    }

    #[test]
    fn test_add_wraps() {
        let e = add(x(), Expr::lit_u64(1, 256));
        let env = env(&[("X", U256::MAX)]);
        assert_eq!(eval_word(&e, &env), U256::ZERO);
    }

    #[test]
    fn test_sub_wraps() {
        let e = sub(Expr::lit_u64(0, 256), Expr::lit_u64(1, 256));
        assert_eq!(eval_word(&e, &Assignment::new()), U256::MAX);
    }

    #[test]
    fn test_narrow_width_wraps_at_width() {
        let e = add(Expr::lit_u64(0xff, 8), Expr::lit_u64(1, 8));
        assert_eq!(eval_word(&e, &Assignment::new()), U256::ZERO);
    }

    #[test]
    fn test_not_stays_within_width() {
        let e = not(Expr::lit_u64(0, 8));
        assert_eq!(eval_word(&e, &Assignment::new()), U256::from(0xffu64));
    }

    #[test]
    fn test_shl_in_range() {
        let e = shl(Expr::lit_u64(8, 256), x());
        let env = env(&[("X", U256::from(0xabu64))]);
        assert_eq!(eval_word(&e, &env), U256::from(0xab00u64));
    }

    #[test]
    fn test_shl_saturates_at_width() {
        for shift in [256u64, 257, 1000] {
            let e = shl(Expr::lit_u64(shift, 256), x());
            let env = env(&[("X", U256::MAX)]);
            assert_eq!(eval_word(&e, &env), U256::ZERO, "shift {}", shift);
        }
    }

    #[test]
    fn test_shl_huge_symbolic_shift() {
        let e = shl(x(), Expr::lit_u64(1, 256));
        let env = env(&[("X", U256::MAX)]);
        assert_eq!(eval_word(&e, &env), U256::ZERO);
    }

    #[test]
    fn test_shr_saturates_at_width() {
        let e = shr(Expr::lit_u64(256, 256), x());
        let env = env(&[("X", U256::MAX)]);
        assert_eq!(eval_word(&e, &env), U256::ZERO);
    }

    #[test]
    fn test_shr_unsigned() {
        let e = shr(Expr::lit_u64(255, 256), x());
        let env = env(&[("X", U256::MAX)]);
        assert_eq!(eval_word(&e, &env), U256::from(1u64));
    }

    #[test]
    fn test_byte_positions() {
        // 0x01 0x02 ... as the two most significant bytes, 0xff lowest
        let value = (U256::from(0x0102u64) << 240) | U256::from(0xffu64);
        let env = env(&[("X", value)]);
        assert_eq!(
            eval_word(&byte(Expr::lit_u64(0, 256), x()), &env),
            U256::from(1u64)
        );
        assert_eq!(
            eval_word(&byte(Expr::lit_u64(1, 256), x()), &env),
            U256::from(2u64)
        );
        assert_eq!(
            eval_word(&byte(Expr::lit_u64(31, 256), x()), &env),
            U256::from(0xffu64)
        );
    }

    #[test]
    fn test_byte_past_width_is_zero() {
        for index in [32u64, 33, 1 << 40] {
            let e = byte(Expr::lit_u64(index, 256), x());
            let env = env(&[("X", U256::MAX)]);
            assert_eq!(eval_word(&e, &env), U256::ZERO, "index {}", index);
        }
    }

    #[test]
    fn test_ult_and_eq() {
        let env = env(&[("X", U256::from(5u64))]);
        assert!(eval_bool(&ult(x(), Expr::lit_u64(6, 256)), &env));
        assert!(!eval_bool(&ult(x(), Expr::lit_u64(5, 256)), &env));
        assert!(eval_bool(&eq(x(), Expr::lit_u64(5, 256)), &env));
    }

    #[test]
    fn test_ult_is_unsigned() {
        // The all-ones word is the largest value, not -1
        let env = env(&[("X", U256::MAX)]);
        assert!(!eval_bool(&ult(x(), Expr::lit_u64(0, 256)), &env));
        assert!(eval_bool(&ult(Expr::lit_u64(0, 256), x()), &env));
    }
}
