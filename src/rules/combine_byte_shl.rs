//! byte(A, shl(B, X)) -> and(X, 0xff)
//! given A < 32 && B == 256 - 8 * (A + 1)
//!
//! Shifting X left by exactly enough to park its low byte at big-endian
//! position A makes the byte extraction a plain low-byte mask. The index
//! bound matters: without it the extraction is past the word and yields
//! zero while the mask does not.

use crate::ir::expr::Expr;
use crate::ir::ops::{add, and, byte, eq, mul, shl, sub, ult};
use crate::rule::{Rule, RuleError};
use crate::rules::{lit, RuleCase, WORD_WIDTH};

pub fn case() -> RuleCase {
    RuleCase {
        name: "combine_byte_shl",
        summary: "byte of a left-shifted word collapses to a low-byte mask",
        build,
    }
}

fn build(rule: &mut Rule) -> Result<(Expr, Expr), RuleError> {
    let x = rule.declare("X", WORD_WIDTH)?;
    let a = rule.declare("A", WORD_WIDTH)?;
    let b = rule.declare("B", WORD_WIDTH)?;

    rule.require(ult(a.clone(), lit(32)))?;
    rule.require(eq(
        b.clone(),
        sub(lit(256), mul(lit(8), add(a.clone(), lit(1)))),
    ))?;

    let nonopt = byte(a, shl(b, x.clone()));
    let opt = and(x, lit(0xff));
    Ok((nonopt, opt))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::semantics::smt::SolverConfig;
    use crate::semantics::VerificationResult;

    #[test]
    fn test_proved() {
        let result = case().run(SolverConfig::default()).unwrap();
        assert_eq!(result, VerificationResult::Proved);
    }

    #[test]
    fn test_unsound_without_index_bound() {
        // The same pattern minus the A < 32 precondition must be refuted
        let mut rule = Rule::new(WORD_WIDTH);
        let x = rule.declare("X", WORD_WIDTH).unwrap();
        let a = rule.declare("A", WORD_WIDTH).unwrap();
        let b = rule.declare("B", WORD_WIDTH).unwrap();
        rule.require(eq(
            b.clone(),
            sub(lit(256), mul(lit(8), add(a.clone(), lit(1)))),
        ))
        .unwrap();
        let result = rule
            .check(byte(a, shl(b, x.clone())), and(x, lit(0xff)))
            .unwrap();
        assert!(matches!(result, VerificationResult::Disproved(_)));
    }
}
