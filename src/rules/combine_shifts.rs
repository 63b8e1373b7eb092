//! Folding nested same-direction shifts into one shift
//!
//! shl(A, shl(B, X)) -> shl(add(A, B), X)   given A < 256 && B < 256
//! shr(A, shr(B, X)) -> shr(add(A, B), X)   given A < 256 && B < 256
//!
//! The bounds keep add(A, B) from wrapping; at and past the width both
//! sides saturate to zero together.

use crate::ir::expr::Expr;
use crate::ir::ops::{add, shl, shr, ult};
use crate::rule::{Rule, RuleError};
use crate::rules::{lit, RuleCase, WORD_WIDTH};

pub fn shl_of_shl() -> RuleCase {
    RuleCase {
        name: "combine_shl_shl",
        summary: "nested left shifts fold into one left shift",
        build: build_shl,
    }
}

pub fn shr_of_shr() -> RuleCase {
    RuleCase {
        name: "combine_shr_shr",
        summary: "nested right shifts fold into one right shift",
        build: build_shr,
    }
}

fn build_shl(rule: &mut Rule) -> Result<(Expr, Expr), RuleError> {
    let x = rule.declare("X", WORD_WIDTH)?;
    let a = rule.declare("A", WORD_WIDTH)?;
    let b = rule.declare("B", WORD_WIDTH)?;

    rule.require(ult(a.clone(), lit(256)))?;
    rule.require(ult(b.clone(), lit(256)))?;

    let nonopt = shl(a.clone(), shl(b.clone(), x.clone()));
    let opt = shl(add(a, b), x);
    Ok((nonopt, opt))
}

fn build_shr(rule: &mut Rule) -> Result<(Expr, Expr), RuleError> {
    let x = rule.declare("X", WORD_WIDTH)?;
    let a = rule.declare("A", WORD_WIDTH)?;
    let b = rule.declare("B", WORD_WIDTH)?;

    rule.require(ult(a.clone(), lit(256)))?;
    rule.require(ult(b.clone(), lit(256)))?;

    let nonopt = shr(a.clone(), shr(b.clone(), x.clone()));
    let opt = shr(add(a, b), x);
    Ok((nonopt, opt))
}
