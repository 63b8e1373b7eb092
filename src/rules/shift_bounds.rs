//! Shift amounts at and past the width
//!
//! shl(A, X) -> 0   given 255 < A
//! shr(A, X) -> 0   given 255 < A

use crate::ir::expr::Expr;
use crate::ir::ops::{shl, shr, ult};
use crate::rule::{Rule, RuleError};
use crate::rules::{lit, RuleCase, WORD_WIDTH};

pub fn shl_past_width() -> RuleCase {
    RuleCase {
        name: "shl_past_width",
        summary: "left shift by the width or more is zero",
        build: build_shl,
    }
}

pub fn shr_past_width() -> RuleCase {
    RuleCase {
        name: "shr_past_width",
        summary: "right shift by the width or more is zero",
        build: build_shr,
    }
}

fn build_shl(rule: &mut Rule) -> Result<(Expr, Expr), RuleError> {
    let x = rule.declare("X", WORD_WIDTH)?;
    let a = rule.declare("A", WORD_WIDTH)?;
    rule.require(ult(lit(255), a.clone()))?;
    Ok((shl(a, x), lit(0)))
}

fn build_shr(rule: &mut Rule) -> Result<(Expr, Expr), RuleError> {
    let x = rule.declare("X", WORD_WIDTH)?;
    let a = rule.declare("A", WORD_WIDTH)?;
    rule.require(ult(lit(255), a.clone()))?;
    Ok((shr(a, x), lit(0)))
}
