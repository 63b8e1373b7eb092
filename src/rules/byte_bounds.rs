//! Byte extraction at the index boundaries
//!
//! byte(A, X) -> 0               given 31 < A
//! byte(31, X) -> and(X, 0xff)

use crate::ir::expr::Expr;
use crate::ir::ops::{and, byte, ult};
use crate::rule::{Rule, RuleError};
use crate::rules::{lit, RuleCase, WORD_WIDTH};

pub fn byte_past_width() -> RuleCase {
    RuleCase {
        name: "byte_past_width",
        summary: "byte index past the last byte always reads zero",
        build: build_past_width,
    }
}

pub fn mask_lowest_byte() -> RuleCase {
    RuleCase {
        name: "mask_lowest_byte",
        summary: "the least significant byte is a 0xff mask",
        build: build_mask,
    }
}

fn build_past_width(rule: &mut Rule) -> Result<(Expr, Expr), RuleError> {
    let x = rule.declare("X", WORD_WIDTH)?;
    let a = rule.declare("A", WORD_WIDTH)?;

    rule.require(ult(lit(31), a.clone()))?;

    Ok((byte(a, x), lit(0)))
}

fn build_mask(rule: &mut Rule) -> Result<(Expr, Expr), RuleError> {
    let x = rule.declare("X", WORD_WIDTH)?;
    Ok((byte(lit(31), x.clone()), and(x, lit(0xff))))
}
