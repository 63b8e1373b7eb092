//! Algebraic identities that need no preconditions
//!
//! sub(add(X, A), A) -> X
//! not(not(X)) -> X
//! xor(X, X) -> 0
//! or(X, and(X, Y)) -> X

use crate::ir::expr::Expr;
use crate::ir::ops::{add, and, not, or, sub, xor};
use crate::rule::{Rule, RuleError};
use crate::rules::{lit, RuleCase, WORD_WIDTH};

pub fn add_sub_cancel() -> RuleCase {
    RuleCase {
        name: "add_sub_cancel",
        summary: "adding then subtracting the same word cancels, even on wrap",
        build: build_add_sub,
    }
}

pub fn double_not() -> RuleCase {
    RuleCase {
        name: "double_not",
        summary: "double complement is the identity",
        build: build_double_not,
    }
}

pub fn xor_self() -> RuleCase {
    RuleCase {
        name: "xor_self",
        summary: "a word xored with itself is zero",
        build: build_xor_self,
    }
}

pub fn or_absorbs_and() -> RuleCase {
    RuleCase {
        name: "or_absorbs_and",
        summary: "or absorbs a conjunction with the same word",
        build: build_absorb,
    }
}

fn build_add_sub(rule: &mut Rule) -> Result<(Expr, Expr), RuleError> {
    let x = rule.declare("X", WORD_WIDTH)?;
    let a = rule.declare("A", WORD_WIDTH)?;
    Ok((sub(add(x.clone(), a.clone()), a), x))
}

fn build_double_not(rule: &mut Rule) -> Result<(Expr, Expr), RuleError> {
    let x = rule.declare("X", WORD_WIDTH)?;
    Ok((not(not(x.clone())), x))
}

fn build_xor_self(rule: &mut Rule) -> Result<(Expr, Expr), RuleError> {
    let x = rule.declare("X", WORD_WIDTH)?;
    Ok((xor(x.clone(), x), lit(0)))
}

fn build_absorb(rule: &mut Rule) -> Result<(Expr, Expr), RuleError> {
    let x = rule.declare("X", WORD_WIDTH)?;
    let y = rule.declare("Y", WORD_WIDTH)?;
    Ok((or(x.clone(), and(x.clone(), y)), x))
}
