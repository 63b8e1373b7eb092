//! Equivalence checking between a baseline and a candidate expression
//!
//! The universal claim "under the preconditions, baseline == candidate for
//! every input" is decided by asking the solver for a counterexample:
//! preconditions plus baseline != candidate. Unsatisfiable means proved.

use crate::ir::expr::Expr;
use crate::rule::Rule;
use crate::semantics::concrete::{eval_bool, eval_word, Assignment};
use crate::semantics::smt::{create_solver_with_config, model_value, Encoder};
use ruint::aliases::U256;
use std::fmt;
use z3::ast::Ast;
use z3::SatResult;

/// Outcome of a rule check
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum VerificationResult {
    /// No counterexample exists under the preconditions
    Proved,
    /// Concrete inputs satisfy the preconditions yet separate the two
    /// expressions
    Disproved(Counterexample),
    /// The solver could not decide within its resource limits
    Inconclusive(String),
}

impl VerificationResult {
    #[allow(dead_code)]
    pub fn is_proved(&self) -> bool {
        matches!(self, VerificationResult::Proved)
    }
}

impl fmt::Display for VerificationResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            VerificationResult::Proved => write!(f, "proved"),
            VerificationResult::Disproved(cex) => write!(f, "disproved: {}", cex),
            VerificationResult::Inconclusive(reason) => {
                write!(f, "inconclusive: {}", reason)
            }
        }
    }
}

/// A concrete assignment separating baseline from candidate
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Counterexample {
    /// Values for every free variable, in declaration order
    pub assignments: Vec<(String, U256)>,
}

impl Counterexample {
    #[allow(dead_code)]
    pub fn get(&self, name: &str) -> Option<U256> {
        self.assignments
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, v)| *v)
    }

    pub fn as_env(&self) -> Assignment {
        self.assignments
            .iter()
            .map(|(n, v)| (n.clone(), *v))
            .collect()
    }
}

impl fmt::Display for Counterexample {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, (name, value)) in self.assignments.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{} = 0x{:x}", name, value)?;
        }
        Ok(())
    }
}

/// Decide whether the preconditions entail baseline == candidate
///
/// One exclusively-owned solver session is created per call and dropped on
/// return. Expressions and variables are validated by the rule before this
/// runs.
pub fn check_equivalence(rule: &Rule, baseline: &Expr, candidate: &Expr) -> VerificationResult {
    let solver = create_solver_with_config(rule.config());
    let mut encoder = Encoder::new();

    for constraint in rule.constraints() {
        solver.assert(&encoder.encode_bool(constraint));
    }

    // A satisfying assignment here is exactly a counterexample to the claim
    let lhs = encoder.encode_word(baseline);
    let rhs = encoder.encode_word(candidate);
    solver.assert(&lhs.eq(rhs).not());

    match solver.check() {
        SatResult::Unsat => VerificationResult::Proved,
        SatResult::Unknown => {
            VerificationResult::Inconclusive("solver returned unknown".to_string())
        }
        SatResult::Sat => {
            let model = match solver.get_model() {
                Some(model) => model,
                None => {
                    return VerificationResult::Inconclusive(
                        "satisfiable, but no model available".to_string(),
                    )
                }
            };
            let mut assignments = Vec::new();
            for (name, width) in rule.variables() {
                let var = encoder.variable(name, *width);
                match model_value(&model, &var, *width) {
                    Some(value) => assignments.push((name.clone(), value)),
                    None => {
                        return VerificationResult::Inconclusive(format!(
                            "could not extract a value for {} from the model",
                            name
                        ))
                    }
                }
            }
            let cex = Counterexample { assignments };
            match replay(rule, baseline, candidate, &cex) {
                Ok(()) => VerificationResult::Disproved(cex),
                Err(reason) => VerificationResult::Inconclusive(reason),
            }
        }
    }
}

/// Re-evaluate a model concretely: every precondition must hold and the two
/// expressions must actually differ, otherwise the model is not trusted
fn replay(
    rule: &Rule,
    baseline: &Expr,
    candidate: &Expr,
    cex: &Counterexample,
) -> Result<(), String> {
    let env = cex.as_env();
    for constraint in rule.constraints() {
        if !eval_bool(constraint, &env) {
            return Err(format!(
                "model does not satisfy precondition {}",
                constraint
            ));
        }
    }
    if eval_word(baseline, &env) == eval_word(candidate, &env) {
        return Err("model does not separate the two expressions".to_string());
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ir::ops::*;
    use crate::rule::{Rule, RuleError};
    use crate::semantics::smt::SolverConfig;

    const W: u32 = 256;

    fn lit(value: u64) -> Expr {
        Expr::lit_u64(value, W)
    }

    #[test]
    fn test_identical_expressions_proved() {
        let mut rule = Rule::new(W);
        let x = rule.declare("X", W).unwrap();
        let result = rule.check(x.clone(), x).unwrap();
        assert_eq!(result, VerificationResult::Proved);
    }

    #[test]
    fn test_unsatisfiable_precondition_is_vacuously_proved() {
        // Nothing is unsigned-less-than zero, so any claim holds
        let mut rule = Rule::new(W);
        let x = rule.declare("X", W).unwrap();
        let a = rule.declare("A", W).unwrap();
        rule.require(ult(a, lit(0))).unwrap();
        let result = rule.check(x, lit(7)).unwrap();
        assert_eq!(result, VerificationResult::Proved);
    }

    #[test]
    fn test_trivially_unequal_disproved_with_replaying_model() {
        let mut rule = Rule::new(W);
        let x = rule.declare("X", W).unwrap();
        let result = rule
            .check(add(x.clone(), lit(1)), x.clone())
            .unwrap();
        match result {
            VerificationResult::Disproved(cex) => {
                assert!(cex.get("X").is_some());
            }
            other => panic!("expected Disproved, got {:?}", other),
        }
    }

    #[test]
    fn test_constraints_narrow_the_input_space() {
        // x & 1 == x only holds below 2, which the precondition enforces
        let mut rule = Rule::new(W);
        let x = rule.declare("X", W).unwrap();
        rule.require(ult(x.clone(), lit(2))).unwrap();
        let result = rule.check(and(x.clone(), lit(1)), x).unwrap();
        assert_eq!(result, VerificationResult::Proved);
    }

    #[test]
    fn test_sample_rule_byte_of_shl_proved() {
        // byte(A, shl(B, X)) -> and(X, 0xff)
        // given A < 32 && B == 256 - 8 * (A + 1)
        let mut rule = Rule::new(W);
        let x = rule.declare("X", W).unwrap();
        let a = rule.declare("A", W).unwrap();
        let b = rule.declare("B", W).unwrap();

        rule.require(ult(a.clone(), lit(32))).unwrap();
        rule.require(eq(
            b.clone(),
            sub(lit(256), mul(lit(8), add(a.clone(), lit(1)))),
        ))
        .unwrap();

        let baseline = byte(a, shl(b, x.clone()));
        let candidate = and(x, lit(0xff));
        let result = rule.check(baseline, candidate).unwrap();
        assert_eq!(result, VerificationResult::Proved);
    }

    #[test]
    fn test_sample_rule_without_index_bound_disproved() {
        // Dropping A < 32 admits indices past the word, where the baseline
        // collapses to zero
        let mut rule = Rule::new(W);
        let x = rule.declare("X", W).unwrap();
        let a = rule.declare("A", W).unwrap();
        let b = rule.declare("B", W).unwrap();

        rule.require(eq(
            b.clone(),
            sub(lit(256), mul(lit(8), add(a.clone(), lit(1)))),
        ))
        .unwrap();

        let baseline = byte(a, shl(b, x.clone()));
        let candidate = and(x, lit(0xff));
        match rule.check(baseline, candidate).unwrap() {
            VerificationResult::Disproved(cex) => {
                let a = cex.get("A").expect("A missing from counterexample");
                assert!(a >= U256::from(32u64), "A = 0x{:x}", a);
            }
            other => panic!("expected Disproved, got {:?}", other),
        }
    }

    #[test]
    fn test_counterexample_satisfies_constraints() {
        let mut rule = Rule::new(W);
        let x = rule.declare("X", W).unwrap();
        rule.require(ult(lit(10), x.clone())).unwrap();
        match rule.check(x.clone(), lit(3)).unwrap() {
            VerificationResult::Disproved(cex) => {
                let x = cex.get("X").unwrap();
                assert!(x > U256::from(10u64));
            }
            other => panic!("expected Disproved, got {:?}", other),
        }
    }

    #[test]
    fn test_second_check_fails() {
        let mut rule = Rule::new(W);
        let x = rule.declare("X", W).unwrap();
        rule.check(x.clone(), x.clone()).unwrap();
        assert_eq!(
            rule.check(x.clone(), x).unwrap_err(),
            RuleError::AlreadyChecked
        );
    }

    #[test]
    fn test_unused_declared_variable_still_reported() {
        let mut rule = Rule::new(W);
        let x = rule.declare("X", W).unwrap();
        rule.declare("Y", W).unwrap();
        match rule.check(add(x.clone(), lit(1)), x).unwrap() {
            VerificationResult::Disproved(cex) => {
                assert!(cex.get("Y").is_some());
            }
            other => panic!("expected Disproved, got {:?}", other),
        }
    }

    #[test]
    fn test_result_display() {
        assert_eq!(format!("{}", VerificationResult::Proved), "proved");
        let cex = Counterexample {
            assignments: vec![("A".to_string(), U256::from(32u64))],
        };
        assert_eq!(format!("{}", cex), "A = 0x20");
    }

    #[test]
    fn test_explicit_config_accepted() {
        let mut rule = Rule::with_config(W, SolverConfig::with_timeout_secs(120));
        let x = rule.declare("X", W).unwrap();
        let result = rule.check(not(not(x.clone())), x).unwrap();
        assert_eq!(result, VerificationResult::Proved);
    }
}
