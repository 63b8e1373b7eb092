//! Random and edge-case input generation for cheap refutation
//!
//! Before paying for a solver run, a rule can be thrown at concrete inputs:
//! any assignment that satisfies every precondition yet separates baseline
//! from candidate refutes the rule outright. This tier can only disprove,
//! never prove.

use crate::ir::expr::{width_mask, Expr};
use crate::rule::Rule;
use crate::semantics::concrete::{eval_bool, eval_word, Assignment};
use crate::semantics::equivalence::Counterexample;
use rand::Rng;
use ruint::aliases::U256;

/// Configuration for random input generation
#[derive(Debug, Clone)]
pub struct RandomInputConfig {
    /// Number of random assignments to try
    pub count: usize,
}

impl Default for RandomInputConfig {
    fn default() -> Self {
        RandomInputConfig { count: 64 }
    }
}

/// Values that sit on the boundaries the opcode semantics care about
pub fn edge_values(width: u32) -> Vec<U256> {
    let mask = width_mask(width);
    let mut values = vec![
        U256::ZERO,
        U256::from(1u64),
        U256::from(2u64),
        U256::from(0xffu64),
        U256::from(0x100u64),
        U256::from(width / 8),            // byte-index bound
        U256::from(width / 8 - 1),
        U256::from(width),                // shift bound
        U256::from(width - 1),
        mask,                             // all ones
        mask >> 1,
        mask ^ (mask >> 1),               // top bit only
        U256::from(0x5555_5555_5555_5555u64) & mask,
        U256::from(0xAAAA_AAAA_AAAA_AAAAu64) & mask,
    ];
    values.sort();
    values.dedup();
    values
}

fn random_word(rng: &mut impl Rng, width: u32) -> U256 {
    let limbs = [
        rng.random::<u64>(),
        rng.random::<u64>(),
        rng.random::<u64>(),
        rng.random::<u64>(),
    ];
    U256::from_limbs(limbs) & width_mask(width)
}

/// Try to refute the equivalence with concrete inputs
///
/// Assignments are filtered through the precondition conjunction; the first
/// one that passes the filter and separates the expressions is returned, in
/// the rule's variable order. `None` means no refutation was found, not that
/// the rule holds.
pub fn quick_refute(
    rule: &Rule,
    baseline: &Expr,
    candidate: &Expr,
    config: &RandomInputConfig,
) -> Option<Counterexample> {
    let mut vars: Vec<(String, u32)> = rule.variables().to_vec();
    for constraint in rule.constraints() {
        constraint.free_vars(&mut vars);
    }
    baseline.free_vars(&mut vars);
    candidate.free_vars(&mut vars);

    let mut candidates: Vec<Assignment> = Vec::new();

    // Every variable pinned to the same edge value
    for value in edge_values(rule.width()) {
        candidates.push(
            vars.iter()
                .map(|(name, _)| (name.clone(), value))
                .collect(),
        );
    }

    // Pairwise edge grid over the first two variables, others zero
    if vars.len() >= 2 {
        let edges = edge_values(rule.width());
        for &first in &edges {
            for &second in &edges {
                let mut env: Assignment = vars
                    .iter()
                    .map(|(name, _)| (name.clone(), U256::ZERO))
                    .collect();
                env.insert(vars[0].0.clone(), first);
                env.insert(vars[1].0.clone(), second);
                candidates.push(env);
            }
        }
    }

    let mut rng = rand::rng();
    for _ in 0..config.count {
        candidates.push(
            vars.iter()
                .map(|(name, width)| (name.clone(), random_word(&mut rng, *width)))
                .collect(),
        );
    }

    for env in candidates {
        if !rule.constraints().iter().all(|c| eval_bool(c, &env)) {
            continue;
        }
        if eval_word(baseline, &env) != eval_word(candidate, &env) {
            let assignments = vars
                .iter()
                .map(|(name, _)| (name.clone(), env[name]))
                .collect();
            return Some(Counterexample { assignments });
        }
    }

    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ir::ops::*;

    const W: u32 = 256;

    #[test]
    fn test_edge_values_cover_bounds() {
        let values = edge_values(W);
        assert!(values.contains(&U256::ZERO));
        assert!(values.contains(&U256::MAX));
        assert!(values.contains(&U256::from(32u64)));
        assert!(values.contains(&U256::from(256u64)));
    }

    #[test]
    fn test_refutes_unconditional_inequality() {
        let mut rule = Rule::new(W);
        let x = rule.declare("X", W).unwrap();
        let cex = quick_refute(
            &rule,
            &add(x.clone(), Expr::lit_u64(1, W)),
            &x,
            &RandomInputConfig::default(),
        )
        .expect("expected a refutation");
        assert!(cex.get("X").is_some());
    }

    #[test]
    fn test_no_refutation_for_identity() {
        let mut rule = Rule::new(W);
        let x = rule.declare("X", W).unwrap();
        assert_eq!(
            quick_refute(&rule, &x.clone(), &x, &RandomInputConfig::default()),
            None
        );
    }

    #[test]
    fn test_constraints_filter_inputs() {
        // Only X = 0 passes the filter, and there the expressions agree
        let mut rule = Rule::new(W);
        let x = rule.declare("X", W).unwrap();
        rule.require(ult(x.clone(), Expr::lit_u64(1, W))).unwrap();
        assert_eq!(
            quick_refute(
                &rule,
                &mul(x.clone(), Expr::lit_u64(5, W)),
                &x,
                &RandomInputConfig::default()
            ),
            None
        );
    }

    #[test]
    fn test_refutation_respects_constraints() {
        // X must exceed the byte bound; the refutation has to honor that
        let mut rule = Rule::new(W);
        let x = rule.declare("X", W).unwrap();
        let y = rule.declare("Y", W).unwrap();
        rule.require(ult(Expr::lit_u64(31, W), x.clone())).unwrap();
        // Deterministic edge case: X = Y = 0xff passes the filter and the
        // baseline collapses to zero while the candidate keeps the low byte
        let cex = quick_refute(
            &rule,
            &byte(x.clone(), y.clone()),
            &byte(Expr::lit_u64(31, W), y),
            &RandomInputConfig::default(),
        )
        .expect("expected a refutation");
        assert!(cex.get("X").unwrap() > U256::from(31u64));
    }
}
