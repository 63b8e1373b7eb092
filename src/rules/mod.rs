//! Built-in optimization rule catalog
//!
//! One module per rewrite pattern: declare the inputs, state the
//! preconditions, name the non-optimized and optimized expressions. The
//! registry below feeds the CLI and the tests.

pub mod byte_bounds;
pub mod combine_byte_shl;
pub mod combine_shifts;
pub mod identities;
pub mod shift_bounds;

use crate::ir::expr::Expr;
use crate::rule::{Rule, RuleError};
use crate::semantics::equivalence::VerificationResult;
use crate::semantics::smt::SolverConfig;

/// Word width of the target machine
pub const WORD_WIDTH: u32 = 256;

/// Constant word at the machine width
pub fn lit(value: u64) -> Expr {
    Expr::lit_u64(value, WORD_WIDTH)
}

/// A named rewrite pattern from the catalog
pub struct RuleCase {
    pub name: &'static str,
    pub summary: &'static str,
    /// Declares inputs and preconditions on the rule and returns the
    /// (non-optimized, optimized) expression pair
    pub build: fn(&mut Rule) -> Result<(Expr, Expr), RuleError>,
}

impl RuleCase {
    /// Build and check this case on a fresh rule
    #[allow(dead_code)]
    pub fn run(&self, config: SolverConfig) -> Result<VerificationResult, RuleError> {
        let mut rule = Rule::with_config(WORD_WIDTH, config);
        let (baseline, candidate) = (self.build)(&mut rule)?;
        rule.check(baseline, candidate)
    }
}

/// Every rule in the catalog
pub fn all() -> Vec<RuleCase> {
    vec![
        combine_byte_shl::case(),
        combine_shifts::shl_of_shl(),
        combine_shifts::shr_of_shr(),
        byte_bounds::byte_past_width(),
        byte_bounds::mask_lowest_byte(),
        shift_bounds::shl_past_width(),
        shift_bounds::shr_past_width(),
        identities::add_sub_cancel(),
        identities::double_not(),
        identities::xor_self(),
        identities::or_absorbs_and(),
    ]
}

/// Look up a catalog rule by name
pub fn find(name: &str) -> Option<RuleCase> {
    all().into_iter().find(|case| case.name == name)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_names_unique() {
        let names: Vec<_> = all().iter().map(|case| case.name).collect();
        let unique: HashSet<_> = names.iter().collect();
        assert_eq!(names.len(), unique.len());
    }

    #[test]
    fn test_find_by_name() {
        assert!(find("combine_byte_shl").is_some());
        assert!(find("no_such_rule").is_none());
    }

    #[test]
    fn test_catalog_all_proved() {
        for case in all() {
            let result = case
                .run(SolverConfig::default())
                .unwrap_or_else(|err| panic!("{}: {}", case.name, err));
            assert!(result.is_proved(), "{}: {}", case.name, result);
        }
    }
}
