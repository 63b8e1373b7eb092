//! Rule objects: preconditions plus a single equivalence query
//!
//! A rule is authored by declaring symbolic words, registering precondition
//! constraints, and checking a baseline expression against its optimized
//! candidate. Structural mistakes (width or sort mismatches, reuse after a
//! check) fail before any solver interaction.

use crate::ir::expr::Expr;
use crate::ir::types::Sort;
use crate::semantics::equivalence::{check_equivalence, VerificationResult};
use crate::semantics::smt::SolverConfig;
use std::fmt;

/// Structural authoring errors, detected before the solver runs
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RuleError {
    /// An expression or variable width disagrees with the rule's width
    WidthMismatch { expected: u32, found: u32 },
    /// A word expression where a boolean was required, or vice versa
    TypeError { expected: Sort, found: Sort },
    /// `check` was already invoked on this rule
    AlreadyChecked,
}

impl fmt::Display for RuleError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RuleError::WidthMismatch { expected, found } => {
                write!(f, "width mismatch: expected {} bits, found {}", expected, found)
            }
            RuleError::TypeError { expected, found } => {
                write!(
                    f,
                    "type error: expected a {}-sorted expression, found {}",
                    expected, found
                )
            }
            RuleError::AlreadyChecked => write!(f, "rule has already been checked"),
        }
    }
}

impl std::error::Error for RuleError {}

/// One verification unit: a set of preconditions and one equivalence claim
/// over expressions of a fixed word width
pub struct Rule {
    width: u32,
    vars: Vec<(String, u32)>,
    constraints: Vec<Expr>,
    checked: bool,
    config: SolverConfig,
}

impl Rule {
    /// Rule over words of the given width, with the default solver limits
    pub fn new(width: u32) -> Self {
        Self::with_config(width, SolverConfig::default())
    }

    /// Rule over words of the given width with explicit solver limits
    pub fn with_config(width: u32, config: SolverConfig) -> Self {
        assert!(
            width > 0 && width <= 256 && width % 8 == 0,
            "word width must be a positive multiple of 8, at most 256"
        );
        Rule {
            width,
            vars: Vec::new(),
            constraints: Vec::new(),
            checked: false,
            config,
        }
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn config(&self) -> &SolverConfig {
        &self.config
    }

    /// Registered constraints, in the order they were required
    pub fn constraints(&self) -> &[Expr] {
        &self.constraints
    }

    /// Free variables, in declaration order
    pub fn variables(&self) -> &[(String, u32)] {
        &self.vars
    }

    /// Declare a free symbolic word; idempotent by name
    ///
    /// The same name declared twice yields the same logical variable. A width
    /// that disagrees with the rule's fails immediately.
    pub fn declare(&mut self, name: &str, width: u32) -> Result<Expr, RuleError> {
        if width != self.width {
            return Err(RuleError::WidthMismatch {
                expected: self.width,
                found: width,
            });
        }
        self.register(name, width)?;
        Ok(Expr::var(name, width))
    }

    fn register(&mut self, name: &str, width: u32) -> Result<(), RuleError> {
        match self.vars.iter().find(|(n, _)| n == name) {
            Some((_, w)) if *w == width => Ok(()),
            Some((_, w)) => Err(RuleError::WidthMismatch {
                expected: *w,
                found: width,
            }),
            None => {
                self.vars.push((name.to_string(), width));
                Ok(())
            }
        }
    }

    /// Add a precondition to the rule's conjunction
    pub fn require(&mut self, constraint: Expr) -> Result<(), RuleError> {
        if self.checked {
            return Err(RuleError::AlreadyChecked);
        }
        if constraint.sort() != Sort::Bool {
            return Err(RuleError::TypeError {
                expected: Sort::Bool,
                found: constraint.sort(),
            });
        }
        self.validate(&constraint)?;
        self.constraints.push(constraint);
        Ok(())
    }

    /// Prove that `baseline` equals `candidate` for every assignment of the
    /// free variables satisfying the preconditions, or find a counterexample
    ///
    /// Finalizes the rule; a second call fails with `AlreadyChecked`.
    pub fn check(
        &mut self,
        baseline: Expr,
        candidate: Expr,
    ) -> Result<VerificationResult, RuleError> {
        if self.checked {
            return Err(RuleError::AlreadyChecked);
        }
        for expr in [&baseline, &candidate] {
            if expr.sort() != Sort::Word {
                return Err(RuleError::TypeError {
                    expected: Sort::Word,
                    found: expr.sort(),
                });
            }
            self.validate(expr)?;
        }
        self.checked = true;
        Ok(check_equivalence(self, &baseline, &candidate))
    }

    /// Walk an expression tree: operand sorts and arities must be well
    /// formed, every width must equal the rule's, and every variable is
    /// registered (first use counts as declaration)
    fn validate(&mut self, expr: &Expr) -> Result<(), RuleError> {
        match expr {
            Expr::Var { name, width } => {
                if *width != self.width {
                    return Err(RuleError::WidthMismatch {
                        expected: self.width,
                        found: *width,
                    });
                }
                self.register(name, *width)
            }
            Expr::Lit { width, .. } => {
                if *width != self.width {
                    return Err(RuleError::WidthMismatch {
                        expected: self.width,
                        found: *width,
                    });
                }
                Ok(())
            }
            Expr::Op { op, args } => {
                assert_eq!(
                    args.len(),
                    op.arity(),
                    "malformed {} node: expected {} operands",
                    op,
                    op.arity()
                );
                for arg in args {
                    if arg.sort() != Sort::Word {
                        return Err(RuleError::TypeError {
                            expected: Sort::Word,
                            found: arg.sort(),
                        });
                    }
                    self.validate(arg)?;
                }
                Ok(())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ir::ops::*;

    const W: u32 = 256;

    #[test]
    fn test_declare_returns_variable() {
        let mut rule = Rule::new(W);
        let x = rule.declare("X", W).unwrap();
        assert_eq!(x, Expr::var("X", W));
        assert_eq!(rule.variables(), &[("X".to_string(), W)]);
    }

    #[test]
    fn test_declare_idempotent_by_name() {
        let mut rule = Rule::new(W);
        let first = rule.declare("X", W).unwrap();
        let second = rule.declare("X", W).unwrap();
        assert_eq!(first, second);
        assert_eq!(rule.variables().len(), 1);
    }

    #[test]
    fn test_declare_width_mismatch() {
        let mut rule = Rule::new(W);
        assert_eq!(
            rule.declare("X", 64).unwrap_err(),
            RuleError::WidthMismatch {
                expected: 256,
                found: 64
            }
        );
    }

    #[test]
    fn test_require_rejects_word_expression() {
        let mut rule = Rule::new(W);
        let x = rule.declare("X", W).unwrap();
        assert_eq!(
            rule.require(add(x.clone(), x)).unwrap_err(),
            RuleError::TypeError {
                expected: Sort::Bool,
                found: Sort::Word
            }
        );
    }

    #[test]
    fn test_require_preserves_order() {
        let mut rule = Rule::new(W);
        let x = rule.declare("X", W).unwrap();
        let first = ult(x.clone(), Expr::lit_u64(32, W));
        let second = ult(Expr::lit_u64(0, W), x);
        rule.require(first.clone()).unwrap();
        rule.require(second.clone()).unwrap();
        assert_eq!(rule.constraints(), &[first, second]);
    }

    #[test]
    fn test_check_rejects_boolean_expression() {
        let mut rule = Rule::new(W);
        let x = rule.declare("X", W).unwrap();
        let err = rule
            .check(ult(x.clone(), x.clone()), x)
            .unwrap_err();
        assert_eq!(
            err,
            RuleError::TypeError {
                expected: Sort::Word,
                found: Sort::Bool
            }
        );
    }

    #[test]
    fn test_check_rejects_foreign_width() {
        let mut rule = Rule::new(W);
        let x = rule.declare("X", W).unwrap();
        let narrow = Expr::var("N", 64);
        let err = rule.check(x, narrow).unwrap_err();
        assert_eq!(
            err,
            RuleError::WidthMismatch {
                expected: 256,
                found: 64
            }
        );
    }

    #[test]
    fn test_nested_boolean_operand_rejected() {
        let mut rule = Rule::new(W);
        let x = rule.declare("X", W).unwrap();
        let bad = add(ult(x.clone(), x.clone()), x.clone());
        assert_eq!(
            rule.check(bad, x).unwrap_err(),
            RuleError::TypeError {
                expected: Sort::Word,
                found: Sort::Bool
            }
        );
    }

    #[test]
    fn test_require_after_check_fails() {
        let mut rule = Rule::new(W);
        let x = rule.declare("X", W).unwrap();
        rule.check(x.clone(), x.clone()).unwrap();
        assert_eq!(
            rule.require(ult(x.clone(), x)).unwrap_err(),
            RuleError::AlreadyChecked
        );
    }

    #[test]
    fn test_undeclared_variables_registered_on_use() {
        let mut rule = Rule::new(W);
        let x = Expr::var("X", W);
        rule.require(ult(x.clone(), Expr::lit_u64(4, W))).unwrap();
        assert_eq!(rule.variables(), &[("X".to_string(), W)]);
    }

    #[test]
    fn test_error_display() {
        let err = RuleError::WidthMismatch {
            expected: 256,
            found: 64,
        };
        assert_eq!(
            format!("{}", err),
            "width mismatch: expected 256 bits, found 64"
        );
        assert_eq!(
            format!("{}", RuleError::AlreadyChecked),
            "rule has already been checked"
        );
    }

    #[test]
    #[should_panic(expected = "word width")]
    fn test_width_must_be_byte_aligned() {
        let _ = Rule::new(12);
    }
}
