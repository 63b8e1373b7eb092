//! opcheck - equivalence checker for EVM bytecode optimization rules
//!
//! Each built-in rule claims that an optimized expression can replace a
//! non-optimized one under stated preconditions; the checker proves the
//! claim for every 256-bit input or prints a concrete counterexample.

use clap::{Parser, Subcommand};

mod ir;
mod rule;
mod rules;
mod semantics;
mod validation;

use rule::Rule;
use rules::RuleCase;
use semantics::{SolverConfig, VerificationResult};
use validation::{quick_refute, RandomInputConfig};

// --- Command Line Arguments ---

#[derive(Parser)]
#[command(name = "opcheck")]
#[command(about = "opcheck - EVM optimization rule equivalence checker")]
#[command(version)]
#[command(subcommand_required = true)]
#[command(arg_required_else_help = true)]
struct Args {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List the built-in optimization rules
    List,
    /// Verify rules: prove each rewrite or report a counterexample
    Run {
        /// Rule names to verify (the whole catalog if omitted)
        names: Vec<String>,
        /// Solver timeout in seconds (0 disables the timeout)
        #[arg(long, default_value = "30")]
        timeout: u64,
        /// Try random and edge-case inputs before invoking the solver
        #[arg(long)]
        quick: bool,
        /// Print preconditions and expressions for each rule
        #[arg(long, short)]
        verbose: bool,
    },
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();

    match args.command {
        Commands::List => {
            for case in rules::all() {
                println!("{:<20} {}", case.name, case.summary);
            }
            Ok(())
        }
        Commands::Run {
            names,
            timeout,
            quick,
            verbose,
        } => {
            let cases = select_cases(&names)?;
            let config = if timeout == 0 {
                SolverConfig::no_timeout()
            } else {
                SolverConfig::with_timeout_secs(timeout)
            };
            let all_proved = run_cases(&cases, &config, quick, verbose)?;
            if !all_proved {
                std::process::exit(1);
            }
            Ok(())
        }
    }
}

fn select_cases(names: &[String]) -> Result<Vec<RuleCase>, Box<dyn std::error::Error>> {
    if names.is_empty() {
        return Ok(rules::all());
    }
    names
        .iter()
        .map(|name| {
            rules::find(name).ok_or_else(|| format!("unknown rule: {}", name).into())
        })
        .collect()
}

fn run_cases(
    cases: &[RuleCase],
    config: &SolverConfig,
    quick: bool,
    verbose: bool,
) -> Result<bool, Box<dyn std::error::Error>> {
    let mut proved = 0usize;
    let mut disproved = 0usize;
    let mut inconclusive = 0usize;

    for case in cases {
        let mut rule = Rule::with_config(rules::WORD_WIDTH, config.clone());
        let (baseline, candidate) = (case.build)(&mut rule)?;

        if verbose {
            println!("{}:", case.name);
            for constraint in rule.constraints() {
                println!("    require {}", constraint);
            }
            println!("    baseline  {}", baseline);
            println!("    candidate {}", candidate);
        }

        // A concrete refutation saves a solver run; otherwise fall through
        let quick_hit = if quick {
            quick_refute(&rule, &baseline, &candidate, &RandomInputConfig::default())
        } else {
            None
        };
        let result = match quick_hit {
            Some(cex) => VerificationResult::Disproved(cex),
            None => rule.check(baseline, candidate)?,
        };

        match &result {
            VerificationResult::Proved => {
                proved += 1;
                println!("{:<20} proved", case.name);
            }
            VerificationResult::Disproved(cex) => {
                disproved += 1;
                println!("{:<20} DISPROVED", case.name);
                for (name, value) in &cex.assignments {
                    println!("    {} = 0x{:x}", name, value);
                }
            }
            VerificationResult::Inconclusive(reason) => {
                inconclusive += 1;
                println!("{:<20} inconclusive ({})", case.name, reason);
            }
        }
    }

    println!();
    println!(
        "{} proved, {} disproved, {} inconclusive",
        proved, disproved, inconclusive
    );
    Ok(disproved == 0 && inconclusive == 0)
}
