//! Rulepatch: one-shot source patching with ordered text rules
//!
//! Rewrites a single file by threading its contents through a fixed, ordered
//! list of [`Rule`]s: literal substring replacement, regular-expression
//! substitution, and exact block replacement. There is no parser and no syntax
//! tree; the target file is opaque text.
//!
//! # Architecture
//!
//! - [`Rule`] turns one buffer into the next and reports a [`RuleOutcome`].
//! - [`RuleSet`] is the ordered, named list of rules for one job.
//! - [`PatchRunner`] reads the file, applies every rule in order, and writes
//!   the final buffer back once all rules have been attempted.
//!
//! # Failure model
//!
//! - A rule whose expected text is absent yields [`RuleOutcome::NoMatch`] and
//!   the run continues
//! - An unreadable file or a malformed rule aborts with [`PatchError`] before
//!   anything is written
//! - Partial application is allowed: inspect the [`RunReport`] afterwards
//!
//! # Example
//!
//! ```no_run
//! use rulepatch::{PatchRunner, RuleSet};
//!
//! let rules = RuleSet::new("rename")
//!     .literal("field", "analysis.suggestedSubSentiments", "analysis.matches");
//!
//! match PatchRunner::new(&rules).run("src/scripts/analyzeMovieSentiments.ts") {
//!     Ok(report) => println!("{} applied, {} skipped", report.applied_count(), report.skipped_count()),
//!     Err(e) => eprintln!("patch failed: {}", e),
//! }
//! ```

pub mod builtin;
pub mod config;
pub mod hint;
pub mod rule;
pub mod ruleset;
pub mod runner;

// Re-exports
pub use config::{load_from_path, load_from_str, load_rule_set, ConfigError, RuleConfig};
pub use hint::{find_near_miss, NearMiss};
pub use rule::{Application, RegexFlags, ReplaceMode, Rule, RuleError, RuleOutcome};
pub use ruleset::{NamedRule, RuleSet};
pub use runner::{
    apply_rules, snapshot, AppliedRules, PatchError, PatchRunner, ReportSummary, RuleRecord,
    RunReport,
};
