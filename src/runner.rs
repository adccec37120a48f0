//! Patch runner - applies an ordered rule set to one file
//!
//! The runner:
//! - Reads the target file into a buffer (UTF-8)
//! - Threads the buffer through every rule in order, recording each outcome
//! - Writes the final buffer back in place once every rule has been attempted
//!
//! A rule that finds nothing is recorded as [`RuleOutcome::NoMatch`] and the
//! run continues. Only an unreadable file or a malformed rule stops the run,
//! and in both cases nothing is written.

use crate::hint::{find_near_miss, NearMiss};
use crate::rule::{RuleError, RuleOutcome};
use crate::ruleset::{NamedRule, RuleSet};
use serde::Serialize;
use similar::TextDiff;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{debug, info};
use xxhash_rust::xxh3::xxh3_64;

/// Fatal errors that abort a run before anything is written.
#[derive(Error, Debug)]
pub enum PatchError {
    #[error("I/O error on {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("rule #{index} ({id}) is malformed: {source}")]
    Rule {
        index: usize,
        id: String,
        #[source]
        source: RuleError,
    },
}

impl PatchError {
    fn io(path: &Path, source: std::io::Error) -> Self {
        PatchError::Io {
            path: path.to_path_buf(),
            source,
        }
    }
}

/// Outcome of one rule within a run.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RuleRecord {
    /// Position of the rule in its set (0-based).
    pub index: usize,
    pub id: String,
    pub kind: &'static str,
    pub outcome: RuleOutcome,
    /// Closest region for a skipped literal/block rule, when one exists.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hint: Option<NearMiss>,
}

/// Buffer after a sequence of rules, with what each rule did.
#[derive(Debug, Clone, PartialEq)]
#[must_use = "AppliedRules carries the rewritten buffer"]
pub struct AppliedRules {
    pub buffer: String,
    pub records: Vec<RuleRecord>,
}

/// Apply `rules` to `buffer` in order, without touching the file system.
///
/// Each rule sees the output of the previous one. An empty rule list returns
/// the buffer unchanged with no records.
pub fn apply_rules(buffer: &str, rules: &[NamedRule]) -> Result<AppliedRules, PatchError> {
    apply_rules_inner(buffer, rules, true)
}

fn apply_rules_inner(
    buffer: &str,
    rules: &[NamedRule],
    hints: bool,
) -> Result<AppliedRules, PatchError> {
    let mut current = buffer.to_string();
    let mut records = Vec::with_capacity(rules.len());

    for (index, named) in rules.iter().enumerate() {
        let application = named
            .rule
            .apply(&current)
            .map_err(|source| PatchError::Rule {
                index,
                id: named.id.clone(),
                source,
            })?;

        let hint = match (application.outcome, named.rule.expected_text()) {
            (RuleOutcome::NoMatch, Some(expected)) if hints => find_near_miss(&current, expected),
            _ => None,
        };

        debug!(
            index,
            id = %named.id,
            kind = named.rule.kind(),
            outcome = %application.outcome,
            near_miss = hint.as_ref().map(|h| h.divergent_line),
            "rule attempted"
        );

        records.push(RuleRecord {
            index,
            id: named.id.clone(),
            kind: named.rule.kind(),
            outcome: application.outcome,
            hint,
        });
        current = application.buffer;
    }

    Ok(AppliedRules {
        buffer: current,
        records,
    })
}

/// Everything a caller needs to judge a run.
///
/// Reaching a report does not mean every rule matched; inspect
/// [`RunReport::skipped_count`] before trusting the result.
#[derive(Debug, Clone, PartialEq)]
pub struct RunReport {
    pub file: PathBuf,
    pub records: Vec<RuleRecord>,
    /// File contents before the first rule.
    pub original: String,
    /// Buffer after the last rule.
    pub buffer: String,
    /// Whether `buffer` has been written to `file`.
    pub written: bool,
}

impl RunReport {
    pub fn applied_count(&self) -> usize {
        self.records
            .iter()
            .filter(|r| r.outcome.is_applied())
            .count()
    }

    pub fn skipped_count(&self) -> usize {
        self.records.len() - self.applied_count()
    }

    pub fn all_applied(&self) -> bool {
        self.skipped_count() == 0
    }

    /// Whether the final buffer differs from the file contents.
    pub fn changed(&self) -> bool {
        self.original != self.buffer
    }

    /// `(ruleIndex, outcome)` pairs in application order.
    pub fn outcomes(&self) -> impl Iterator<Item = (usize, RuleOutcome)> + '_ {
        self.records.iter().map(|r| (r.index, r.outcome))
    }

    pub fn original_digest(&self) -> u64 {
        xxh3_64(self.original.as_bytes())
    }

    pub fn buffer_digest(&self) -> u64 {
        xxh3_64(self.buffer.as_bytes())
    }

    /// Unified diff from the original contents to the final buffer.
    pub fn unified_diff(&self) -> String {
        let name = self.file.display().to_string();
        let diff = TextDiff::from_lines(&self.original, &self.buffer);
        let mut unified = diff.unified_diff();
        unified
            .context_radius(3)
            .header(&format!("{name} (original)"), &format!("{name} (patched)"));
        unified.to_string()
    }

    /// Overwrite the target file with the final buffer.
    ///
    /// The write is a direct in-place overwrite; callers wanting a fallback
    /// should take a [`snapshot`] first.
    pub fn write(&mut self) -> Result<(), PatchError> {
        fs::write(&self.file, &self.buffer).map_err(|e| PatchError::io(&self.file, e))?;
        self.written = true;
        info!(
            path = %self.file.display(),
            bytes = self.buffer.len(),
            applied = self.applied_count(),
            skipped = self.skipped_count(),
            "wrote patched file"
        );
        Ok(())
    }

    pub fn summary(&self) -> ReportSummary<'_> {
        ReportSummary {
            file: &self.file,
            written: self.written,
            changed: self.changed(),
            applied: self.applied_count(),
            skipped: self.skipped_count(),
            original_digest: format!("{:016x}", self.original_digest()),
            buffer_digest: format!("{:016x}", self.buffer_digest()),
            rules: &self.records,
        }
    }
}

/// Serializable view of a [`RunReport`], without the buffers.
#[derive(Debug, Serialize)]
pub struct ReportSummary<'a> {
    pub file: &'a Path,
    pub written: bool,
    pub changed: bool,
    pub applied: usize,
    pub skipped: usize,
    pub original_digest: String,
    pub buffer_digest: String,
    pub rules: &'a [RuleRecord],
}

/// Applies one [`RuleSet`] to one file.
#[derive(Debug, Clone)]
pub struct PatchRunner<'a> {
    rules: &'a RuleSet,
    hints: bool,
}

impl<'a> PatchRunner<'a> {
    pub fn new(rules: &'a RuleSet) -> Self {
        Self { rules, hints: true }
    }

    /// Skip near-miss computation for skipped rules.
    pub fn without_hints(mut self) -> Self {
        self.hints = false;
        self
    }

    /// Read `path` and apply every rule, without writing anything.
    pub fn plan(&self, path: impl AsRef<Path>) -> Result<RunReport, PatchError> {
        let path = path.as_ref();
        let original = fs::read_to_string(path).map_err(|e| PatchError::io(path, e))?;
        debug!(
            path = %path.display(),
            rules = self.rules.len(),
            set = self.rules.name(),
            "loaded buffer"
        );

        let applied = apply_rules_inner(&original, self.rules.rules(), self.hints)?;

        Ok(RunReport {
            file: path.to_path_buf(),
            records: applied.records,
            original,
            buffer: applied.buffer,
            written: false,
        })
    }

    /// Apply every rule to `path` and overwrite it with the result.
    ///
    /// The file is written once all rules have been attempted, however many of
    /// them matched. No write happens if reading fails or a rule is malformed.
    pub fn run(&self, path: impl AsRef<Path>) -> Result<RunReport, PatchError> {
        let mut report = self.plan(path)?;
        report.write()?;
        Ok(report)
    }
}

/// Copy `path` to `<path>.orig`, returning the snapshot location.
pub fn snapshot(path: impl AsRef<Path>) -> Result<PathBuf, PatchError> {
    let path = path.as_ref();
    let mut name = path.as_os_str().to_os_string();
    name.push(".orig");
    let backup = PathBuf::from(name);
    fs::copy(path, &backup).map_err(|e| PatchError::io(&backup, e))?;
    debug!(from = %path.display(), to = %backup.display(), "snapshot taken");
    Ok(backup)
}
