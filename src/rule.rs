use regex::{Regex, RegexBuilder};
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// An atomic text transformation applied to a whole buffer.
///
/// Rules are plain data: they hold their before/after text and never touch the
/// file system. Applying a rule consumes nothing and returns a fresh buffer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Rule {
    /// Exact substring replacement.
    LiteralReplace {
        old: String,
        new: String,
        mode: ReplaceMode,
    },
    /// Regular-expression substitution over every match. The replacement may
    /// reference capture groups (`$1`, `${name}`); a literal `$` is written `$$`.
    RegexReplace {
        pattern: String,
        replacement: String,
        flags: RegexFlags,
    },
    /// Exact multi-line block replacement, whitespace and line breaks included.
    /// Only the first occurrence of the block is replaced.
    BlockReplace { old_block: String, new_block: String },
}

/// Which occurrences a literal replacement rewrites.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ReplaceMode {
    /// Only the first occurrence in the buffer.
    First,
    /// Every non-overlapping occurrence.
    #[default]
    All,
}

/// Compilation flags for [`Rule::RegexReplace`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct RegexFlags {
    /// `^` and `$` match at line boundaries.
    pub multi_line: bool,
    pub case_insensitive: bool,
    /// `.` also matches `\n`.
    pub dot_matches_new_line: bool,
}

impl RegexFlags {
    pub fn multi_line() -> Self {
        Self {
            multi_line: true,
            ..Self::default()
        }
    }
}

/// What happened when a rule was attempted against a buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "kebab-case")]
pub enum RuleOutcome {
    /// At least one replacement was made.
    Applied { replacements: usize },
    /// The expected text or pattern was absent; the buffer is unchanged.
    NoMatch,
}

impl RuleOutcome {
    pub fn is_applied(&self) -> bool {
        matches!(self, RuleOutcome::Applied { .. })
    }
}

impl fmt::Display for RuleOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RuleOutcome::Applied { replacements: 1 } => write!(f, "applied (1 replacement)"),
            RuleOutcome::Applied { replacements } => {
                write!(f, "applied ({replacements} replacements)")
            }
            RuleOutcome::NoMatch => write!(f, "no match"),
        }
    }
}

/// Result of applying one rule: the next buffer and the outcome that produced it.
#[derive(Debug, Clone, PartialEq, Eq)]
#[must_use = "Application carries the rewritten buffer"]
pub struct Application {
    pub buffer: String,
    pub outcome: RuleOutcome,
}

impl Application {
    fn unchanged(buffer: &str) -> Self {
        Self {
            buffer: buffer.to_string(),
            outcome: RuleOutcome::NoMatch,
        }
    }
}

/// A rule whose definition cannot be applied at all.
#[derive(Error, Debug)]
pub enum RuleError {
    #[error("invalid pattern {pattern:?}: {source}")]
    InvalidPattern {
        pattern: String,
        #[source]
        source: regex::Error,
    },

    #[error("{kind} rule has empty target text")]
    EmptyTarget { kind: &'static str },
}

impl Rule {
    /// Literal replacement of every occurrence.
    pub fn literal(old: impl Into<String>, new: impl Into<String>) -> Self {
        Rule::LiteralReplace {
            old: old.into(),
            new: new.into(),
            mode: ReplaceMode::All,
        }
    }

    /// Literal replacement of the first occurrence only.
    pub fn literal_first(old: impl Into<String>, new: impl Into<String>) -> Self {
        Rule::LiteralReplace {
            old: old.into(),
            new: new.into(),
            mode: ReplaceMode::First,
        }
    }

    pub fn regex(pattern: impl Into<String>, replacement: impl Into<String>) -> Self {
        Self::regex_with_flags(pattern, replacement, RegexFlags::default())
    }

    pub fn regex_with_flags(
        pattern: impl Into<String>,
        replacement: impl Into<String>,
        flags: RegexFlags,
    ) -> Self {
        Rule::RegexReplace {
            pattern: pattern.into(),
            replacement: replacement.into(),
            flags,
        }
    }

    pub fn block(old_block: impl Into<String>, new_block: impl Into<String>) -> Self {
        Rule::BlockReplace {
            old_block: old_block.into(),
            new_block: new_block.into(),
        }
    }

    /// Short name of the rule variant, used in reports.
    pub fn kind(&self) -> &'static str {
        match self {
            Rule::LiteralReplace { .. } => "literal",
            Rule::RegexReplace { .. } => "regex",
            Rule::BlockReplace { .. } => "block",
        }
    }

    /// The exact text this rule expects to find, if it is not a pattern.
    pub fn expected_text(&self) -> Option<&str> {
        match self {
            Rule::LiteralReplace { old, .. } => Some(old),
            Rule::BlockReplace { old_block, .. } => Some(old_block),
            Rule::RegexReplace { .. } => None,
        }
    }

    /// Check that the rule can be applied, without touching any buffer.
    pub fn validate(&self) -> Result<(), RuleError> {
        match self {
            Rule::LiteralReplace { old, .. } if old.is_empty() => {
                Err(RuleError::EmptyTarget { kind: self.kind() })
            }
            Rule::BlockReplace { old_block, .. } if old_block.is_empty() => {
                Err(RuleError::EmptyTarget { kind: self.kind() })
            }
            Rule::RegexReplace { pattern, flags, .. } => compile(pattern, *flags).map(|_| ()),
            _ => Ok(()),
        }
    }

    /// Apply this rule to `buffer`, producing the next buffer.
    ///
    /// Absence of the expected text is not an error: it yields
    /// [`RuleOutcome::NoMatch`] with the buffer returned byte-for-byte.
    pub fn apply(&self, buffer: &str) -> Result<Application, RuleError> {
        match self {
            Rule::LiteralReplace { old, new, mode } => {
                if old.is_empty() {
                    return Err(RuleError::EmptyTarget { kind: self.kind() });
                }
                Ok(replace_literal(buffer, old, new, *mode))
            }
            Rule::BlockReplace {
                old_block,
                new_block,
            } => {
                if old_block.is_empty() {
                    return Err(RuleError::EmptyTarget { kind: self.kind() });
                }
                Ok(replace_literal(
                    buffer,
                    old_block,
                    new_block,
                    ReplaceMode::First,
                ))
            }
            Rule::RegexReplace {
                pattern,
                replacement,
                flags,
            } => {
                let regex = compile(pattern, *flags)?;
                Ok(replace_pattern(buffer, &regex, replacement))
            }
        }
    }
}

fn compile(pattern: &str, flags: RegexFlags) -> Result<Regex, RuleError> {
    RegexBuilder::new(pattern)
        .multi_line(flags.multi_line)
        .case_insensitive(flags.case_insensitive)
        .dot_matches_new_line(flags.dot_matches_new_line)
        .build()
        .map_err(|source| RuleError::InvalidPattern {
            pattern: pattern.to_string(),
            source,
        })
}

fn replace_literal(buffer: &str, old: &str, new: &str, mode: ReplaceMode) -> Application {
    let replacements = match mode {
        ReplaceMode::First => usize::from(buffer.contains(old)),
        ReplaceMode::All => buffer.matches(old).count(),
    };
    if replacements == 0 {
        return Application::unchanged(buffer);
    }

    let buffer = match mode {
        ReplaceMode::First => buffer.replacen(old, new, 1),
        ReplaceMode::All => buffer.replace(old, new),
    };
    Application {
        buffer,
        outcome: RuleOutcome::Applied { replacements },
    }
}

fn replace_pattern(buffer: &str, regex: &Regex, replacement: &str) -> Application {
    let replacements = regex.find_iter(buffer).count();
    if replacements == 0 {
        return Application::unchanged(buffer);
    }

    Application {
        buffer: regex.replace_all(buffer, replacement).into_owned(),
        outcome: RuleOutcome::Applied { replacements },
    }
}
