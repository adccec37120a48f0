use crate::rule::{RegexFlags, ReplaceMode, Rule};
use crate::ruleset::RuleSet;
use serde::Deserialize;
use std::collections::HashSet;
use std::fmt;

#[derive(Debug, Deserialize, Default, Clone)]
pub struct RuleConfig {
    #[serde(default)]
    pub meta: Metadata,
    #[serde(default)]
    pub rules: Vec<RuleDefinition>,
}

impl RuleConfig {
    pub fn validate(&self) -> Result<(), ValidationError> {
        let mut issues = Vec::new();

        if self.rules.is_empty() {
            issues.push(ValidationIssue::EmptyRuleList);
        }

        let mut seen = HashSet::new();
        for rule in &self.rules {
            let rule_id = if rule.id.trim().is_empty() {
                issues.push(ValidationIssue::MissingField {
                    rule_id: None,
                    field: "id",
                });
                None
            } else {
                if !seen.insert(rule.id.as_str()) {
                    issues.push(ValidationIssue::DuplicateId(rule.id.clone()));
                }
                Some(rule.id.clone())
            };

            match &rule.kind {
                RuleKind::Literal { old, .. } => {
                    if old.is_empty() {
                        issues.push(ValidationIssue::MissingField {
                            rule_id,
                            field: "old",
                        });
                    }
                }
                RuleKind::Block { old, .. } => {
                    if old.trim().is_empty() {
                        issues.push(ValidationIssue::MissingField {
                            rule_id,
                            field: "old",
                        });
                    }
                }
                RuleKind::Regex { pattern, .. } => {
                    if pattern.is_empty() {
                        issues.push(ValidationIssue::MissingField {
                            rule_id,
                            field: "pattern",
                        });
                    } else if let Err(err) = rule.to_rule().validate() {
                        issues.push(ValidationIssue::InvalidRule {
                            rule_id,
                            message: err.to_string(),
                        });
                    }
                }
            }
        }

        if issues.is_empty() {
            Ok(())
        } else {
            Err(ValidationError { issues })
        }
    }

    /// Convert into an ordered [`RuleSet`], keeping definition order.
    pub fn to_rule_set(&self) -> RuleSet {
        let mut set = RuleSet::new(self.meta.name.clone());
        if let Some(description) = &self.meta.description {
            set = set.with_description(description.clone());
        }
        if let Some(target) = &self.meta.target {
            set = set.with_target(target);
        }
        self.rules
            .iter()
            .fold(set, |set, def| set.rule(def.id.clone(), def.to_rule()))
    }
}

#[derive(Debug, Deserialize, Default, Clone)]
pub struct Metadata {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    /// Default file to patch, relative to the working directory.
    #[serde(default)]
    pub target: Option<String>,
}

#[derive(Debug, Deserialize, Clone)]
pub struct RuleDefinition {
    pub id: String,
    #[serde(flatten)]
    pub kind: RuleKind,
}

impl RuleDefinition {
    pub fn to_rule(&self) -> Rule {
        match &self.kind {
            RuleKind::Literal {
                old,
                new,
                occurrences,
            } => Rule::LiteralReplace {
                old: old.clone(),
                new: new.clone(),
                mode: *occurrences,
            },
            RuleKind::Regex {
                pattern,
                replacement,
                multi_line,
                case_insensitive,
                dot_matches_new_line,
            } => Rule::regex_with_flags(
                pattern.clone(),
                replacement.clone(),
                RegexFlags {
                    multi_line: *multi_line,
                    case_insensitive: *case_insensitive,
                    dot_matches_new_line: *dot_matches_new_line,
                },
            ),
            RuleKind::Block { old, new } => Rule::block(old.clone(), new.clone()),
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
#[serde(tag = "type", rename_all = "kebab-case")]
pub enum RuleKind {
    /// Exact substring replacement
    Literal {
        old: String,
        new: String,
        #[serde(default)]
        occurrences: ReplaceMode,
    },
    Regex {
        pattern: String,
        replacement: String,
        #[serde(default)]
        multi_line: bool,
        #[serde(default)]
        case_insensitive: bool,
        #[serde(default)]
        dot_matches_new_line: bool,
    },
    /// Exact multi-line block, first occurrence
    Block { old: String, new: String },
}

#[derive(Debug, Clone)]
pub struct ValidationError {
    pub issues: Vec<ValidationIssue>,
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (idx, issue) in self.issues.iter().enumerate() {
            if idx > 0 {
                writeln!(f)?;
            }
            write!(f, "{issue}")?;
        }
        Ok(())
    }
}

impl std::error::Error for ValidationError {}

#[derive(Debug, Clone)]
pub enum ValidationIssue {
    EmptyRuleList,
    MissingField {
        rule_id: Option<String>,
        field: &'static str,
    },
    DuplicateId(String),
    InvalidRule {
        rule_id: Option<String>,
        message: String,
    },
}

impl fmt::Display for ValidationIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ValidationIssue::EmptyRuleList => write!(f, "rule file contains no rules"),
            ValidationIssue::MissingField { rule_id, field } => match rule_id {
                Some(id) => write!(f, "rule '{id}' missing required field '{field}'"),
                None => write!(f, "rule missing required field '{field}'"),
            },
            ValidationIssue::DuplicateId(id) => write!(f, "rule id '{id}' is used more than once"),
            ValidationIssue::InvalidRule { rule_id, message } => match rule_id {
                Some(id) => write!(f, "rule '{id}' is invalid: {message}"),
                None => write!(f, "invalid rule: {message}"),
            },
        }
    }
}
