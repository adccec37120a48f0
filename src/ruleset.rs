use crate::rule::{RegexFlags, Rule, RuleError};
use std::collections::HashSet;
use std::path::{Path, PathBuf};

/// A rule with the identifier it is reported under.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NamedRule {
    pub id: String,
    pub rule: Rule,
}

/// An ordered list of rules, applied first to last.
///
/// Rule sets are built declaratively and never mutated once a run starts:
///
/// ```
/// use rulepatch::RuleSet;
///
/// let rules = RuleSet::new("rename")
///     .literal("field", "analysis.suggestedSubSentiments", "analysis.matches")
///     .regex("loop", r"for \(const suggestion of", "for (const match of");
/// assert_eq!(rules.len(), 2);
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RuleSet {
    name: String,
    description: Option<String>,
    target: Option<PathBuf>,
    rules: Vec<NamedRule>,
}

impl RuleSet {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Default file this set is meant for, used when the caller names none.
    pub fn with_target(mut self, target: impl Into<PathBuf>) -> Self {
        self.target = Some(target.into());
        self
    }

    pub fn rule(mut self, id: impl Into<String>, rule: Rule) -> Self {
        self.rules.push(NamedRule {
            id: id.into(),
            rule,
        });
        self
    }

    /// Literal replacement of every occurrence of `old`.
    pub fn literal(self, id: impl Into<String>, old: &str, new: &str) -> Self {
        self.rule(id, Rule::literal(old, new))
    }

    /// Literal replacement of the first occurrence of `old`.
    pub fn literal_first(self, id: impl Into<String>, old: &str, new: &str) -> Self {
        self.rule(id, Rule::literal_first(old, new))
    }

    pub fn regex(self, id: impl Into<String>, pattern: &str, replacement: &str) -> Self {
        self.rule(id, Rule::regex(pattern, replacement))
    }

    pub fn regex_with_flags(
        self,
        id: impl Into<String>,
        pattern: &str,
        replacement: &str,
        flags: RegexFlags,
    ) -> Self {
        self.rule(id, Rule::regex_with_flags(pattern, replacement, flags))
    }

    pub fn block(self, id: impl Into<String>, old_block: &str, new_block: &str) -> Self {
        self.rule(id, Rule::block(old_block, new_block))
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }

    pub fn target(&self) -> Option<&Path> {
        self.target.as_deref()
    }

    pub fn rules(&self) -> &[NamedRule] {
        &self.rules
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    /// Ids that appear more than once, in first-seen order.
    pub fn duplicate_ids(&self) -> Vec<&str> {
        let mut seen = HashSet::new();
        let mut duplicates = Vec::new();
        for named in &self.rules {
            if !seen.insert(named.id.as_str()) && !duplicates.contains(&named.id.as_str()) {
                duplicates.push(named.id.as_str());
            }
        }
        duplicates
    }

    /// Validate every rule up front, returning the first failing index.
    pub fn validate(&self) -> Result<(), (usize, RuleError)> {
        for (index, named) in self.rules.iter().enumerate() {
            named.rule.validate().map_err(|e| (index, e))?;
        }
        Ok(())
    }
}
