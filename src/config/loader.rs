use crate::config::schema::{RuleConfig, ValidationError};
use crate::ruleset::RuleSet;
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};

#[derive(Debug)]
pub enum ConfigError {
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    Toml {
        path: Option<PathBuf>,
        source: toml_edit::de::Error,
    },
    Validation {
        path: Option<PathBuf>,
        source: ValidationError,
    },
}

impl ConfigError {
    fn with_path(self, path: &Path) -> Self {
        let path = path.to_path_buf();
        match self {
            ConfigError::Toml { path: None, source } => ConfigError::Toml {
                path: Some(path),
                source,
            },
            ConfigError::Validation { path: None, source } => ConfigError::Validation {
                path: Some(path),
                source,
            },
            other => other,
        }
    }
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::Io { path, source } => {
                write!(f, "failed to read rule file {}: {}", path.display(), source)
            }
            ConfigError::Toml { path, source } => match path {
                Some(path) => write!(
                    f,
                    "failed to parse rule file TOML ({}): {}",
                    path.display(),
                    source
                ),
                None => write!(f, "failed to parse rule file TOML: {}", source),
            },
            ConfigError::Validation { path, source } => match path {
                Some(path) => write!(f, "invalid rule file ({}): {}", path.display(), source),
                None => write!(f, "invalid rule file: {}", source),
            },
        }
    }
}

impl std::error::Error for ConfigError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ConfigError::Io { source, .. } => Some(source),
            ConfigError::Toml { source, .. } => Some(source),
            ConfigError::Validation { source, .. } => Some(source),
        }
    }
}

pub fn load_from_str(input: &str) -> Result<RuleConfig, ConfigError> {
    let config: RuleConfig = toml_edit::de::from_str(input)
        .map_err(|source| ConfigError::Toml { path: None, source })?;
    config
        .validate()
        .map_err(|source| ConfigError::Validation { path: None, source })?;
    Ok(config)
}

pub fn load_from_path(path: impl AsRef<Path>) -> Result<RuleConfig, ConfigError> {
    let path = path.as_ref();
    let contents = fs::read_to_string(path).map_err(|source| ConfigError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    load_from_str(&contents).map_err(|error| error.with_path(path))
}

/// Load and validate a rule file straight into a [`RuleSet`].
pub fn load_rule_set(path: impl AsRef<Path>) -> Result<RuleSet, ConfigError> {
    load_from_path(path).map(|config| config.to_rule_set())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::schema::ValidationIssue;
    use crate::rule::{ReplaceMode, Rule};

    #[test]
    fn test_load_all_rule_kinds() {
        let config = load_from_str(
            r#"
[meta]
name = "kinds"
target = "src/app.ts"

[[rules]]
id = "field"
type = "literal"
old = "a.b"
new = "a.c"
occurrences = "first"

[[rules]]
id = "loop"
type = "regex"
pattern = '^for \(const (\w+)'
replacement = "for (const $1"
multi_line = true

[[rules]]
id = "block"
type = "block"
old = """
x
y
"""
new = "z\n"
"#,
        )
        .unwrap();

        let set = config.to_rule_set();
        assert_eq!(set.name(), "kinds");
        assert_eq!(set.target(), Some(Path::new("src/app.ts")));
        assert_eq!(
            set.rules()[0].rule,
            Rule::LiteralReplace {
                old: "a.b".into(),
                new: "a.c".into(),
                mode: ReplaceMode::First
            }
        );
        match &set.rules()[1].rule {
            Rule::RegexReplace { flags, .. } => assert!(flags.multi_line),
            other => panic!("expected regex rule, got {other:?}"),
        }
        assert_eq!(set.rules()[2].rule, Rule::block("x\ny\n", "z\n"));
    }

    #[test]
    fn test_literal_defaults_to_all_occurrences() {
        let config = load_from_str(
            r#"
[[rules]]
id = "field"
type = "literal"
old = "a"
new = "b"
"#,
        )
        .unwrap();
        assert_eq!(config.to_rule_set().rules()[0].rule, Rule::literal("a", "b"));
    }

    #[test]
    fn test_validation_collects_all_issues() {
        let err = load_from_str(
            r#"
[[rules]]
id = "dup"
type = "literal"
old = ""
new = "x"

[[rules]]
id = "dup"
type = "regex"
pattern = "(unclosed"
replacement = "x"
"#,
        )
        .unwrap_err();

        let ConfigError::Validation { source, .. } = err else {
            panic!("expected validation error, got {err}");
        };
        assert_eq!(source.issues.len(), 3);
        assert!(source
            .issues
            .iter()
            .any(|i| matches!(i, ValidationIssue::DuplicateId(id) if id == "dup")));
        assert!(source
            .issues
            .iter()
            .any(|i| matches!(i, ValidationIssue::InvalidRule { .. })));
    }

    #[test]
    fn test_empty_rule_list_rejected() {
        let err = load_from_str("[meta]\nname = \"empty\"\n").unwrap_err();
        assert!(matches!(err, ConfigError::Validation { .. }));
    }

    #[test]
    fn test_unknown_rule_type_rejected() {
        let err = load_from_str(
            r#"
[[rules]]
id = "x"
type = "ast"
pattern = "fn $A()"
"#,
        )
        .unwrap_err();
        assert!(matches!(err, ConfigError::Toml { .. }));
    }

    #[test]
    fn test_path_attached_to_errors() {
        let temp_dir = tempfile::tempdir().unwrap();
        let path = temp_dir.path().join("rules.toml");
        fs::write(&path, "[[rules]]\nid = \"x\"\n").unwrap();

        let err = load_from_path(&path).unwrap_err();
        assert!(err.to_string().contains("rules.toml"));

        let missing = load_from_path(temp_dir.path().join("missing.toml")).unwrap_err();
        assert!(matches!(missing, ConfigError::Io { .. }));
    }
}
