pub mod loader;
pub mod schema;

pub use loader::{load_from_path, load_from_str, load_rule_set, ConfigError};
pub use schema::{
    Metadata, RuleConfig, RuleDefinition, RuleKind, ValidationError, ValidationIssue,
};
