use rulepatch::{PatchError, PatchRunner, Rule, RuleOutcome, RuleSet};
use std::fs;
use tempfile::TempDir;

fn write_source(dir: &TempDir, contents: &str) -> std::path::PathBuf {
    let path = dir.path().join("analyze.ts");
    fs::write(&path, contents).unwrap();
    path
}

#[test]
fn loop_header_rewrite() {
    let dir = TempDir::new().unwrap();
    let file = write_source(&dir, "for (const suggestion of analysis.matches) { x }");

    let rules = RuleSet::new("loop").rule(
        "loop",
        Rule::literal(
            "for (const suggestion of analysis.matches)",
            "for (const match of officialMatches)",
        ),
    );
    let report = PatchRunner::new(&rules).run(&file).unwrap();

    assert_eq!(
        report.outcomes().collect::<Vec<_>>(),
        [(0, RuleOutcome::Applied { replacements: 1 })]
    );
    assert_eq!(
        fs::read_to_string(&file).unwrap(),
        "for (const match of officialMatches) { x }"
    );
}

#[test]
fn absent_field_is_skipped_and_file_rewritten_unchanged() {
    let dir = TempDir::new().unwrap();
    let source = "const list = analysis.matches;\n";
    let file = write_source(&dir, source);

    let rules = RuleSet::new("rename").literal(
        "rename",
        "analysis.suggestedSubSentiments",
        "analysis.matches",
    );
    let report = PatchRunner::new(&rules).run(&file).unwrap();

    assert_eq!(report.records[0].outcome, RuleOutcome::NoMatch);
    assert!(report.written);
    assert!(!report.changed());
    assert_eq!(report.original_digest(), report.buffer_digest());
    assert_eq!(fs::read_to_string(&file).unwrap(), source);
}

#[test]
fn missing_file_is_io_error() {
    let dir = TempDir::new().unwrap();
    let missing = dir.path().join("nope.ts");

    let rules = RuleSet::new("any").literal("a", "x", "y");
    let err = PatchRunner::new(&rules).run(&missing).unwrap_err();

    assert!(matches!(err, PatchError::Io { ref path, .. } if path == &missing));
    assert!(!missing.exists());
}

#[test]
fn non_utf8_file_is_io_error() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("binary.ts");
    fs::write(&path, [0xff, 0xfe, 0x00, 0x61]).unwrap();

    let rules = RuleSet::new("any").literal("a", "x", "y");
    let err = PatchRunner::new(&rules).run(&path).unwrap_err();

    assert!(matches!(err, PatchError::Io { .. }));
    assert_eq!(fs::read(&path).unwrap(), [0xff, 0xfe, 0x00, 0x61]);
}

#[test]
fn malformed_rule_leaves_file_untouched() {
    let dir = TempDir::new().unwrap();
    let source = "alpha beta\n";
    let file = write_source(&dir, source);

    let rules = RuleSet::new("broken")
        .literal("first", "alpha", "ALPHA")
        .regex("bad", "beta(", "x");
    let err = PatchRunner::new(&rules).run(&file).unwrap_err();

    assert!(matches!(err, PatchError::Rule { index: 1, .. }));
    assert_eq!(fs::read_to_string(&file).unwrap(), source);
}

#[test]
fn same_literal_twice_in_one_set() {
    let dir = TempDir::new().unwrap();
    let file = write_source(&dir, "x = analysis.suggestedSubSentiments;");

    let rules = RuleSet::new("twice")
        .literal("once", "analysis.suggestedSubSentiments", "analysis.matches")
        .literal("again", "analysis.suggestedSubSentiments", "analysis.matches");
    let report = PatchRunner::new(&rules).run(&file).unwrap();

    assert!(report.records[0].outcome.is_applied());
    assert_eq!(report.records[1].outcome, RuleOutcome::NoMatch);
    assert_eq!(fs::read_to_string(&file).unwrap(), "x = analysis.matches;");
}

#[test]
fn empty_rule_set_rewrites_identical_contents() {
    let dir = TempDir::new().unwrap();
    let file = write_source(&dir, "untouched\n");

    let report = PatchRunner::new(&RuleSet::new("empty")).run(&file).unwrap();

    assert!(report.records.is_empty());
    assert!(report.written);
    assert_eq!(fs::read_to_string(&file).unwrap(), "untouched\n");
}

#[test]
fn summary_serializes_outcomes() {
    let dir = TempDir::new().unwrap();
    let file = write_source(&dir, "a\n");

    let rules = RuleSet::new("json")
        .literal("hit", "a", "b")
        .literal("miss", "zzz", "y");
    let report = PatchRunner::new(&rules).plan(&file).unwrap();
    let json = serde_json::to_value(report.summary()).unwrap();

    assert_eq!(json["applied"], 1);
    assert_eq!(json["skipped"], 1);
    assert_eq!(json["written"], false);
    assert_eq!(json["rules"][0]["outcome"]["status"], "applied");
    assert_eq!(json["rules"][0]["outcome"]["replacements"], 1);
    assert_eq!(json["rules"][1]["outcome"]["status"], "no-match");
    assert!(json["rules"][1].get("hint").is_none());
}
