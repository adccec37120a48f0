use super::stage_fixture;
use rulepatch::builtin::{direct_id_validation, official_matches};
use rulepatch::{PatchRunner, RuleOutcome};
use std::fs;

#[test]
fn official_matches_against_legacy_script() {
    let (_dir, file) = stage_fixture("official_matches.input.ts");
    let rules = official_matches();

    let report = PatchRunner::new(&rules).run(&file).unwrap();
    let outcomes: Vec<_> = report.outcomes().collect();

    assert_eq!(outcomes[0], (0, RuleOutcome::Applied { replacements: 2 }));
    assert_eq!(outcomes[1], (1, RuleOutcome::Applied { replacements: 1 }));
    // The block already rewrote the loop header, so the fallback regex finds nothing.
    assert_eq!(outcomes[2], (2, RuleOutcome::NoMatch));
    assert_eq!(outcomes[3], (3, RuleOutcome::Applied { replacements: 1 }));
    assert!(report.written);

    let patched = fs::read_to_string(&file).unwrap();
    assert!(!patched.contains("analysis.suggestedSubSentiments"));
    assert!(patched.contains("  suggestedSubSentiments: Suggestion[];"));
    assert!(patched.contains(
        "const officialMatches = analysis.matches.filter(m => m.type === 'OFFICIAL');"
    ));
    assert!(patched.contains("for (const match of officialMatches) {"));
    assert!(patched
        .contains(r#"console.log(`\n🔍 Validando match oficial: "${match.name}" (ID: ${match.id})"#));
    assert!(patched.contains("if (!analysis.matches.length) {"));
}

#[test]
fn official_matches_second_run_is_inert() {
    let (_dir, file) = stage_fixture("official_matches.input.ts");
    let rules = official_matches();

    PatchRunner::new(&rules).run(&file).unwrap();
    let after_first = fs::read_to_string(&file).unwrap();

    let second = PatchRunner::new(&rules).run(&file).unwrap();
    assert_eq!(second.applied_count(), 0);
    assert!(!second.changed());
    assert_eq!(fs::read_to_string(&file).unwrap(), after_first);
}

#[test]
fn direct_id_validation_against_scoped_script() {
    let (_dir, file) = stage_fixture("direct_id_validation.input.ts");
    let rules = direct_id_validation();

    let report = PatchRunner::new(&rules).run(&file).unwrap();
    assert!(report.all_applied());

    let patched = fs::read_to_string(&file).unwrap();
    assert!(patched.contains("// Se a IA retornou um ID (match OFFICIAL), confiar nele"));
    assert!(patched.contains("continue;"));
    assert!(patched.contains("if (matchingWords.length > 0) {"));
    assert!(!patched.contains("dbSub.mainSentimentId === mainSentimentId"));
    assert!(!patched.contains("❌ Descartado"));
}

#[test]
fn builtin_sets_are_independent() {
    // Once official-matches renamed the field, the id-first block no longer matches.
    let (_dir, file) = stage_fixture("direct_id_validation.input.ts");

    PatchRunner::new(&official_matches()).run(&file).unwrap();
    let report = PatchRunner::new(&direct_id_validation()).run(&file).unwrap();

    assert_eq!(report.records[0].outcome, RuleOutcome::NoMatch);
    let hint = report.records[0].hint.as_ref().expect("near miss for drifted block");
    assert_eq!(hint.line, 5);
    assert!(hint.found.contains("analysis.matches"));
    assert_eq!(report.records[1].outcome, RuleOutcome::Applied { replacements: 1 });
}
