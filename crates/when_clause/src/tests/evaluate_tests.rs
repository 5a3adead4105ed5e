use super::*;
use serde_json::json;

fn context() -> WhenClauseContext {
    WhenClauseContext::new()
        .with("noteIsSelected", true)
        .with("inConflictFolder", false)
        .with("markdownEditorVisible", true)
        .with("notesSortOrder.field", "title")
        .with("selectedNoteCount", 3)
        .with("emptyText", "")
        .with("selectedNoteIds", json!(["a", "b"]))
}

fn eval(source: &str) -> bool {
    WhenClause::parse(source)
        .expect("parse")
        .evaluate(&context())
}

#[test]
fn literals_and_bare_keys() {
    assert!(eval("true"));
    assert!(!eval("false"));
    assert!(eval("noteIsSelected"));
    assert!(!eval("inConflictFolder"));
    assert!(!eval("missingKey"));
    assert!(!eval("emptyText"));
    assert!(eval("selectedNoteIds"));
    assert!(eval("selectedNoteCount"));
}

#[test]
fn and_binds_tighter_than_or() {
    assert!(eval("inConflictFolder && noteIsSelected || markdownEditorVisible"));
    assert!(!eval("inConflictFolder && (noteIsSelected || markdownEditorVisible)"));
    assert!(eval("noteIsSelected && !inConflictFolder"));
    assert!(eval("!!noteIsSelected"));
}

#[test]
fn equality_compares_by_type_then_string_form() {
    assert!(eval("notesSortOrder.field == title"));
    assert!(eval("notesSortOrder.field == 'title'"));
    assert!(eval("notesSortOrder.field != order"));
    assert!(eval("selectedNoteCount == 3"));
    assert!(eval("selectedNoteCount == 3.0"));
    assert!(eval("noteIsSelected == true"));
    assert!(!eval("noteIsSelected == false"));
    assert!(!eval("missingKey == anything"));
    assert!(eval("missingKey != anything"));
}

#[test]
fn regex_and_numeric_comparisons() {
    assert!(eval("notesSortOrder.field =~ /^ti/"));
    assert!(eval("notesSortOrder.field =~ /TITLE/i"));
    assert!(!eval("notesSortOrder.field =~ /^order$/"));
    assert!(!eval("missingKey =~ /.*/"));
    assert!(eval("selectedNoteCount > 1 && selectedNoteCount <= 3"));
    assert!(!eval("selectedNoteCount < 3"));
    assert!(!eval("notesSortOrder.field >= 0"));
}

#[test]
fn malformed_sources_are_rejected() {
    for source in [
        "",
        "   ",
        "a &&",
        "(a || b",
        "a b",
        "== a",
        "a == ",
        "a < b",
        "a =~ nope",
        "a =~ /x/g",
        "a =~ /(/",
        "'quoted'",
        "a || )",
    ] {
        let err = WhenClause::parse(source).expect_err(source);
        assert!(
            matches!(err, WhenClauseError::Malformed { .. }),
            "{source:?} should be malformed, got {err:?}"
        );
        assert_eq!(err.source_text(), source);
    }

    let negations = format!("{}a", "!".repeat(200_000));
    let parens = format!("{}a{}", "(".repeat(200_000), ")".repeat(200_000));
    for source in [&negations, &parens] {
        match WhenClause::parse(source).expect_err("deep nesting") {
            WhenClauseError::Malformed { message, .. } => {
                assert_eq!(message, "expression nested too deeply")
            }
            other => panic!("expected a malformed error, got {other:?}"),
        }
    }
}

#[test]
fn moderate_nesting_still_parses() {
    let source = format!("{}noteIsSelected{}", "(!".repeat(32), ")".repeat(32));
    assert!(WhenClause::parse(&source).expect("nested").evaluate(&context()));
}

#[test]
fn keys_are_listed_once_in_order() {
    let clause =
        WhenClause::parse("b && (a || !b) && c == x && d =~ /y/ && e > 1").expect("parse");
    assert_eq!(clause.keys(), ["b", "a", "c", "d", "e"]);
    assert_eq!(
        WhenClause::parse("true").expect("parse").keys(),
        &[] as &[String]
    );
}

#[test]
fn developer_mode_is_chosen_per_evaluation() {
    let clause = WhenClause::parse("noteIsSelected && unknownFact").expect("parse");
    let context = context();

    assert_eq!(
        clause.evaluate_with(&context, EvaluationMode::Standard),
        Ok(false)
    );
    let err = clause
        .evaluate_with(&context, EvaluationMode::Developer)
        .expect_err("unknown key");
    assert_eq!(
        err,
        WhenClauseError::UnknownContextKey {
            key: "unknownFact".into(),
            source_text: "noteIsSelected && unknownFact".into(),
        }
    );

    let known = WhenClause::parse("noteIsSelected && !inConflictFolder").expect("parse");
    assert_eq!(
        known.evaluate_with(&context, EvaluationMode::Developer),
        Ok(true)
    );
}

#[test]
fn context_builds_from_json_object() {
    let json = json!({ "noteIsSelected": true, "count": 0 });
    let serde_json::Value::Object(map) = json else {
        panic!("object");
    };
    let context = WhenClauseContext::from(map);
    assert_eq!(context.len(), 2);
    assert!(WhenClause::parse("noteIsSelected && !count")
        .expect("parse")
        .evaluate(&context));

    let collected: WhenClauseContext = [("a", true), ("b", false)].into_iter().collect();
    assert!(WhenClause::parse("a && !b").expect("parse").evaluate(&collected));
}
