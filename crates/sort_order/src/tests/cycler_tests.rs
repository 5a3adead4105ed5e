use super::*;
use serde_json::json;
use settings::MemorySettings;

fn settings(field: &str, reverse: bool) -> Arc<MemorySettings> {
    let settings = Arc::new(MemorySettings::new());
    settings.define_enum(FIELD_KEY, DEFAULT_FIELDS);
    settings.seed(FIELD_KEY, field);
    settings.seed(REVERSE_KEY, reverse);
    settings
}

fn cycler(settings: &Arc<MemorySettings>) -> SortOrderCycler {
    SortOrderCycler::new(settings.clone())
}

#[test]
fn field_array_is_descending_and_stable() {
    let settings = settings("title", false);
    let cycler = cycler(&settings);

    let expected = vec!["user_updated_time", "user_created_time", "title", "order"];
    assert_eq!(cycler.field_array(), expected);
    settings.define_enum(FIELD_KEY, ["zzz"]);
    assert_eq!(cycler.field_array(), expected);

    cycler.invalidate_caches();
    assert_eq!(cycler.field_array(), vec!["zzz"]);
}

#[test]
fn next_field_wraps_and_ignores_unknown_fields() {
    let settings = Arc::new(MemorySettings::new());
    settings.define_enum(FIELD_KEY, ["A", "B", "C"]);
    let cycler = cycler(&settings);

    assert_eq!(cycler.field_array(), vec!["C", "B", "A"]);
    assert_eq!(cycler.next_field("C"), "B");
    assert_eq!(cycler.next_field("A"), "C");
    assert_eq!(cycler.next_field("D"), "D");
}

#[test]
fn missing_enum_options_fall_back_to_default_fields() {
    let settings = Arc::new(MemorySettings::new());
    let cycler = cycler(&settings);
    assert_eq!(cycler.next_field("order"), "user_updated_time");
}

#[test]
fn auto_cycle_writes_only_the_field() {
    let settings = settings("title", false);
    let cycler = cycler(&settings);

    let outcome = cycler
        .execute(SortOrderInput::Unspecified)
        .expect("execute");

    assert_eq!(
        outcome.state,
        SortOrderState {
            field: "order".into(),
            reverse: false,
        }
    );
    assert!(outcome.field_written);
    assert!(!outcome.reverse_written);
    assert!(!outcome.per_field_written);
    assert_eq!(settings.writes_for(FIELD_KEY), vec![json!("order")]);
    assert!(settings.writes_for(REVERSE_KEY).is_empty());
    assert_eq!(settings.writes().len(), 1);
}

#[test]
fn reverse_only_keeps_the_current_field() {
    let settings = settings("title", false);
    let cycler = cycler(&settings);

    let outcome = cycler
        .execute(SortOrderInput::reverse(true))
        .expect("execute");

    assert_eq!(outcome.state.field, "title");
    assert!(outcome.state.reverse);
    assert!(!outcome.field_written);
    assert_eq!(settings.writes_for(REVERSE_KEY), vec![json!(true)]);
    assert!(settings.writes_for(FIELD_KEY).is_empty());
}

#[test]
fn resolving_to_stored_values_writes_nothing() {
    let settings = settings("title", true);
    let cycler = cycler(&settings);

    let outcome = cycler
        .execute(SortOrderInput::new(Some("title".into()), Some(true)))
        .expect("execute");

    assert!(!outcome.field_written);
    assert!(!outcome.reverse_written);
    assert!(settings.writes().is_empty());
}

#[test]
fn explicit_field_without_reverse_keeps_global_reverse() {
    let settings = settings("title", true);
    let cycler = cycler(&settings);

    let outcome = cycler
        .execute(SortOrderInput::field("user_created_time"))
        .expect("execute");

    assert_eq!(outcome.state.field, "user_created_time");
    assert!(outcome.state.reverse);
    assert!(settings.writes_for(REVERSE_KEY).is_empty());
}

#[test]
fn per_field_reverse_is_remembered_per_field() {
    let settings = settings("order", false);
    settings.seed(PER_FIELD_REVERSAL_ENABLED_KEY, true);
    settings.seed(PER_FIELD_REVERSE_KEY, json!({ "title": true }));
    let cycler = cycler(&settings);

    let outcome = cycler
        .execute(SortOrderInput::field("title"))
        .expect("execute");

    assert_eq!(
        outcome.state,
        SortOrderState {
            field: "title".into(),
            reverse: true,
        }
    );
    assert!(outcome.reverse_written);
    assert!(!outcome.per_field_written);
    assert!(settings.writes_for(PER_FIELD_REVERSE_KEY).is_empty());
}

#[test]
fn per_field_map_is_updated_when_the_flag_changes() {
    let settings = settings("title", false);
    settings.seed(PER_FIELD_REVERSAL_ENABLED_KEY, true);
    settings.seed(PER_FIELD_REVERSE_KEY, json!({ "title": false }));
    let cycler = cycler(&settings);

    cycler
        .execute(SortOrderInput::reverse(true))
        .expect("reverse title");
    cycler
        .execute(SortOrderInput::Unspecified)
        .expect("cycle to order");
    let back = cycler
        .execute(SortOrderInput::field("title"))
        .expect("back to title");

    assert!(back.state.reverse);
    assert_eq!(
        settings.writes_for(PER_FIELD_REVERSE_KEY),
        vec![
            json!({ "title": true }),
            json!({ "order": true, "title": true }),
        ]
    );
    assert!(!back.per_field_written);
}

#[test]
fn per_field_map_is_ignored_when_disabled() {
    let settings = settings("order", false);
    settings.seed(PER_FIELD_REVERSE_KEY, json!({ "title": true }));
    let cycler = cycler(&settings);

    let outcome = cycler
        .execute(SortOrderInput::field("title"))
        .expect("execute");

    assert!(!outcome.state.reverse);
    assert!(settings.writes_for(PER_FIELD_REVERSE_KEY).is_empty());
}

#[test]
fn toggle_reverse_flips_the_stored_flag() {
    let settings = settings("title", false);
    let cycler = cycler(&settings);

    assert!(cycler.toggle_reverse().expect("first").state.reverse);
    assert!(!cycler.toggle_reverse().expect("second").state.reverse);
    assert_eq!(
        settings.writes_for(REVERSE_KEY),
        vec![json!(true), json!(false)]
    );
}

#[test]
fn unset_field_is_left_alone_by_auto_cycle() {
    let settings = Arc::new(MemorySettings::new());
    let cycler = cycler(&settings);

    let outcome = cycler
        .execute(SortOrderInput::Unspecified)
        .expect("execute");

    assert_eq!(outcome.state.field, "");
    assert!(settings.writes().is_empty());
}

#[test]
fn field_tip_names_current_and_next_field() {
    let settings = settings("title", false);
    let cycler = cycler(&settings);
    assert_eq!(
        cycler.field_tip("Switch sort order"),
        "Switch sort order:\n Title -> Custom order"
    );
}

#[test]
fn per_field_map_is_kept_in_memory_until_invalidated() {
    let settings = settings("order", false);
    settings.seed(PER_FIELD_REVERSAL_ENABLED_KEY, true);
    settings.seed(PER_FIELD_REVERSE_KEY, json!({ "title": true }));
    let cycler = cycler(&settings);

    let first = cycler
        .execute(SortOrderInput::field("title"))
        .expect("load map");
    assert!(first.state.reverse);

    cycler
        .execute(SortOrderInput::field("order"))
        .expect("leave title");
    settings.seed(PER_FIELD_REVERSE_KEY, json!({ "title": false }));
    let cached = cycler
        .execute(SortOrderInput::field("title"))
        .expect("cached map");
    assert!(cached.state.reverse);

    cycler.invalidate_caches();
    settings.seed(PER_FIELD_REVERSE_KEY, json!({ "title": false }));
    let reloaded = cycler
        .execute(SortOrderInput::field("title"))
        .expect("reloaded map");
    assert!(!reloaded.state.reverse);
}
