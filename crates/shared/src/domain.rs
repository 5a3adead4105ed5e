use serde::{Deserialize, Serialize};
use serde_json::Value;

/// One match produced by a command search.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchResult {
    pub command_name: String,
    pub title: String,
}

/// State-store action, shaped like a reducer action: a type tag plus an arbitrary payload.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Action {
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default, skip_serializing_if = "Value::is_null")]
    pub payload: Value,
}

impl Action {
    pub fn new(kind: impl Into<String>) -> Self {
        Self {
            kind: kind.into(),
            payload: Value::Null,
        }
    }

    pub fn with_payload(kind: impl Into<String>, payload: Value) -> Self {
        Self {
            kind: kind.into(),
            payload,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SortOrderState {
    pub field: String,
    pub reverse: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IconVariant {
    #[default]
    Default,
    Tinymce,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn action_uses_type_tag_and_skips_null_payload() {
        let raw = serde_json::to_value(Action::new("NOTE_SELECT")).expect("serialize");
        assert_eq!(raw, json!({ "type": "NOTE_SELECT" }));

        let action: Action =
            serde_json::from_value(json!({ "type": "FOLDER_SET", "payload": { "id": "a" } }))
                .expect("deserialize");
        assert_eq!(action.kind, "FOLDER_SET");
        assert_eq!(action.payload, json!({ "id": "a" }));
    }

    #[test]
    fn search_result_is_camel_case_on_the_wire() {
        let raw = serde_json::to_value(SearchResult {
            command_name: "newNote".into(),
            title: "New note (newNote)".into(),
        })
        .expect("serialize");
        assert_eq!(
            raw,
            json!({ "commandName": "newNote", "title": "New note (newNote)" })
        );
    }
}
