use std::{collections::BTreeMap, sync::Arc};

use anyhow::{Context, Result};
use parking_lot::Mutex;
use serde::Serialize;
use serde_json::Value;
use settings::SettingsStore;
use shared::domain::SortOrderState;
use tracing::{debug, warn};

use crate::{display::field_label, input::SortOrderInput};

pub const FIELD_KEY: &str = "notes.sortOrder.field";
pub const REVERSE_KEY: &str = "notes.sortOrder.reverse";
pub const PER_FIELD_REVERSAL_ENABLED_KEY: &str = "notes.perFieldReversalEnabled";
pub const PER_FIELD_REVERSE_KEY: &str = "notes.perFieldReverse";

/// Used when the settings store does not enumerate the field options.
pub const DEFAULT_FIELDS: [&str; 4] = ["user_updated_time", "user_created_time", "title", "order"];

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SortOrderOutcome {
    pub state: SortOrderState,
    pub field_written: bool,
    pub reverse_written: bool,
    pub per_field_written: bool,
}

#[derive(Default)]
struct CyclerCaches {
    fields: Option<Vec<String>>,
    per_field_reverse: Option<BTreeMap<String, bool>>,
}

/// Cycles the note list sort order through the settings store.
///
/// The field list and the per-field reverse map are read from settings once and kept until
/// [`SortOrderCycler::invalidate_caches`]. Every resolution runs under one lock, so toggles issued
/// back to back are applied one after the other against up-to-date values.
pub struct SortOrderCycler {
    settings: Arc<dyn SettingsStore>,
    caches: Mutex<CyclerCaches>,
}

impl SortOrderCycler {
    pub fn new(settings: Arc<dyn SettingsStore>) -> Self {
        Self {
            settings,
            caches: Mutex::new(CyclerCaches::default()),
        }
    }

    /// Sortable fields in descending order.
    pub fn field_array(&self) -> Vec<String> {
        let mut caches = self.caches.lock();
        self.fields(&mut caches).to_vec()
    }

    /// The field after `current`, wrapping around. Unrecognized fields are returned unchanged.
    pub fn next_field(&self, current: &str) -> String {
        let mut caches = self.caches.lock();
        next_in(self.fields(&mut caches), current)
    }

    pub fn current(&self) -> SortOrderState {
        SortOrderState {
            field: self.settings.string_value(FIELD_KEY).unwrap_or_default(),
            reverse: self.settings.bool_value(REVERSE_KEY).unwrap_or(false),
        }
    }

    /// Tooltip of the sort field button: `"<label>:\n <current> -> <next>"`.
    pub fn field_tip(&self, label: &str) -> String {
        let current = self.current().field;
        let next = self.next_field(&current);
        format!("{label}:\n {} -> {}", field_label(&current), field_label(&next))
    }

    pub fn invalidate_caches(&self) {
        *self.caches.lock() = CyclerCaches::default();
        debug!("sort order: caches invalidated");
    }

    pub fn execute(&self, input: SortOrderInput) -> Result<SortOrderOutcome> {
        let mut caches = self.caches.lock();
        self.resolve(&mut caches, input)
    }

    /// Flips the current reverse flag, keeping the field.
    pub fn toggle_reverse(&self) -> Result<SortOrderOutcome> {
        let mut caches = self.caches.lock();
        let reverse = !self.current().reverse;
        self.resolve(&mut caches, SortOrderInput::reverse(reverse))
    }

    fn resolve(&self, caches: &mut CyclerCaches, input: SortOrderInput) -> Result<SortOrderOutcome> {
        let (field, reverse) = match input {
            SortOrderInput::Unspecified => (None, None),
            SortOrderInput::Explicit { field, reverse } => (field, reverse),
        };
        let current = self.current();
        let per_field_enabled = self
            .settings
            .bool_value(PER_FIELD_REVERSAL_ENABLED_KEY)
            .unwrap_or(false);

        let next_field = match (field, reverse) {
            (Some(field), _) => field,
            (None, None) => next_in(self.fields(caches), &current.field),
            (None, Some(_)) => current.field.clone(),
        };
        let remembered = if per_field_enabled {
            self.per_field_reverse(caches).get(&next_field).copied()
        } else {
            None
        };
        let next_reverse = reverse.or(remembered).unwrap_or(current.reverse);

        let field_written = current.field != next_field;
        if field_written {
            self.write(FIELD_KEY, Value::String(next_field.clone()))?;
        }
        let reverse_written = current.reverse != next_reverse;
        if reverse_written {
            self.write(REVERSE_KEY, Value::Bool(next_reverse))?;
        }

        let mut per_field_written = false;
        if per_field_enabled && remembered != Some(next_reverse) {
            let per_field = self.per_field_reverse(caches);
            per_field.insert(next_field.clone(), next_reverse);
            let snapshot = per_field
                .iter()
                .map(|(field, reverse)| (field.clone(), Value::Bool(*reverse)))
                .collect();
            self.write(PER_FIELD_REVERSE_KEY, Value::Object(snapshot))?;
            per_field_written = true;
        }

        debug!(
            field = %next_field,
            reverse = next_reverse,
            field_written,
            reverse_written,
            per_field_written,
            "sort order: resolved"
        );
        Ok(SortOrderOutcome {
            state: SortOrderState {
                field: next_field,
                reverse: next_reverse,
            },
            field_written,
            reverse_written,
            per_field_written,
        })
    }

    fn write(&self, key: &str, value: Value) -> Result<()> {
        self.settings
            .set_value(key, value)
            .with_context(|| format!("failed to write setting '{key}'"))
    }

    fn fields<'a>(&self, caches: &'a mut CyclerCaches) -> &'a [String] {
        caches.fields.get_or_insert_with(|| {
            let mut fields = self.settings.enum_option_values(FIELD_KEY);
            if fields.is_empty() {
                fields = DEFAULT_FIELDS.iter().map(|field| field.to_string()).collect();
            }
            fields.sort_unstable_by(|a, b| b.cmp(a));
            fields.dedup();
            fields
        })
    }

    fn per_field_reverse<'a>(&self, caches: &'a mut CyclerCaches) -> &'a mut BTreeMap<String, bool> {
        caches
            .per_field_reverse
            .get_or_insert_with(|| match self.settings.value(PER_FIELD_REVERSE_KEY) {
                None | Some(Value::Null) => BTreeMap::new(),
                Some(Value::Object(entries)) => entries
                    .into_iter()
                    .map(|(field, reverse)| (field, is_truthy(&reverse)))
                    .collect(),
                Some(other) => {
                    warn!(value = %other, "sort order: ignoring malformed per-field reverse map");
                    BTreeMap::new()
                }
            })
    }
}

fn next_in(fields: &[String], current: &str) -> String {
    match fields.iter().position(|field| field == current) {
        Some(index) => fields[(index + 1) % fields.len()].clone(),
        None => current.to_string(),
    }
}

fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(flag) => *flag,
        Value::Number(number) => number.as_f64().is_some_and(|n| n != 0.0),
        Value::String(text) => !text.is_empty(),
        Value::Array(_) | Value::Object(_) => true,
    }
}

#[cfg(test)]
#[path = "tests/cycler_tests.rs"]
mod tests;
