use std::{collections::HashMap, sync::Arc};

use parking_lot::RwLock;
use tracing::debug;

use crate::{EvaluationMode, WhenClause, WhenClauseContext, WhenClauseError};

type CachedParse = Result<Arc<WhenClause>, WhenClauseError>;

/// Memoizes parsed when-clauses by their exact source text. Parse failures are cached too, so a
/// broken condition is only parsed once.
#[derive(Default)]
pub struct WhenClauseCache {
    entries: RwLock<HashMap<String, CachedParse>>,
}

impl WhenClauseCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, source: &str) -> CachedParse {
        if let Some(entry) = self.entries.read().get(source) {
            return entry.clone();
        }

        let parsed = WhenClause::parse(source).map(Arc::new);
        if let Err(err) = &parsed {
            debug!(source, error = %err, "when-clause: parse failed");
        }

        self.entries
            .write()
            .entry(source.to_string())
            .or_insert(parsed)
            .clone()
    }

    pub fn evaluate(
        &self,
        source: &str,
        context: &WhenClauseContext,
        mode: EvaluationMode,
    ) -> Result<bool, WhenClauseError> {
        self.get(source)?.evaluate_with(context, mode)
    }

    pub fn len(&self) -> usize {
        self.entries.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.read().is_empty()
    }

    pub fn clear(&self) {
        self.entries.write().clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn same_source_returns_the_same_expression() {
        let cache = WhenClauseCache::new();
        let first = cache.get("noteIsSelected && !inConflictFolder").expect("parse");
        let second = cache.get("noteIsSelected && !inConflictFolder").expect("parse");
        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn sources_are_keyed_by_exact_text() {
        let cache = WhenClauseCache::new();
        let spaced = cache.get("a && b").expect("parse");
        let tight = cache.get("a&&b").expect("parse");
        assert!(!Arc::ptr_eq(&spaced, &tight));
        assert_eq!(cache.len(), 2);
    }

    #[test]
    fn parse_failures_are_cached() {
        let cache = WhenClauseCache::new();
        let first = cache.get("a &&").expect_err("malformed");
        let second = cache.get("a &&").expect_err("malformed");
        assert_eq!(first, second);
        assert_eq!(cache.len(), 1);

        cache.clear();
        assert!(cache.is_empty());
    }
}
