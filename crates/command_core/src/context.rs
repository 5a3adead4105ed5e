use std::sync::Arc;

use parking_lot::RwLock;
use serde_json::Value;
use shared::domain::Action;

/// Global application store: a state snapshot accessor plus a dispatch entry point.
pub trait StateStore: Send + Sync {
    fn state(&self) -> Value;

    fn dispatch(&self, action: Action);
}

pub type Reducer = Box<dyn Fn(&mut Value, &Action) + Send + Sync>;

/// In-process store that records dispatched actions and optionally reduces them into its state.
pub struct MemoryStateStore {
    state: RwLock<Value>,
    actions: RwLock<Vec<Action>>,
    reducer: Option<Reducer>,
}

impl MemoryStateStore {
    pub fn new(initial: Value) -> Self {
        Self {
            state: RwLock::new(initial),
            actions: RwLock::new(Vec::new()),
            reducer: None,
        }
    }

    pub fn with_reducer(
        initial: Value,
        reducer: impl Fn(&mut Value, &Action) + Send + Sync + 'static,
    ) -> Self {
        Self {
            reducer: Some(Box::new(reducer)),
            ..Self::new(initial)
        }
    }

    pub fn actions(&self) -> Vec<Action> {
        self.actions.read().clone()
    }
}

impl StateStore for MemoryStateStore {
    fn state(&self) -> Value {
        self.state.read().clone()
    }

    fn dispatch(&self, action: Action) {
        if let Some(reducer) = &self.reducer {
            reducer(&mut *self.state.write(), &action);
        }
        self.actions.write().push(action);
    }
}

/// Per-execution context. Built fresh for every `execute` call and owned by it.
#[derive(Clone)]
pub struct CommandContext {
    state: Value,
    store: Arc<dyn StateStore>,
}

impl CommandContext {
    pub(crate) fn new(store: Arc<dyn StateStore>) -> Self {
        Self {
            state: store.state(),
            store,
        }
    }

    /// State snapshot taken when the execution started.
    pub fn state(&self) -> &Value {
        &self.state
    }

    pub fn current_state(&self) -> Value {
        self.store.state()
    }

    pub fn dispatch(&self, action: Action) {
        self.store.dispatch(action);
    }
}
