use std::{
    collections::{HashMap, HashSet},
    sync::Arc,
    time::Duration,
};

use parking_lot::{Mutex, RwLock};
use serde_json::Value;
use shared::domain::{IconVariant, SearchResult};
use tokio::sync::broadcast;
use tracing::{debug, warn};
use when_clause::{EvaluationMode, WhenClauseCache, WhenClauseContext, WhenClauseError};

use crate::{
    context::{CommandContext, StateStore},
    declaration::CommandDeclaration,
    error::CommandError,
    events::CommandEvent,
    runtime::{CommandArgs, CommandRuntime},
};

pub const DEFAULT_SCHEDULE_DELAY: Duration = Duration::from_millis(10);
pub const DEFAULT_TINYMCE_ICON: &str = "preferences";

// Executions of these are not logged.
const QUIET_COMMANDS: &[&str] = &["showModalMessage"];

pub type WhenClauseContextProducer = Arc<dyn Fn(&Value) -> WhenClauseContext + Send + Sync>;

#[derive(Debug, Clone)]
pub struct CommandServiceOptions {
    /// Evaluate enabled conditions strictly: referencing a key the context does not provide is
    /// reported as a failure instead of reading as false.
    pub dev_mode: bool,
    pub schedule_delay: Duration,
}

impl Default for CommandServiceOptions {
    fn default() -> Self {
        Self {
            dev_mode: false,
            schedule_delay: DEFAULT_SCHEDULE_DELAY,
        }
    }
}

#[derive(Debug, Clone)]
pub struct Command {
    pub declaration: CommandDeclaration,
    pub runtime: Option<CommandRuntime>,
}

#[derive(Debug, Clone, Copy)]
pub struct CommandLookup {
    pub must_exist: bool,
    pub runtime_must_be_registered: bool,
}

impl Default for CommandLookup {
    fn default() -> Self {
        Self {
            must_exist: true,
            runtime_must_be_registered: false,
        }
    }
}

#[derive(Default)]
struct CommandTable {
    order: Vec<String>,
    commands: HashMap<String, Command>,
}

pub struct CommandService {
    table: RwLock<CommandTable>,
    store: Arc<dyn StateStore>,
    when_clause_context: WhenClauseContextProducer,
    when_clauses: WhenClauseCache,
    reported_conditions: Mutex<HashSet<(String, String)>>,
    options: CommandServiceOptions,
    events: broadcast::Sender<CommandEvent>,
}

impl CommandService {
    pub fn new(
        store: Arc<dyn StateStore>,
        when_clause_context: impl Fn(&Value) -> WhenClauseContext + Send + Sync + 'static,
        options: CommandServiceOptions,
    ) -> Self {
        let (events, _) = broadcast::channel(256);
        Self {
            table: RwLock::new(CommandTable::default()),
            store,
            when_clause_context: Arc::new(when_clause_context),
            when_clauses: WhenClauseCache::new(),
            reported_conditions: Mutex::new(HashSet::new()),
            options,
            events,
        }
    }

    pub fn options(&self) -> &CommandServiceOptions {
        &self.options
    }

    pub fn subscribe_events(&self) -> broadcast::Receiver<CommandEvent> {
        self.events.subscribe()
    }

    pub(crate) fn publish(&self, event: CommandEvent) {
        // No subscribers is not an error.
        let _ = self.events.send(event);
    }

    pub fn register_declaration(&self, declaration: CommandDeclaration) -> Result<(), CommandError> {
        validate_name(&declaration.name)?;
        let name = declaration.name.clone();
        {
            let mut table = self.table.write();
            match table.commands.get_mut(&name) {
                Some(existing) => existing.declaration = declaration,
                None => {
                    table.order.push(name.clone());
                    table.commands.insert(
                        name.clone(),
                        Command {
                            declaration,
                            runtime: None,
                        },
                    );
                }
            }
        }
        debug!(command = %name, "command: declaration registered");
        self.publish(CommandEvent::DeclarationRegistered { name });
        Ok(())
    }

    pub fn register_runtime(&self, name: &str, runtime: CommandRuntime) -> Result<(), CommandError> {
        validate_name(name)?;
        {
            let mut table = self.table.write();
            let command = table
                .commands
                .get_mut(name)
                .ok_or_else(|| CommandError::CommandNotFound(name.to_string()))?;
            command.runtime = Some(runtime.normalized());
        }
        debug!(command = name, "command: runtime registered");
        self.publish(CommandEvent::RuntimeRegistered {
            name: name.to_string(),
        });
        Ok(())
    }

    /// Registers several runtimes, stopping at the first name that is not declared.
    pub fn register_runtimes<I, S>(&self, runtimes: I) -> Result<(), CommandError>
    where
        I: IntoIterator<Item = (S, CommandRuntime)>,
        S: AsRef<str>,
    {
        for (name, runtime) in runtimes {
            self.register_runtime(name.as_ref(), runtime)?;
        }
        Ok(())
    }

    /// Removes the runtime for `name`. Unknown names and missing runtimes are a no-op.
    pub fn unregister_runtime(&self, name: &str) {
        let removed = self
            .table
            .write()
            .commands
            .get_mut(name)
            .and_then(|command| command.runtime.take())
            .is_some();
        if removed {
            debug!(command = name, "command: runtime unregistered");
            self.publish(CommandEvent::RuntimeUnregistered {
                name: name.to_string(),
            });
        }
    }

    pub fn unregister_runtimes<I, S>(&self, names: I)
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        for name in names {
            self.unregister_runtime(name.as_ref());
        }
    }

    pub fn command_by_name(
        &self,
        name: &str,
        lookup: CommandLookup,
    ) -> Result<Option<Command>, CommandError> {
        let Some(command) = self.lookup(name) else {
            if lookup.must_exist {
                return Err(CommandError::CommandNotFound(name.to_string()));
            }
            return Ok(None);
        };
        if lookup.runtime_must_be_registered && command.runtime.is_none() {
            return Err(CommandError::RuntimeNotRegistered(name.to_string()));
        }
        Ok(Some(command))
    }

    pub fn exists(&self, name: &str) -> bool {
        self.table.read().commands.contains_key(name)
    }

    /// Registered names in registration order. With `public_only`, only commands with a
    /// non-empty label.
    pub fn command_names(&self, public_only: bool) -> Vec<String> {
        let names = self.table.read().order.clone();
        if !public_only {
            return names;
        }
        names.into_iter().filter(|name| self.is_public(name)).collect()
    }

    pub fn is_public(&self, name: &str) -> bool {
        self.label(name, false)
            .map(|label| !label.is_empty())
            .unwrap_or(false)
    }

    pub fn current_when_clause_context(&self) -> WhenClauseContext {
        (self.when_clause_context)(&self.store.state())
    }

    /// Whether `name` can run right now. Unknown commands, commands without a runtime and
    /// conditions that fail to evaluate all read as disabled.
    pub fn is_enabled(&self, name: &str, context: Option<&WhenClauseContext>) -> bool {
        let Some(command) = self.lookup(name) else {
            return false;
        };
        let Some(runtime) = command.runtime else {
            return false;
        };
        let condition = runtime.enabled_condition();
        match self.evaluate_condition(condition, context) {
            Ok(enabled) => enabled,
            Err(err) => {
                self.report_condition_failure(name, condition, &err);
                false
            }
        }
    }

    /// Like [`Self::is_enabled`] but surfaces unknown commands and unusable conditions.
    pub fn check_enabled(
        &self,
        name: &str,
        context: Option<&WhenClauseContext>,
    ) -> Result<bool, CommandError> {
        let command = self.require(name, CommandError::CommandNotFound)?;
        let Some(runtime) = command.runtime else {
            return Ok(false);
        };
        self.evaluate_condition(runtime.enabled_condition(), context)
            .map_err(|source| CommandError::MalformedExpression {
                name: name.to_string(),
                source,
            })
    }

    pub fn label(&self, name: &str, full_label: bool) -> Result<String, CommandError> {
        let declaration = self.require(name, CommandError::CommandNotDeclared)?.declaration;
        let mut parts = Vec::with_capacity(2);
        if full_label {
            if let Some(parent) = declaration.parent_label.as_ref().map(|label| label.resolve()) {
                if !parent.is_empty() {
                    parts.push(parent);
                }
            }
        }
        parts.push(declaration.label.resolve());
        Ok(parts.join(": "))
    }

    pub fn description(&self, name: &str) -> Result<String, CommandError> {
        let declaration = self.require(name, CommandError::CommandNotFound)?.declaration;
        match declaration.description {
            Some(description) if !description.is_empty() => Ok(description),
            _ => self.label(name, true),
        }
    }

    /// Dynamic title for toolbar buttons. `None` when no runtime is registered; an empty string
    /// when the runtime has no title mapper.
    pub fn title(&self, name: &str, state: Option<&Value>) -> Result<Option<String>, CommandError> {
        let command = self.require(name, CommandError::CommandNotFound)?;
        let Some(runtime) = command.runtime else {
            return Ok(None);
        };
        let Some(mapper) = runtime.title_mapper() else {
            return Ok(Some(String::new()));
        };
        let title = match state {
            Some(state) => mapper(state),
            None => mapper(&self.store.state()),
        };
        Ok(Some(title))
    }

    pub fn icon_name(&self, name: &str, variant: IconVariant) -> Result<String, CommandError> {
        let declaration = self.require(name, CommandError::UnknownCommand)?.declaration;
        Ok(match variant {
            IconVariant::Default => declaration.icon_name,
            IconVariant::Tinymce => declaration
                .tinymce_icon_name
                .unwrap_or_else(|| DEFAULT_TINYMCE_ICON.to_string()),
        })
    }

    /// Enabled commands whose "<label> (<name>)" title contains `query`, case-insensitively,
    /// sorted by lowercased title.
    pub fn search_commands(
        &self,
        query: &str,
        return_all_when_empty: bool,
        exclude_without_label: bool,
    ) -> Vec<SearchResult> {
        let query = query.to_lowercase();
        let context = self.current_when_clause_context();
        let names = self.table.read().order.clone();

        let mut results: Vec<SearchResult> = names
            .into_iter()
            .filter_map(|name| {
                let label = self.label(&name, true).ok()?;
                if exclude_without_label && label.is_empty() {
                    return None;
                }
                if !self.is_enabled(&name, Some(&context)) {
                    return None;
                }
                let title = if label.is_empty() {
                    name.clone()
                } else {
                    format!("{label} ({name})")
                };
                let matches = (return_all_when_empty && query.is_empty())
                    || title.to_lowercase().contains(&query);
                matches.then(|| SearchResult {
                    command_name: name,
                    title,
                })
            })
            .collect();
        results.sort_by_cached_key(|result| result.title.to_lowercase());
        results
    }

    pub async fn execute(&self, name: &str, args: CommandArgs) -> Result<Value, CommandError> {
        let command = self.require(name, CommandError::CommandNotFound)?;
        if !QUIET_COMMANDS.contains(&name) {
            debug!(command = name, ?args, "command: execute");
        }
        let runtime = command
            .runtime
            .ok_or_else(|| CommandError::NoRuntime(name.to_string()))?;
        let context = self.create_context();
        runtime
            .handler()
            .execute(context, args)
            .await
            .map_err(|source| match source.downcast::<CommandError>() {
                Ok(err) => err,
                Err(source) => CommandError::Execution {
                    name: name.to_string(),
                    source,
                },
            })
    }

    pub fn create_context(&self) -> CommandContext {
        CommandContext::new(Arc::clone(&self.store))
    }

    fn lookup(&self, name: &str) -> Option<Command> {
        self.table.read().commands.get(name).cloned()
    }

    fn require(
        &self,
        name: &str,
        missing: fn(String) -> CommandError,
    ) -> Result<Command, CommandError> {
        self.lookup(name).ok_or_else(|| missing(name.to_string()))
    }

    fn evaluate_condition(
        &self,
        condition: &str,
        context: Option<&WhenClauseContext>,
    ) -> Result<bool, WhenClauseError> {
        let mode = EvaluationMode::from_dev_mode(self.options.dev_mode);
        match context {
            Some(context) => self.when_clauses.evaluate(condition, context, mode),
            None => {
                let context = self.current_when_clause_context();
                self.when_clauses.evaluate(condition, &context, mode)
            }
        }
    }

    fn report_condition_failure(&self, name: &str, condition: &str, err: &WhenClauseError) {
        let first = self
            .reported_conditions
            .lock()
            .insert((name.to_string(), condition.to_string()));
        if !first {
            return;
        }
        warn!(command = name, condition, "command: enabled condition failed: {err}");
        self.publish(CommandEvent::ConditionFailed {
            name: name.to_string(),
            condition: condition.to_string(),
            message: err.to_string(),
        });
    }
}

fn validate_name(name: &str) -> Result<(), CommandError> {
    if name.trim().is_empty() {
        return Err(CommandError::InvalidArgument(format!(
            "command name must not be empty, got {name:?}"
        )));
    }
    Ok(())
}

#[cfg(test)]
#[path = "tests/registry_tests.rs"]
mod tests;
