use std::{fmt, future::Future, sync::Arc};

use anyhow::Result;
use async_trait::async_trait;
use serde_json::Value;

use crate::context::CommandContext;

pub const DEFAULT_ENABLED_CONDITION: &str = "true";

pub type CommandArgs = Vec<Value>;

pub type TitleMapper = Arc<dyn Fn(&Value) -> String + Send + Sync>;

#[async_trait]
pub trait CommandHandler: Send + Sync {
    async fn execute(&self, context: CommandContext, args: CommandArgs) -> Result<Value>;
}

pub struct FnHandler<F>(F);

#[async_trait]
impl<F, Fut> CommandHandler for FnHandler<F>
where
    F: Fn(CommandContext, CommandArgs) -> Fut + Send + Sync,
    Fut: Future<Output = Result<Value>> + Send + 'static,
{
    async fn execute(&self, context: CommandContext, args: CommandArgs) -> Result<Value> {
        (self.0)(context, args).await
    }
}

/// Behavior bound to a declared command. Runtimes are registered, replaced and unregistered
/// independently of the declaration.
#[derive(Clone)]
pub struct CommandRuntime {
    handler: Arc<dyn CommandHandler>,
    enabled_condition: Option<String>,
    title_mapper: Option<TitleMapper>,
}

impl CommandRuntime {
    pub fn new(handler: impl CommandHandler + 'static) -> Self {
        Self::from_handler(Arc::new(handler))
    }

    pub fn from_handler(handler: Arc<dyn CommandHandler>) -> Self {
        Self {
            handler,
            enabled_condition: None,
            title_mapper: None,
        }
    }

    pub fn with_enabled_condition(mut self, condition: impl Into<String>) -> Self {
        self.enabled_condition = Some(condition.into());
        self
    }

    /// Dynamic toolbar title derived from the application state.
    pub fn with_title(mut self, mapper: impl Fn(&Value) -> String + Send + Sync + 'static) -> Self {
        self.title_mapper = Some(Arc::new(mapper));
        self
    }

    pub fn enabled_condition(&self) -> &str {
        self.enabled_condition
            .as_deref()
            .filter(|condition| !condition.trim().is_empty())
            .unwrap_or(DEFAULT_ENABLED_CONDITION)
    }

    pub fn handler(&self) -> &Arc<dyn CommandHandler> {
        &self.handler
    }

    pub fn title_mapper(&self) -> Option<&TitleMapper> {
        self.title_mapper.as_ref()
    }

    pub(crate) fn normalized(mut self) -> Self {
        self.enabled_condition = Some(self.enabled_condition().to_string());
        self
    }
}

impl fmt::Debug for CommandRuntime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CommandRuntime")
            .field("enabled_condition", &self.enabled_condition())
            .field("has_title", &self.title_mapper.is_some())
            .finish_non_exhaustive()
    }
}

pub fn runtime_fn<F, Fut>(handler: F) -> CommandRuntime
where
    F: Fn(CommandContext, CommandArgs) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<Value>> + Send + 'static,
{
    CommandRuntime::new(FnHandler(handler))
}
