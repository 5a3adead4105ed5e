//! Application-wide command registry and dispatch.
//!
//! Commands are declared once (name, label, icon) and bound to runtime behavior separately, so a
//! screen can attach and detach the behavior as it mounts and unmounts while menus keep listing
//! the declaration.

mod context;
mod declaration;
mod dispatcher;
pub mod error;
mod events;
mod registry;
mod runtime;

pub use context::{CommandContext, MemoryStateStore, Reducer, StateStore};
pub use declaration::{CommandDeclaration, Label};
pub use dispatcher::{Dispatcher, ScheduledCommand};
pub use error::CommandError;
pub use events::CommandEvent;
pub use registry::{
    Command, CommandLookup, CommandService, CommandServiceOptions, WhenClauseContextProducer,
    DEFAULT_SCHEDULE_DELAY, DEFAULT_TINYMCE_ICON,
};
pub use runtime::{
    runtime_fn, CommandArgs, CommandHandler, CommandRuntime, FnHandler, TitleMapper,
    DEFAULT_ENABLED_CONDITION,
};
