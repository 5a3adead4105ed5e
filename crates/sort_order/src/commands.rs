use std::sync::Arc;

use anyhow::Result;
use command_core::{
    runtime_fn, CommandArgs, CommandDeclaration, CommandError, CommandService, Label,
};
use serde_json::Value;
use tracing::debug;

use crate::{cycler::SortOrderCycler, input::SortOrderInput};

pub const SWITCH_COMMAND: &str = "notesSortOrderSwitch";
pub const TOGGLE_REVERSE_COMMAND: &str = "notesSortOrderToggleReverse";

pub fn switch_declaration() -> CommandDeclaration {
    CommandDeclaration::new(SWITCH_COMMAND)
        .with_label(Label::lazy(|| "Switch sort order".to_string()))
        .with_parent_label(Label::lazy(|| "Notes".to_string()))
}

pub fn toggle_reverse_declaration() -> CommandDeclaration {
    CommandDeclaration::new(TOGGLE_REVERSE_COMMAND)
        .with_label(Label::lazy(|| "Reverse sort order".to_string()))
        .with_parent_label(Label::lazy(|| "Notes".to_string()))
}

/// Declares both sort commands and binds them to `cycler`.
pub fn register(service: &CommandService, cycler: Arc<SortOrderCycler>) -> Result<(), CommandError> {
    service.register_declaration(switch_declaration())?;
    service.register_declaration(toggle_reverse_declaration())?;

    let switch = Arc::clone(&cycler);
    service.register_runtime(
        SWITCH_COMMAND,
        runtime_fn(move |_context, args| switch_sort_order(Arc::clone(&switch), args)),
    )?;
    service.register_runtime(
        TOGGLE_REVERSE_COMMAND,
        runtime_fn(move |_context, _args| toggle_sort_reverse(Arc::clone(&cycler))),
    )?;

    debug!("sort order: commands registered");
    Ok(())
}

async fn switch_sort_order(cycler: Arc<SortOrderCycler>, args: CommandArgs) -> Result<Value> {
    let input = SortOrderInput::from_args(&args)?;
    let outcome = cycler.execute(input)?;
    Ok(serde_json::to_value(outcome)?)
}

async fn toggle_sort_reverse(cycler: Arc<SortOrderCycler>) -> Result<Value> {
    let outcome = cycler.toggle_reverse()?;
    Ok(serde_json::to_value(outcome)?)
}
