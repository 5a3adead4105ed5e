use std::sync::Arc;

use anyhow::{Context, Result};
use command_core::{
    runtime_fn, CommandArgs, CommandContext, CommandDeclaration, CommandService, MemoryStateStore,
};
use serde_json::{json, Value};
use settings::{MemorySettings, SettingsStore};
use shared::domain::Action;
use sort_order::{SortOrderCycler, DEFAULT_FIELDS, FIELD_KEY, REVERSE_KEY};
use tracing::info;
use when_clause::WhenClauseContext;

use crate::config::ToolSettings;

pub struct App {
    pub service: Arc<CommandService>,
    pub store: Arc<MemoryStateStore>,
    pub settings: Arc<MemorySettings>,
    pub cycler: Arc<SortOrderCycler>,
}

impl App {
    pub fn new(tool: &ToolSettings) -> Result<Self> {
        let settings = Arc::new(load_settings_store(tool)?);
        let store = Arc::new(MemoryStateStore::with_reducer(initial_state(), reduce));
        let service =
            CommandService::new(store.clone(), when_clause_context, tool.service_options());

        register_builtins(&service)?;
        let cycler = Arc::new(SortOrderCycler::new(settings.clone()));
        sort_order::register(&service, Arc::clone(&cycler))?;
        info!(
            commands = service.command_names(false).len(),
            dev_mode = tool.dev_mode,
            "tool: command service ready"
        );

        Ok(Self {
            service: Arc::new(service),
            store,
            settings,
            cycler,
        })
    }
}

fn load_settings_store(tool: &ToolSettings) -> Result<MemorySettings> {
    let settings = match &tool.settings_file {
        Some(path) => MemorySettings::from_toml_file(path)?,
        None => MemorySettings::new(),
    };
    if settings.enum_option_values(FIELD_KEY).is_empty() {
        settings.define_enum(FIELD_KEY, DEFAULT_FIELDS);
    }
    if settings.value(FIELD_KEY).is_none() {
        settings.seed(FIELD_KEY, "user_updated_time");
    }
    if settings.value(REVERSE_KEY).is_none() {
        settings.seed(REVERSE_KEY, false);
    }
    Ok(settings)
}

fn initial_state() -> Value {
    json!({
        "notes": [],
        "selectedNoteIds": [],
        "sidebarVisible": true,
        "syncStarted": false,
    })
}

fn reduce(state: &mut Value, action: &Action) {
    match action.kind.as_str() {
        "NOTE_CREATE" => {
            if let Some(notes) = state["notes"].as_array_mut() {
                notes.push(action.payload.clone());
            }
            state["selectedNoteIds"] = json!([action.payload["id"].clone()]);
        }
        "SIDEBAR_VISIBILITY_TOGGLE" => {
            let visible = state["sidebarVisible"].as_bool().unwrap_or(true);
            state["sidebarVisible"] = json!(!visible);
        }
        "SYNC_STARTED" => state["syncStarted"] = json!(true),
        _ => {}
    }
}

/// Facts exposed to enabled conditions.
pub fn when_clause_context(state: &Value) -> WhenClauseContext {
    let selected = state["selectedNoteIds"].as_array().map_or(0, Vec::len);
    WhenClauseContext::new()
        .with("noteIsSelected", selected > 0)
        .with("selectedNoteCount", selected as u64)
        .with("sidebarVisible", state["sidebarVisible"].as_bool().unwrap_or(true))
        .with("syncStarted", state["syncStarted"].as_bool().unwrap_or(false))
}

fn register_builtins(service: &CommandService) -> Result<()> {
    let declarations = [
        CommandDeclaration::new("newNote")
            .with_label("New note")
            .with_icon("fa-file"),
        CommandDeclaration::new("toggleSideBar")
            .with_label("Toggle sidebar")
            .with_parent_label("View")
            .with_icon("fas fa-bars")
            .with_tinymce_icon("sidebar"),
        CommandDeclaration::new("synchronize")
            .with_label("Synchronise")
            .with_parent_label("Tools")
            .with_icon("fa-sync-alt"),
        CommandDeclaration::new("copyNoteLink")
            .with_label("Copy Markdown link")
            .with_parent_label("Note"),
        CommandDeclaration::new("showModalMessage"),
    ];
    for declaration in declarations {
        service
            .register_declaration(declaration)
            .context("failed to declare builtin command")?;
    }

    service
        .register_runtimes([
            ("newNote", runtime_fn(new_note)),
            (
                "toggleSideBar",
                runtime_fn(|context, _args| dispatch(context, "SIDEBAR_VISIBILITY_TOGGLE"))
                    .with_title(|state| {
                        if state["sidebarVisible"].as_bool().unwrap_or(true) {
                            "Hide sidebar".to_string()
                        } else {
                            "Show sidebar".to_string()
                        }
                    }),
            ),
            (
                "synchronize",
                runtime_fn(|context, _args| dispatch(context, "SYNC_STARTED"))
                    .with_enabled_condition("!syncStarted"),
            ),
            (
                "copyNoteLink",
                runtime_fn(copy_note_link).with_enabled_condition("selectedNoteCount == 1"),
            ),
            ("showModalMessage", runtime_fn(show_modal_message)),
        ])
        .context("failed to register builtin runtimes")?;
    Ok(())
}

async fn new_note(context: CommandContext, args: CommandArgs) -> Result<Value> {
    let title = args
        .first()
        .and_then(Value::as_str)
        .unwrap_or("Untitled")
        .to_string();
    let count = context.state()["notes"].as_array().map_or(0, Vec::len);
    let note = json!({ "id": format!("note-{}", count + 1), "title": title });
    context.dispatch(Action::with_payload("NOTE_CREATE", note.clone()));
    Ok(note)
}

async fn dispatch(context: CommandContext, kind: &'static str) -> Result<Value> {
    context.dispatch(Action::new(kind));
    Ok(context.current_state())
}

async fn copy_note_link(context: CommandContext, _args: CommandArgs) -> Result<Value> {
    let state = context.state();
    let id = state["selectedNoteIds"][0]
        .as_str()
        .context("no note is selected")?;
    let title = state["notes"]
        .as_array()
        .and_then(|notes| notes.iter().find(|note| note["id"] == id))
        .and_then(|note| note["title"].as_str())
        .unwrap_or(id);
    Ok(json!(format!("[{title}](:/{id})")))
}

async fn show_modal_message(_context: CommandContext, args: CommandArgs) -> Result<Value> {
    let message = args.first().and_then(Value::as_str).unwrap_or_default();
    Ok(json!({ "modal": message }))
}
