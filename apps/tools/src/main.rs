mod app;
mod config;

use std::{path::PathBuf, process::ExitCode, sync::Arc};

use anyhow::Result;
use clap::{Parser, Subcommand};
use command_core::{CommandArgs, CommandError, CommandEvent, Dispatcher, StateStore};
use serde_json::{json, Value};
use shared::{
    domain::IconVariant,
    error::{ErrorCode, ErrorPayload},
};
use sort_order::{field_icon, reverse_icon, SWITCH_COMMAND};
use tracing_subscriber::EnvFilter;
use when_clause::{EvaluationMode, WhenClause, WhenClauseContext, WhenClauseError};

use crate::{app::App, config::ToolSettings};

#[derive(Parser, Debug)]
#[command(name = "command-tool", about = "Inspect, search and run registered commands")]
struct Cli {
    /// Configuration file. Defaults to ./command-tool.toml when present.
    #[arg(long)]
    config: Option<PathBuf>,
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// List commands in registration order.
    List {
        #[arg(long)]
        public: bool,
    },
    Search {
        query: String,
        /// Return every enabled command when the query is empty.
        #[arg(long)]
        all: bool,
        #[arg(long)]
        include_unlabeled: bool,
    },
    /// Execute a command. Arguments are parsed as JSON, falling back to plain strings.
    Run { name: String, args: Vec<String> },
    /// Queue a command on the deferred dispatcher and wait for the queue to drain.
    Schedule { name: String, args: Vec<String> },
    /// Switch the note sort order. Without flags, advances to the next field.
    Sort {
        #[arg(long)]
        field: Option<String>,
        #[arg(long)]
        reverse: Option<bool>,
    },
    /// Evaluate a when-clause against the given facts.
    Eval {
        expr: String,
        #[arg(long = "fact", value_name = "KEY=VALUE")]
        facts: Vec<String>,
        #[arg(long)]
        dev: bool,
    },
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    let tool = match config::load_settings(cli.config.as_deref()) {
        Ok(tool) => tool,
        Err(err) => return report(&err),
    };
    init_tracing(&tool.log_filter);

    match run(cli.command, &tool).await {
        Ok(output) => {
            print_json(&output);
            ExitCode::SUCCESS
        }
        Err(err) => report(&err),
    }
}

fn init_tracing(filter: &str) {
    let filter = EnvFilter::try_new(filter).unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

async fn run(command: Command, tool: &ToolSettings) -> Result<Value> {
    let app = App::new(tool)?;
    match command {
        Command::List { public } => list(&app, public),
        Command::Search {
            query,
            all,
            include_unlabeled,
        } => {
            let results = app.service.search_commands(&query, all, !include_unlabeled);
            Ok(serde_json::to_value(results)?)
        }
        Command::Run { name, args } => Ok(app.service.execute(&name, parse_args(&args)).await?),
        Command::Schedule { name, args } => schedule(&app, &name, parse_args(&args)).await,
        Command::Sort { field, reverse } => sort(&app, field, reverse).await,
        Command::Eval { expr, facts, dev } => eval(&expr, &facts, dev || tool.dev_mode),
    }
}

fn list(app: &App, public_only: bool) -> Result<Value> {
    let context = app.service.current_when_clause_context();
    let mut entries = Vec::new();
    for name in app.service.command_names(public_only) {
        entries.push(json!({
            "name": name,
            "label": app.service.label(&name, true)?,
            "description": app.service.description(&name)?,
            "icon": app.service.icon_name(&name, IconVariant::Default)?,
            "enabled": app.service.is_enabled(&name, Some(&context)),
            "title": app.service.title(&name, None)?,
        }));
    }
    Ok(Value::Array(entries))
}

async fn schedule(app: &App, name: &str, args: CommandArgs) -> Result<Value> {
    let mut events = app.service.subscribe_events();
    let dispatcher = Dispatcher::spawn(Arc::clone(&app.service));
    dispatcher.schedule_execute(name, args);
    dispatcher.shutdown().await;

    let mut failures = Vec::new();
    while let Ok(event) = events.try_recv() {
        if let CommandEvent::ScheduledExecutionFailed { name, message } = event {
            failures.push(json!({ "command": name, "message": message }));
        }
    }
    Ok(json!({
        "scheduled": name,
        "failures": failures,
        "state": app.store.state(),
    }))
}

async fn sort(app: &App, field: Option<String>, reverse: Option<bool>) -> Result<Value> {
    let args = vec![
        field.map_or(Value::Null, Value::String),
        reverse.map_or(Value::Null, Value::Bool),
    ];
    let outcome = app.service.execute(SWITCH_COMMAND, args).await?;
    let label = app.service.label(SWITCH_COMMAND, false)?;
    let current = app.cycler.current();
    let writes: Vec<Value> = app
        .settings
        .writes()
        .into_iter()
        .map(|write| json!({ "key": write.key, "value": write.value }))
        .collect();
    Ok(json!({
        "outcome": outcome,
        "tip": app.cycler.field_tip(&label),
        "fieldIcon": field_icon(&current.field),
        "reverseIcon": reverse_icon(current.reverse),
        "writes": writes,
    }))
}

fn eval(expr: &str, facts: &[String], dev: bool) -> Result<Value> {
    let clause = WhenClause::parse(expr)?;
    let context = facts
        .iter()
        .map(|fact| parse_fact(fact))
        .collect::<Result<WhenClauseContext, CommandError>>()?;
    let result = clause.evaluate_with(&context, EvaluationMode::from_dev_mode(dev))?;
    Ok(json!({
        "expression": clause.source(),
        "keys": clause.keys(),
        "result": result,
    }))
}

fn parse_fact(fact: &str) -> Result<(String, Value), CommandError> {
    let (key, raw) = fact.split_once('=').ok_or_else(|| {
        CommandError::InvalidArgument(format!("fact '{fact}' must look like key=value"))
    })?;
    Ok((key.trim().to_string(), parse_value(raw)))
}

fn parse_value(raw: &str) -> Value {
    serde_json::from_str(raw).unwrap_or_else(|_| Value::String(raw.to_string()))
}

fn parse_args(raw: &[String]) -> CommandArgs {
    raw.iter().map(|arg| parse_value(arg)).collect()
}

fn error_payload(err: &anyhow::Error) -> ErrorPayload {
    if let Some(err) = err.downcast_ref::<CommandError>() {
        return err.payload();
    }
    if let Some(err) = err.downcast_ref::<WhenClauseError>() {
        return ErrorPayload::new(ErrorCode::Validation, err.to_string());
    }
    ErrorPayload::new(ErrorCode::Internal, format!("{err:#}"))
}

fn report(err: &anyhow::Error) -> ExitCode {
    match serde_json::to_value(error_payload(err)) {
        Ok(payload) => print_json(&payload),
        Err(_) => eprintln!("{err:#}"),
    }
    ExitCode::FAILURE
}

fn print_json(value: &Value) {
    match serde_json::to_string_pretty(value) {
        Ok(text) => println!("{text}"),
        Err(_) => println!("{value}"),
    }
}
