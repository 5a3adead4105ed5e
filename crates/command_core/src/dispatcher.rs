use std::{sync::Arc, time::Duration};

use serde_json::Value;
use tokio::{
    sync::mpsc,
    task::{JoinError, JoinHandle, JoinSet},
    time::Instant,
};
use tracing::{debug, warn};

use crate::{error::CommandError, events::CommandEvent, registry::CommandService, runtime::CommandArgs};

#[derive(Debug, Clone, PartialEq)]
pub struct ScheduledCommand {
    pub name: String,
    pub args: CommandArgs,
}

#[derive(Debug)]
struct Deferred {
    command: ScheduledCommand,
    due: Instant,
}

/// Runs commands either immediately or deferred. Each deferred run starts once the configured
/// delay has passed since it was scheduled and executes on its own task, so a runtime that never
/// finishes only holds up itself. Deferred runs never report back to the caller.
pub struct Dispatcher {
    service: Arc<CommandService>,
    delay: Duration,
    queue: mpsc::UnboundedSender<Deferred>,
    worker: JoinHandle<()>,
}

impl Dispatcher {
    /// Must be called from within a tokio runtime.
    pub fn spawn(service: Arc<CommandService>) -> Self {
        let (queue, pending) = mpsc::unbounded_channel();
        let delay = service.options().schedule_delay;
        let worker = tokio::spawn(run_deferred_queue(Arc::clone(&service), pending));
        Self {
            service,
            delay,
            queue,
            worker,
        }
    }

    pub fn service(&self) -> &Arc<CommandService> {
        &self.service
    }

    pub async fn execute(&self, name: &str, args: CommandArgs) -> Result<Value, CommandError> {
        self.service.execute(name, args).await
    }

    pub fn schedule_execute(&self, name: &str, args: CommandArgs) {
        let deferred = Deferred {
            command: ScheduledCommand {
                name: name.to_string(),
                args,
            },
            due: Instant::now() + self.delay,
        };
        if let Err(err) = self.queue.send(deferred) {
            warn!(
                command = %err.0.command.name,
                "dispatcher: deferred queue closed, dropping scheduled command"
            );
        }
    }

    /// Stops accepting scheduled commands and waits for the ones already queued to finish.
    pub async fn shutdown(self) {
        drop(self.queue);
        if let Err(err) = self.worker.await {
            warn!("dispatcher: deferred worker ended abnormally: {err}");
        }
    }
}

async fn run_deferred_queue(
    service: Arc<CommandService>,
    mut pending: mpsc::UnboundedReceiver<Deferred>,
) {
    let mut running = JoinSet::new();
    let mut carried = None;
    loop {
        let next = match carried.take() {
            Some(next) => next,
            None => match pending.recv().await {
                Some(next) => next,
                None => break,
            },
        };
        tokio::time::sleep_until(next.due).await;

        // Identical triggers queued back to back before the run is due collapse into one run.
        let mut coalesced = 0usize;
        while let Ok(following) = pending.try_recv() {
            if following.command == next.command {
                coalesced += 1;
            } else {
                carried = Some(following);
                break;
            }
        }
        if coalesced > 0 {
            debug!(command = %next.command.name, coalesced, "dispatcher: coalesced repeated triggers");
        }

        running.spawn(run_scheduled(Arc::clone(&service), next.command));
        while let Some(finished) = running.try_join_next() {
            report_join(finished);
        }
    }

    while let Some(finished) = running.join_next().await {
        report_join(finished);
    }
    debug!("dispatcher: deferred queue drained");
}

async fn run_scheduled(service: Arc<CommandService>, scheduled: ScheduledCommand) {
    let ScheduledCommand { name, args } = scheduled;
    if let Err(err) = service.execute(&name, args).await {
        warn!(command = %name, "dispatcher: scheduled execution failed: {err}");
        service.publish(CommandEvent::ScheduledExecutionFailed {
            name,
            message: err.to_string(),
        });
    }
}

fn report_join(finished: Result<(), JoinError>) {
    if let Err(err) = finished {
        warn!("dispatcher: scheduled run ended abnormally: {err}");
    }
}

#[cfg(test)]
#[path = "tests/dispatcher_tests.rs"]
mod tests;
