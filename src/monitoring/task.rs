/*!
 * Control Task
 * Background tokio task driving one periodic control loop
 *
 * The task runs a cycle on every interval tick and on demand, and stops on
 * `Shutdown` or when its handle is dropped. A failed cycle is logged and the
 * loop keeps going.
 */

use super::tracer::span_cycle;
use crate::core::errors::Result;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tracing::{error, info, warn};

/// One periodic feedback loop
pub trait ControlLoop: Send + Sync + 'static {
    /// Name used in logs
    fn name(&self) -> &'static str;

    /// Period between cycles
    fn interval(&self) -> Duration;

    /// Run a single cycle
    fn run_cycle(&self) -> Result<()>;

    /// Called once after the loop stops
    fn on_shutdown(&self) {}
}

/// Control messages for a control task
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ControlCommand {
    /// Run a cycle now
    Trigger,
    /// Stop the task
    Shutdown,
}

/// Handle to a running control loop
pub struct ControlTask {
    name: &'static str,
    command_tx: mpsc::UnboundedSender<ControlCommand>,
    handle: Option<tokio::task::JoinHandle<()>>,
}

impl ControlTask {
    /// Spawn `control` on the current tokio runtime
    pub fn spawn<L: ControlLoop>(control: Arc<L>) -> Self {
        let (command_tx, command_rx) = mpsc::unbounded_channel();
        let name = control.name();

        let handle = tokio::spawn(async move {
            run_control_loop(control, command_rx).await;
        });

        info!(control_loop = name, "Control task spawned");

        Self {
            name,
            command_tx,
            handle: Some(handle),
        }
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    /// Request an immediate cycle
    pub fn trigger(&self) {
        let _ = self.command_tx.send(ControlCommand::Trigger);
    }

    /// Stop the task and wait for it to exit
    pub async fn shutdown(mut self) {
        let _ = self.command_tx.send(ControlCommand::Shutdown);

        if let Some(handle) = self.handle.take() {
            if let Err(e) = handle.await {
                warn!(control_loop = self.name, error = %e, "Control task shutdown error");
            } else {
                info!(control_loop = self.name, "Control task shutdown complete");
            }
        }
    }
}

async fn run_control_loop<L: ControlLoop>(
    control: Arc<L>,
    mut command_rx: mpsc::UnboundedReceiver<ControlCommand>,
) {
    let period = control.interval().max(Duration::from_millis(1));
    let mut interval = tokio::time::interval(period);
    interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);

    info!(
        control_loop = control.name(),
        interval_ms = period.as_millis() as u64,
        "Control loop started"
    );

    loop {
        tokio::select! {
            _ = interval.tick() => run_cycle(control.as_ref()),

            cmd = command_rx.recv() => match cmd {
                Some(ControlCommand::Trigger) => run_cycle(control.as_ref()),
                Some(ControlCommand::Shutdown) | None => {
                    info!(control_loop = control.name(), "Control loop shutting down");
                    break;
                }
            },
        }
    }

    control.on_shutdown();
}

fn run_cycle<L: ControlLoop>(control: &L) {
    let span = span_cycle(control.name());
    let _entered = span.enter();
    match control.run_cycle() {
        Ok(()) => span.record_result(true),
        Err(e) => {
            span.record_result(false);
            error!(control_loop = control.name(), error = %e, "Control cycle failed");
        }
    }
}

impl Drop for ControlTask {
    fn drop(&mut self) {
        if self.handle.is_some() {
            let _ = self.command_tx.send(ControlCommand::Shutdown);
        }
    }
}
