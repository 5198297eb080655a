//! Background task that periodically sweeps the bypass registry.

use std::sync::Arc;
use std::time::Duration;

use tokio::runtime::Handle;
use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior, interval_at};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::error::SchedulerError;
use crate::gate::JoinGate;
use crate::presence::PresenceOracle;
use crate::LOG_JOIN;

/// Handle to the running cleanup task. Dropping it cancels the task.
#[derive(Debug)]
pub struct CleanupScheduler {
    cancel: CancellationToken,
    handle: Option<JoinHandle<()>>,
}

impl CleanupScheduler {
    /// Spawns the sweep loop onto `runtime`.
    ///
    /// The first sweep runs after `initial_delay`, then every `interval`.
    /// Ticks missed while the runtime was busy are skipped.
    pub fn spawn(
        runtime: &Handle,
        gate: JoinGate,
        presence: Arc<dyn PresenceOracle>,
        initial_delay: Duration,
        interval: Duration,
    ) -> Result<Self, SchedulerError> {
        if interval.is_zero() {
            return Err(SchedulerError::ZeroInterval);
        }

        let cancel = CancellationToken::new();
        let cancel_child = cancel.clone();
        let handle = runtime.spawn(async move {
            let mut ticker = interval_at(Instant::now() + initial_delay, interval);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
            debug!(
                target: LOG_JOIN,
                "Bypass cleanup started (interval {:?}, first sweep in {:?})",
                interval,
                initial_delay
            );

            loop {
                tokio::select! {
                    _ = cancel_child.cancelled() => {
                        debug!(target: LOG_JOIN, "Bypass cleanup cancelled");
                        break;
                    }
                    _ = ticker.tick() => {
                        gate.sweep_once(presence.as_ref());
                    }
                }
            }
        });

        Ok(Self {
            cancel,
            handle: Some(handle),
        })
    }

    pub fn is_running(&self) -> bool {
        self.handle
            .as_ref()
            .is_some_and(|handle| !handle.is_finished())
    }

    /// Requests cancellation without waiting for the task to finish.
    pub fn cancel(&self) {
        self.cancel.cancel();
    }

    /// Cancels the task and waits until it has stopped.
    pub async fn shutdown(mut self) {
        self.cancel.cancel();
        if let Some(handle) = self.handle.take() {
            if let Err(err) = handle.await {
                warn!(target: LOG_JOIN, "Bypass cleanup task ended abnormally: {err}");
            }
        }
        info!(target: LOG_JOIN, "Bypass cleanup stopped");
    }
}

impl Drop for CleanupScheduler {
    fn drop(&mut self) {
        self.cancel.cancel();
    }
}
