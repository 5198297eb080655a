//! Startup and shutdown of the join manager as a whole.

use std::sync::Arc;

use tokio::runtime::Handle;
use tracing::info;

use crate::clock::Clock;
use crate::error::JoinManagerError;
use crate::gate::JoinGate;
use crate::permissions::PermissionOracle;
use crate::presence::PresenceOracle;
use crate::scheduler::CleanupScheduler;
use crate::settings::JoinSettings;
use crate::LOG_JOIN;

/// Owns the gate and its cleanup task for the lifetime of the server.
#[derive(Debug)]
pub struct JoinManager {
    settings: JoinSettings,
    gate: JoinGate,
    scheduler: CleanupScheduler,
}

impl JoinManager {
    /// Validates `settings`, creates an empty registry and starts the cleanup
    /// task on `runtime`.
    pub fn start(
        settings: JoinSettings,
        permissions: Arc<dyn PermissionOracle>,
        presence: Arc<dyn PresenceOracle>,
        clock: Arc<dyn Clock>,
        runtime: &Handle,
    ) -> Result<Self, JoinManagerError> {
        settings.validate()?;

        let gate = JoinGate::new(&settings, permissions, clock);
        let scheduler = CleanupScheduler::spawn(
            runtime,
            gate.clone(),
            presence,
            settings.cleanup_initial_delay(),
            settings.cleanup_interval(),
        )?;

        info!(
            target: LOG_JOIN,
            "Join manager {} started (max level {}, cleanup every {}s)",
            env!("CARGO_PKG_VERSION"),
            settings.max_level,
            settings.cleanup_interval_secs
        );

        Ok(Self {
            settings,
            gate,
            scheduler,
        })
    }

    pub fn gate(&self) -> &JoinGate {
        &self.gate
    }

    pub fn settings(&self) -> &JoinSettings {
        &self.settings
    }

    /// Stops the cleanup task and discards every temporary bypass.
    pub async fn shutdown(self) {
        let Self {
            gate, scheduler, ..
        } = self;
        scheduler.shutdown().await;
        let discarded = gate.registry().clear();
        info!(
            target: LOG_JOIN,
            "Join manager stopped, discarded {discarded} temporary bypasses"
        );
    }
}
