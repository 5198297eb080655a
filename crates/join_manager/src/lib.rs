//! Priority join and temporary join-bypass management.
//!
//! A capacity-limited server asks [`JoinGate::status_of`] whether a player may
//! join past the slot limit. The answer is derived from two sources:
//! - permissions supplied by the host through a [`PermissionOracle`]
//!   (permanent bypass, priority levels, command tiers)
//! - one-time grants held in the [`BypassRegistry`], which the
//!   [`CleanupScheduler`] sweeps periodically
//!
//! Lifecycle of a temporary grant:
//! `absent -> pending (grant) -> consumed (seen online) -> absent (seen offline)`,
//! or `pending -> absent` once the grant expires without the player connecting.
//!
//! Grants live in memory only and are dropped when the [`JoinManager`] shuts down.

pub mod admin;
#[cfg(feature = "bevy")]
pub mod bevy;
pub mod clock;
pub mod error;
pub mod gate;
pub mod manager;
pub mod permissions;
pub mod presence;
pub mod registry;
pub mod scheduler;
pub mod settings;

use uuid::Uuid;

/// Log target used by every event emitted from this crate.
pub const LOG_JOIN: &str = "join_manager";

/// Identifies a player across connections.
pub type PlayerId = Uuid;

pub use admin::{AdminError, AdminRequest, AdminResponse, CommandSender, JoinInfo, execute};
pub use clock::{Clock, ManualClock, SystemClock};
pub use error::{JoinManagerError, OracleError, SchedulerError, SettingsError};
pub use gate::JoinGate;
pub use manager::JoinManager;
pub use permissions::{
    BypassStatus, CommandPermission, Permission, PermissionOracle, PermissionTable, Priority,
    PriorityOracle,
};
pub use presence::{OnlinePlayers, PresenceOracle};
pub use registry::{BypassRegistry, RemovalReason, SweepReport, TempBypass};
pub use scheduler::CleanupScheduler;
pub use settings::JoinSettings;
