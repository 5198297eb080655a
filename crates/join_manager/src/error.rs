//! Error types shared across the crate.
//!
//! The registry itself never fails; errors only come from collaborators
//! (oracles), settings validation and scheduler setup.

use thiserror::Error;

use crate::PlayerId;

/// Failure reported by a permission or presence oracle.
///
/// Callers inside this crate never propagate it: a failed lookup is treated as
/// "not authorized" or "not online".
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum OracleError {
    #[error("player {0} is unknown to the oracle")]
    UnknownPlayer(PlayerId),
    #[error("oracle unavailable: {0}")]
    Unavailable(String),
}

#[derive(Debug, Error)]
pub enum SettingsError {
    #[error("toml error: {0}")]
    Toml(#[from] toml::de::Error),
    #[error("invalid value for `{key}`: {reason}")]
    InvalidValue { key: &'static str, reason: String },
}

#[derive(Debug, Error)]
pub enum SchedulerError {
    #[error("cleanup interval must be greater than zero")]
    ZeroInterval,
}

/// Errors raised while starting a [`JoinManager`](crate::JoinManager).
#[derive(Debug, Error)]
pub enum JoinManagerError {
    #[error("settings error: {0}")]
    Settings(#[from] SettingsError),
    #[error("scheduler error: {0}")]
    Scheduler(#[from] SchedulerError),
}
