//! Administrative operations on join bypasses.
//!
//! Requests arrive already parsed (from a console, chat command or admin
//! socket); this module only checks the sender's tier and applies them.
//! Queries need [`CommandPermission::Info`], mutations need
//! [`CommandPermission::Manage`].

use std::fmt;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{info, warn};

use crate::gate::JoinGate;
use crate::permissions::{BypassStatus, CommandPermission, Priority};
use crate::registry::TempBypass;
use crate::settings::JoinSettings;
use crate::{LOG_JOIN, PlayerId};

/// Origin of an administrative request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CommandSender {
    /// Server console; holds every tier.
    Console,
    Player(PlayerId),
}

impl fmt::Display for CommandSender {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CommandSender::Console => write!(f, "console"),
            CommandSender::Player(id) => write!(f, "player {id}"),
        }
    }
}

/// Join-related facts about a single player.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct JoinInfo {
    pub player: PlayerId,
    pub priority: Priority,
    pub status: BypassStatus,
    pub temp_bypass: Option<TempBypass>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AdminRequest {
    JoinInfo {
        target: PlayerId,
    },
    GetTempBypass {
        target: PlayerId,
    },
    AllowTempBypass {
        target: PlayerId,
        /// Falls back to [`JoinSettings::default_grant`].
        duration: Option<Duration>,
    },
    RemoveTempBypass {
        target: PlayerId,
    },
}

impl AdminRequest {
    pub fn required_permission(&self) -> CommandPermission {
        match self {
            AdminRequest::JoinInfo { .. } | AdminRequest::GetTempBypass { .. } => {
                CommandPermission::Info
            }
            AdminRequest::AllowTempBypass { .. } | AdminRequest::RemoveTempBypass { .. } => {
                CommandPermission::Manage
            }
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AdminResponse {
    JoinInfo(JoinInfo),
    TempBypass(Option<TempBypass>),
    Granted(TempBypass),
    Revoked(Option<TempBypass>),
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum AdminError {
    #[error("{sender} lacks the {required:?} command permission")]
    PermissionDenied {
        sender: CommandSender,
        required: CommandPermission,
    },
    #[error("grant duration must be at least one second")]
    ZeroDuration,
}

/// Authorizes and applies an administrative request.
pub fn execute(
    gate: &JoinGate,
    settings: &JoinSettings,
    sender: &CommandSender,
    request: AdminRequest,
) -> Result<AdminResponse, AdminError> {
    let required = request.required_permission();
    let granted = gate.command_permission(sender);
    if granted < required {
        warn!(
            target: LOG_JOIN,
            %sender,
            ?required,
            ?granted,
            "Rejected join bypass command"
        );
        return Err(AdminError::PermissionDenied {
            sender: *sender,
            required,
        });
    }

    let response = match request {
        AdminRequest::JoinInfo { target } => AdminResponse::JoinInfo(gate.join_info(target)),
        AdminRequest::GetTempBypass { target } => {
            AdminResponse::TempBypass(gate.temp_bypass(&target))
        }
        AdminRequest::AllowTempBypass { target, duration } => {
            let duration = duration.unwrap_or_else(|| settings.default_grant());
            if duration.as_secs() == 0 {
                return Err(AdminError::ZeroDuration);
            }
            let record = gate.grant(target, duration);
            info!(
                target: LOG_JOIN,
                %sender,
                player = %target,
                secs = duration.as_secs(),
                "Temporary join bypass granted"
            );
            AdminResponse::Granted(record)
        }
        AdminRequest::RemoveTempBypass { target } => {
            let removed = gate.revoke(&target);
            if removed.is_some() {
                info!(
                    target: LOG_JOIN,
                    %sender,
                    player = %target,
                    "Temporary join bypass removed"
                );
            }
            AdminResponse::Revoked(removed)
        }
    };
    Ok(response)
}
