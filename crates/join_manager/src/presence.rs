//! Online-presence lookups used by the cleanup sweep.

use std::collections::HashSet;
use std::sync::{Arc, PoisonError, RwLock};

use tracing::warn;

use crate::error::OracleError;
use crate::{LOG_JOIN, PlayerId};

/// Answers whether a player is currently connected.
pub trait PresenceOracle: Send + Sync {
    fn is_online(&self, player: &PlayerId) -> Result<bool, OracleError>;
}

impl<F> PresenceOracle for F
where
    F: Fn(&PlayerId) -> bool + Send + Sync,
{
    fn is_online(&self, player: &PlayerId) -> Result<bool, OracleError> {
        Ok(self(player))
    }
}

/// Set of connected players, maintained by the host's connection handler.
///
/// Clones share the same set.
#[derive(Debug, Clone, Default)]
#[cfg_attr(feature = "bevy", derive(bevy::prelude::Resource))]
pub struct OnlinePlayers {
    players: Arc<RwLock<HashSet<PlayerId>>>,
}

impl OnlinePlayers {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns `false` if the player was already marked online.
    pub fn connect(&self, player: PlayerId) -> bool {
        self.players
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(player)
    }

    /// Returns `false` if the player was not online.
    pub fn disconnect(&self, player: &PlayerId) -> bool {
        self.players
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(player)
    }

    pub fn contains(&self, player: &PlayerId) -> bool {
        self.players
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .contains(player)
    }

    pub fn len(&self) -> usize {
        self.players
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl PresenceOracle for OnlinePlayers {
    fn is_online(&self, player: &PlayerId) -> Result<bool, OracleError> {
        Ok(self.contains(player))
    }
}

/// Resolves presence, treating a failed lookup as offline.
pub(crate) fn observed_online(presence: &dyn PresenceOracle, player: &PlayerId) -> bool {
    presence.is_online(player).unwrap_or_else(|err| {
        warn!(
            target: LOG_JOIN,
            %player,
            "Presence lookup failed, treating player as offline: {err}"
        );
        false
    })
}
