//! Permission-derived join priority and command tiers.
//!
//! The host's permission system is reached through [`PermissionOracle`]. The
//! oracle only answers "does this player hold that capability?"; everything
//! else (level scan, bypass resolution, command tier) is derived here.

use std::collections::{HashMap, HashSet};
use std::sync::{Arc, PoisonError, RwLock};

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::admin::CommandSender;
use crate::error::OracleError;
use crate::registry::BypassRegistry;
use crate::{LOG_JOIN, PlayerId};

/// Capability a player can hold in the host permission system.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Permission {
    /// May always join a full server.
    Bypass,
    /// Join priority of exactly this level.
    Level(u32),
    /// Unlimited join priority; implies a permanent bypass.
    HighestLevel,
    /// May query join information.
    CommandInfo,
    /// May grant and revoke temporary bypasses.
    CommandManage,
}

/// Answers capability lookups for players.
pub trait PermissionOracle: Send + Sync {
    fn has_permission(&self, player: &PlayerId, permission: Permission)
    -> Result<bool, OracleError>;
}

impl<F> PermissionOracle for F
where
    F: Fn(&PlayerId, Permission) -> bool + Send + Sync,
{
    fn has_permission(
        &self,
        player: &PlayerId,
        permission: Permission,
    ) -> Result<bool, OracleError> {
        Ok(self(player, permission))
    }
}

/// In-memory permission assignments. Clones share the same table.
#[derive(Debug, Clone, Default)]
pub struct PermissionTable {
    entries: Arc<RwLock<HashMap<PlayerId, HashSet<Permission>>>>,
}

impl PermissionTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn allow(&self, player: PlayerId, permission: Permission) {
        self.entries
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .entry(player)
            .or_default()
            .insert(permission);
    }

    pub fn deny(&self, player: &PlayerId, permission: Permission) {
        let mut entries = self.entries.write().unwrap_or_else(PoisonError::into_inner);
        if let Some(held) = entries.get_mut(player) {
            held.remove(&permission);
            if held.is_empty() {
                entries.remove(player);
            }
        }
    }
}

impl PermissionOracle for PermissionTable {
    fn has_permission(
        &self,
        player: &PlayerId,
        permission: Permission,
    ) -> Result<bool, OracleError> {
        Ok(self
            .entries
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(player)
            .is_some_and(|held| held.contains(&permission)))
    }
}

/// Join priority of a player. `Unlimited` orders above every level.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Priority {
    Level(u32),
    Unlimited,
}

impl Priority {
    pub fn is_unlimited(self) -> bool {
        matches!(self, Priority::Unlimited)
    }
}

impl Default for Priority {
    fn default() -> Self {
        Priority::Level(0)
    }
}

/// Bypass that currently applies to a player.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum BypassStatus {
    /// Bypass or unlimited-priority permission held.
    Permanent,
    /// A temporary grant exists in the registry.
    Temporary,
    NotAvailable,
}

impl BypassStatus {
    pub fn can_bypass(self) -> bool {
        !matches!(self, BypassStatus::NotAvailable)
    }
}

/// Authorization tier for administrative operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum CommandPermission {
    None,
    Info,
    Manage,
}

/// Derives priorities and statuses from a [`PermissionOracle`].
#[derive(Clone)]
pub struct PriorityOracle {
    permissions: Arc<dyn PermissionOracle>,
    max_level: u32,
}

impl PriorityOracle {
    pub fn new(permissions: Arc<dyn PermissionOracle>, max_level: u32) -> Self {
        Self {
            permissions,
            max_level,
        }
    }

    pub fn max_level(&self) -> u32 {
        self.max_level
    }

    /// Scans levels from `max_level` down to 0 and returns the first one held.
    pub fn priority_of(&self, player: &PlayerId) -> Priority {
        if self.holds(player, Permission::HighestLevel) {
            return Priority::Unlimited;
        }

        (0..=self.max_level)
            .rev()
            .find(|level| self.holds(player, Permission::Level(*level)))
            .map(Priority::Level)
            .unwrap_or_default()
    }

    pub fn has_permanent_bypass(&self, player: &PlayerId) -> bool {
        self.holds(player, Permission::Bypass) || self.priority_of(player).is_unlimited()
    }

    /// Permanent bypass wins over any temporary record.
    pub fn bypass_status(&self, player: &PlayerId, registry: &BypassRegistry) -> BypassStatus {
        if self.has_permanent_bypass(player) {
            BypassStatus::Permanent
        } else if registry.has(player) {
            BypassStatus::Temporary
        } else {
            BypassStatus::NotAvailable
        }
    }

    pub fn command_permission(&self, sender: &CommandSender) -> CommandPermission {
        let player = match sender {
            CommandSender::Console => return CommandPermission::Manage,
            CommandSender::Player(player) => player,
        };

        if self.holds(player, Permission::CommandManage) {
            CommandPermission::Manage
        } else if self.holds(player, Permission::CommandInfo) {
            CommandPermission::Info
        } else {
            CommandPermission::None
        }
    }

    fn holds(&self, player: &PlayerId, permission: Permission) -> bool {
        match self.permissions.has_permission(player, permission) {
            Ok(held) => held,
            Err(err) => {
                warn!(
                    target: LOG_JOIN,
                    %player,
                    ?permission,
                    "Permission lookup failed, treating as not held: {err}"
                );
                false
            }
        }
    }
}

impl std::fmt::Debug for PriorityOracle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PriorityOracle")
            .field("max_level", &self.max_level)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    fn oracle_with(table: &PermissionTable) -> PriorityOracle {
        PriorityOracle::new(Arc::new(table.clone()), 10)
    }

    #[test]
    fn test_priority_picks_highest_held_level() {
        let table = PermissionTable::new();
        let player = Uuid::new_v4();
        table.allow(player, Permission::Level(3));
        table.allow(player, Permission::Level(7));

        assert_eq!(oracle_with(&table).priority_of(&player), Priority::Level(7));
    }

    #[test]
    fn test_priority_defaults_to_zero() {
        let table = PermissionTable::new();
        assert_eq!(
            oracle_with(&table).priority_of(&Uuid::new_v4()),
            Priority::Level(0)
        );
    }

    #[test]
    fn test_priority_ignores_levels_above_max() {
        let table = PermissionTable::new();
        let player = Uuid::new_v4();
        table.allow(player, Permission::Level(11));
        table.allow(player, Permission::Level(2));

        assert_eq!(oracle_with(&table).priority_of(&player), Priority::Level(2));
    }

    #[test]
    fn test_highest_level_is_unlimited_regardless_of_levels() {
        let table = PermissionTable::new();
        let player = Uuid::new_v4();
        table.allow(player, Permission::Level(10));
        table.allow(player, Permission::HighestLevel);

        let oracle = oracle_with(&table);
        assert_eq!(oracle.priority_of(&player), Priority::Unlimited);
        assert!(oracle.has_permanent_bypass(&player));
    }

    #[test]
    fn test_unlimited_orders_above_levels() {
        assert!(Priority::Unlimited > Priority::Level(u32::MAX));
        assert!(Priority::Level(7) > Priority::Level(3));
    }

    #[test]
    fn test_status_prefers_permanent_over_temporary() {
        let table = PermissionTable::new();
        let registry = BypassRegistry::new();
        let player = Uuid::new_v4();
        registry.grant(player, 60, 0);

        let oracle = oracle_with(&table);
        assert_eq!(
            oracle.bypass_status(&player, &registry),
            BypassStatus::Temporary
        );

        table.allow(player, Permission::Bypass);
        assert_eq!(
            oracle.bypass_status(&player, &registry),
            BypassStatus::Permanent
        );
    }

    #[test]
    fn test_status_not_available_without_grant() {
        let table = PermissionTable::new();
        let oracle = oracle_with(&table);
        assert_eq!(
            oracle.bypass_status(&Uuid::new_v4(), &BypassRegistry::new()),
            BypassStatus::NotAvailable
        );
    }

    #[test]
    fn test_command_permission_manage_wins() {
        let table = PermissionTable::new();
        let player = Uuid::new_v4();
        let sender = CommandSender::Player(player);
        let oracle = oracle_with(&table);

        assert_eq!(oracle.command_permission(&sender), CommandPermission::None);
        table.allow(player, Permission::CommandInfo);
        assert_eq!(oracle.command_permission(&sender), CommandPermission::Info);
        table.allow(player, Permission::CommandManage);
        assert_eq!(oracle.command_permission(&sender), CommandPermission::Manage);
        assert_eq!(
            oracle.command_permission(&CommandSender::Console),
            CommandPermission::Manage
        );
    }

    #[test]
    fn test_failing_oracle_is_treated_as_not_held() {
        struct Offline;
        impl PermissionOracle for Offline {
            fn has_permission(
                &self,
                _player: &PlayerId,
                _permission: Permission,
            ) -> Result<bool, OracleError> {
                Err(OracleError::Unavailable("backend down".into()))
            }
        }

        let oracle = PriorityOracle::new(Arc::new(Offline), 10);
        let player = Uuid::new_v4();
        assert_eq!(oracle.priority_of(&player), Priority::Level(0));
        assert!(!oracle.has_permanent_bypass(&player));
        assert_eq!(
            oracle.command_permission(&CommandSender::Player(player)),
            CommandPermission::None
        );
    }

    #[test]
    fn test_closure_oracle() {
        let oracle = PriorityOracle::new(
            Arc::new(|_: &PlayerId, permission: Permission| permission == Permission::Level(4)),
            10,
        );
        assert_eq!(oracle.priority_of(&Uuid::new_v4()), Priority::Level(4));
    }

    #[test]
    fn test_deny_removes_permission() {
        let table = PermissionTable::new();
        let player = Uuid::new_v4();
        table.allow(player, Permission::Bypass);
        table.deny(&player, Permission::Bypass);
        assert_eq!(table.has_permission(&player, Permission::Bypass), Ok(false));
    }
}
