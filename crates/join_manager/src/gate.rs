//! Join decision surface consulted by the connection handler.

use std::sync::Arc;
use std::time::Duration;

use crate::admin::{CommandSender, JoinInfo};
use crate::clock::Clock;
use crate::permissions::{
    BypassStatus, CommandPermission, PermissionOracle, Priority, PriorityOracle,
};
use crate::presence::PresenceOracle;
use crate::registry::{BypassRegistry, SweepReport, TempBypass};
use crate::settings::JoinSettings;
use crate::PlayerId;

/// Combines permission-derived priorities with the temporary bypass registry.
///
/// Nothing is cached: every query reads the current permissions and the
/// current registry contents. Clones share the registry.
#[derive(Clone)]
#[cfg_attr(feature = "bevy", derive(bevy::prelude::Resource))]
pub struct JoinGate {
    priorities: PriorityOracle,
    registry: BypassRegistry,
    clock: Arc<dyn Clock>,
}

impl JoinGate {
    pub fn new(
        settings: &JoinSettings,
        permissions: Arc<dyn PermissionOracle>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self::with_registry(settings, permissions, clock, BypassRegistry::new())
    }

    pub fn with_registry(
        settings: &JoinSettings,
        permissions: Arc<dyn PermissionOracle>,
        clock: Arc<dyn Clock>,
        registry: BypassRegistry,
    ) -> Self {
        Self {
            priorities: PriorityOracle::new(permissions, settings.max_level),
            registry,
            clock,
        }
    }

    /// Bypass that applies to the player right now.
    pub fn status_of(&self, player: &PlayerId) -> BypassStatus {
        self.priorities.bypass_status(player, &self.registry)
    }

    pub fn priority_of(&self, player: &PlayerId) -> Priority {
        self.priorities.priority_of(player)
    }

    pub fn command_permission(&self, sender: &CommandSender) -> CommandPermission {
        self.priorities.command_permission(sender)
    }

    /// Grants a one-time bypass valid for `duration` from now.
    pub fn grant(&self, player: PlayerId, duration: Duration) -> TempBypass {
        self.registry
            .grant(player, duration.as_secs(), self.clock.now_epoch_secs())
    }

    pub fn revoke(&self, player: &PlayerId) -> Option<TempBypass> {
        self.registry.revoke(player)
    }

    pub fn has(&self, player: &PlayerId) -> bool {
        self.registry.has(player)
    }

    pub fn temp_bypass(&self, player: &PlayerId) -> Option<TempBypass> {
        self.registry.get(player)
    }

    /// Runs one cleanup pass at the current time.
    pub fn sweep_once(&self, presence: &dyn PresenceOracle) -> SweepReport {
        self.registry
            .sweep_once(self.clock.now_epoch_secs(), presence)
    }

    pub fn join_info(&self, player: PlayerId) -> JoinInfo {
        JoinInfo {
            player,
            priority: self.priority_of(&player),
            status: self.status_of(&player),
            temp_bypass: self.temp_bypass(&player),
        }
    }

    pub fn registry(&self) -> &BypassRegistry {
        &self.registry
    }

    pub fn now_epoch_secs(&self) -> u64 {
        self.clock.now_epoch_secs()
    }
}

impl std::fmt::Debug for JoinGate {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("JoinGate")
            .field("priorities", &self.priorities)
            .field("registry", &self.registry)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::ManualClock;
    use crate::permissions::{Permission, PermissionTable};
    use crate::presence::OnlinePlayers;
    use uuid::Uuid;

    fn gate() -> (JoinGate, PermissionTable, ManualClock) {
        let table = PermissionTable::new();
        let clock = ManualClock::new(0);
        let gate = JoinGate::new(
            &JoinSettings::default(),
            Arc::new(table.clone()),
            Arc::new(clock.clone()),
        );
        (gate, table, clock)
    }

    #[test]
    fn test_grant_uses_clock() {
        let (gate, _, clock) = gate();
        let player = Uuid::new_v4();
        clock.set(1_000);

        let record = gate.grant(player, Duration::from_secs(60));
        assert_eq!(record.granted_at, 1_000);
        assert_eq!(record.expires_at, 1_060);
        assert!(gate.has(&player));
        assert_eq!(gate.status_of(&player), BypassStatus::Temporary);
    }

    #[test]
    fn test_status_reflects_permission_changes_without_caching() {
        let (gate, table, _) = gate();
        let player = Uuid::new_v4();

        assert_eq!(gate.status_of(&player), BypassStatus::NotAvailable);
        table.allow(player, Permission::HighestLevel);
        assert_eq!(gate.status_of(&player), BypassStatus::Permanent);
        table.deny(&player, Permission::HighestLevel);
        assert_eq!(gate.status_of(&player), BypassStatus::NotAvailable);
    }

    #[test]
    fn test_sweep_uses_clock() {
        let (gate, _, clock) = gate();
        let offline = OnlinePlayers::new();
        let player = Uuid::new_v4();
        gate.grant(player, Duration::from_secs(60));

        clock.set(60);
        assert!(gate.sweep_once(&offline).is_noop());
        clock.set(61);
        assert_eq!(gate.sweep_once(&offline).removed.len(), 1);
        assert_eq!(gate.status_of(&player), BypassStatus::NotAvailable);
    }

    #[test]
    fn test_join_info() {
        let (gate, table, _) = gate();
        let player = Uuid::new_v4();
        table.allow(player, Permission::Level(5));
        let record = gate.grant(player, Duration::from_secs(30));

        let info = gate.join_info(player);
        assert_eq!(info.priority, Priority::Level(5));
        assert_eq!(info.status, BypassStatus::Temporary);
        assert_eq!(info.temp_bypass, Some(record));
    }

    #[test]
    fn test_clones_share_registry() {
        let (gate, _, _) = gate();
        let other = gate.clone();
        let player = Uuid::new_v4();
        gate.grant(player, Duration::from_secs(10));
        assert!(other.has(&player));
        assert!(other.revoke(&player).is_some());
        assert!(!gate.has(&player));
    }
}
