//! In-memory store of temporary join bypasses.
//!
//! Each player holds at most one [`TempBypass`]. Records are only removed by
//! [`BypassRegistry::sweep_once`], by an explicit revoke, or when the registry
//! is cleared at shutdown.

use std::collections::HashMap;
use std::sync::{
    Arc, Mutex, MutexGuard, PoisonError,
    atomic::{AtomicU64, Ordering},
};

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::presence::{PresenceOracle, observed_online};
use crate::{LOG_JOIN, PlayerId};

/// One-time, time-limited permission to join a full server.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TempBypass {
    pub granted_to: PlayerId,
    /// Epoch seconds at which the grant was issued.
    pub granted_at: u64,
    /// Epoch seconds after which an unused grant is dropped.
    pub expires_at: u64,
    /// Set once the holder has been seen online.
    pub consumed: bool,
    /// Distinguishes successive grants for the same player.
    #[serde(skip)]
    revision: u64,
}

impl TempBypass {
    pub fn is_expired(&self, now: u64) -> bool {
        now > self.expires_at
    }

    pub fn remaining_secs(&self, now: u64) -> u64 {
        self.expires_at.saturating_sub(now)
    }
}

/// Why the sweep dropped a record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RemovalReason {
    /// Consumed grant whose holder went offline.
    Disconnected,
    /// Unused grant past its expiry.
    Expired,
}

/// Outcome of a single sweep.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SweepReport {
    pub examined: usize,
    pub consumed: Vec<PlayerId>,
    pub removed: Vec<(PlayerId, RemovalReason)>,
}

impl SweepReport {
    pub fn is_noop(&self) -> bool {
        self.consumed.is_empty() && self.removed.is_empty()
    }
}

#[derive(Clone, Copy)]
enum SweepAction {
    MarkConsumed,
    Remove(RemovalReason),
}

/// Shared handle to the bypass records. Clones refer to the same map.
#[derive(Debug, Clone, Default)]
pub struct BypassRegistry {
    records: Arc<Mutex<HashMap<PlayerId, TempBypass>>>,
    revisions: Arc<AtomicU64>,
}

impl BypassRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts a fresh grant, replacing any previous one for the player.
    pub fn grant(&self, player: PlayerId, duration_secs: u64, now: u64) -> TempBypass {
        let record = TempBypass {
            granted_to: player,
            granted_at: now,
            expires_at: now.saturating_add(duration_secs),
            consumed: false,
            revision: self.revisions.fetch_add(1, Ordering::Relaxed),
        };

        let previous = self.lock().insert(player, record);
        debug!(
            target: LOG_JOIN,
            %player,
            expires_at = record.expires_at,
            replaced = previous.is_some(),
            "Granted temporary join bypass"
        );
        record
    }

    pub fn has(&self, player: &PlayerId) -> bool {
        self.lock().contains_key(player)
    }

    pub fn get(&self, player: &PlayerId) -> Option<TempBypass> {
        self.lock().get(player).copied()
    }

    /// Removes the player's grant. Returns the removed record, if any.
    pub fn revoke(&self, player: &PlayerId) -> Option<TempBypass> {
        let removed = self.lock().remove(player);
        if removed.is_some() {
            debug!(target: LOG_JOIN, %player, "Revoked temporary join bypass");
        }
        removed
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    /// Point-in-time copy of all records.
    pub fn snapshot(&self) -> Vec<TempBypass> {
        self.lock().values().copied().collect()
    }

    /// Drops every record. Returns how many were removed.
    pub fn clear(&self) -> usize {
        let mut records = self.lock();
        let count = records.len();
        records.clear();
        count
    }

    /// Advances every record by one step of its lifecycle.
    ///
    /// Works on a snapshot so that presence lookups run without holding the
    /// lock. A decision is only applied if the live record is still the one
    /// that was examined; a grant or revoke issued in the meantime wins.
    pub fn sweep_once(&self, now: u64, presence: &dyn PresenceOracle) -> SweepReport {
        let snapshot = self.snapshot();
        let mut report = SweepReport {
            examined: snapshot.len(),
            ..SweepReport::default()
        };

        for record in snapshot {
            let online = observed_online(presence, &record.granted_to);
            let action = match (record.consumed, online) {
                (true, true) => continue,
                (true, false) => SweepAction::Remove(RemovalReason::Disconnected),
                (false, true) => SweepAction::MarkConsumed,
                (false, false) if record.is_expired(now) => {
                    SweepAction::Remove(RemovalReason::Expired)
                }
                (false, false) => continue,
            };

            let player = record.granted_to;
            let applied = {
                let mut records = self.lock();
                let unchanged = records.get(&player) == Some(&record);
                if unchanged {
                    match action {
                        SweepAction::MarkConsumed => {
                            if let Some(current) = records.get_mut(&player) {
                                current.consumed = true;
                            }
                        }
                        SweepAction::Remove(_) => {
                            records.remove(&player);
                        }
                    }
                }
                unchanged
            };

            if !applied {
                debug!(
                    target: LOG_JOIN,
                    %player,
                    "Bypass record changed during sweep, skipping"
                );
                continue;
            }

            match action {
                SweepAction::MarkConsumed => {
                    debug!(target: LOG_JOIN, %player, "Temporary join bypass consumed");
                    report.consumed.push(player);
                }
                SweepAction::Remove(reason) => {
                    debug!(
                        target: LOG_JOIN,
                        %player,
                        ?reason,
                        "Removed temporary join bypass"
                    );
                    report.removed.push((player, reason));
                }
            }
        }

        if !report.is_noop() {
            info!(
                target: LOG_JOIN,
                "Bypass sweep: {} examined, {} consumed, {} removed",
                report.examined,
                report.consumed.len(),
                report.removed.len()
            );
        }
        report
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<PlayerId, TempBypass>> {
        // A panic mid-operation cannot leave the map structurally invalid.
        self.records.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
