#![cfg(feature = "bevy")]
//! Bevy integration: runs the bypass sweep from the app's `Update` schedule.

use std::time::Duration;

use ::bevy::prelude::*;

use crate::gate::JoinGate;
use crate::presence::OnlinePlayers;
use crate::registry::SweepReport;
use crate::settings::JoinSettings;

/// Inserts the [`JoinGate`] and [`OnlinePlayers`] resources and sweeps the
/// registry on a repeating timer.
///
/// The host's connection systems are expected to keep [`OnlinePlayers`] in
/// sync and to consult [`JoinGate::status_of`] before admitting a client.
pub struct JoinManagerPlugin {
    settings: JoinSettings,
    gate: JoinGate,
    online: OnlinePlayers,
}

impl JoinManagerPlugin {
    pub fn new(settings: JoinSettings, gate: JoinGate, online: OnlinePlayers) -> Self {
        Self {
            settings,
            gate,
            online,
        }
    }
}

impl Plugin for JoinManagerPlugin {
    fn build(&self, app: &mut App) {
        app.insert_resource(self.gate.clone())
            .insert_resource(self.online.clone())
            .insert_resource(BypassCleanupTimer::new(&self.settings))
            .add_systems(Update, sweep_temp_bypasses);
    }
}

/// Repeating timer driving the sweep.
#[derive(Resource, Debug)]
pub struct BypassCleanupTimer(Timer);

impl BypassCleanupTimer {
    /// The first sweep fires after the initial delay, later ones after the
    /// full interval.
    pub fn new(settings: &JoinSettings) -> Self {
        let interval = settings.cleanup_interval();
        let mut timer = Timer::new(interval, TimerMode::Repeating);
        timer.set_elapsed(interval.saturating_sub(settings.cleanup_initial_delay()));
        Self(timer)
    }
}

/// Advances the timer and sweeps once if it elapsed.
pub fn tick_cleanup(
    timer: &mut BypassCleanupTimer,
    delta: Duration,
    gate: &JoinGate,
    online: &OnlinePlayers,
) -> Option<SweepReport> {
    if timer.0.tick(delta).just_finished() {
        Some(gate.sweep_once(online))
    } else {
        None
    }
}

fn sweep_temp_bypasses(
    time: Res<Time>,
    mut timer: ResMut<BypassCleanupTimer>,
    gate: Res<JoinGate>,
    online: Res<OnlinePlayers>,
) {
    tick_cleanup(&mut timer, time.delta(), &gate, &online);
}
