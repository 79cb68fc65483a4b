//! Orchestrator
//!
//! The [`Registry`] owns the backend, the declared action set and one [`Player`] per
//! backend slot. Each call to [`Registry::update`] is one tick:
//!
//! ```text
//! begin_tick ──► poll every slot once ──► for each player (slot order):
//!                                           evaluate ──► diff ──► dispatch
//! ```
//!
//! Everything runs on the caller's thread, to completion. Listeners must not block.

pub mod event;
pub mod player;

use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::config::EngineSettings;
use crate::controller::{poll_snapshot, InputBackend, RawSnapshot, SignalCatalog};
use crate::mapping::{ActionId, ActionSet, BindExpr, BindProfile, ConfigError, Configuration, ProfileError};

pub use event::{ActionEvent, ActionListener, ListenerId, ListenerList};
pub use player::{Player, PlayerTick};

#[derive(Debug, Error)]
pub enum EngineError {
    #[error("No player in slot {0}")]
    UnknownPlayer(usize),

    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Profile(#[from] ProfileError),
}

/// Summary of one tick.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TickReport {
    pub tick: u64,
    /// Actions whose value differs from the previous tick, over all players
    pub changes: usize,
    pub listener_calls: usize,
}

// Running totals for the periodic stats log
#[derive(Debug, Default)]
struct TickStats {
    ticks: u64,
    evaluations: usize,
    changes: usize,
    listener_calls: usize,
}

pub struct Registry<B: InputBackend> {
    backend: B,
    actions: Arc<ActionSet>,
    catalog: Arc<SignalCatalog>,
    settings: EngineSettings,
    players: Vec<Player>,
    // Registry-wide listeners, indexed by action position
    shared_listeners: Vec<ListenerList>,
    stats: TickStats,
    tick: u64,
}

impl<B: InputBackend> Registry<B> {
    pub fn create(actions: ActionSet, backend: B) -> Self {
        Self::with_settings(actions, backend, EngineSettings::default())
    }

    /// Builds one player per backend slot, each with a neutral configuration.
    pub fn with_settings(actions: ActionSet, backend: B, settings: EngineSettings) -> Self {
        let actions = Arc::new(actions);
        let catalog = Arc::new(backend.signals());
        let slots = backend.slot_count();

        info!(
            "Creating registry: {} actions, {} raw signals, {} player slots",
            actions.len(),
            catalog.len(),
            slots
        );

        let players = (0..slots)
            .map(|slot| {
                Player::new(
                    slot,
                    Configuration::new(Arc::clone(&actions), Arc::clone(&catalog)),
                )
            })
            .collect();
        let shared_listeners = actions.iter().map(|_| ListenerList::default()).collect();

        Self {
            backend,
            actions,
            catalog,
            settings,
            players,
            shared_listeners,
            stats: TickStats::default(),
            tick: 0,
        }
    }

    pub fn actions(&self) -> &Arc<ActionSet> {
        &self.actions
    }

    pub fn settings(&self) -> &EngineSettings {
        &self.settings
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    pub fn backend_mut(&mut self) -> &mut B {
        &mut self.backend
    }

    /// A fresh, all-neutral configuration for this registry's actions and signals.
    pub fn configuration(&self) -> Configuration {
        Configuration::new(Arc::clone(&self.actions), Arc::clone(&self.catalog))
    }

    pub fn player(&self, slot: usize) -> Option<&Player> {
        self.players.get(slot)
    }

    pub fn player_mut(&mut self, slot: usize) -> Option<&mut Player> {
        self.players.get_mut(slot)
    }

    pub fn players(&self) -> &[Player] {
        &self.players
    }

    pub fn player_count(&self) -> usize {
        self.players.len()
    }

    pub fn configure(&mut self, slot: usize, configuration: Configuration) -> Result<(), EngineError> {
        let player = self
            .players
            .get_mut(slot)
            .ok_or(EngineError::UnknownPlayer(slot))?;
        player.set_configuration(configuration)?;
        Ok(())
    }

    pub fn bind(&mut self, slot: usize, action: ActionId, expr: BindExpr) -> Result<(), EngineError> {
        let player = self
            .players
            .get_mut(slot)
            .ok_or(EngineError::UnknownPlayer(slot))?;
        player.bind(action, expr)?;
        Ok(())
    }

    /// Replaces a player's configuration with the one described by `profile`.
    pub fn apply_profile(&mut self, slot: usize, profile: &BindProfile) -> Result<(), EngineError> {
        let base = self.configuration();
        let configuration = profile.apply(&base)?;
        self.configure(slot, configuration)?;
        info!("Applied profile {:?} to player {}", profile.name, slot);
        Ok(())
    }

    /// Listener fired when `action` changes for any player.
    pub fn add_listener<F>(&mut self, action: ActionId, listener: F) -> Option<ListenerId>
    where
        F: FnMut(&ActionEvent<'_>) + 'static,
    {
        self.add_handler(action, listener)
    }

    pub fn add_handler<L: ActionListener + 'static>(
        &mut self,
        action: ActionId,
        listener: L,
    ) -> Option<ListenerId> {
        let position = self.actions.position(action)?;
        Some(self.shared_listeners[position].add(listener))
    }

    pub fn remove_listener(&mut self, action: ActionId, id: ListenerId) -> bool {
        match self.actions.position(action) {
            Some(position) => self.shared_listeners[position].remove(id),
            None => false,
        }
    }

    /// Runs one tick. Backend faults are absorbed, so this never fails.
    pub fn update(&mut self) -> TickReport {
        self.tick += 1;

        if let Err(e) = self.backend.begin_tick() {
            warn!("Backend failed to start tick {}: {}", self.tick, e);
        }

        let snapshots: Vec<RawSnapshot> = (0..self.players.len())
            .map(|slot| poll_snapshot(&mut self.backend, slot, &self.catalog, &self.settings))
            .collect();

        let mut report = TickReport {
            tick: self.tick,
            ..TickReport::default()
        };

        for (player, snapshot) in self.players.iter_mut().zip(snapshots.iter()) {
            let result = player.update(snapshot, &self.shared_listeners);
            self.stats.evaluations += result.evaluated;
            report.changes += result.changes;
            report.listener_calls += result.listener_calls;
        }

        if report.changes > 0 {
            debug!(
                "Tick {}: {} changes, {} listener calls",
                report.tick, report.changes, report.listener_calls
            );
        }

        self.stats.ticks += 1;
        self.stats.changes += report.changes;
        self.stats.listener_calls += report.listener_calls;
        self.log_stats_if_due();

        report
    }

    fn log_stats_if_due(&mut self) {
        let interval = self.settings.stats_interval_ticks;
        if interval == 0 || self.stats.ticks < interval {
            return;
        }
        info!(
            "Registry stats: {} ticks, {} evaluations, {} changes, {} listener calls",
            self.stats.ticks, self.stats.evaluations, self.stats.changes, self.stats.listener_calls
        );
        self.stats = TickStats::default();
    }
}
