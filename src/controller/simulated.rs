//! In-memory backend whose readings are set by the owner.
//!
//! Every instance owns its own state, so tests can run side by side without sharing anything.

use std::collections::HashMap;
use tracing::debug;

use super::{BackendError, InputBackend, RawAnalog1, RawAnalog2, RawDigital, SignalCatalog};

#[derive(Debug, Clone, Default)]
struct SlotState {
    digital: HashMap<RawDigital, bool>,
    analog1: HashMap<RawAnalog1, f32>,
    analog2: HashMap<RawAnalog2, (f32, f32)>,
    disconnected: bool,
}

#[derive(Debug, Clone)]
pub struct SimulatedBackend {
    slots: Vec<SlotState>,
    catalog: SignalCatalog,
    ticks: u64,
    polls: u64,
}

impl SimulatedBackend {
    pub fn new(slot_count: usize) -> Self {
        debug!("Creating simulated backend with {} slots", slot_count);
        Self {
            slots: vec![SlotState::default(); slot_count],
            catalog: SignalCatalog::all(),
            ticks: 0,
            polls: 0,
        }
    }

    /// Restricts the signals this backend reports as supported.
    pub fn with_catalog(mut self, catalog: SignalCatalog) -> Self {
        self.catalog = catalog;
        self
    }

    pub fn set_digital(&mut self, slot: usize, id: RawDigital, pressed: bool) {
        if let Some(state) = self.slots.get_mut(slot) {
            state.digital.insert(id, pressed);
        }
    }

    pub fn set_analog1(&mut self, slot: usize, id: RawAnalog1, value: f32) {
        if let Some(state) = self.slots.get_mut(slot) {
            state.analog1.insert(id, value);
        }
    }

    pub fn set_analog2(&mut self, slot: usize, id: RawAnalog2, x: f32, y: f32) {
        if let Some(state) = self.slots.get_mut(slot) {
            state.analog2.insert(id, (x, y));
        }
    }

    /// A disconnected slot fails every poll.
    pub fn set_connected(&mut self, slot: usize, connected: bool) {
        if let Some(state) = self.slots.get_mut(slot) {
            state.disconnected = !connected;
        }
    }

    /// Number of `begin_tick` calls seen so far.
    pub fn ticks(&self) -> u64 {
        self.ticks
    }

    /// Number of individual signal polls seen so far.
    pub fn polls(&self) -> u64 {
        self.polls
    }

    fn slot(&mut self, slot: usize) -> Result<&SlotState, BackendError> {
        self.polls += 1;
        match self.slots.get(slot) {
            Some(state) if !state.disconnected => Ok(state),
            _ => Err(BackendError::Disconnected(slot)),
        }
    }
}

impl InputBackend for SimulatedBackend {
    fn slot_count(&self) -> usize {
        self.slots.len()
    }

    fn signals(&self) -> SignalCatalog {
        self.catalog.clone()
    }

    fn begin_tick(&mut self) -> Result<(), BackendError> {
        self.ticks += 1;
        Ok(())
    }

    fn poll_digital(&mut self, slot: usize, id: RawDigital) -> Result<bool, BackendError> {
        let state = self.slot(slot)?;
        Ok(state.digital.get(&id).copied().unwrap_or(false))
    }

    fn poll_analog1(&mut self, slot: usize, id: RawAnalog1) -> Result<f32, BackendError> {
        let state = self.slot(slot)?;
        Ok(state.analog1.get(&id).copied().unwrap_or(0.0))
    }

    fn poll_analog2(&mut self, slot: usize, id: RawAnalog2) -> Result<(f32, f32), BackendError> {
        let state = self.slot(slot)?;
        Ok(state.analog2.get(&id).copied().unwrap_or((0.0, 0.0)))
    }
}
