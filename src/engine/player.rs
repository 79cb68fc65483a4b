//! Player state and the evaluate/diff/dispatch step.

use std::sync::Arc;
use tracing::{debug, trace, warn};

use crate::controller::{RawSnapshot, SignalCatalog};
use crate::engine::event::{dispatch, ActionEvent, ActionListener, ListenerId, ListenerList};
use crate::mapping::{ActionId, ActionSet, BindExpr, ConfigError, Configuration, Value};

struct ActionState {
    value: Value,
    listeners: ListenerList,
}

/// Counters for one player's pass over its actions.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PlayerTick {
    pub evaluated: usize,
    pub changes: usize,
    pub listener_calls: usize,
}

/// One logical player: a configuration plus the last resolved value and listeners per action.
pub struct Player {
    slot: usize,
    actions: Arc<ActionSet>,
    catalog: Arc<SignalCatalog>,
    configuration: Configuration,
    // Dense, in evaluation order
    states: Vec<ActionState>,
}

impl Player {
    pub(crate) fn new(slot: usize, configuration: Configuration) -> Self {
        let actions = Arc::clone(configuration.actions());
        let catalog = Arc::clone(configuration.catalog());
        let states = actions
            .iter()
            .map(|action| ActionState {
                value: action.category().neutral(),
                listeners: ListenerList::default(),
            })
            .collect();
        Self {
            slot,
            actions,
            catalog,
            configuration,
            states,
        }
    }

    pub fn slot(&self) -> usize {
        self.slot
    }

    pub fn actions(&self) -> &Arc<ActionSet> {
        &self.actions
    }

    pub fn configuration(&self) -> &Configuration {
        &self.configuration
    }

    /// Swaps in a whole configuration. It takes effect on the next tick.
    ///
    /// A configuration built against another signal catalogue is re-checked against this
    /// player's backend signals first.
    pub fn set_configuration(&mut self, mut configuration: Configuration) -> Result<(), ConfigError> {
        if configuration.actions() != &self.actions {
            warn!("Player {} rejected a configuration for another action set", self.slot);
            return Err(ConfigError::ForeignActionSet);
        }
        if configuration.catalog() != &self.catalog {
            configuration.rebase(Arc::clone(&self.catalog))?;
        }
        debug!("Player {} installed a new configuration", self.slot);
        self.configuration = configuration;
        Ok(())
    }

    /// Binds a single action in this player's configuration.
    pub fn bind(&mut self, action: ActionId, expr: BindExpr) -> Result<(), ConfigError> {
        self.configuration.bind(action, expr)
    }

    /// Current value of `action`, `None` if the action is not declared.
    ///
    /// Before the first tick, and for unbound actions, this is the neutral value.
    pub fn state(&self, action: ActionId) -> Option<Value> {
        self.actions
            .position(action)
            .map(|position| self.states[position].value)
    }

    pub fn digital(&self, action: ActionId) -> Option<bool> {
        self.state(action).and_then(|v| v.as_bool())
    }

    pub fn analog1(&self, action: ActionId) -> Option<f32> {
        self.state(action).and_then(|v| v.as_scalar())
    }

    pub fn analog2(&self, action: ActionId) -> Option<(f32, f32)> {
        self.state(action).and_then(|v| v.as_vec2())
    }

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
        Some(self.states[position].listeners.add(listener))
    }

    pub fn remove_listener(&mut self, action: ActionId, id: ListenerId) -> bool {
        match self.actions.position(action) {
            Some(position) => self.states[position].listeners.remove(id),
            None => false,
        }
    }

    pub fn listener_count(&self, action: ActionId) -> Option<usize> {
        self.actions
            .position(action)
            .map(|position| self.states[position].listeners.len())
    }

    /// Evaluates every binding in order, stores changed values and notifies listeners.
    ///
    /// `shared` holds the registry-wide listeners, indexed like this player's actions;
    /// they run after the player's own listeners.
    pub(crate) fn update(&mut self, snapshot: &RawSnapshot, shared: &[ListenerList]) -> PlayerTick {
        let mut tick = PlayerTick::default();

        for (position, (action, binding)) in self.configuration.iter().enumerate() {
            let previous = self.states[position].value;
            let value = binding.evaluate(snapshot, previous);
            tick.evaluated += 1;

            if value == previous {
                continue;
            }

            trace!(
                "Player {} {}: {} -> {}",
                self.slot,
                self.actions.describe(action),
                previous,
                value
            );
            self.states[position].value = value;
            tick.changes += 1;

            let mut listeners = self.states[position].listeners.snapshot();
            if let Some(list) = shared.get(position) {
                listeners.extend(list.snapshot());
            }
            if listeners.is_empty() {
                continue;
            }

            let event = ActionEvent {
                action,
                player: &*self,
                value,
            };
            tick.listener_calls += dispatch(&listeners, &event);
        }

        tick
    }
}
