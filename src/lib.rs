//! padbind
//!
//! Binds gamepad inputs to game actions through small typed expression trees and
//! notifies listeners when an action's value changes between ticks.

pub mod config;
pub mod controller;
pub mod engine;
pub mod mapping;

/// Everything needed to declare actions, bind them and run the registry.
pub mod prelude {
    pub use crate::config::EngineSettings;
    pub use crate::controller::{
        InputBackend, RawAnalog1, RawAnalog2, RawDigital, RawSignal, SimulatedBackend,
    };
    pub use crate::engine::{ActionEvent, ActionListener, EngineError, Player, Registry, TickReport};
    pub use crate::mapping::expr::{
        add, branch, constant, digital_to_axis, input, join, multiply, negate, previous_state,
        split, threshold, xor,
    };
    pub use crate::mapping::{
        ActionId, ActionSet, Axis, BindExpr, BindProfile, Category, ConfigError, Configuration,
        Value,
    };
}
