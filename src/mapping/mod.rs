//! Action mapping
//!
//! Turns raw controller signals into typed action values:
//!
//! ```text
//! ActionSet ──declares──► ActionId (category + index)
//!                             │
//! BindExpr ──check──► Binding ┴──► Configuration (one binding per action)
//!                                        │
//! RawSnapshot + previous value ──evaluate┘──► Value
//! ```
//!
//! Bindings are type-checked when they are installed, so evaluation itself cannot fail.

pub mod action;
pub mod configuration;
pub mod error;
pub mod eval;
pub mod expr;
pub mod profile;
pub mod value;

pub use action::{ActionId, ActionSet, ActionSetBuilder};
pub use configuration::Configuration;
pub use error::ConfigError;
pub use eval::Binding;
pub use expr::BindExpr;
pub use profile::{BindProfile, ProfileEntry, ProfileError};
pub use value::{Axis, Category, Value};
