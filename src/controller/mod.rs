//! Raw input side of the pipeline
//!
//! A backend exposes the current readings of physical signals for each player slot.
//! Once per tick the orchestrator pumps the backend and reads every catalogued signal
//! through [`poll_snapshot`], which is also where read faults are absorbed:
//!
//! ```text
//! Backend ──► poll_snapshot ──► RawSnapshot (per slot)
//!             (errors → neutral, NaN → neutral, clamp)
//! ```
//!
//! Nothing past this boundary ever sees a backend error.

pub mod raw;
pub mod simulated;

#[cfg(feature = "gilrs")]
pub mod gilrs_backend;

use std::collections::{BTreeMap, BTreeSet};
use tracing::{debug, warn};

use crate::config::{EngineSettings, DEFAULT_ANALOG_LIMIT};
use crate::mapping::Value;

pub use raw::{RawAnalog1, RawAnalog2, RawDigital, RawSignal};
pub use simulated::SimulatedBackend;

#[cfg(feature = "gilrs")]
pub use gilrs_backend::GilrsBackend;

// Backend read faults
#[derive(Debug, thiserror::Error)]
pub enum BackendError {
    #[error("No gamepad connected in slot {0}")]
    Disconnected(usize),

    #[error("Signal {0} is not supported by this backend")]
    Unsupported(RawSignal),

    #[error("Failed to read input: {0}")]
    ReadFailed(String),
}

/// Source of raw readings, implemented per platform or simulator.
///
/// Polls are synchronous and may block on hardware I/O. A failed poll is never fatal;
/// the caller substitutes the neutral value.
pub trait InputBackend {
    /// Number of player slots; fixed for the lifetime of a registry.
    fn slot_count(&self) -> usize;

    /// Signals this backend can answer for. Binds referencing anything else are rejected.
    fn signals(&self) -> SignalCatalog {
        SignalCatalog::all()
    }

    /// Called once at the start of every tick, before any poll.
    fn begin_tick(&mut self) -> Result<(), BackendError> {
        Ok(())
    }

    fn poll_digital(&mut self, slot: usize, id: RawDigital) -> Result<bool, BackendError>;

    fn poll_analog1(&mut self, slot: usize, id: RawAnalog1) -> Result<f32, BackendError>;

    fn poll_analog2(&mut self, slot: usize, id: RawAnalog2) -> Result<(f32, f32), BackendError>;
}

impl<B: InputBackend + ?Sized> InputBackend for Box<B> {
    fn slot_count(&self) -> usize {
        (**self).slot_count()
    }

    fn signals(&self) -> SignalCatalog {
        (**self).signals()
    }

    fn begin_tick(&mut self) -> Result<(), BackendError> {
        (**self).begin_tick()
    }

    fn poll_digital(&mut self, slot: usize, id: RawDigital) -> Result<bool, BackendError> {
        (**self).poll_digital(slot, id)
    }

    fn poll_analog1(&mut self, slot: usize, id: RawAnalog1) -> Result<f32, BackendError> {
        (**self).poll_analog1(slot, id)
    }

    fn poll_analog2(&mut self, slot: usize, id: RawAnalog2) -> Result<(f32, f32), BackendError> {
        (**self).poll_analog2(slot, id)
    }
}

/// Set of raw signals a backend supports.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignalCatalog {
    signals: BTreeSet<RawSignal>,
}

impl SignalCatalog {
    pub fn all() -> Self {
        Self {
            signals: RawSignal::all().collect(),
        }
    }

    pub fn contains(&self, signal: RawSignal) -> bool {
        self.signals.contains(&signal)
    }

    pub fn iter(&self) -> impl Iterator<Item = RawSignal> + '_ {
        self.signals.iter().copied()
    }

    pub fn len(&self) -> usize {
        self.signals.len()
    }

    pub fn is_empty(&self) -> bool {
        self.signals.is_empty()
    }
}

impl FromIterator<RawSignal> for SignalCatalog {
    fn from_iter<I: IntoIterator<Item = RawSignal>>(iter: I) -> Self {
        Self {
            signals: iter.into_iter().collect(),
        }
    }
}

/// Sanitized readings of one slot for one tick.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RawSnapshot {
    values: BTreeMap<RawSignal, Value>,
}

impl RawSnapshot {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style insert, mostly for tests.
    pub fn with(mut self, signal: impl Into<RawSignal>, value: impl Into<Value>) -> Self {
        self.insert(signal.into(), value.into());
        self
    }

    pub fn insert(&mut self, signal: RawSignal, value: Value) {
        self.values.insert(signal, value);
    }

    /// Reading for `signal`, or the neutral value of its category when absent.
    pub fn get(&self, signal: RawSignal) -> Value {
        self.values
            .get(&signal)
            .copied()
            .unwrap_or_else(|| signal.category().neutral())
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

/// Reads every catalogued signal of `slot` once and applies the fault policy.
pub fn poll_snapshot<B: InputBackend + ?Sized>(
    backend: &mut B,
    slot: usize,
    catalog: &SignalCatalog,
    settings: &EngineSettings,
) -> RawSnapshot {
    let mut snapshot = RawSnapshot::new();
    let limit = if settings.analog_limit.is_finite() && settings.analog_limit > 0.0 {
        settings.analog_limit
    } else {
        warn!(
            "Ignoring invalid analog limit {}, using {}",
            settings.analog_limit, DEFAULT_ANALOG_LIMIT
        );
        DEFAULT_ANALOG_LIMIT
    };

    for signal in catalog.iter() {
        let reading = match signal {
            RawSignal::Digital(id) => backend.poll_digital(slot, id).map(Value::Bool),
            RawSignal::Analog1(id) => backend
                .poll_analog1(slot, id)
                .map(|v| Value::Scalar(sanitize_axis(v, limit))),
            RawSignal::Analog2(id) => backend
                .poll_analog2(slot, id)
                .map(|(x, y)| Value::Vec2(sanitize_axis(x, limit), sanitize_axis(y, limit))),
        };

        let value = match reading {
            Ok(value) => value,
            Err(e) => {
                warn!("Read fault on slot {} signal {}: {}", slot, signal, e);
                signal.category().neutral()
            }
        };
        snapshot.insert(signal, value);
    }

    debug!("Polled {} signals for slot {}", snapshot.len(), slot);
    snapshot
}

// NaN is treated as "no reading", everything else is clamped into range
fn sanitize_axis(value: f32, limit: f32) -> f32 {
    if value.is_nan() {
        warn!("Backend returned NaN, substituting 0.0");
        return 0.0;
    }
    if value.abs() > limit {
        debug!("Clamping out-of-range reading {:.4} to ±{:.2}", value, limit);
    }
    // Normalise -0.0 so a sign flip at rest never registers as a change
    let clamped = value.clamp(-limit, limit);
    if clamped == 0.0 {
        0.0
    } else {
        clamped
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct FaultyBackend;

    impl InputBackend for FaultyBackend {
        fn slot_count(&self) -> usize {
            1
        }

        fn poll_digital(&mut self, slot: usize, _id: RawDigital) -> Result<bool, BackendError> {
            Err(BackendError::Disconnected(slot))
        }

        fn poll_analog1(&mut self, _slot: usize, _id: RawAnalog1) -> Result<f32, BackendError> {
            Ok(f32::NAN)
        }

        fn poll_analog2(&mut self, _slot: usize, _id: RawAnalog2) -> Result<(f32, f32), BackendError> {
            Ok((3.5, -7.0))
        }
    }

    #[test]
    fn faults_become_neutral_and_ranges_are_clamped() {
        let mut backend = FaultyBackend;
        let catalog = SignalCatalog::all();
        let snapshot = poll_snapshot(&mut backend, 0, &catalog, &EngineSettings::default());

        assert_eq!(snapshot.len(), catalog.len());
        assert_eq!(snapshot.get(RawDigital::FaceDown.into()), Value::Bool(false));
        assert_eq!(snapshot.get(RawAnalog1::TriggerLeft.into()), Value::Scalar(0.0));
        assert_eq!(snapshot.get(RawAnalog2::StickLeft.into()), Value::Vec2(1.0, -1.0));
    }

    #[test]
    fn invalid_limit_falls_back_to_default() {
        for limit in [-1.0, f32::NAN, 0.0] {
            let settings = EngineSettings {
                analog_limit: limit,
                ..EngineSettings::default()
            };
            let snapshot = poll_snapshot(&mut FaultyBackend, 0, &SignalCatalog::all(), &settings);
            assert_eq!(snapshot.get(RawAnalog2::StickLeft.into()), Value::Vec2(1.0, -1.0));
        }
    }

    #[test]
    fn missing_signal_reads_neutral() {
        let snapshot = RawSnapshot::new().with(RawDigital::FaceUp, true);
        assert_eq!(snapshot.get(RawDigital::FaceUp.into()), Value::Bool(true));
        assert_eq!(snapshot.get(RawAnalog2::StickRight.into()), Value::Vec2(0.0, 0.0));
    }

    #[test]
    fn negative_zero_is_normalised() {
        assert!(sanitize_axis(-0.0, 1.0).is_sign_positive());
    }
}
