use crate::mapping::Category;
use serde::{Deserialize, Serialize};
use std::fmt;

// Face buttons are named by position, not by label.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RawDigital {
    FaceDown,
    FaceRight,
    FaceLeft,
    FaceUp,
    BumperLeft,
    BumperRight,
    DpadUp,
    DpadDown,
    DpadLeft,
    DpadRight,
    StickLeftButton,
    StickRightButton,
    SpecialBack,
    SpecialStart,
}

impl RawDigital {
    pub const ALL: [RawDigital; 14] = [
        RawDigital::FaceDown,
        RawDigital::FaceRight,
        RawDigital::FaceLeft,
        RawDigital::FaceUp,
        RawDigital::BumperLeft,
        RawDigital::BumperRight,
        RawDigital::DpadUp,
        RawDigital::DpadDown,
        RawDigital::DpadLeft,
        RawDigital::DpadRight,
        RawDigital::StickLeftButton,
        RawDigital::StickRightButton,
        RawDigital::SpecialBack,
        RawDigital::SpecialStart,
    ];
}

// Trigger-like signals, typically in [0, 1]
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RawAnalog1 {
    TriggerLeft,
    TriggerRight,
}

impl RawAnalog1 {
    pub const ALL: [RawAnalog1; 2] = [RawAnalog1::TriggerLeft, RawAnalog1::TriggerRight];
}

// Sticks, each component in [-1, 1] with +Y pointing up
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RawAnalog2 {
    StickLeft,
    StickRight,
}

impl RawAnalog2 {
    pub const ALL: [RawAnalog2; 2] = [RawAnalog2::StickLeft, RawAnalog2::StickRight];
}

/// Identifier of a physical input channel, tagged with its category.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RawSignal {
    Digital(RawDigital),
    Analog1(RawAnalog1),
    Analog2(RawAnalog2),
}

impl RawSignal {
    pub fn category(&self) -> Category {
        match self {
            RawSignal::Digital(_) => Category::Digital,
            RawSignal::Analog1(_) => Category::Analog1,
            RawSignal::Analog2(_) => Category::Analog2,
        }
    }

    /// Every signal this crate knows about, digital first.
    pub fn all() -> impl Iterator<Item = RawSignal> {
        RawDigital::ALL
            .into_iter()
            .map(RawSignal::Digital)
            .chain(RawAnalog1::ALL.into_iter().map(RawSignal::Analog1))
            .chain(RawAnalog2::ALL.into_iter().map(RawSignal::Analog2))
    }
}

impl From<RawDigital> for RawSignal {
    fn from(id: RawDigital) -> Self {
        RawSignal::Digital(id)
    }
}

impl From<RawAnalog1> for RawSignal {
    fn from(id: RawAnalog1) -> Self {
        RawSignal::Analog1(id)
    }
}

impl From<RawAnalog2> for RawSignal {
    fn from(id: RawAnalog2) -> Self {
        RawSignal::Analog2(id)
    }
}

impl fmt::Display for RawSignal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RawSignal::Digital(id) => write!(f, "{:?}", id),
            RawSignal::Analog1(id) => write!(f, "{:?}", id),
            RawSignal::Analog2(id) => write!(f, "{:?}", id),
        }
    }
}
