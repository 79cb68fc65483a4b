//! Hardware backend on top of gilrs.
//!
//! Connected gamepads are assigned to slots in id order at the start of every tick.
//! A slot without a gamepad fails its polls, which the snapshot boundary turns into
//! neutral readings.

use gilrs::{Axis, Button, Event, EventType, Gamepad, GamepadId, Gilrs};
use tracing::{debug, error, info, warn};

use super::{BackendError, InputBackend, RawAnalog1, RawAnalog2, RawDigital};

pub struct GilrsBackend {
    gilrs: Gilrs,
    slots: Vec<Option<GamepadId>>,
    joystick_deadzone: f32,
}

impl GilrsBackend {
    pub fn create(slot_count: usize, joystick_deadzone: f32) -> Result<Self, BackendError> {
        info!("Initializing gilrs controller interface");
        let gilrs = match Gilrs::new() {
            Ok(g) => {
                info!("Successfully initialized gilrs");
                g
            }
            Err(e) => {
                error!("Failed to initialize gilrs: {}", e);
                return Err(BackendError::ReadFailed(e.to_string()));
            }
        };

        let mut backend = Self {
            gilrs,
            slots: vec![None; slot_count],
            joystick_deadzone,
        };
        backend.assign_slots();
        Ok(backend)
    }

    fn assign_slots(&mut self) {
        let mut connected: Vec<GamepadId> = self
            .gilrs
            .gamepads()
            .filter(|(_, gamepad)| gamepad.is_connected())
            .map(|(id, _)| id)
            .collect();
        connected.sort_by_key(|id| usize::from(*id));

        for (index, slot) in self.slots.iter_mut().enumerate() {
            let assigned = connected.get(index).copied();
            if *slot != assigned {
                info!("Slot {} now bound to gamepad {:?}", index, assigned);
                *slot = assigned;
            }
        }
    }

    fn gamepad(&self, slot: usize) -> Result<Gamepad<'_>, BackendError> {
        self.slots
            .get(slot)
            .copied()
            .flatten()
            .and_then(|id| self.gilrs.connected_gamepad(id))
            .ok_or(BackendError::Disconnected(slot))
    }

    fn trigger_value(gamepad: &Gamepad<'_>, button: Button, axis: Axis) -> f32 {
        gamepad
            .button_data(button)
            .map(|data| data.value())
            .unwrap_or_else(|| gamepad.value(axis))
    }
}

impl InputBackend for GilrsBackend {
    fn slot_count(&self) -> usize {
        self.slots.len()
    }

    fn begin_tick(&mut self) -> Result<(), BackendError> {
        let mut hotplug = false;
        // Draining the queue is what updates gilrs' cached gamepad state
        while let Some(Event { id, event, .. }) = self.gilrs.next_event() {
            match event {
                EventType::Connected => {
                    info!("Controller {} connected", id);
                    hotplug = true;
                }
                EventType::Disconnected => {
                    warn!("Controller {} disconnected", id);
                    hotplug = true;
                }
                _ => debug!("gilrs event from {}: {:?}", id, event),
            }
        }
        if hotplug {
            self.assign_slots();
        }
        Ok(())
    }

    fn poll_digital(&mut self, slot: usize, id: RawDigital) -> Result<bool, BackendError> {
        let gamepad = self.gamepad(slot)?;
        Ok(gamepad.is_pressed(map_button(id)))
    }

    fn poll_analog1(&mut self, slot: usize, id: RawAnalog1) -> Result<f32, BackendError> {
        let gamepad = self.gamepad(slot)?;
        let value = match id {
            RawAnalog1::TriggerLeft => Self::trigger_value(&gamepad, Button::LeftTrigger2, Axis::LeftZ),
            RawAnalog1::TriggerRight => {
                Self::trigger_value(&gamepad, Button::RightTrigger2, Axis::RightZ)
            }
        };
        Ok(apply_deadzone(value, self.joystick_deadzone))
    }

    fn poll_analog2(&mut self, slot: usize, id: RawAnalog2) -> Result<(f32, f32), BackendError> {
        let gamepad = self.gamepad(slot)?;
        let (x_axis, y_axis) = match id {
            RawAnalog2::StickLeft => (Axis::LeftStickX, Axis::LeftStickY),
            RawAnalog2::StickRight => (Axis::RightStickX, Axis::RightStickY),
        };
        Ok((
            apply_deadzone(gamepad.value(x_axis), self.joystick_deadzone),
            apply_deadzone(gamepad.value(y_axis), self.joystick_deadzone),
        ))
    }
}

fn map_button(id: RawDigital) -> Button {
    match id {
        RawDigital::FaceDown => Button::South,
        RawDigital::FaceRight => Button::East,
        RawDigital::FaceLeft => Button::West,
        RawDigital::FaceUp => Button::North,
        RawDigital::BumperLeft => Button::LeftTrigger,
        RawDigital::BumperRight => Button::RightTrigger,
        RawDigital::DpadUp => Button::DPadUp,
        RawDigital::DpadDown => Button::DPadDown,
        RawDigital::DpadLeft => Button::DPadLeft,
        RawDigital::DpadRight => Button::DPadRight,
        RawDigital::StickLeftButton => Button::LeftThumb,
        RawDigital::StickRightButton => Button::RightThumb,
        RawDigital::SpecialBack => Button::Select,
        RawDigital::SpecialStart => Button::Start,
    }
}

// Rescales the value to the range outside the deadzone
fn apply_deadzone(value: f32, deadzone: f32) -> f32 {
    if value.abs() < deadzone {
        0.0
    } else {
        let sign = if value < 0.0 { -1.0 } else { 1.0 };
        sign * (value.abs() - deadzone) / (1.0 - deadzone)
    }
}
