use color_eyre::{eyre::eyre, Result};
use std::str::FromStr;
use tracing::{info, Level};
use tracing_subscriber::FmtSubscriber;

use padbind::config::{self, EngineSettings, PROFILE_FILE};
use padbind::prelude::*;

fn main() -> Result<()> {
    let dir = config::default_dir();
    let settings = EngineSettings::load_or_default(&dir)?;
    setup(&settings)?;
    info!("Using config directory {}", dir.display());

    let mut builder = ActionSet::builder();
    let fire = builder.digital("fire")?;
    let movement = builder.analog2("movement")?;
    let actions = builder.build();

    let profile_path = dir.join(PROFILE_FILE);
    let profile = if profile_path.exists() {
        BindProfile::load(&profile_path)?
    } else {
        info!("No profile at {}, using built-in bindings", profile_path.display());
        default_profile()
    };

    #[cfg(feature = "gilrs")]
    {
        let backend = padbind::controller::GilrsBackend::create(4, settings.joystick_deadzone)?;
        let mut registry = Registry::with_settings(actions, backend, settings);
        prepare(&mut registry, &profile, fire, movement)?;
        info!("Polling gamepads, press Ctrl+C to stop");
        loop {
            registry.update();
            std::thread::sleep(std::time::Duration::from_millis(16));
        }
    }

    #[cfg(not(feature = "gilrs"))]
    {
        let backend = SimulatedBackend::new(1);
        let mut registry = Registry::with_settings(actions, backend, settings);
        prepare(&mut registry, &profile, fire, movement)?;
        run_scripted_session(&mut registry, fire, movement);
        Ok(())
    }
}

fn setup(settings: &EngineSettings) -> Result<()> {
    if std::env::var("RUST_LIB_BACKTRACE").is_err() {
        std::env::set_var("RUST_LIB_BACKTRACE", "0")
    }
    color_eyre::install()?;

    let level = Level::from_str(&settings.log_level)
        .map_err(|e| eyre!("Invalid log level {:?}: {}", settings.log_level, e))?;
    setup_logging_env(level);
    Ok(())
}

fn setup_logging_env(level: Level) {
    FmtSubscriber::builder()
        .with_max_level(level)
        .with_target(false)
        .with_thread_ids(true)
        .with_file(true)
        .with_line_number(true)
        .pretty()
        .init();
}

/// Fire on the bottom face button. Movement X from the triggers, Y from the D-pad,
/// holding its last value while the D-pad is idle.
fn default_profile() -> BindProfile {
    let vertical = branch(
        xor(input(RawDigital::DpadUp), input(RawDigital::DpadDown)),
        branch(input(RawDigital::DpadUp), constant(1.0), constant(-1.0)),
        split(previous_state(), Axis::Y),
    );
    let horizontal = add(
        input(RawAnalog1::TriggerRight),
        negate(input(RawAnalog1::TriggerLeft)),
    );

    BindProfile::new("default")
        .entry(Category::Digital, "fire", input(RawDigital::FaceDown))
        .entry(Category::Analog2, "movement", join(horizontal, vertical))
}

fn prepare<B: InputBackend>(
    registry: &mut Registry<B>,
    profile: &BindProfile,
    fire: ActionId,
    movement: ActionId,
) -> Result<()> {
    for slot in 0..registry.player_count() {
        registry.apply_profile(slot, profile)?;
    }

    registry
        .add_listener(fire, |event| {
            info!("Player {} fire: {}", event.player.slot(), event.value);
        })
        .ok_or_else(|| eyre!("fire is not declared"))?;
    registry
        .add_listener(movement, |event| {
            info!("Player {} movement: {}", event.player.slot(), event.value);
        })
        .ok_or_else(|| eyre!("movement is not declared"))?;
    Ok(())
}

#[cfg(not(feature = "gilrs"))]
fn run_scripted_session(registry: &mut Registry<SimulatedBackend>, fire: ActionId, movement: ActionId) {
    fn step(registry: &mut Registry<SimulatedBackend>, label: &str) {
        let report = registry.update();
        info!(
            "Tick {} ({}): {} changes, {} listener calls",
            report.tick, label, report.changes, report.listener_calls
        );
    }

    step(registry, "idle");

    registry.backend_mut().set_digital(0, RawDigital::FaceDown, true);
    step(registry, "press fire");

    let backend = registry.backend_mut();
    backend.set_digital(0, RawDigital::DpadUp, true);
    backend.set_analog1(0, RawAnalog1::TriggerRight, 0.75);
    step(registry, "dpad up, right trigger");

    registry.backend_mut().set_digital(0, RawDigital::DpadUp, false);
    step(registry, "release dpad");

    registry.backend_mut().set_connected(0, false);
    step(registry, "disconnect");

    match registry.player(0) {
        Some(player) => info!(
            "Final state: fire {:?}, movement {:?}",
            player.digital(fire),
            player.analog2(movement)
        ),
        None => tracing::warn!("Simulated backend exposed no players"),
    }
}
