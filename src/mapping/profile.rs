//! TOML bind profiles
//!
//! A profile names actions instead of holding [`ActionId`]s, so it can be written by hand:
//!
//! ```toml
//! name = "default"
//!
//! [[bindings]]
//! action = "fire"
//! category = "digital"
//! expr = { input = { digital = "face_down" } }
//! ```

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use thiserror::Error;
use tracing::{debug, info};

use crate::mapping::{ActionId, BindExpr, Category, ConfigError, Configuration};

#[derive(Debug, Error)]
pub enum ProfileError {
    #[error("Failed to access profile file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse profile: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Failed to serialize profile: {0}")]
    Serialize(#[from] toml::ser::Error),

    #[error("Profile references undeclared {category} action {name:?}")]
    UnknownAction { category: Category, name: String },

    #[error(transparent)]
    Config(#[from] ConfigError),
}

#[derive(Deserialize, Serialize, Clone, Debug, PartialEq)]
pub struct ProfileEntry {
    pub action: String,
    pub category: Category,
    pub expr: BindExpr,
}

#[derive(Deserialize, Serialize, Clone, Debug, Default, PartialEq)]
pub struct BindProfile {
    pub name: String,
    #[serde(default)]
    pub bindings: Vec<ProfileEntry>,
}

impl BindProfile {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            bindings: Vec::new(),
        }
    }

    pub fn entry(mut self, category: Category, action: impl Into<String>, expr: BindExpr) -> Self {
        self.bindings.push(ProfileEntry {
            action: action.into(),
            category,
            expr,
        });
        self
    }

    pub fn from_toml_str(content: &str) -> Result<Self, ProfileError> {
        Ok(toml::from_str(content)?)
    }

    pub fn to_toml_string(&self) -> Result<String, ProfileError> {
        Ok(toml::to_string_pretty(self)?)
    }

    pub fn load(path: &Path) -> Result<Self, ProfileError> {
        debug!("Loading bind profile from {}", path.display());
        let content = fs::read_to_string(path)?;
        let profile = Self::from_toml_str(&content)?;
        info!("Loaded profile {:?} with {} bindings", profile.name, profile.bindings.len());
        Ok(profile)
    }

    pub fn save(&self, path: &Path) -> Result<(), ProfileError> {
        fs::write(path, self.to_toml_string()?)?;
        debug!("Saved profile {:?} to {}", self.name, path.display());
        Ok(())
    }

    /// Resolves names against `base`'s action set and installs every entry at once.
    ///
    /// Returns a new configuration; `base` is never modified, so a failing profile
    /// cannot leave a half-applied table behind.
    pub fn apply(&self, base: &Configuration) -> Result<Configuration, ProfileError> {
        let actions = base.actions();
        let mapping = self
            .bindings
            .iter()
            .map(|entry| {
                actions
                    .find(entry.category, &entry.action)
                    .map(|id| (id, entry.expr.clone()))
                    .ok_or_else(|| ProfileError::UnknownAction {
                        category: entry.category,
                        name: entry.action.clone(),
                    })
            })
            .collect::<Result<Vec<(ActionId, BindExpr)>, ProfileError>>()?;

        let mut config = base.clone();
        config.install(mapping)?;
        Ok(config)
    }

    /// Exports every non-neutral binding of `config`.
    pub fn from_configuration(name: impl Into<String>, config: &Configuration) -> Self {
        let actions = config.actions();
        let bindings = config
            .iter()
            .filter(|(_, binding)| !binding.is_neutral())
            .map(|(action, binding)| ProfileEntry {
                action: actions.describe(action),
                category: action.category(),
                expr: binding.expr().clone(),
            })
            .collect();
        Self {
            name: name.into(),
            bindings,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::controller::{RawAnalog1, RawAnalog2, RawDigital, SignalCatalog};
    use crate::mapping::expr::*;
    use crate::mapping::{ActionSet, Axis};
    use std::sync::Arc;

    fn base() -> Configuration {
        let mut builder = ActionSet::builder();
        builder.digital("fire").unwrap();
        builder.analog1("rotation").unwrap();
        builder.analog2("movement").unwrap();
        Configuration::new(Arc::new(builder.build()), Arc::new(SignalCatalog::all()))
    }

    const HAND_WRITTEN: &str = r#"
name = "hand"

[[bindings]]
action = "fire"
category = "digital"
expr = { input = { digital = "face_down" } }

[[bindings]]
action = "rotation"
category = "analog1"
expr = { split = [{ input = { analog2 = "stick_right" } }, "x"] }

[[bindings]]
action = "movement"
category = "analog2"
expr = { join = { x = { input = { analog1 = "trigger_right" } }, y = { split = ["previous_state", "y"] } } }
"#;

    #[test]
    fn parses_hand_written_profile() {
        let profile = BindProfile::from_toml_str(HAND_WRITTEN).unwrap();
        assert_eq!(profile.name, "hand");
        assert_eq!(profile.bindings[0].expr, input(RawDigital::FaceDown));
        assert_eq!(profile.bindings[1].expr, split(input(RawAnalog2::StickRight), Axis::X));
        assert_eq!(
            profile.bindings[2].expr,
            join(input(RawAnalog1::TriggerRight), split(previous_state(), Axis::Y))
        );

        let config = profile.apply(&base()).unwrap();
        assert_eq!(config.iter().filter(|(_, b)| !b.is_neutral()).count(), 3);
    }

    #[test]
    fn export_then_reload_gives_same_bindings() {
        let profile = BindProfile::from_toml_str(HAND_WRITTEN).unwrap();
        let config = profile.apply(&base()).unwrap();

        let exported = BindProfile::from_configuration("hand", &config);
        let text = exported.to_toml_string().unwrap();
        assert_eq!(BindProfile::from_toml_str(&text).unwrap(), exported);
    }

    #[test]
    fn unknown_name_applies_nothing() {
        let profile = BindProfile::new("broken")
            .entry(Category::Digital, "fire", input(RawDigital::FaceDown))
            .entry(Category::Digital, "jump", input(RawDigital::FaceUp));
        assert!(matches!(
            profile.apply(&base()),
            Err(ProfileError::UnknownAction { .. })
        ));
    }

    #[test]
    fn ill_typed_entry_is_a_config_error() {
        let profile = BindProfile::new("broken").entry(Category::Digital, "fire", constant(0.5));
        assert!(matches!(
            profile.apply(&base()),
            Err(ProfileError::Config(ConfigError::TypeMismatch { .. }))
        ));
    }

    #[test]
    fn save_and_load_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("profile.toml");
        let profile = BindProfile::new("saved").entry(
            Category::Analog1,
            "rotation",
            negate(input(RawAnalog1::TriggerLeft)),
        );
        profile.save(&path).unwrap();
        assert_eq!(BindProfile::load(&path).unwrap(), profile);
    }
}
