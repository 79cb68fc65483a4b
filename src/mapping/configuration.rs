//! Per-player binding tables
//!
//! A [`Configuration`] holds exactly one checked [`Binding`] per declared action.
//! Actions that were never bound carry the neutral constant. Every mutation either
//! fully succeeds or leaves the table as it was.

use std::collections::HashSet;
use std::sync::Arc;
use tracing::{debug, warn};

use crate::controller::SignalCatalog;
use crate::mapping::{ActionId, ActionSet, BindExpr, Binding, ConfigError};

#[derive(Debug, Clone)]
pub struct Configuration {
    actions: Arc<ActionSet>,
    catalog: Arc<SignalCatalog>,
    // Dense, in evaluation order
    bindings: Vec<Binding>,
}

impl Configuration {
    /// A configuration with every action bound to its neutral constant.
    pub fn new(actions: Arc<ActionSet>, catalog: Arc<SignalCatalog>) -> Self {
        let bindings = actions
            .iter()
            .map(|action| Binding::neutral(action.category()))
            .collect();
        Self {
            actions,
            catalog,
            bindings,
        }
    }

    pub fn actions(&self) -> &Arc<ActionSet> {
        &self.actions
    }

    pub fn catalog(&self) -> &Arc<SignalCatalog> {
        &self.catalog
    }

    /// Checks `expr` against the action's category and replaces its binding.
    pub fn bind(&mut self, action: ActionId, expr: BindExpr) -> Result<(), ConfigError> {
        let (position, binding) = self.check(action, expr).inspect_err(|e| {
            warn!("Rejected binding for {}: {}", self.actions.describe(action), e);
        })?;
        debug!(
            "Bound {} to {}",
            self.actions.describe(action),
            binding.expr().node_name()
        );
        self.bindings[position] = binding;
        Ok(())
    }

    /// Builder-style [`Configuration::bind`].
    pub fn with(mut self, action: ActionId, expr: BindExpr) -> Result<Self, ConfigError> {
        self.bind(action, expr)?;
        Ok(self)
    }

    /// Restores the neutral binding of `action`.
    pub fn unbind(&mut self, action: ActionId) -> Result<(), ConfigError> {
        let position = self.position(action)?;
        self.bindings[position] = Binding::neutral(action.category());
        Ok(())
    }

    /// Replaces the whole table. Actions missing from `mapping` go back to neutral.
    ///
    /// Everything is checked before anything is swapped in, so a failure leaves the
    /// current table untouched.
    pub fn install<I>(&mut self, mapping: I) -> Result<(), ConfigError>
    where
        I: IntoIterator<Item = (ActionId, BindExpr)>,
    {
        let mut table: Vec<Binding> = self
            .actions
            .iter()
            .map(|action| Binding::neutral(action.category()))
            .collect();
        let mut seen = HashSet::new();

        for (action, expr) in mapping {
            if !seen.insert(action) {
                let e = ConfigError::DuplicateAction {
                    category: action.category(),
                    name: self.actions.describe(action),
                };
                warn!("Rejected configuration: {}", e);
                return Err(e);
            }
            let (position, binding) = self.check(action, expr).inspect_err(|e| {
                warn!("Rejected configuration: {}", e);
            })?;
            table[position] = binding;
        }

        debug!("Installed configuration with {} explicit bindings", seen.len());
        self.bindings = table;
        Ok(())
    }

    /// Moves the table onto another signal catalogue.
    ///
    /// Fails with [`ConfigError::UnknownSignal`] if any binding reads a signal `catalog`
    /// does not contain; the table is left unchanged in that case.
    pub fn rebase(&mut self, catalog: Arc<SignalCatalog>) -> Result<(), ConfigError> {
        if let Some(signal) = self
            .bindings
            .iter()
            .flat_map(|binding| binding.expr().signals())
            .find(|signal| !catalog.contains(*signal))
        {
            warn!("Rejected configuration: signal {} is not available", signal);
            return Err(ConfigError::UnknownSignal(signal));
        }
        self.catalog = catalog;
        Ok(())
    }

    pub fn binding(&self, action: ActionId) -> Option<&Binding> {
        self.actions
            .position(action)
            .and_then(|position| self.bindings.get(position))
    }

    /// Bindings in evaluation order, paired with their actions.
    pub fn iter(&self) -> impl Iterator<Item = (ActionId, &Binding)> + '_ {
        self.actions.iter().zip(self.bindings.iter())
    }

    fn position(&self, action: ActionId) -> Result<usize, ConfigError> {
        self.actions
            .position(action)
            .ok_or_else(|| ConfigError::UnknownAction(action.to_string()))
    }

    fn check(&self, action: ActionId, expr: BindExpr) -> Result<(usize, Binding), ConfigError> {
        let position = self.position(action)?;
        let name = self.actions.describe(action);
        let binding = Binding::check(&name, action.category(), expr, &self.catalog)?;
        Ok((position, binding))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::controller::{RawAnalog2, RawDigital, RawSignal};
    use crate::mapping::expr::*;
    use crate::mapping::Category;

    fn setup() -> (Configuration, ActionId, ActionId) {
        let mut builder = ActionSet::builder();
        let fire = builder.digital("fire").unwrap();
        let aim = builder.analog2("aim").unwrap();
        let config = Configuration::new(Arc::new(builder.build()), Arc::new(SignalCatalog::all()));
        (config, fire, aim)
    }

    #[test]
    fn unbound_actions_are_neutral() {
        let (config, fire, aim) = setup();
        assert!(config.binding(fire).unwrap().is_neutral());
        assert_eq!(config.binding(aim).unwrap().category(), Category::Analog2);
    }

    #[test]
    fn failed_bind_keeps_previous_binding() {
        let (mut config, fire, _) = setup();
        config.bind(fire, input(RawDigital::FaceDown)).unwrap();
        let before = config.binding(fire).cloned();

        assert!(config.bind(fire, input(RawAnalog2::StickLeft)).is_err());
        assert_eq!(config.binding(fire).cloned(), before);
    }

    #[test]
    fn install_is_all_or_nothing() {
        let (mut config, fire, aim) = setup();
        config.bind(fire, input(RawDigital::FaceDown)).unwrap();
        let before: Vec<Binding> = config.iter().map(|(_, b)| b.clone()).collect();

        let result = config.install(vec![
            (aim, input(RawAnalog2::StickRight)),
            (fire, constant(1.0)),
        ]);
        assert!(matches!(result, Err(ConfigError::TypeMismatch { .. })));
        let after: Vec<Binding> = config.iter().map(|(_, b)| b.clone()).collect();
        assert_eq!(before, after);

        config.install(vec![(aim, input(RawAnalog2::StickRight))]).unwrap();
        assert!(config.binding(fire).unwrap().is_neutral());
        assert!(!config.binding(aim).unwrap().is_neutral());
    }

    #[test]
    fn install_rejects_duplicate_entries() {
        let (mut config, fire, _) = setup();
        let result = config.install(vec![
            (fire, input(RawDigital::FaceDown)),
            (fire, input(RawDigital::FaceUp)),
        ]);
        assert!(matches!(result, Err(ConfigError::DuplicateAction { .. })));
        assert!(config.binding(fire).unwrap().is_neutral());
    }

    #[test]
    fn rebase_checks_every_binding() {
        let (mut config, fire, _) = setup();
        config.bind(fire, input(RawDigital::FaceUp)).unwrap();

        let narrow: Arc<SignalCatalog> =
            Arc::new([RawSignal::from(RawDigital::FaceDown)].into_iter().collect());
        assert_eq!(
            config.rebase(Arc::clone(&narrow)),
            Err(ConfigError::UnknownSignal(RawSignal::Digital(RawDigital::FaceUp)))
        );
        assert_eq!(config.catalog().len(), SignalCatalog::all().len());

        config.bind(fire, input(RawDigital::FaceDown)).unwrap();
        config.rebase(Arc::clone(&narrow)).unwrap();
        assert_eq!(config.catalog(), &narrow);
        assert!(config.bind(fire, input(RawDigital::FaceUp)).is_err());
    }

    #[test]
    fn actions_from_another_set_are_unknown() {
        let (mut config, _, _) = setup();
        let mut other = ActionSet::builder();
        let stray = other.digital("a").unwrap();
        assert!(matches!(
            config.bind(stray, input(RawDigital::FaceDown)),
            Err(ConfigError::UnknownAction(_))
        ));
    }
}
