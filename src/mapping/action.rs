//! Action declarations
//!
//! Actions are declared once, up front, per category. An [`ActionId`] carries its
//! category and its declaration index, which together define the evaluation order.
//! It also remembers which set declared it, so an id from another set is never mistaken
//! for a local action with the same index.

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use tracing::debug;

use crate::mapping::{Category, ConfigError};

static NEXT_SET_ID: AtomicU64 = AtomicU64::new(0);

/// Handle for a declared action. Ordering is category first, then declaration order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ActionId {
    category: Category,
    index: usize,
    set: u64,
}

impl ActionId {
    pub fn category(&self) -> Category {
        self.category
    }

    pub fn index(&self) -> usize {
        self.index
    }
}

impl fmt::Display for ActionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}#{}", self.category, self.index)
    }
}

/// Builder for an [`ActionSet`]
#[derive(Debug)]
pub struct ActionSetBuilder {
    id: u64,
    names: [Vec<String>; 3],
}

impl ActionSetBuilder {
    fn new() -> Self {
        Self {
            id: NEXT_SET_ID.fetch_add(1, Ordering::Relaxed),
            names: Default::default(),
        }
    }

    pub fn declare(&mut self, category: Category, name: impl Into<String>) -> Result<ActionId, ConfigError> {
        let name = name.into();
        let names = &mut self.names[slot_of(category)];
        if names.iter().any(|existing| *existing == name) {
            return Err(ConfigError::DuplicateAction { category, name });
        }
        debug!("Declared {} action {:?}", category, name);
        names.push(name);
        Ok(ActionId {
            category,
            index: names.len() - 1,
            set: self.id,
        })
    }

    pub fn digital(&mut self, name: impl Into<String>) -> Result<ActionId, ConfigError> {
        self.declare(Category::Digital, name)
    }

    pub fn analog1(&mut self, name: impl Into<String>) -> Result<ActionId, ConfigError> {
        self.declare(Category::Analog1, name)
    }

    pub fn analog2(&mut self, name: impl Into<String>) -> Result<ActionId, ConfigError> {
        self.declare(Category::Analog2, name)
    }

    pub fn build(self) -> ActionSet {
        ActionSet {
            id: self.id,
            names: self.names,
        }
    }
}

/// The fixed, ordered set of actions a registry was created with.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActionSet {
    id: u64,
    names: [Vec<String>; 3],
}

impl ActionSet {
    pub fn builder() -> ActionSetBuilder {
        ActionSetBuilder::new()
    }

    pub fn len(&self) -> usize {
        self.names.iter().map(Vec::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn contains(&self, action: ActionId) -> bool {
        action.set == self.id && action.index < self.names[slot_of(action.category)].len()
    }

    pub fn name(&self, action: ActionId) -> Option<&str> {
        if !self.contains(action) {
            return None;
        }
        self.names[slot_of(action.category)]
            .get(action.index)
            .map(String::as_str)
    }

    pub fn find(&self, category: Category, name: &str) -> Option<ActionId> {
        self.names[slot_of(category)]
            .iter()
            .position(|n| n == name)
            .map(|index| ActionId {
                category,
                index,
                set: self.id,
            })
    }

    /// All actions in evaluation order: Digital, Analog1, Analog2, each in declaration order.
    pub fn iter(&self) -> impl Iterator<Item = ActionId> + '_ {
        Category::ALL.into_iter().flat_map(move |category| {
            (0..self.names[slot_of(category)].len()).map(move |index| ActionId {
                category,
                index,
                set: self.id,
            })
        })
    }

    /// Dense position of `action` in evaluation order.
    pub fn position(&self, action: ActionId) -> Option<usize> {
        if !self.contains(action) {
            return None;
        }
        let offset: usize = Category::ALL
            .iter()
            .take_while(|c| **c != action.category)
            .map(|c| self.names[slot_of(*c)].len())
            .sum();
        Some(offset + action.index)
    }

    /// Display name for logs and errors.
    pub fn describe(&self, action: ActionId) -> String {
        match self.name(action) {
            Some(name) => name.to_string(),
            None => action.to_string(),
        }
    }
}

fn slot_of(category: Category) -> usize {
    match category {
        Category::Digital => 0,
        Category::Analog1 => 1,
        Category::Analog2 => 2,
    }
}
