use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::entity::Entity;
use crate::error::CoreError;

/// Keys written by the built-in provisioning steps.
pub mod keys {
    /// The VM a media or power step acts on.
    pub const VM: &str = "vm";
    /// The vApp created by instantiation.
    pub const VAPP: &str = "vapp";
    /// Name given to the vApp being instantiated. Written before the create
    /// request is sent so rollback can find the vApp by name.
    pub const INSTANTIATE_VAPP_NAME: &str = "instantiate_vapp_name";
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "value", rename_all = "snake_case")]
pub enum StateValue {
    Entity(Box<Entity>),
    Text(String),
    Flag(bool),
}

impl StateValue {
    #[must_use]
    pub fn as_entity(&self) -> Option<&Entity> {
        match self {
            Self::Entity(entity) => Some(&**entity),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::Text(text) => Some(text.as_str()),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_flag(&self) -> Option<bool> {
        match self {
            Self::Flag(flag) => Some(*flag),
            _ => None,
        }
    }

    fn type_name(&self) -> &'static str {
        match self {
            Self::Entity(_) => "entity",
            Self::Text(_) => "text",
            Self::Flag(_) => "flag",
        }
    }
}

impl From<Entity> for StateValue {
    fn from(entity: Entity) -> Self {
        Self::Entity(Box::new(entity))
    }
}

impl From<String> for StateValue {
    fn from(text: String) -> Self {
        Self::Text(text)
    }
}

impl From<&str> for StateValue {
    fn from(text: &str) -> Self {
        Self::Text(text.to_string())
    }
}

impl From<bool> for StateValue {
    fn from(flag: bool) -> Self {
        Self::Flag(flag)
    }
}

/// Values handed from one provisioning step to the next within one run.
///
/// Keys are unique; writing an existing key replaces its value. A missing
/// key is a normal state, so the plain accessors return `Option` and only the
/// `require_*` accessors turn absence into an error.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ProvisionState {
    values: IndexMap<String, StateValue>,
}

impl ProvisionState {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Store `value` under `key`, returning the value it replaced.
    pub fn insert(
        &mut self,
        key: impl Into<String>,
        value: impl Into<StateValue>,
    ) -> Option<StateValue> {
        self.values.insert(key.into(), value.into())
    }

    #[must_use]
    pub fn with(mut self, key: impl Into<String>, value: impl Into<StateValue>) -> Self {
        self.insert(key, value);
        self
    }

    #[must_use]
    pub fn get(&self, key: &str) -> Option<&StateValue> {
        self.values.get(key)
    }

    #[must_use]
    pub fn entity(&self, key: &str) -> Option<&Entity> {
        self.get(key).and_then(StateValue::as_entity)
    }

    #[must_use]
    pub fn text(&self, key: &str) -> Option<&str> {
        self.get(key).and_then(StateValue::as_text)
    }

    #[must_use]
    pub fn flag(&self, key: &str) -> Option<bool> {
        self.get(key).and_then(StateValue::as_flag)
    }

    /// # Errors
    ///
    /// Returns an error if `key` is absent or does not hold an entity.
    pub fn require_entity(&self, key: &str) -> Result<&Entity, CoreError> {
        let value = self.require(key)?;
        value
            .as_entity()
            .ok_or_else(|| CoreError::UnexpectedStateValue {
                key: key.to_string(),
                expected: "entity",
                found: value.type_name(),
            })
    }

    /// # Errors
    ///
    /// Returns an error if `key` is absent or does not hold text.
    pub fn require_text(&self, key: &str) -> Result<&str, CoreError> {
        let value = self.require(key)?;
        value
            .as_text()
            .ok_or_else(|| CoreError::UnexpectedStateValue {
                key: key.to_string(),
                expected: "text",
                found: value.type_name(),
            })
    }

    fn require(&self, key: &str) -> Result<&StateValue, CoreError> {
        self.values.get(key).ok_or_else(|| CoreError::MissingState {
            key: key.to_string(),
        })
    }

    /// Remove `key`, keeping the insertion order of the remaining keys.
    pub fn remove(&mut self, key: &str) -> Option<StateValue> {
        self.values.shift_remove(key)
    }

    #[must_use]
    pub fn contains(&self, key: &str) -> bool {
        self.values.contains_key(key)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.values.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.values.keys().map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &StateValue)> {
        self.values.iter().map(|(key, value)| (key.as_str(), value))
    }
}
