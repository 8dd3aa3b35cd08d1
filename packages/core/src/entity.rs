//! Properties and entities.

use crate::{Key, Value};

/// A named, possibly unindexed value.
///
/// Names may contain `.` to address a leaf inside nested sub-entities
/// (a *flattened* name).
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Property {
    pub name: String,
    pub value: Value,
    /// Exclude this property from indexes when stored.
    pub no_index: bool,
}

impl Property {
    pub fn new(name: impl Into<String>, value: impl Into<Value>) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
            no_index: false,
        }
    }

    /// A property excluded from indexes.
    pub fn unindexed(name: impl Into<String>, value: impl Into<Value>) -> Self {
        Self {
            no_index: true,
            ..Self::new(name, value)
        }
    }

    /// A property holding null.
    pub fn null(name: impl Into<String>) -> Self {
        Self::new(name, Value::Null)
    }
}

/// A stored record: an optional key plus an ordered property list.
///
/// Property order is preserved for deterministic iteration but carries no
/// meaning.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Entity {
    pub key: Option<Key>,
    pub properties: Vec<Property>,
}

impl Entity {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_properties(properties: Vec<Property>) -> Self {
        Self {
            key: None,
            properties,
        }
    }

    pub fn with_key(mut self, key: Key) -> Self {
        self.key = Some(key);
        self
    }

    /// Append an indexed property.
    pub fn with_property(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.properties.push(Property::new(name, value));
        self
    }

    /// Append an arbitrary property.
    pub fn with(mut self, property: Property) -> Self {
        self.properties.push(property);
        self
    }

    /// The first property with the given name.
    pub fn property(&self, name: &str) -> Option<&Property> {
        self.properties.iter().find(|p| p.name == name)
    }

    /// The value of the first property with the given name.
    pub fn get(&self, name: &str) -> Option<&Value> {
        self.property(name).map(|p| &p.value)
    }

    pub fn len(&self) -> usize {
        self.properties.len()
    }

    pub fn is_empty(&self) -> bool {
        self.properties.is_empty()
    }
}
