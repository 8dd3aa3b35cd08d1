//! Wire-shaped entities.
//!
//! Transport layers hand entities over as a map of name to value, with the
//! index exclusion flag attached to each value (and, for arrays, to each
//! element). This module converts between that shape and [`Entity`], where
//! the flag lives on the [`Property`].

use std::collections::BTreeMap;

use bytes::Bytes;
use chrono::{DateTime, Utc};

use crate::{Entity, GeoPoint, Key, Property, Value};

/// A value as carried by the transport.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct WireValue {
    pub kind: WireKind,
    pub exclude_from_indexes: bool,
}

/// Payload of a [`WireValue`].
#[derive(Clone, Debug, Default, PartialEq)]
pub enum WireKind {
    #[default]
    Null,
    Boolean(bool),
    Integer(i64),
    Double(f64),
    String(String),
    Blob(Bytes),
    Timestamp(DateTime<Utc>),
    GeoPoint(GeoPoint),
    Key(Key),
    Entity(WireEntity),
    Array(Vec<WireValue>),
}

/// An entity as carried by the transport.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct WireEntity {
    pub key: Option<Key>,
    pub properties: BTreeMap<String, WireValue>,
}

impl WireValue {
    pub fn new(kind: WireKind) -> Self {
        Self {
            kind,
            exclude_from_indexes: false,
        }
    }

    pub fn unindexed(kind: WireKind) -> Self {
        Self {
            kind,
            exclude_from_indexes: true,
        }
    }

    /// Whether this value, or any element of it, is excluded from indexes.
    fn excluded(&self) -> bool {
        match &self.kind {
            WireKind::Array(values) => {
                self.exclude_from_indexes || values.iter().any(|v| v.exclude_from_indexes)
            }
            _ => self.exclude_from_indexes,
        }
    }
}

impl Entity {
    /// Convert a wire entity, moving index flags onto properties.
    ///
    /// An array property is unindexed when the array or any of its elements
    /// is flagged; the flag describes the property as a whole.
    pub fn from_wire(wire: WireEntity) -> Self {
        let properties = wire
            .properties
            .into_iter()
            .map(|(name, value)| Property {
                name,
                no_index: value.excluded(),
                value: value_from_wire(value.kind),
            })
            .collect();
        Entity {
            key: wire.key,
            properties,
        }
    }

    /// Convert to a wire entity.
    ///
    /// Array properties carry the flag on every element, which is where
    /// transports expect it. Later duplicates of a name replace earlier ones.
    pub fn to_wire(&self) -> WireEntity {
        let properties = self
            .properties
            .iter()
            .map(|p| (p.name.clone(), value_to_wire(&p.value, p.no_index)))
            .collect();
        WireEntity {
            key: self.key.clone(),
            properties,
        }
    }
}

fn value_from_wire(kind: WireKind) -> Value {
    match kind {
        WireKind::Null => Value::Null,
        WireKind::Boolean(b) => Value::Bool(b),
        WireKind::Integer(i) => Value::Integer(i),
        WireKind::Double(f) => Value::Float(f),
        WireKind::String(s) => Value::String(s),
        WireKind::Blob(b) => Value::Bytes(b),
        WireKind::Timestamp(t) => Value::Timestamp(t),
        WireKind::GeoPoint(g) => Value::GeoPoint(g),
        WireKind::Key(k) => Value::Key(k),
        WireKind::Entity(e) => Value::Entity(Box::new(Entity::from_wire(e))),
        WireKind::Array(values) => {
            Value::Array(values.into_iter().map(|v| value_from_wire(v.kind)).collect())
        }
    }
}

fn value_to_wire(value: &Value, no_index: bool) -> WireValue {
    let kind = match value {
        Value::Null => WireKind::Null,
        Value::Bool(b) => WireKind::Boolean(*b),
        Value::Integer(i) => WireKind::Integer(*i),
        Value::Float(f) => WireKind::Double(*f),
        Value::String(s) => WireKind::String(s.clone()),
        Value::Bytes(b) => WireKind::Blob(b.clone()),
        Value::Timestamp(t) => WireKind::Timestamp(*t),
        Value::GeoPoint(g) => WireKind::GeoPoint(*g),
        Value::Key(k) => WireKind::Key(k.clone()),
        Value::Entity(e) => WireKind::Entity(e.to_wire()),
        Value::Array(values) => {
            return WireValue::new(WireKind::Array(
                values.iter().map(|v| value_to_wire(v, no_index)).collect(),
            ));
        }
    };
    WireValue {
        kind,
        exclude_from_indexes: no_index,
    }
}
