//! Core propmap types
//!
//! This layer is the data model shared by everything above it:
//! - `Value`: a decoded property value (primitives, timestamps, geo-points,
//!   keys, nested entities, arrays)
//! - `Property` / `Entity`: an optional key plus an ordered property list
//! - `Key`: entity identity, possibly incomplete or invalid
//! - `WireEntity`: the transport shape, with per-value index flags
//! - `Error`: field mismatches, structural failures, capability failures
//!
//! # Example
//!
//! ```rust
//! use propmap_core::{Entity, Key, Value};
//!
//! let entity = Entity::new()
//!     .with_key(Key::name("User", "alice", None))
//!     .with_property("Name", "Alice")
//!     .with_property("Address.City", "Lisbon");
//!
//! assert_eq!(entity.get("Address.City"), Some(&Value::from("Lisbon")));
//! ```

pub use bytes::Bytes;

mod entity;
mod error;
mod key;
mod value;
pub mod wire;

pub use entity::{Entity, Property};
pub use error::{Error, FieldMismatch, StructuralError};
pub use key::{Key, KeyId};
pub use value::{GeoPoint, Value, ValueKind};
pub use wire::{WireEntity, WireKind, WireValue};
