//! Record <-> property-list mapping
//!
//! This crate maps native record types onto the [`Entity`](propmap_core::Entity)
//! model and back:
//! - [`Record`] / [`Schema`]: each type describes its fields once
//! - [`load`] / [`load_with`]: coerce property values into fields, collecting
//!   field mismatches instead of stopping at the first one
//! - [`save`] / [`save_entity`]: emit properties, honoring `noindex`,
//!   `flatten` and `omitempty`
//! - [`PropertyLoader`], [`PropertySaver`], [`KeyLoader`]: per-type overrides
//!
//! Resolved metadata is cached per type for the life of the process.
//!
//! # Example
//!
//! ```rust
//! use propmap_core::{Entity, Property};
//! use propmap_mapper::{load, save, Record, Schema};
//!
//! #[derive(Default)]
//! struct Address {
//!     city: String,
//! }
//!
//! impl Record for Address {
//!     fn schema() -> Schema<Self> {
//!         Schema::<Self>::new().field("City", |a| &a.city, |a| &mut a.city)
//!     }
//! }
//!
//! #[derive(Default)]
//! struct Person {
//!     name: String,
//!     address: Address,
//! }
//!
//! impl Record for Person {
//!     fn schema() -> Schema<Self> {
//!         Schema::<Self>::new()
//!             .field("Name", |p| &p.name, |p| &mut p.name)
//!             .tagged("Address", ",flatten", |p| &p.address, |p| &mut p.address)
//!     }
//! }
//!
//! let mut person = Person::default();
//! let entity = Entity::new()
//!     .with_property("Name", "Ada")
//!     .with_property("Address.City", "London");
//! load(&mut person, entity).unwrap();
//! assert_eq!(person.address.city, "London");
//!
//! let properties = save(&person).unwrap();
//! assert_eq!(properties[1], Property::new("Address.City", "London"));
//! ```

mod cache;
mod capability;
mod coerce;
mod dynamic;
mod load;
mod resolve;
mod save;
mod schema;
mod slot;
mod tag;

pub use cache::field_map;
pub use capability::{Capabilities, KeyLoader, PropertyLoader, PropertySaver};
pub use dynamic::{AnyValue, Constraint, Dynamic};
pub use load::{load, load_properties, load_with, LoadOptions};
pub use resolve::{FieldMap, ResolvedField, Step, StepKind, Target};
pub use save::{save, save_entity};
pub use schema::{FieldInfo, FieldType, Record, RecordType, Schema, Shape};
pub use slot::{DynRecord, LoadContext, Slot};
pub use tag::{FieldOptions, KEY_FIELD};
