//! propmap: map native records to and from document store property lists.
//!
//! Records describe their fields once through [`Record::schema`]; [`load`]
//! and [`save`] then convert between records and [`Entity`] values, handling
//! dotted and nested names, embedded fields, optional and repeated fields,
//! dynamically typed fields and custom load/save capabilities.
//!
//! The pieces live in separate crates, re-exported here:
//! - `propmap-core`: the value and entity model
//! - `propmap-mapper`: schemas, field resolution, load and save
//! - `propmap-memory-store`: an in-memory keyed store (feature `memory-store`)
//! - `propmap-auth`: an OAuth2 three-legged token provider (feature `auth`)
//!
//! # Example
//!
//! ```rust
//! use propmap::{load, save_entity, Entity, Key, Record, Schema};
//!
//! #[derive(Debug, Default, PartialEq)]
//! struct Book {
//!     title: String,
//!     pages: i64,
//!     key: Option<Key>,
//! }
//!
//! impl Record for Book {
//!     fn schema() -> Schema<Self> {
//!         Schema::<Self>::new()
//!             .field("Title", |b| &b.title, |b| &mut b.title)
//!             .tagged("Pages", "Pages,noindex", |b| &b.pages, |b| &mut b.pages)
//!             .tagged("Key", "__key__", |b| &b.key, |b| &mut b.key)
//!     }
//! }
//!
//! let entity = Entity::new()
//!     .with_key(Key::name("Book", "dune", None))
//!     .with_property("Title", "Dune")
//!     .with_property("Pages", 412i64);
//!
//! let mut book = Book::default();
//! load(&mut book, entity).unwrap();
//! assert_eq!(book.key, Some(Key::name("Book", "dune", None)));
//!
//! let saved = save_entity(&book).unwrap();
//! assert!(saved.property("Pages").unwrap().no_index);
//! ```

pub use propmap_core::{
    wire, Bytes, Entity, Error, FieldMismatch, GeoPoint, Key, KeyId, Property, StructuralError,
    Value, ValueKind, WireEntity, WireKind, WireValue,
};
pub use propmap_mapper::{
    field_map, load, load_properties, load_with, save, save_entity, AnyValue, Capabilities,
    Constraint, Dynamic, DynRecord, FieldInfo, FieldMap, FieldOptions, FieldType, KeyLoader,
    LoadContext, LoadOptions, PropertyLoader, PropertySaver, Record, RecordType, ResolvedField,
    Schema, Shape, Slot, Step, StepKind, Target, KEY_FIELD,
};

#[cfg(feature = "memory-store")]
pub use propmap_memory_store::{Error as StoreError, InMemoryDatastore};

#[cfg(feature = "auth")]
pub mod auth {
    pub use propmap_auth::*;
}
