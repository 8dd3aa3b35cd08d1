//! Type-erased field slots.
//!
//! Every declared field is reached through a [`Slot`]: something that can take
//! a [`Value`] (coercing it into its own representation) and produce one back.
//! Nested records are reached through [`DynRecord`], which is implemented for
//! every [`Record`].
//!
//! # Design Notes
//!
//! Coercion failures do not abort a load. A slot records them on the
//! [`LoadContext`] and returns `Ok(())`; only capability failures and
//! structural problems come back as `Err`.

use std::sync::Arc;

use propmap_core::{Error, FieldMismatch, Property, Value};

use crate::load::LoadOptions;
use crate::resolve::FieldMap;
use crate::schema::{type_name, Record};
use crate::{cache, save};

/// A field that values can be loaded into and saved from.
pub trait Slot {
    /// Coerce `value` into this slot, recording mismatches on `cx`.
    fn load_value(&mut self, value: Value, cx: &mut LoadContext<'_>) -> Result<(), Error>;

    fn save_value(&self) -> Result<Value, Error>;

    /// Whether this slot holds its type's zero value (for `omitempty`).
    fn is_zero(&self) -> bool {
        false
    }

    /// The record held by this slot, if any.
    fn record(&self) -> Option<&dyn DynRecord> {
        None
    }

    /// The record held by this slot, allocating an absent optional record.
    fn record_mut(&mut self) -> Option<&mut dyn DynRecord> {
        None
    }

    /// Elements of a sequence slot.
    fn elements(&self) -> Option<Vec<&dyn Slot>> {
        None
    }

    /// Resize a sequence slot. Returns false for non-sequences.
    fn set_len(&mut self, _len: usize) -> bool {
        false
    }

    fn element_mut(&mut self, _index: usize) -> Option<&mut dyn Slot> {
        None
    }
}

/// Where a value is being loaded, and where mismatches go.
pub struct LoadContext<'a> {
    type_name: &'a str,
    field: &'a str,
    mismatches: &'a mut Vec<FieldMismatch>,
    options: &'a LoadOptions,
}

impl<'a> LoadContext<'a> {
    pub(crate) fn new(
        type_name: &'a str,
        field: &'a str,
        mismatches: &'a mut Vec<FieldMismatch>,
        options: &'a LoadOptions,
    ) -> Self {
        Self {
            type_name,
            field,
            mismatches,
            options,
        }
    }

    /// Record a mismatch for the current field.
    pub fn mismatch(&mut self, reason: impl Into<String>) {
        self.mismatches
            .push(FieldMismatch::new(self.type_name, self.field, reason));
    }

    pub fn type_name(&self) -> &str {
        self.type_name
    }

    pub fn field(&self) -> &str {
        self.field
    }

    pub fn options(&self) -> &LoadOptions {
        self.options
    }

    pub(crate) fn parts(&mut self) -> (&mut Vec<FieldMismatch>, &LoadOptions) {
        (&mut *self.mismatches, self.options)
    }
}

/// Object-safe view of a [`Record`].
pub trait DynRecord {
    fn type_name(&self) -> &'static str;

    /// The resolved field map of this record's type.
    fn field_map(&self) -> Result<Arc<FieldMap>, Error>;

    /// The slot of the field at `index`, in declaration order.
    fn field(&self, index: usize) -> Result<&dyn Slot, Error>;

    fn field_mut(&mut self, index: usize) -> Result<&mut dyn Slot, Error>;

    /// Save through the type's saver, or field by field.
    fn save_properties(&self) -> Result<Vec<Property>, Error>;
}

impl<T: Record> DynRecord for T {
    fn type_name(&self) -> &'static str {
        type_name::<T>()
    }

    fn field_map(&self) -> Result<Arc<FieldMap>, Error> {
        Ok(cache::codec::<T>()?.map.clone())
    }

    fn field(&self, index: usize) -> Result<&dyn Slot, Error> {
        let codec = cache::codec::<T>()?;
        let def = codec
            .schema
            .fields
            .get(index)
            .ok_or_else(|| out_of_range::<T>(index))?;
        Ok(def.accessor.get(self))
    }

    fn field_mut(&mut self, index: usize) -> Result<&mut dyn Slot, Error> {
        let codec = cache::codec::<T>()?;
        let def = codec
            .schema
            .fields
            .get(index)
            .ok_or_else(|| out_of_range::<T>(index))?;
        Ok(def.accessor.get_mut(self))
    }

    fn save_properties(&self) -> Result<Vec<Property>, Error> {
        save::save(self)
    }
}

fn out_of_range<T>(index: usize) -> Error {
    Error::other(format!(
        "field index {} out of range for {}",
        index,
        type_name::<T>()
    ))
}
