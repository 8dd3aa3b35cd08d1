//! Loading property lists into records.
//!
//! # Design Notes
//!
//! - Field mismatches are collected, not returned early. The destination ends
//!   up holding every value that could be assigned and the caller gets one
//!   [`Error::FieldMismatch`] listing the rest.
//! - Capability errors (anything a custom loader returns that is not a field
//!   mismatch) stop the load immediately.
//! - The entity key is applied after the properties, so a key holder is set
//!   even when some properties failed.

use std::collections::HashSet;

use propmap_core::{Entity, Error, FieldMismatch, Key, Property, Value};

use crate::cache::{self, Codec};
use crate::resolve::{FieldMap, Step, StepKind};
use crate::schema::Record;
use crate::slot::{DynRecord, LoadContext};

/// Options for [`load_with`].
#[derive(Clone, Debug, Default)]
pub struct LoadOptions {
    ignore_unknown: bool,
}

impl LoadOptions {
    pub fn new() -> Self {
        Self::default()
    }

    /// Skip properties that match no field instead of reporting
    /// `"no such struct field"`.
    pub fn ignore_unknown(mut self, ignore: bool) -> Self {
        self.ignore_unknown = ignore;
        self
    }

    pub fn ignores_unknown(&self) -> bool {
        self.ignore_unknown
    }
}

/// Load `entity` into `dst`.
///
/// Returns [`Error::FieldMismatch`] when some properties could not be
/// assigned; `dst` still holds everything that could.
pub fn load<T: Record>(dst: &mut T, entity: Entity) -> Result<(), Error> {
    load_with(dst, entity, &LoadOptions::default())
}

pub fn load_with<T: Record>(
    dst: &mut T,
    entity: Entity,
    options: &LoadOptions,
) -> Result<(), Error> {
    let mut mismatches = Vec::new();
    load_entity(dst, entity, &mut mismatches, options)?;
    finish(mismatches)
}

/// Load a bare property list (no key) into `dst`.
pub fn load_properties<T: Record>(dst: &mut T, properties: Vec<Property>) -> Result<(), Error> {
    load(dst, Entity::from_properties(properties))
}

/// Load a nested entity value, reporting into the enclosing load.
pub(crate) fn load_nested<T: Record>(
    dst: &mut T,
    entity: Entity,
    cx: &mut LoadContext<'_>,
) -> Result<(), Error> {
    let (mismatches, options) = cx.parts();
    load_entity(dst, entity, mismatches, options)
}

fn finish(mismatches: Vec<FieldMismatch>) -> Result<(), Error> {
    if mismatches.is_empty() {
        return Ok(());
    }
    log::debug!("load finished with {} field mismatches", mismatches.len());
    Err(Error::FieldMismatch(mismatches))
}

fn load_entity<T: Record>(
    dst: &mut T,
    entity: Entity,
    mismatches: &mut Vec<FieldMismatch>,
    options: &LoadOptions,
) -> Result<(), Error> {
    let codec = cache::codec::<T>()?;
    let Entity { key, properties } = entity;

    let before = mismatches.len();
    let loaded = match codec.schema.loader {
        Some(loader) => absorb(loader(dst, properties), mismatches),
        None => load_fields(dst, &codec.map, properties, mismatches, options),
    };
    let clean = loaded.is_ok() && mismatches.len() == before;

    let keyed = match key {
        None => Ok(()),
        Some(key) => match codec.schema.key_loader {
            Some(key_loader) => {
                let mut key_mismatches = Vec::new();
                let result = absorb(key_loader(dst, key), &mut key_mismatches);
                if clean {
                    mismatches.append(&mut key_mismatches);
                }
                result
            }
            None => assign_key(dst, &codec, key, mismatches, options),
        },
    };

    loaded?;
    keyed
}

/// Move a capability's field mismatches onto the list; pass other errors on.
fn absorb(result: Result<(), Error>, mismatches: &mut Vec<FieldMismatch>) -> Result<(), Error> {
    match result {
        Err(Error::FieldMismatch(mut found)) => {
            mismatches.append(&mut found);
            Ok(())
        }
        other => other,
    }
}

fn assign_key<T: Record>(
    dst: &mut T,
    codec: &Codec<T>,
    key: Key,
    mismatches: &mut Vec<FieldMismatch>,
    options: &LoadOptions,
) -> Result<(), Error> {
    let Some(index) = codec.map.key_field() else {
        return Ok(());
    };
    let (Some(field), Some(def)) = (codec.map.fields().get(index), codec.schema.fields.get(index))
    else {
        return Ok(());
    };
    let mut cx = LoadContext::new(codec.map.type_name(), &field.name, mismatches, options);
    def.accessor.get_mut(dst).load_value(Value::Key(key), &mut cx)
}

fn load_fields<T: Record>(
    dst: &mut T,
    map: &FieldMap,
    properties: Vec<Property>,
    mismatches: &mut Vec<FieldMismatch>,
    options: &LoadOptions,
) -> Result<(), Error> {
    let mut grouped: Vec<(String, Entity)> = Vec::new();
    let mut seen: HashSet<String> = HashSet::new();

    for Property { name, value, .. } in properties {
        if let Some(target) = map.target(&name) {
            if !target.is_slice && !seen.insert(name.clone()) {
                mismatches.push(FieldMismatch::new(
                    map.type_name(),
                    name,
                    "multiple-valued property requires a sequence field",
                ));
                continue;
            }
            let mut cx = LoadContext::new(map.type_name(), &name, mismatches, options);
            store(dst, &target.steps, value, &mut cx)?;
            continue;
        }

        if let Some((prefix, rest)) = map.opaque_prefix(&name) {
            let property = Property::new(rest, value);
            match grouped.iter_mut().find(|(p, _)| p == prefix) {
                Some((_, entity)) => entity.properties.push(property),
                None => grouped.push((prefix.to_string(), Entity::from_properties(vec![property]))),
            }
            continue;
        }

        if options.ignores_unknown() {
            log::trace!("{}: ignoring unknown property {:?}", map.type_name(), name);
            continue;
        }
        mismatches.push(FieldMismatch::new(map.type_name(), name, "no such struct field"));
    }

    for (prefix, entity) in grouped {
        if let Some(target) = map.target(&prefix) {
            let mut cx = LoadContext::new(map.type_name(), &prefix, mismatches, options);
            store(dst, &target.steps, Value::Entity(Box::new(entity)), &mut cx)?;
        }
    }
    Ok(())
}

/// Walk `steps` from `record` and load `value` into the final slot.
fn store(
    record: &mut dyn DynRecord,
    steps: &[Step],
    value: Value,
    cx: &mut LoadContext<'_>,
) -> Result<(), Error> {
    let Some((step, rest)) = steps.split_first() else {
        return Ok(());
    };
    let slot = record.field_mut(step.index)?;
    if rest.is_empty() {
        return slot.load_value(value, cx);
    }

    if step.kind == StepKind::Slice {
        let values = match value {
            Value::Array(values) => values,
            single => vec![single],
        };
        if values.is_empty() {
            return Ok(());
        }
        // Sibling columns may differ in length; never shrink what an
        // earlier column filled.
        let current = slot.elements().map_or(0, |elements| elements.len());
        if values.len() > current {
            slot.set_len(values.len());
        }
        for (i, value) in values.into_iter().enumerate() {
            match slot.element_mut(i).and_then(|element| element.record_mut()) {
                Some(nested) => store(nested, rest, value, cx)?,
                None => cx.mismatch("cannot descend into sequence element"),
            }
        }
        return Ok(());
    }

    match slot.record_mut() {
        Some(nested) => store(nested, rest, value, cx),
        None => {
            cx.mismatch("cannot descend into a non-record field");
            Ok(())
        }
    }
}
