//! Saving records as property lists.

use propmap_core::{Entity, Error, Key, Property, Value};

use crate::cache;
use crate::resolve::FieldMap;
use crate::schema::Record;
use crate::slot::{DynRecord, Slot};

/// Save `src` as a property list.
///
/// A registered [`PropertySaver`](crate::PropertySaver) takes over entirely.
/// Otherwise fields are emitted in declaration order: skipped and key fields
/// are left out, embedded records are promoted, `omitempty` drops zero
/// values, and `flatten` emits dotted names (one array per leaf when the
/// flattened field is a sequence).
pub fn save<T: Record>(src: &T) -> Result<Vec<Property>, Error> {
    let codec = cache::codec::<T>()?;
    if let Some(saver) = codec.schema.saver {
        return saver(src);
    }
    let mut properties = Vec::new();
    save_fields(src, &codec.map, "", false, &mut properties)?;
    Ok(properties)
}

/// Save `src` as an entity, taking the key from its `__key__` field.
pub fn save_entity<T: Record>(src: &T) -> Result<Entity, Error> {
    let codec = cache::codec::<T>()?;
    let key = match codec.map.key_field().and_then(|i| codec.schema.fields.get(i)) {
        Some(def) => key_of(def.accessor.get(src))?,
        None => None,
    };
    Ok(Entity {
        key,
        properties: save(src)?,
    })
}

fn key_of(slot: &dyn Slot) -> Result<Option<Key>, Error> {
    if slot.is_zero() {
        return Ok(None);
    }
    match slot.save_value()? {
        Value::Key(key) => Ok(Some(key)),
        _ => Ok(None),
    }
}

fn save_fields(
    record: &dyn DynRecord,
    map: &FieldMap,
    prefix: &str,
    no_index: bool,
    out: &mut Vec<Property>,
) -> Result<(), Error> {
    for (index, field) in map.fields().iter().enumerate() {
        if field.options.skip || field.options.key {
            continue;
        }
        let slot = record.field(index)?;
        let no_index = no_index || field.options.no_index;

        if field.promoted {
            if let Some(inner) = slot.record() {
                let map = inner.field_map()?;
                save_fields(inner, &map, prefix, no_index, out)?;
            }
            continue;
        }
        if field.options.omit_empty && slot.is_zero() {
            continue;
        }

        let name = format!("{}{}", prefix, field.name);
        if field.options.flatten {
            save_flattened(slot, &name, no_index, out)?;
            continue;
        }
        out.push(Property {
            name,
            value: slot.save_value()?,
            no_index,
        });
    }
    Ok(())
}

fn save_flattened(
    slot: &dyn Slot,
    name: &str,
    no_index: bool,
    out: &mut Vec<Property>,
) -> Result<(), Error> {
    match slot.elements() {
        Some(elements) => {
            // Every column holds one entry per element; a property an
            // element did not emit (omitempty) is padded with null.
            let count = elements.len();
            let mut columns: Vec<(Property, Vec<Value>)> = Vec::new();
            for (index, element) in elements.into_iter().enumerate() {
                let Some(inner) = element.record() else {
                    return Err(Error::other(format!(
                        "cannot flatten {:?}: element {} is null",
                        name, index
                    )));
                };
                for property in prefixed(inner, name, no_index)? {
                    if property.value.is_array() {
                        return Err(Error::other(format!(
                            "flattening {:?} leads to a sequence of sequences at {:?}",
                            name, property.name
                        )));
                    }
                    let found = columns.iter().position(|(c, _)| c.name == property.name);
                    let position = match found {
                        Some(position) => position,
                        None => {
                            let header = Property {
                                name: property.name,
                                value: Value::Null,
                                no_index: property.no_index,
                            };
                            columns.push((header, vec![Value::Null; index]));
                            columns.len() - 1
                        }
                    };
                    let values = &mut columns[position].1;
                    if values.len() < index {
                        values.resize(index, Value::Null);
                    }
                    values.push(property.value);
                }
            }
            out.extend(columns.into_iter().map(|(mut column, mut values)| {
                values.resize(count, Value::Null);
                column.value = Value::Array(values);
                column
            }));
        }
        None => {
            if let Some(inner) = slot.record() {
                out.extend(prefixed(inner, name, no_index)?);
            }
        }
    }
    Ok(())
}

fn prefixed(record: &dyn DynRecord, name: &str, no_index: bool) -> Result<Vec<Property>, Error> {
    let properties = record.save_properties()?;
    Ok(properties
        .into_iter()
        .map(|p| Property {
            name: format!("{}.{}", name, p.name),
            value: p.value,
            no_index: no_index || p.no_index,
        })
        .collect())
}
