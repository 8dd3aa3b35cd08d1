//! Process-wide cache of resolved record types.
//!
//! Each record type is resolved at most once per process (modulo a benign
//! race on first use, where the first writer wins). Structural failures are
//! cached too, so a malformed type fails the same way on every call.

use std::any::{Any, TypeId};
use std::collections::HashMap;
use std::sync::{Arc, PoisonError, RwLock};

use lazy_static::lazy_static;
use propmap_core::{Error, StructuralError};

use crate::resolve::{resolve, FieldMap};
use crate::schema::{type_name, Record, Schema};

/// A record type's schema together with its resolved field map.
pub(crate) struct Codec<T> {
    pub(crate) schema: Schema<T>,
    pub(crate) map: Arc<FieldMap>,
}

type Entry<T> = Result<Arc<Codec<T>>, StructuralError>;

lazy_static! {
    static ref CODECS: RwLock<HashMap<TypeId, Arc<dyn Any + Send + Sync>>> =
        RwLock::new(HashMap::new());
}

pub(crate) fn codec<T: Record>() -> Result<Arc<Codec<T>>, Error> {
    let id = TypeId::of::<T>();
    let cached = CODECS
        .read()
        .unwrap_or_else(PoisonError::into_inner)
        .get(&id)
        .cloned();

    let entry = match cached {
        Some(entry) => entry,
        None => {
            let built: Arc<dyn Any + Send + Sync> = Arc::new(build::<T>());
            CODECS
                .write()
                .unwrap_or_else(PoisonError::into_inner)
                .entry(id)
                .or_insert(built)
                .clone()
        }
    };

    match entry.downcast_ref::<Entry<T>>() {
        Some(Ok(codec)) => Ok(codec.clone()),
        Some(Err(e)) => Err(e.clone().into()),
        None => Err(Error::other(format!(
            "type cache entry for {} has an unexpected type",
            type_name::<T>()
        ))),
    }
}

fn build<T: Record>() -> Entry<T> {
    let schema = T::schema();
    let resolved = resolve(
        type_name::<T>(),
        TypeId::of::<T>(),
        &schema.infos(),
        schema.capabilities(),
    );
    match resolved {
        Ok(map) => {
            log::debug!(
                "resolved {} property names for {}",
                map.len(),
                map.type_name()
            );
            Ok(Arc::new(Codec {
                schema,
                map: Arc::new(map),
            }))
        }
        Err(e) => {
            log::warn!("{}", e);
            Err(e)
        }
    }
}

/// The resolved field map of `T`, resolving and caching it on first use.
pub fn field_map<T: Record>() -> Result<Arc<FieldMap>, Error> {
    Ok(codec::<T>()?.map.clone())
}
