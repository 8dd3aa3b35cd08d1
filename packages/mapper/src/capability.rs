//! Custom load, save and key capabilities.
//!
//! A record type that implements one of these traits and registers it on its
//! [`Schema`](crate::Schema) takes over that part of the mapping. Returning
//! [`Error::FieldMismatch`] from a capability is treated as recoverable; any
//! other error aborts the operation.

use propmap_core::{Error, Key, Property};

/// Replaces field-by-field loading for a record type.
pub trait PropertyLoader {
    fn load(&mut self, properties: Vec<Property>) -> Result<(), Error>;
}

/// Replaces field-by-field saving for a record type.
pub trait PropertySaver {
    fn save(&self) -> Result<Vec<Property>, Error>;
}

/// Receives the entity key instead of a `__key__` field.
pub trait KeyLoader {
    fn load_key(&mut self, key: Key) -> Result<(), Error>;
}

/// Which capabilities a record type registered.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Capabilities {
    pub load: bool,
    pub save: bool,
    pub load_key: bool,
}

impl Capabilities {
    /// Types with a custom loader or saver are never expanded or promoted;
    /// they are addressed as a whole.
    pub fn is_opaque(&self) -> bool {
        self.load || self.save
    }
}
