//! Entity keys.

use std::fmt;

/// The identifier part of a key.
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum KeyId {
    /// No identifier has been assigned yet.
    #[default]
    Incomplete,
    /// Numeric identifier. Zero is never a valid ID.
    Id(i64),
    /// String identifier.
    Name(String),
}

/// Identifies a stored entity.
///
/// A key may be *incomplete* (no identifier yet) or *invalid* (for example an
/// incomplete parent). Both are ordinary values: records may hold a key
/// before a store round-trip completes, and the mapper assigns such keys
/// without validating them.
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Key {
    pub kind: String,
    pub id: KeyId,
    pub parent: Option<Box<Key>>,
    pub namespace: String,
}

impl Key {
    /// A key with no identifier, to be completed by the store.
    pub fn incomplete(kind: impl Into<String>, parent: Option<Key>) -> Self {
        Self {
            kind: kind.into(),
            id: KeyId::Incomplete,
            parent: parent.map(Box::new),
            namespace: String::new(),
        }
    }

    /// A key with a numeric identifier.
    pub fn id(kind: impl Into<String>, id: i64, parent: Option<Key>) -> Self {
        Self {
            kind: kind.into(),
            id: if id == 0 { KeyId::Incomplete } else { KeyId::Id(id) },
            parent: parent.map(Box::new),
            namespace: String::new(),
        }
    }

    /// A key with a string identifier.
    pub fn name(kind: impl Into<String>, name: impl Into<String>, parent: Option<Key>) -> Self {
        let name = name.into();
        Self {
            kind: kind.into(),
            id: if name.is_empty() {
                KeyId::Incomplete
            } else {
                KeyId::Name(name)
            },
            parent: parent.map(Box::new),
            namespace: String::new(),
        }
    }

    pub fn with_namespace(mut self, namespace: impl Into<String>) -> Self {
        self.namespace = namespace.into();
        self
    }

    pub fn parent(&self) -> Option<&Key> {
        self.parent.as_deref()
    }

    /// Whether this key still lacks an identifier.
    pub fn is_incomplete(&self) -> bool {
        match &self.id {
            KeyId::Incomplete => true,
            KeyId::Id(id) => *id == 0,
            KeyId::Name(name) => name.is_empty(),
        }
    }

    /// Whether this key and its ancestry are well formed.
    ///
    /// Every level needs a kind, every ancestor must be complete, and
    /// namespaces must agree along the chain.
    pub fn is_valid(&self) -> bool {
        let mut current = Some(self);
        while let Some(key) = current {
            if key.kind.is_empty() {
                return false;
            }
            if let Some(parent) = key.parent() {
                if parent.is_incomplete() || parent.namespace != key.namespace {
                    return false;
                }
            }
            current = key.parent();
        }
        true
    }

    /// The key with its identifier replaced by a numeric one.
    pub fn completed(&self, id: i64) -> Self {
        Self {
            id: KeyId::Id(id),
            ..self.clone()
        }
    }
}

impl fmt::Display for Key {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(parent) = self.parent() {
            write!(f, "{}", parent)?;
        }
        write!(f, "/{},", self.kind)?;
        match &self.id {
            KeyId::Incomplete => write!(f, "<incomplete>"),
            KeyId::Id(id) => write!(f, "{}", id),
            KeyId::Name(name) => write!(f, "{:?}", name),
        }
    }
}
