//! Error types shared by the mapper and its callers.

/// A recoverable, per-field load failure.
///
/// Loading continues past a mismatch; everything else that could be assigned
/// is still assigned.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
#[error("cannot load field {field:?} into a {type_name:?}: {reason}")]
pub struct FieldMismatch {
    /// The destination record type.
    pub type_name: String,
    /// The property (or field) name that failed.
    pub field: String,
    /// Human-readable reason.
    pub reason: String,
}

impl FieldMismatch {
    pub fn new(
        type_name: impl Into<String>,
        field: impl Into<String>,
        reason: impl Into<String>,
    ) -> Self {
        Self {
            type_name: type_name.into(),
            field: field.into(),
            reason: reason.into(),
        }
    }
}

/// A record type whose metadata cannot be resolved.
///
/// Detected once per type and remembered: every later load or save against
/// the type fails the same way.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
#[error("invalid record type {type_name:?}: {message}")]
pub struct StructuralError {
    pub type_name: String,
    pub message: String,
}

impl StructuralError {
    pub fn new(type_name: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            type_name: type_name.into(),
            message: message.into(),
        }
    }
}

/// Errors produced while mapping records to and from property lists.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// One or more recoverable field mismatches. Never empty.
    ///
    /// The destination still holds every value that loaded successfully.
    #[error("{}", describe_mismatches(.0))]
    FieldMismatch(Vec<FieldMismatch>),

    /// The record type itself is malformed.
    #[error(transparent)]
    Structural(#[from] StructuralError),

    /// A custom load, save or key capability failed.
    #[error("{0}")]
    Custom(Box<dyn std::error::Error + Send + Sync>),

    /// Generic error with message.
    #[error("{message}")]
    Other { message: String },
}

impl Error {
    /// A single field mismatch.
    pub fn mismatch(
        type_name: impl Into<String>,
        field: impl Into<String>,
        reason: impl Into<String>,
    ) -> Self {
        Error::FieldMismatch(vec![FieldMismatch::new(type_name, field, reason)])
    }

    /// Wrap an arbitrary error raised by a custom capability.
    pub fn custom(error: impl std::error::Error + Send + Sync + 'static) -> Self {
        Error::Custom(Box::new(error))
    }

    pub fn other(message: impl Into<String>) -> Self {
        Error::Other {
            message: message.into(),
        }
    }

    /// Whether the destination is still usable after this error.
    pub fn is_field_mismatch(&self) -> bool {
        matches!(self, Error::FieldMismatch(_))
    }

    /// The mismatches carried by this error; empty for other kinds.
    pub fn field_mismatches(&self) -> &[FieldMismatch] {
        match self {
            Error::FieldMismatch(mismatches) => mismatches,
            _ => &[],
        }
    }
}

impl From<FieldMismatch> for Error {
    fn from(mismatch: FieldMismatch) -> Self {
        Error::FieldMismatch(vec![mismatch])
    }
}

fn describe_mismatches(mismatches: &[FieldMismatch]) -> String {
    match mismatches {
        [] => "field mismatch".to_string(),
        [only] => only.to_string(),
        [first, rest @ ..] => format!("{} (and {} more field mismatches)", first, rest.len()),
    }
}
