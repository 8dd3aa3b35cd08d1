use propmap_core::Key;

#[derive(thiserror::Error, Debug)]
pub enum Error {
    #[error(transparent)]
    Mapper(#[from] propmap_core::Error),

    #[error("no such entity: {key}")]
    NoSuchEntity { key: Key },

    #[error("invalid key: {key}")]
    InvalidKey { key: Key },

    #[error("{keys} keys but {destinations} destinations")]
    LengthMismatch { keys: usize, destinations: usize },

    /// Per-key results of a multi-key operation; `None` where the key
    /// succeeded.
    #[error("{}", describe_multi(.0))]
    Multi(Vec<Option<Error>>),
}

impl Error {
    /// Whether every failure is a field mismatch, leaving destinations usable.
    pub fn is_field_mismatch(&self) -> bool {
        match self {
            Error::Mapper(e) => e.is_field_mismatch(),
            Error::Multi(errors) => errors.iter().flatten().all(Error::is_field_mismatch),
            _ => false,
        }
    }
}

fn describe_multi(errors: &[Option<Error>]) -> String {
    let mut failed = errors.iter().flatten();
    match failed.next() {
        None => "no errors".to_string(),
        Some(first) => {
            let rest = failed.count();
            if rest == 0 {
                first.to_string()
            } else {
                format!("{} (and {} other errors)", first, rest)
            }
        }
    }
}
