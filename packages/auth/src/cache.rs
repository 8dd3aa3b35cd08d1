//! Token caching in front of another provider.

use std::sync::{Mutex, PoisonError};
use std::time::Duration;

use crate::error::Error;
use crate::types::Token;
use crate::TokenProvider;

/// Cached tokens are replaced this long before they expire unless
/// configured otherwise.
pub const DEFAULT_EARLY_EXPIRY: Duration = Duration::from_secs(10);

/// Wraps a provider and reuses its token until shortly before expiry.
pub struct CachedTokenProvider {
    provider: Box<dyn TokenProvider>,
    early_expiry: Duration,
    cached: Mutex<Option<Token>>,
}

impl CachedTokenProvider {
    /// A zero or missing `early_expiry` means [`DEFAULT_EARLY_EXPIRY`].
    pub fn new(provider: Box<dyn TokenProvider>, early_expiry: Option<Duration>) -> Self {
        Self {
            provider,
            early_expiry: early_expiry
                .filter(|d| !d.is_zero())
                .unwrap_or(DEFAULT_EARLY_EXPIRY),
            cached: Mutex::new(None),
        }
    }

    pub fn early_expiry(&self) -> Duration {
        self.early_expiry
    }
}

impl TokenProvider for CachedTokenProvider {
    fn token(&self) -> Result<Token, Error> {
        let mut cached = self.cached.lock().unwrap_or_else(PoisonError::into_inner);
        if let Some(token) = cached.as_ref() {
            if token.is_valid_for(self.early_expiry) {
                return Ok(token.clone());
            }
        }
        let fresh = self.provider.token()?;
        *cached = Some(fresh.clone());
        Ok(fresh)
    }
}
