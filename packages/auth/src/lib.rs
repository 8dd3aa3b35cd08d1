//! OAuth2 three-legged token provider
//!
//! Obtains access tokens for document store clients, either from a stored
//! refresh token or by running the consent step through an
//! [`AuthorizationHandler`] and exchanging the returned code. Providers are
//! blocking and safe to share between threads.
//!
//! # Example
//!
//! ```no_run
//! use propmap_auth::{new_3lo_token_provider, AuthStyle, Options3LO, TokenProvider};
//!
//! let opts = Options3LO::new(
//!     "client-id",
//!     "client-secret",
//!     "https://accounts.example.com/o/oauth2/auth",
//!     "https://oauth2.example.com/token",
//! )
//! .with_auth_style(AuthStyle::InParams)
//! .with_scopes(["https://www.example.com/auth/datastore"]);
//!
//! let provider = new_3lo_token_provider("stored-refresh-token", opts);
//! let token = provider.token()?;
//! println!("Authorization: {} {}", token.token_type, token.value);
//! # Ok::<(), propmap_auth::Error>(())
//! ```

mod cache;
mod error;
mod three_legged;
mod types;

pub use cache::{CachedTokenProvider, DEFAULT_EARLY_EXPIRY};
pub use error::{Error, TokenError};
pub use three_legged::{new_3lo_token_provider, HandlerTokenProvider, RefreshTokenProvider};
pub use types::{
    AuthStyle, AuthorizationHandler, AuthorizationHandlerOptions, Options3LO, PkceConfig, Token,
};

/// A source of access tokens.
pub trait TokenProvider: Send + Sync {
    fn token(&self) -> Result<Token, Error>;
}
