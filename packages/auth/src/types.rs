use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use reqwest::blocking::Client;
use serde::{Deserialize, Deserializer, Serialize};

/// How client credentials travel in a token request.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AuthStyle {
    /// Not configured. Token requests fail with [`Error::MissingAuthStyle`](crate::Error::MissingAuthStyle).
    #[default]
    Unknown,
    /// `client_id` and `client_secret` in the form body.
    InParams,
    /// HTTP basic auth with URL-escaped credentials.
    InHeader,
}

/// Proof Key for Code Exchange parameters.
///
/// The challenge and verifier are generated by the caller.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PkceConfig {
    pub challenge: String,
    /// e.g. `S256`
    pub challenge_method: String,
    pub verifier: String,
}

/// Prompts for consent at the given URL and returns `(code, state)`.
pub type AuthorizationHandler = Arc<
    dyn Fn(&str) -> Result<(String, String), Box<dyn std::error::Error + Send + Sync>>
        + Send
        + Sync,
>;

/// Settings for running the consent step through a custom handler.
#[derive(Clone)]
pub struct AuthorizationHandlerOptions {
    pub handler: AuthorizationHandler,
    /// Must come back unchanged from the handler.
    pub state: String,
    pub pkce: Option<PkceConfig>,
}

impl AuthorizationHandlerOptions {
    pub fn new(
        handler: impl Fn(&str) -> Result<(String, String), Box<dyn std::error::Error + Send + Sync>>
            + Send
            + Sync
            + 'static,
        state: impl Into<String>,
    ) -> Self {
        Self {
            handler: Arc::new(handler),
            state: state.into(),
            pkce: None,
        }
    }

    pub fn with_pkce(mut self, pkce: PkceConfig) -> Self {
        self.pkce = Some(pkce);
        self
    }
}

impl fmt::Debug for AuthorizationHandlerOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AuthorizationHandlerOptions")
            .field("state", &self.state)
            .field("pkce", &self.pkce)
            .finish_non_exhaustive()
    }
}

/// Options for a three-legged OAuth2 flow.
///
/// Deserializes from configuration files; the handler and HTTP client are
/// attached in code.
#[derive(Clone, Default, Deserialize)]
#[serde(default)]
pub struct Options3LO {
    pub client_id: String,
    pub client_secret: String,
    pub auth_url: String,
    pub token_url: String,
    pub redirect_url: String,
    pub scopes: Vec<String>,
    /// Extra parameters for every token request.
    pub url_params: BTreeMap<String, String>,
    pub auth_style: AuthStyle,
    /// How long before expiry a cached token is replaced. Defaults to 10 s.
    #[serde(rename = "early_token_expiry_secs", deserialize_with = "seconds")]
    pub early_token_expiry: Option<Duration>,
    #[serde(skip)]
    pub auth_handler: Option<AuthorizationHandlerOptions>,
    #[serde(skip)]
    pub client: Option<Client>,
}

fn seconds<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<Duration>, D::Error> {
    Ok(Option::<u64>::deserialize(deserializer)?.map(Duration::from_secs))
}

impl Options3LO {
    pub fn new(
        client_id: impl Into<String>,
        client_secret: impl Into<String>,
        auth_url: impl Into<String>,
        token_url: impl Into<String>,
    ) -> Self {
        Self {
            client_id: client_id.into(),
            client_secret: client_secret.into(),
            auth_url: auth_url.into(),
            token_url: token_url.into(),
            ..Self::default()
        }
    }

    pub fn with_redirect_url(mut self, url: impl Into<String>) -> Self {
        self.redirect_url = url.into();
        self
    }

    pub fn with_scopes<I, S>(mut self, scopes: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.scopes = scopes.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_url_param(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.url_params.insert(name.into(), value.into());
        self
    }

    pub fn with_auth_style(mut self, style: AuthStyle) -> Self {
        self.auth_style = style;
        self
    }

    pub fn with_early_token_expiry(mut self, early: Duration) -> Self {
        self.early_token_expiry = Some(early);
        self
    }

    pub fn with_auth_handler(mut self, handler: AuthorizationHandlerOptions) -> Self {
        self.auth_handler = Some(handler);
        self
    }

    /// Use a preconfigured HTTP client for token requests.
    pub fn with_client(mut self, client: Client) -> Self {
        self.client = Some(client);
        self
    }

    pub(crate) fn pkce(&self) -> Option<&PkceConfig> {
        self.auth_handler.as_ref()?.pkce.as_ref()
    }

    pub(crate) fn http_client(&self) -> Client {
        self.client.clone().unwrap_or_default()
    }
}

impl fmt::Debug for Options3LO {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Options3LO")
            .field("client_id", &self.client_id)
            .field("client_secret", &"<redacted>")
            .field("auth_url", &self.auth_url)
            .field("token_url", &self.token_url)
            .field("redirect_url", &self.redirect_url)
            .field("scopes", &self.scopes)
            .field("url_params", &self.url_params)
            .field("auth_style", &self.auth_style)
            .field("early_token_expiry", &self.early_token_expiry)
            .field("auth_handler", &self.auth_handler)
            .finish_non_exhaustive()
    }
}

/// An OAuth2 access token.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Token {
    pub value: String,
    /// Usually `Bearer`.
    pub token_type: String,
    /// `None` means the token does not expire.
    pub expiry: Option<DateTime<Utc>>,
    /// Every field of the token response.
    pub metadata: serde_json::Map<String, serde_json::Value>,
}

impl Token {
    /// Whether the token is usable for at least `early` more time.
    pub fn is_valid_for(&self, early: Duration) -> bool {
        if self.value.is_empty() {
            return false;
        }
        match self.expiry {
            None => true,
            Some(expiry) => {
                let early =
                    chrono::Duration::from_std(early).unwrap_or_else(|_| chrono::Duration::zero());
                Utc::now() < expiry - early
            }
        }
    }

    pub fn is_valid(&self) -> bool {
        self.is_valid_for(Duration::ZERO)
    }
}
