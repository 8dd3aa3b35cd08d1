//! The authorization-code flow and token endpoint client.

use std::collections::BTreeMap;
use std::io::Read;
use std::sync::{Arc, Mutex, PoisonError};

use chrono::Utc;
use serde::Deserialize;
use url::{form_urlencoded, Url};

use crate::cache::CachedTokenProvider;
use crate::error::{Error, TokenError};
use crate::types::{AuthStyle, Options3LO, Token};
use crate::TokenProvider;

const CODE_CHALLENGE: &str = "code_challenge";
const CODE_CHALLENGE_METHOD: &str = "code_challenge_method";
const CODE_VERIFIER: &str = "code_verifier";

/// Token responses larger than this are truncated.
const MAX_RESPONSE_BYTES: u64 = 1 << 20;

impl Options3LO {
    /// The consent page URL for the authorization step.
    ///
    /// `extra` parameters are added last and replace any standard parameter
    /// of the same name.
    pub fn auth_code_url(&self, state: &str, extra: &BTreeMap<String, String>) -> String {
        let scope = self.scopes.join(" ");
        let mut params: BTreeMap<&str, &str> = BTreeMap::new();
        params.insert("response_type", "code");
        params.insert("client_id", &self.client_id);
        if !self.redirect_url.is_empty() {
            params.insert("redirect_uri", &self.redirect_url);
        }
        if !scope.is_empty() {
            params.insert("scope", &scope);
        }
        if !state.is_empty() {
            params.insert("state", state);
        }
        if let Some(pkce) = self.pkce() {
            if !pkce.challenge.is_empty() {
                params.insert(CODE_CHALLENGE, &pkce.challenge);
            }
            if !pkce.challenge_method.is_empty() {
                params.insert(CODE_CHALLENGE_METHOD, &pkce.challenge_method);
            }
        }
        for (name, value) in extra {
            params.insert(name, value);
        }

        let query = form_urlencoded::Serializer::new(String::new())
            .extend_pairs(&params)
            .finish();
        let separator = if self.auth_url.contains('?') { '&' } else { '?' };
        format!("{}{}{}", self.auth_url, separator, query)
    }

    /// Trade an authorization code for a token.
    ///
    /// Returns the token and the refresh token the server issued (empty when
    /// it sent none).
    pub fn exchange(&self, code: &str) -> Result<(Token, String), Error> {
        let mut params = BTreeMap::new();
        params.insert("grant_type".to_string(), "authorization_code".to_string());
        params.insert("code".to_string(), code.to_string());
        if !self.redirect_url.is_empty() {
            params.insert("redirect_uri".to_string(), self.redirect_url.clone());
        }
        if let Some(pkce) = self.pkce() {
            if !pkce.verifier.is_empty() {
                params.insert(CODE_VERIFIER.to_string(), pkce.verifier.clone());
            }
        }
        params.extend(self.url_params.clone());
        fetch_token(self, params)
    }
}

/// Mints tokens from a refresh token, adopting rotated refresh tokens.
pub struct RefreshTokenProvider {
    opts: Arc<Options3LO>,
    refresh_token: Mutex<String>,
}

impl RefreshTokenProvider {
    pub fn new(refresh_token: impl Into<String>, opts: Arc<Options3LO>) -> Self {
        Self {
            opts,
            refresh_token: Mutex::new(refresh_token.into()),
        }
    }

    /// The refresh token the next request will use.
    pub fn refresh_token(&self) -> String {
        self.refresh_token
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

impl TokenProvider for RefreshTokenProvider {
    fn token(&self) -> Result<Token, Error> {
        let mut refresh_token = self
            .refresh_token
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        if refresh_token.is_empty() {
            return Err(Error::MissingRefreshToken);
        }

        let mut params = BTreeMap::new();
        params.insert("grant_type".to_string(), "refresh_token".to_string());
        params.insert("refresh_token".to_string(), refresh_token.clone());
        params.extend(self.opts.url_params.clone());

        let (token, rotated) = fetch_token(&self.opts, params)?;
        if !rotated.is_empty() && rotated != *refresh_token {
            log::debug!("adopting rotated refresh token");
            *refresh_token = rotated;
        }
        Ok(token)
    }
}

/// Runs the consent step through the configured authorization handler,
/// then exchanges the returned code.
pub struct HandlerTokenProvider {
    opts: Arc<Options3LO>,
}

impl HandlerTokenProvider {
    pub fn new(opts: Arc<Options3LO>) -> Self {
        Self { opts }
    }
}

impl TokenProvider for HandlerTokenProvider {
    fn token(&self) -> Result<Token, Error> {
        let handler = self.opts.auth_handler.as_ref().ok_or_else(|| Error::Other {
            message: "no authorization handler configured".to_string(),
        })?;
        let url = self.opts.auth_code_url(&handler.state, &BTreeMap::new());
        let (code, state) = (handler.handler)(&url).map_err(Error::Handler)?;
        if state != handler.state {
            return Err(Error::StateMismatch);
        }
        let (token, _) = self.opts.exchange(&code)?;
        Ok(token)
    }
}

/// A caching provider for the three-legged flow.
///
/// Uses the authorization handler when one is configured, otherwise the
/// refresh token.
pub fn new_3lo_token_provider(
    refresh_token: impl Into<String>,
    opts: Options3LO,
) -> CachedTokenProvider {
    let early = opts.early_token_expiry;
    let opts = Arc::new(opts);
    let provider: Box<dyn TokenProvider> = if opts.auth_handler.is_some() {
        Box::new(HandlerTokenProvider::new(opts))
    } else {
        Box::new(RefreshTokenProvider::new(refresh_token, opts))
    };
    CachedTokenProvider::new(provider, early)
}

#[derive(Deserialize, Default)]
#[serde(default)]
struct TokenJson {
    access_token: String,
    token_type: String,
    refresh_token: String,
    expires_in: i64,
    error: String,
    error_description: String,
    error_uri: String,
}

/// POST `params` to the token endpoint. Returns the token and any refresh
/// token in the response.
fn fetch_token(
    opts: &Options3LO,
    mut params: BTreeMap<String, String>,
) -> Result<(Token, String), Error> {
    match opts.auth_style {
        AuthStyle::Unknown => return Err(Error::MissingAuthStyle),
        AuthStyle::InParams => {
            if !opts.client_id.is_empty() {
                params.insert("client_id".to_string(), opts.client_id.clone());
            }
            if !opts.client_secret.is_empty() {
                params.insert("client_secret".to_string(), opts.client_secret.clone());
            }
        }
        AuthStyle::InHeader => {}
    }

    let url = Url::parse(&opts.token_url)?;
    let mut request = opts.http_client().post(url).form(&params);
    if opts.auth_style == AuthStyle::InHeader {
        request = request.basic_auth(
            query_escape(&opts.client_id),
            Some(query_escape(&opts.client_secret)),
        );
    }

    let response = request.send()?;
    let status = response.status();
    let content_type = response
        .headers()
        .get(reqwest::header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .map(media_type)
        .unwrap_or_default();
    let mut body = Vec::new();
    response.take(MAX_RESPONSE_BYTES).read_to_end(&mut body)?;

    let failed = !status.is_success();
    let mut token_error = TokenError {
        status: status.as_u16(),
        body: String::from_utf8_lossy(&body).into_owned(),
        code: String::new(),
        description: String::new(),
        uri: String::new(),
    };

    let (token, refresh_token) = match content_type.as_str() {
        "application/x-www-form-urlencoded" | "text/plain" => {
            let mut values: BTreeMap<String, String> = BTreeMap::new();
            for (name, value) in form_urlencoded::parse(&body).into_owned() {
                values.entry(name).or_insert(value);
            }
            let field = |name: &str| values.get(name).cloned().unwrap_or_default();

            token_error.code = field("error");
            token_error.description = field("error_description");
            token_error.uri = field("error_uri");
            let expires_in: i64 = field("expires_in").parse().unwrap_or(0);
            let token = Token {
                value: field("access_token"),
                token_type: field("token_type"),
                expiry: expiry_after(expires_in),
                metadata: values
                    .iter()
                    .map(|(k, v)| (k.clone(), serde_json::Value::String(v.clone())))
                    .collect(),
            };
            (token, field("refresh_token"))
        }
        _ => {
            let parsed: TokenJson = match serde_json::from_slice(&body) {
                Ok(parsed) => parsed,
                Err(_) if failed => return Err(token_error.into()),
                Err(e) => return Err(e.into()),
            };
            token_error.code = parsed.error;
            token_error.description = parsed.error_description;
            token_error.uri = parsed.error_uri;
            let token = Token {
                value: parsed.access_token,
                token_type: parsed.token_type,
                expiry: expiry_after(parsed.expires_in),
                metadata: serde_json::from_slice(&body).unwrap_or_default(),
            };
            (token, parsed.refresh_token)
        }
    };

    // Some servers report errors with a 200 status.
    if failed || !token_error.code.is_empty() {
        log::debug!(
            "token request to {} failed with status {}",
            opts.token_url,
            token_error.status
        );
        return Err(token_error.into());
    }
    if token.value.is_empty() {
        return Err(Error::MissingAccessToken);
    }
    log::debug!("fetched {} token from {}", token.token_type, opts.token_url);
    Ok((token, refresh_token))
}

fn expiry_after(expires_in: i64) -> Option<chrono::DateTime<Utc>> {
    (expires_in != 0).then(|| Utc::now() + chrono::Duration::seconds(expires_in))
}

fn query_escape(s: &str) -> String {
    form_urlencoded::byte_serialize(s.as_bytes()).collect()
}

fn media_type(header: &str) -> String {
    header
        .split(';')
        .next()
        .unwrap_or_default()
        .trim()
        .to_ascii_lowercase()
}
