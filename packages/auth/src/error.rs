use std::fmt;

/// A token endpoint rejected the request.
///
/// Carries the raw status and body alongside the OAuth2 error fields the
/// server filled in, if any.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TokenError {
    pub status: u16,
    pub body: String,
    pub code: String,
    pub description: String,
    pub uri: String,
}

impl fmt::Display for TokenError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.code.is_empty() {
            return write!(
                f,
                "cannot fetch token: status {}\nResponse: {}",
                self.status, self.body
            );
        }
        write!(f, "{:?}", self.code)?;
        if !self.description.is_empty() {
            write!(f, " {:?}", self.description)?;
        }
        if !self.uri.is_empty() {
            write!(f, " {:?}", self.uri)?;
        }
        Ok(())
    }
}

impl std::error::Error for TokenError {}

#[derive(thiserror::Error, Debug)]
pub enum Error {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("URL parse error: {0}")]
    UrlParse(#[from] url::ParseError),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("cannot fetch token: {0}")]
    Read(#[from] std::io::Error),

    #[error("token endpoint error: {0}")]
    Token(TokenError),

    #[error("server response missing access_token")]
    MissingAccessToken,

    #[error("missing required field auth_style")]
    MissingAuthStyle,

    #[error("token expired and refresh token is not set")]
    MissingRefreshToken,

    #[error("state mismatch in 3-legged-OAuth flow")]
    StateMismatch,

    #[error("authorization handler failed: {0}")]
    Handler(#[source] Box<dyn std::error::Error + Send + Sync>),

    #[error("{message}")]
    Other { message: String },
}

impl From<TokenError> for Error {
    fn from(error: TokenError) -> Self {
        Error::Token(error)
    }
}
