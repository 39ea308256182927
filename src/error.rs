use thiserror::Error;

/// Code used when the server did not supply one.
pub const UNSPECIFIED_CODE: i64 = -1;

/// Error envelope code the server uses for "authentication needed".
pub const AUTH_REQUIRED_CODE: i64 = -2;

/// A failure tagged with the kind of authentication it relates to.
///
/// An empty auth type means a generic failure; anything else tells the caller
/// that retrying only makes sense after re-authenticating.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{message}")]
pub struct AuthError {
    message: String,
    code: i64,
    auth_type: String,
}

impl AuthError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            code: UNSPECIFIED_CODE,
            auth_type: String::new(),
        }
    }

    pub fn with_code(mut self, code: i64) -> Self {
        self.code = code;
        self
    }

    pub fn with_auth_type(mut self, auth_type: impl Into<String>) -> Self {
        self.auth_type = auth_type.into();
        self
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn code(&self) -> i64 {
        self.code
    }

    pub fn auth_type(&self) -> &str {
        &self.auth_type
    }

    pub fn is_auth(&self) -> bool {
        !self.auth_type.is_empty()
    }
}

/// Errors raised while talking to the summary endpoint.
#[derive(Debug, Error)]
pub enum ClientError {
    #[error("{0}")]
    Transport(#[from] reqwest::Error),

    #[error("{what}")]
    Status { what: &'static str, status: u16 },

    #[error("Malformed response: {0}")]
    Payload(String),

    #[error("{message}")]
    Envelope { code: i64, message: String },

    #[error(transparent)]
    Auth(#[from] AuthError),

    #[error("Invalid server URL: {0}")]
    Url(#[from] url::ParseError),

    #[error("Invalid header '{0}'")]
    InvalidHeader(String),
}

impl ClientError {
    /// True when the user has to log in again before retrying.
    pub fn needs_reauth(&self) -> bool {
        matches!(self, ClientError::Auth(e) if e.is_auth())
    }
}

impl From<serde_json::Error> for ClientError {
    fn from(e: serde_json::Error) -> Self {
        ClientError::Payload(e.to_string())
    }
}
