//! Cookie-based authentication.

use std::fmt;

/// Credentials a client may carry. Only the one matching the client's
/// [`AuthScheme`] is ever sent.
#[derive(Clone, Default, PartialEq, Eq)]
pub struct Credentials {
    pub token: Option<String>,
    pub session_token: Option<String>,
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let redact = |v: &Option<String>| v.as_ref().map(|_| "<redacted>");
        f.debug_struct("Credentials")
            .field("token", &redact(&self.token))
            .field("session_token", &redact(&self.session_token))
            .finish()
    }
}

/// How a credential is attached to a request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthScheme {
    /// `Cookie: token=<api token>`
    TokenCookie,
    /// `Cookie: ring-session=<session token>`
    SessionCookie,
}

impl AuthScheme {
    /// The `Cookie` header value. A missing credential is sent empty.
    pub fn cookie(self, credentials: &Credentials) -> String {
        match self {
            AuthScheme::TokenCookie => {
                format!("token={}", credentials.token.as_deref().unwrap_or_default())
            }
            AuthScheme::SessionCookie => format!(
                "ring-session={}",
                credentials.session_token.as_deref().unwrap_or_default()
            ),
        }
    }
}
