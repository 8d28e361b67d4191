//! Credentials for the search API.

use crate::ConfigError;

/// The credential a client authenticates with. Exactly one kind is ever set.
#[derive(Clone, PartialEq, Eq)]
pub enum Credential {
    /// A personal access token, sent as `Authorization: token <value>`.
    AccessToken(String),
    /// An OAuth token, sent as `Authorization: Bearer <value>`.
    OAuth(String),
}

impl Credential {
    /// Build a credential from two optional sources (env vars, config files).
    ///
    /// Fails when neither or both are supplied. Empty strings count as absent.
    pub fn from_parts(
        access_token: Option<String>,
        oauth_token: Option<String>,
    ) -> Result<Self, ConfigError> {
        let access_token = access_token.filter(|t| !t.trim().is_empty());
        let oauth_token = oauth_token.filter(|t| !t.trim().is_empty());

        match (access_token, oauth_token) {
            (Some(token), None) => Ok(Credential::AccessToken(token)),
            (None, Some(token)) => Ok(Credential::OAuth(token)),
            (Some(_), Some(_)) => Err(ConfigError::ConflictingCredentials),
            (None, None) => Err(ConfigError::MissingCredential {
                hint: "provide an access token or an OAuth token".into(),
            }),
        }
    }

    /// The full `Authorization` header value for this credential.
    pub fn authorization(&self) -> String {
        match self {
            Credential::AccessToken(token) => format!("token {token}"),
            Credential::OAuth(token) => format!("Bearer {token}"),
        }
    }
}

// Keep tokens out of logs.
impl std::fmt::Debug for Credential {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Credential::AccessToken(_) => f.write_str("AccessToken(<redacted>)"),
            Credential::OAuth(_) => f.write_str("OAuth(<redacted>)"),
        }
    }
}
