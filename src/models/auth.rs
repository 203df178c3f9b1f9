//! OAuth2 artifacts handed back to the caller. Nothing here is ever stored.

use serde::{Deserialize, Serialize};

/// The first half of the PKCE flow: where to send the user, and the verifier
/// the caller must echo back when exchanging the code.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthArtifact {
    pub authorization_url: String,
    pub code_verifier: String,
    pub state: String,
}

/// Tokens returned by the MAL token endpoint
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenArtifact {
    pub access_token: String,

    #[serde(default)]
    pub refresh_token: Option<String>,

    /// Lifetime of the access token in seconds
    pub expires_in: u64,

    #[serde(default = "default_token_type")]
    pub token_type: String,
}

fn default_token_type() -> String {
    "Bearer".to_string()
}

impl std::fmt::Debug for TokenArtifact {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenArtifact")
            .field("access_token", &"<redacted>")
            .field("refresh_token", &self.refresh_token.as_ref().map(|_| "<redacted>"))
            .field("expires_in", &self.expires_in)
            .field("token_type", &self.token_type)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_token_type_defaults_to_bearer() {
        let token: TokenArtifact =
            serde_json::from_str(r#"{"access_token":"abc","expires_in":3600}"#).unwrap();
        assert_eq!(token.token_type, "Bearer");
        assert!(token.refresh_token.is_none());
    }

    #[test]
    fn test_debug_hides_tokens() {
        let token = TokenArtifact {
            access_token: "secret-access".to_string(),
            refresh_token: Some("secret-refresh".to_string()),
            expires_in: 3600,
            token_type: "Bearer".to_string(),
        };
        let debug = format!("{:?}", token);
        assert!(!debug.contains("secret"));
        assert!(debug.contains("3600"));
    }
}
