//! MyAnimeList OAuth2 Authorization Code flow with PKCE.
//!
//! MAL only supports the `plain` challenge method, so the challenge equals the
//! verifier. Nothing here stores state: the verifier goes back to the caller
//! with the authorization URL and must be passed in again for the exchange.

use rand::rngs::OsRng;
use rand::Rng;
use url::Url;

use crate::config::Config;
use crate::models::{AuthArtifact, AuthUrlRequest, TokenArtifact, TokenRequest};
use crate::sources::{SetupError, SourceError};
use crate::utils::{default_user_agent, fetch_text, HttpClient};

/// RFC 7636 unreserved characters
const UNRESERVED: &[u8] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz0123456789-._~";

/// Verifier length; RFC 7636 allows 43 to 128
pub const VERIFIER_LENGTH: usize = 128;

const STATE_LENGTH: usize = 32;

fn random_string(charset: &[u8], len: usize) -> String {
    let mut rng = OsRng;
    (0..len)
        .map(|_| charset[rng.gen_range(0..charset.len())] as char)
        .collect()
}

/// A fresh code verifier from the OS random number generator
pub fn generate_code_verifier() -> String {
    random_string(UNRESERVED, VERIFIER_LENGTH)
}

/// The `plain` method challenge: the verifier itself
pub fn code_challenge(verifier: &str) -> &str {
    verifier
}

/// Stateless helper for MAL's authorize and token endpoints
#[derive(Debug, Clone)]
pub struct MalAuth {
    http: HttpClient,
    authorize_endpoint: Url,
    token_endpoint: Url,
}

impl MalAuth {
    /// Create a helper for the OAuth2 base, e.g. `https://myanimelist.net/v1/oauth2`
    pub fn new(http: HttpClient, oauth_base: &str) -> Result<Self, url::ParseError> {
        let base = oauth_base.trim_end_matches('/');
        Ok(Self {
            http,
            authorize_endpoint: Url::parse(&format!("{}/authorize", base))?,
            token_endpoint: Url::parse(&format!("{}/token", base))?,
        })
    }

    /// Create a helper from configuration
    pub fn from_config(config: &Config) -> Result<Self, SetupError> {
        let http = HttpClient::with_config(&config.http, default_user_agent())?;
        Self::new(http, &config.mal.oauth_base).map_err(|source| SetupError::InvalidUrl {
            name: "mal.oauth_base",
            source,
        })
    }

    /// Build the URL the user must visit, with a freshly generated verifier.
    ///
    /// `client_secret` plays no part in the authorization request; it is only
    /// sent during the exchange.
    pub fn authorization_url(&self, request: &AuthUrlRequest) -> AuthArtifact {
        let state = random_string(UNRESERVED, STATE_LENGTH);
        self.authorization_url_with(request, generate_code_verifier(), state)
    }

    fn authorization_url_with(
        &self,
        request: &AuthUrlRequest,
        code_verifier: String,
        state: String,
    ) -> AuthArtifact {
        let mut url = self.authorize_endpoint.clone();
        {
            let mut query = url.query_pairs_mut();
            query
                .append_pair("response_type", "code")
                .append_pair("client_id", &request.client_id)
                .append_pair("code_challenge", code_challenge(&code_verifier))
                .append_pair("code_challenge_method", "plain")
                .append_pair("state", &state);
            if let Some(redirect_uri) = &request.redirect_uri {
                query.append_pair("redirect_uri", redirect_uri);
            }
        }

        AuthArtifact {
            authorization_url: url.into(),
            code_verifier,
            state,
        }
    }

    /// Exchange an authorization code for tokens. Not retried.
    ///
    /// A non-2xx answer becomes [`SourceError::AuthExchange`] carrying MAL's
    /// body unmodified, so OAuth error codes such as `invalid_grant` reach the
    /// caller intact.
    pub async fn exchange_token(&self, request: &TokenRequest) -> Result<TokenArtifact, SourceError> {
        let mut form = vec![
            ("client_id", request.client_id.as_str()),
            ("grant_type", "authorization_code"),
            ("code", request.code.as_str()),
            ("code_verifier", request.code_verifier.as_str()),
        ];
        if let Some(secret) = &request.client_secret {
            form.push(("client_secret", secret.as_str()));
        }
        if let Some(redirect_uri) = &request.redirect_uri {
            form.push(("redirect_uri", redirect_uri.as_str()));
        }

        tracing::info!("Exchanging MAL authorization code at {}", self.token_endpoint);

        let (status, body) = fetch_text(
            self.http
                .client()
                .post(self.token_endpoint.clone())
                .form(&form),
        )
        .await?;

        if !status.is_success() {
            tracing::warn!("MAL token exchange rejected with HTTP {}", status.as_u16());
            return Err(SourceError::AuthExchange {
                status: status.as_u16(),
                body,
            });
        }

        serde_json::from_str(&body)
            .map_err(|e| SourceError::Shape(format!("token response: {}", e)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn auth() -> MalAuth {
        let http = HttpClient::new().unwrap();
        MalAuth::new(http, "https://myanimelist.net/v1/oauth2/").unwrap()
    }

    #[test]
    fn test_verifier_is_well_formed() {
        let verifier = generate_code_verifier();
        assert_eq!(verifier.len(), VERIFIER_LENGTH);
        assert!(verifier.bytes().all(|b| UNRESERVED.contains(&b)));
    }

    #[test]
    fn test_verifiers_differ() {
        assert_ne!(generate_code_verifier(), generate_code_verifier());
    }

    #[test]
    fn test_authorization_url_uses_plain_challenge() {
        let request = AuthUrlRequest {
            client_id: "x".to_string(),
            redirect_uri: Some("https://cb".to_string()),
            client_secret: None,
        };
        let artifact = auth().authorization_url(&request);

        let url = Url::parse(&artifact.authorization_url).unwrap();
        assert_eq!(url.path(), "/v1/oauth2/authorize");

        let pairs: std::collections::HashMap<_, _> = url.query_pairs().into_owned().collect();
        assert_eq!(pairs["response_type"], "code");
        assert_eq!(pairs["client_id"], "x");
        assert_eq!(pairs["code_challenge"], artifact.code_verifier);
        assert_eq!(pairs["code_challenge_method"], "plain");
        assert_eq!(pairs["state"], artifact.state);
        assert_eq!(pairs["redirect_uri"], "https://cb");
    }

    #[test]
    fn test_authorization_url_without_redirect() {
        let request = AuthUrlRequest {
            client_id: "abc".to_string(),
            redirect_uri: None,
            client_secret: Some("secret".to_string()),
        };
        let artifact =
            auth().authorization_url_with(&request, "v".repeat(43), "state".to_string());

        assert!(!artifact.authorization_url.contains("redirect_uri"));
        assert!(!artifact.authorization_url.contains("secret"));
        assert!(artifact
            .authorization_url
            .contains(&format!("code_challenge={}", "v".repeat(43))));
    }
}
