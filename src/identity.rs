//! Identity provider integration.
//!
//! Session tokens issued by the hosted identity provider are verified here
//! and turned into an explicit [`Identity`] value that handlers thread into
//! the access verifier and the store. The core never writes identity state;
//! the provider's management API is only queried for member display metadata.

use jsonwebtoken::{Algorithm, DecodingKey, Validation};
use reqwest::Client;
use serde::{Deserialize, Serialize};

use crate::error::PortalError;

/// Claims carried by the identity provider's session token.
#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    /// Subject: the provider's stable user id.
    pub sub: String,
    /// Expiration unix seconds.
    pub exp: i64,
    /// Display email, when the provider includes it.
    #[serde(default)]
    pub email: Option<String>,
    /// Display name, when the provider includes it.
    #[serde(default)]
    pub name: Option<String>,
}

/// The authenticated caller, threaded explicitly through every handler.
#[derive(Debug, Clone)]
pub struct Identity {
    pub user_id: String,
    pub email: Option<String>,
    pub name: Option<String>,
}

/// Verify a session token and extract the caller's identity.
pub fn identity_from_token(token: &str, secret: &str) -> Result<Identity, PortalError> {
    let validation = Validation::new(Algorithm::HS256);
    let data = jsonwebtoken::decode::<Claims>(
        token,
        &DecodingKey::from_secret(secret.as_bytes()),
        &validation,
    )
    .map_err(|_| PortalError::Unauthenticated)?;

    Ok(Identity {
        user_id: data.claims.sub,
        email: data.claims.email,
        name: data.claims.name,
    })
}

/// Member metadata as reported by the identity provider.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProviderMember {
    pub user_id: String,
    pub name: Option<String>,
    pub email: Option<String>,
    pub avatar_url: Option<String>,
}

/// Client for the identity provider's management API.
///
/// Read-only: the portal enumerates membership metadata for display but
/// never mutates identity state.
pub struct IdentityProvider {
    client: Client,
    api_url: String,
    api_key: String,
}

impl IdentityProvider {
    pub fn new(api_url: &str, api_key: &str) -> Self {
        Self {
            client: Client::new(),
            api_url: api_url.trim_end_matches('/').to_string(),
            api_key: api_key.to_string(),
        }
    }

    /// Enumerate member metadata for an external org reference.
    pub async fn org_members(&self, external_ref: &str) -> Result<Vec<ProviderMember>, PortalError> {
        let resp = self
            .client
            .get(format!(
                "{}/organizations/{}/memberships",
                self.api_url,
                urlencoding::encode(external_ref)
            ))
            .header("Authorization", format!("Bearer {}", self.api_key))
            .send()
            .await?;

        let status = resp.status();
        if !status.is_success() {
            let text = resp.text().await.unwrap_or_default();
            return Err(PortalError::Upstream(format!(
                "identity provider returned {}: {}",
                status, text
            )));
        }

        Ok(resp.json().await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use jsonwebtoken::{EncodingKey, Header};

    fn issue(secret: &str, claims: &Claims) -> String {
        jsonwebtoken::encode(
            &Header::default(),
            claims,
            &EncodingKey::from_secret(secret.as_bytes()),
        )
        .unwrap()
    }

    #[test]
    fn test_valid_token_yields_identity() {
        let claims = Claims {
            sub: "user_1".to_string(),
            exp: chrono::Utc::now().timestamp() + 3600,
            email: Some("a@b.test".to_string()),
            name: None,
        };
        let token = issue("secret", &claims);

        let identity = identity_from_token(&token, "secret").unwrap();
        assert_eq!(identity.user_id, "user_1");
        assert_eq!(identity.email.as_deref(), Some("a@b.test"));
    }

    #[test]
    fn test_wrong_secret_is_unauthenticated() {
        let claims = Claims {
            sub: "user_1".to_string(),
            exp: chrono::Utc::now().timestamp() + 3600,
            email: None,
            name: None,
        };
        let token = issue("secret", &claims);

        let err = identity_from_token(&token, "other").unwrap_err();
        assert!(matches!(err, PortalError::Unauthenticated));
    }

    #[test]
    fn test_expired_token_is_unauthenticated() {
        let claims = Claims {
            sub: "user_1".to_string(),
            exp: chrono::Utc::now().timestamp() - 3600,
            email: None,
            name: None,
        };
        let token = issue("secret", &claims);

        let err = identity_from_token(&token, "secret").unwrap_err();
        assert!(matches!(err, PortalError::Unauthenticated));
    }
}
