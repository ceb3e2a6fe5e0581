/// Authentication identity deletion
///
/// The ban cascade removes a user's login identity as one of its last steps.
/// Where identities live is deployment-specific, so the cascade talks to an
/// [`IdentityProvider`]:
///
/// - [`LocalIdentityProvider`] deletes the row from the local `users` table.
/// - [`RemoteIdentityProvider`] calls an external, privileged delete-user
///   function over HTTPS with a service bearer token.
///
/// # Remote protocol
///
/// ```text
/// POST {delete_url}
/// Authorization: Bearer {service_token}
/// Content-Type: application/json
///
/// {"userId": "<uuid>"}
/// ```
///
/// Any 2xx response counts as success unless its JSON body contains
/// `"success": false`.

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use std::time::Duration;
use tracing::{debug, instrument};
use uuid::Uuid;

use crate::models::user::User;

/// Identity deletion errors
#[derive(Debug, thiserror::Error)]
pub enum IdentityError {
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Identity service request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Identity service returned {status}: {message}")]
    Rejected { status: u16, message: String },

    #[error("Identity service is not configured")]
    NotConfigured,
}

/// Removes authentication identities
#[async_trait]
pub trait IdentityProvider: Send + Sync {
    /// Short name used in logs
    fn name(&self) -> &str;

    /// Deletes the identity of `user_id`
    ///
    /// # Returns
    ///
    /// True if an identity was removed, false if none existed
    async fn delete_identity(&self, user_id: Uuid) -> Result<bool, IdentityError>;
}

/// Identities stored in the local `users` table
#[derive(Debug, Clone)]
pub struct LocalIdentityProvider {
    pool: PgPool,
}

impl LocalIdentityProvider {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl IdentityProvider for LocalIdentityProvider {
    fn name(&self) -> &str {
        "local"
    }

    async fn delete_identity(&self, user_id: Uuid) -> Result<bool, IdentityError> {
        Ok(User::delete(&self.pool, user_id).await?)
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct DeleteUserRequest {
    user_id: Uuid,
}

#[derive(Debug, Default, Deserialize)]
struct DeleteUserResponse {
    success: Option<bool>,
    error: Option<String>,
}

/// Identities held by an external auth service
#[derive(Debug, Clone)]
pub struct RemoteIdentityProvider {
    client: Client,
    delete_url: String,
    service_token: String,
}

impl RemoteIdentityProvider {
    /// Default request timeout
    pub const TIMEOUT: Duration = Duration::from_secs(10);

    pub fn new(delete_url: impl Into<String>, service_token: impl Into<String>) -> Result<Self, IdentityError> {
        let client = Client::builder().timeout(Self::TIMEOUT).build()?;

        Ok(Self {
            client,
            delete_url: delete_url.into(),
            service_token: service_token.into(),
        })
    }
}

#[async_trait]
impl IdentityProvider for RemoteIdentityProvider {
    fn name(&self) -> &str {
        "remote"
    }

    #[instrument(skip(self), fields(url = %self.delete_url))]
    async fn delete_identity(&self, user_id: Uuid) -> Result<bool, IdentityError> {
        let response = self
            .client
            .post(&self.delete_url)
            .bearer_auth(&self.service_token)
            .json(&DeleteUserRequest { user_id })
            .send()
            .await?;

        let status = response.status();
        let body = response.text().await?;
        let parsed: DeleteUserResponse = serde_json::from_str(&body).unwrap_or_default();

        if !status.is_success() {
            return Err(IdentityError::Rejected {
                status: status.as_u16(),
                message: parsed.error.unwrap_or(body),
            });
        }

        if parsed.success == Some(false) {
            return Err(IdentityError::Rejected {
                status: status.as_u16(),
                message: parsed
                    .error
                    .unwrap_or_else(|| "success: false".to_string()),
            });
        }

        debug!(%user_id, "Remote identity deleted");
        Ok(true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_request_body_uses_camel_case() {
        let id = Uuid::new_v4();
        let json = serde_json::to_value(DeleteUserRequest { user_id: id }).unwrap();
        assert_eq!(json, serde_json::json!({ "userId": id }));
    }

    #[test]
    fn test_response_parsing_is_lenient() {
        let parsed: DeleteUserResponse = serde_json::from_str(r#"{"success":false,"error":"nope"}"#).unwrap();
        assert_eq!(parsed.success, Some(false));
        assert_eq!(parsed.error.as_deref(), Some("nope"));

        let empty: DeleteUserResponse = serde_json::from_str("{}").unwrap();
        assert!(empty.success.is_none());
    }

    #[test]
    fn test_remote_provider_builds() {
        let provider = RemoteIdentityProvider::new("https://auth.example.com/delete-user", "svc").unwrap();
        assert_eq!(provider.name(), "remote");
    }
}
