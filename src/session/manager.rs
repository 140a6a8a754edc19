// Session manager
// Owns the credential lifecycle: restore, login, register, logout, and
// the expiry notification path driven by dependent components.

use anyhow::{Context, Result};
use reqwest::Client;
use tokio::sync::RwLock;

use crate::error::{extract_service_message, ClientError};

use super::store::CredentialStore;
use super::types::{AuthRequest, Credential, LoginResponse};

/// Callback fired when a dependent operation reports a rejected credential
pub type ExpiryHandler = Box<dyn Fn() + Send + Sync>;

/// Manages the authentication credential.
///
/// The manager is either `Unauthenticated` (no credential) or
/// `Authenticated` (a credential in memory, mirrored to durable storage).
/// It never polls for expiry itself; dependent components report a 401
/// through [`SessionManager::notify_expired`].
pub struct SessionManager {
    /// HTTP client for auth requests
    client: Client,

    /// Base URL of the remote service
    api_url: String,

    /// Durable credential storage
    store: CredentialStore,

    /// Current credential, None while unauthenticated
    credential: RwLock<Option<Credential>>,

    /// Handlers fired after an expiry notification has cleared the session
    expiry_handlers: RwLock<Vec<ExpiryHandler>>,
}

impl SessionManager {
    pub fn new(api_url: impl Into<String>, store: CredentialStore) -> Result<Self> {
        let client = Client::builder()
            .timeout(std::time::Duration::from_secs(30))
            .build()
            .context("Failed to create HTTP client")?;

        let api_url = api_url.into().trim_end_matches('/').to_string();

        Ok(Self {
            client,
            api_url,
            store,
            credential: RwLock::new(None),
            expiry_handlers: RwLock::new(Vec::new()),
        })
    }

    /// Read the persisted credential, if any, and adopt it.
    ///
    /// Storage is not modified; a partial or empty pair reads as absent.
    /// Called once at startup to decide the initial state.
    pub async fn restore(&self) -> Result<Option<Credential>, ClientError> {
        let restored = self.store.load()?;

        if let Some(ref credential) = restored {
            tracing::debug!(identity = %credential.identity, "Restored persisted session");
            *self.credential.write().await = Some(credential.clone());
        }

        Ok(restored)
    }

    /// Authenticate against the remote service.
    ///
    /// Empty inputs are rejected locally without a network call. On success
    /// the credential is stored in memory and durable storage and returned.
    pub async fn login(&self, identity: &str, secret: &str) -> Result<Credential, ClientError> {
        let identity = identity.trim();
        let secret = secret.trim();

        if identity.is_empty() || secret.is_empty() {
            return Err(ClientError::Validation(
                "identity and secret are required".to_string(),
            ));
        }

        tracing::debug!(identity, "Sending login request");
        let response = self
            .client
            .post(format!("{}/login", self.api_url))
            .json(&AuthRequest {
                username: identity,
                password: secret,
            })
            .send()
            .await
            .context("Failed to send login request")?;

        let status = response.status();
        let body = response
            .text()
            .await
            .context("Failed to read login response")?;

        if !status.is_success() {
            let message = extract_service_message(&body)
                .unwrap_or_else(|| format!("login rejected (HTTP {})", status.as_u16()));
            return Err(ClientError::Auth(message));
        }

        let parsed: LoginResponse = serde_json::from_str(&body)
            .map_err(|e| ClientError::Auth(format!("malformed login response: {}", e)))?;

        let token = match parsed.token {
            Some(token) if !token.is_empty() => token,
            _ => return Err(ClientError::Auth("token missing from login response".to_string())),
        };

        let credential = Credential {
            token,
            identity: identity.to_string(),
        };

        self.store.save(&credential)?;
        *self.credential.write().await = Some(credential.clone());

        tracing::info!(identity, "Logged in");
        Ok(credential)
    }

    /// Register a new identity. Does not establish a credential; the caller
    /// logs in afterwards.
    pub async fn register(
        &self,
        identity: &str,
        secret: &str,
        confirm_secret: &str,
    ) -> Result<(), ClientError> {
        let identity = identity.trim();
        let secret = secret.trim();
        let confirm_secret = confirm_secret.trim();

        let mut violations = Vec::new();
        if identity.is_empty() || secret.is_empty() || confirm_secret.is_empty() {
            violations.push("all fields are required");
        }
        if secret != confirm_secret {
            violations.push("secret and confirmation do not match");
        }
        if !secret.is_empty() && secret.chars().count() < 3 {
            violations.push("secret must be at least 3 characters");
        }
        if !violations.is_empty() {
            return Err(ClientError::Validation(violations.join("; ")));
        }

        tracing::debug!(identity, "Sending registration request");
        let response = self
            .client
            .post(format!("{}/register", self.api_url))
            .json(&AuthRequest {
                username: identity,
                password: secret,
            })
            .send()
            .await
            .context("Failed to send registration request")?;

        let status = response.status();
        if !status.is_success() {
            let body = response
                .text()
                .await
                .context("Failed to read registration response")?;
            let message = extract_service_message(&body)
                .unwrap_or_else(|| format!("registration rejected (HTTP {})", status.as_u16()));
            return Err(ClientError::Auth(message));
        }

        tracing::info!(identity, "Registered");
        Ok(())
    }

    /// Clear the in-memory credential and the durable copy. Idempotent.
    pub async fn logout(&self) -> Result<(), ClientError> {
        *self.credential.write().await = None;
        self.store.clear()?;
        tracing::info!("Logged out");
        Ok(())
    }

    /// Register a callback invoked after an expiry notification
    pub async fn on_expired(&self, handler: impl Fn() + Send + Sync + 'static) {
        self.expiry_handlers.write().await.push(Box::new(handler));
    }

    /// Called by a dependent component when the service rejected the
    /// credential with 401. Performs logout, then fires the registered
    /// handlers. The system is back in the unauthenticated state when
    /// this returns.
    pub async fn notify_expired(&self) {
        tracing::warn!("Credential rejected by the service; clearing session");

        if let Err(e) = self.logout().await {
            tracing::error!("Failed to clear persisted credential: {}", e);
        }

        for handler in self.expiry_handlers.read().await.iter() {
            handler();
        }
    }

    /// Current credential, if authenticated
    pub async fn credential(&self) -> Option<Credential> {
        self.credential.read().await.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn manager() -> SessionManager {
        // Unroutable URL: validation failures must return before any
        // network call, so these tests never touch it.
        SessionManager::new(
            "http://127.0.0.1:9",
            CredentialStore::open_in_memory().unwrap(),
        )
        .unwrap()
    }

    #[tokio::test]
    async fn test_login_rejects_empty_inputs() {
        let manager = manager();

        let err = manager.login("", "secret").await.unwrap_err();
        assert!(matches!(err, ClientError::Validation(_)));

        let err = manager.login("alice", "").await.unwrap_err();
        assert!(matches!(err, ClientError::Validation(_)));

        let err = manager.login("   ", "  ").await.unwrap_err();
        assert!(matches!(err, ClientError::Validation(_)));
    }

    #[tokio::test]
    async fn test_register_rejects_short_secret() {
        let manager = manager();

        let err = manager.register("a", "bb", "bb").await.unwrap_err();
        match err {
            ClientError::Validation(msg) => assert!(msg.contains("at least 3")),
            other => panic!("expected validation error, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_register_rejects_mismatched_confirmation() {
        let manager = manager();

        let err = manager.register("a", "bbb", "ccc").await.unwrap_err();
        match err {
            ClientError::Validation(msg) => assert!(msg.contains("do not match")),
            other => panic!("expected validation error, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_register_rejects_empty_fields() {
        let manager = manager();

        let err = manager.register("", "bbb", "bbb").await.unwrap_err();
        match err {
            ClientError::Validation(msg) => assert!(msg.contains("required")),
            other => panic!("expected validation error, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_logout_is_idempotent() {
        let manager = manager();

        manager.logout().await.unwrap();
        manager.logout().await.unwrap();
        assert_eq!(manager.credential().await, None);
    }

    #[tokio::test]
    async fn test_restore_absent() {
        let manager = manager();
        assert_eq!(manager.restore().await.unwrap(), None);
        assert_eq!(manager.credential().await, None);
    }
}
