// Task synchronization client
// The cache mutates only after the server acknowledges an operation with
// a 2xx; it can be stale, never wrong-but-confident. A 401 on any round
// trip routes through the session expiry path instead of surfacing as a
// sync error.

use anyhow::Context;
use reqwest::{Client, StatusCode};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::RwLock;

use crate::error::{extract_service_message, ClientError};
use crate::models::{CreateTaskRequest, Task, UpdateTaskRequest};
use crate::session::{Credential, SessionManager};

use super::view;

/// Client for the authenticated task collection.
///
/// Holds a local mirror of the server's task set for the bound credential.
/// All cache access is serialized through one lock per instance; mutations
/// take the write lock only after a response has arrived, so completed
/// operations apply in completion order (a delete that finishes before an
/// earlier-issued update wins, and the late update is dropped).
///
/// Once the bound credential is invalidated the instance is inert; callers
/// construct a fresh one after re-authentication.
pub struct TaskSyncClient {
    /// HTTP client with connect/request timeouts
    client: Client,

    /// Task collection endpoint
    task_url: String,

    /// Credential attached to every request
    credential: Credential,

    /// Session manager notified on a 401
    session: Arc<SessionManager>,

    /// Local mirror of the server's task set, in insertion order
    cache: RwLock<Vec<Task>>,
}

impl TaskSyncClient {
    pub fn new(
        session: Arc<SessionManager>,
        credential: Credential,
        api_url: &str,
        connect_timeout: u64,
        request_timeout: u64,
    ) -> anyhow::Result<Self> {
        let client = Client::builder()
            .connect_timeout(Duration::from_secs(connect_timeout))
            .timeout(Duration::from_secs(request_timeout))
            .build()
            .context("Failed to create HTTP client")?;

        Ok(Self {
            client,
            task_url: format!("{}/task", api_url.trim_end_matches('/')),
            credential,
            session,
            cache: RwLock::new(Vec::new()),
        })
    }

    /// Fetch the full task set and replace the cache wholesale.
    ///
    /// On any failure the previous cache is kept, so the front end shows
    /// the last good state rather than going blank.
    pub async fn load(&self) -> Result<(), ClientError> {
        let response = self
            .client
            .get(&self.task_url)
            .bearer_auth(&self.credential.token)
            .send()
            .await
            .context("Failed to send task list request")?;

        let (status, body) = self.check(response).await?;
        let tasks: Vec<Task> = serde_json::from_str(&body).map_err(|e| ClientError::Sync {
            status,
            message: format!("malformed task list: {}", e),
        })?;

        tracing::debug!(count = tasks.len(), "Task list loaded");
        *self.cache.write().await = tasks;
        Ok(())
    }

    /// Create a task. Empty or whitespace-only names are rejected locally
    /// without a network call. The server's representation is inserted at
    /// the front of the cache.
    pub async fn create(&self, name: &str) -> Result<Task, ClientError> {
        let name = name.trim();
        if name.is_empty() {
            return Err(ClientError::Validation(
                "task name must not be empty".to_string(),
            ));
        }

        let response = self
            .client
            .post(&self.task_url)
            .bearer_auth(&self.credential.token)
            .json(&CreateTaskRequest { name })
            .send()
            .await
            .context("Failed to send task create request")?;

        let (status, body) = self.check(response).await?;
        let task = parse_task(status, &body)?;

        let mut cache = self.cache.write().await;
        // The id is server-assigned; dropping any entry with the same id
        // keeps the no-duplicate invariant.
        cache.retain(|t| t.id != task.id);
        cache.insert(0, task.clone());

        tracing::debug!(id = %task.id, "Task created");
        Ok(task)
    }

    /// Update a task's done flag. The cache entry is replaced with the
    /// server's returned representation; if the entry vanished in the
    /// meantime the acknowledgement is dropped and the next load reconciles.
    pub async fn set_done(&self, id: &str, done: bool) -> Result<(), ClientError> {
        let response = self
            .client
            .patch(format!("{}/{}", self.task_url, id))
            .bearer_auth(&self.credential.token)
            .json(&UpdateTaskRequest { done })
            .send()
            .await
            .context("Failed to send task update request")?;

        let (status, body) = self.check(response).await?;
        let task = parse_task(status, &body)?;

        let mut cache = self.cache.write().await;
        match cache.iter_mut().find(|t| t.id == task.id) {
            Some(entry) => *entry = task,
            None => tracing::debug!(id, "Update acknowledged for a task no longer cached"),
        }

        Ok(())
    }

    /// Delete a task. Confirmation is the front end's concern and must
    /// happen before this is invoked. Removing an already-absent entry is
    /// a no-op.
    pub async fn delete(&self, id: &str) -> Result<(), ClientError> {
        let response = self
            .client
            .delete(format!("{}/{}", self.task_url, id))
            .bearer_auth(&self.credential.token)
            .send()
            .await
            .context("Failed to send task delete request")?;

        self.check(response).await?;

        let mut cache = self.cache.write().await;
        cache.retain(|t| t.id != id);

        tracing::debug!(id, "Task deleted");
        Ok(())
    }

    /// Sorted read-only projection of the cache: active tasks first,
    /// newest first within each group. Recomputed on every call.
    pub async fn view(&self) -> Vec<Task> {
        view::sorted(&self.cache.read().await)
    }

    /// Shared response gate.
    ///
    /// 401 fires the session expiry path and the cache is left untouched;
    /// any other non-2xx becomes a SyncError carrying status and body.
    /// Returns the status and body text of a successful response.
    async fn check(&self, response: reqwest::Response) -> Result<(u16, String), ClientError> {
        let status = response.status();
        let body = response
            .text()
            .await
            .context("Failed to read task service response")?;

        if status == StatusCode::UNAUTHORIZED {
            tracing::warn!("Task request rejected with 401");
            self.session.notify_expired().await;
            return Err(ClientError::SessionExpired);
        }

        if !status.is_success() {
            return Err(ClientError::Sync {
                status: status.as_u16(),
                message: extract_service_message(&body).unwrap_or(body),
            });
        }

        Ok((status.as_u16(), body))
    }
}

fn parse_task(status: u16, body: &str) -> Result<Task, ClientError> {
    serde_json::from_str(body).map_err(|e| ClientError::Sync {
        status,
        message: format!("malformed task payload: {}", e),
    })
}
