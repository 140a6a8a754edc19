// Wire schemas for the task service

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A task record as the server returns it.
///
/// Ids are server-assigned and immutable; the client never fabricates one.
/// The cache only ever holds representations the server acknowledged.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Task {
    pub id: String,
    pub name: String,
    pub done: bool,
    pub created_at: DateTime<Utc>,
}

/// Create request body: `POST /task`
#[derive(Debug, Serialize)]
pub struct CreateTaskRequest<'a> {
    pub name: &'a str,
}

/// Status update body: `PATCH /task/{id}`
#[derive(Debug, Serialize)]
pub struct UpdateTaskRequest {
    pub done: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_task_deserialization() {
        let json = r#"{
            "id": "1",
            "name": "Buy milk",
            "done": false,
            "created_at": "2024-01-01T00:00:00Z"
        }"#;

        let task: Task = serde_json::from_str(json).unwrap();
        assert_eq!(task.id, "1");
        assert_eq!(task.name, "Buy milk");
        assert!(!task.done);
        assert_eq!(task.created_at.to_rfc3339(), "2024-01-01T00:00:00+00:00");
    }

    #[test]
    fn test_task_missing_field_is_rejected() {
        let json = r#"{"id": "1", "name": "Buy milk", "done": false}"#;
        assert!(serde_json::from_str::<Task>(json).is_err());
    }

    #[test]
    fn test_request_bodies() {
        let body = serde_json::to_value(CreateTaskRequest { name: "Buy milk" }).unwrap();
        assert_eq!(body, serde_json::json!({"name": "Buy milk"}));

        let body = serde_json::to_value(UpdateTaskRequest { done: true }).unwrap();
        assert_eq!(body, serde_json::json!({"done": true}));
    }
}
