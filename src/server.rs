use std::sync::Arc;

use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::post;
use axum::{Json, Router};
use log::{error, info};
use serde_json::{json, Map, Value};

use crate::error::{AsilSyncError, Result};
use crate::replicate::{ReplicationOutcome, Replicator};

#[derive(Clone)]
pub struct AppState {
    pub replicator: Arc<Replicator>,
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/trigger", post(trigger))
        .with_state(state)
}

async fn trigger(State(state): State<AppState>, body: String) -> Response {
    match dispatch(&state.replicator, &body).await {
        Ok(outcome) => (StatusCode::OK, Json(outcome)).into_response(),
        Err(e) => error_response(&e),
    }
}

/// Parses the inbound `{action, ...params}` body, validates the parameters
/// for the requested action, and runs the matching workflow.
pub async fn dispatch(replicator: &Replicator, body: &str) -> Result<ReplicationOutcome> {
    let params: Map<String, Value> = serde_json::from_str(body)
        .map_err(|e| AsilSyncError::Validation(format!("Invalid request body: {e}")))?;

    let action = string_param(&params, "action")
        .ok_or_else(|| AsilSyncError::Validation("Action parameter is required".to_string()))?;
    info!("Action to perform: {action}");

    match action.as_str() {
        "cloneAsilStory" => {
            let values = required_params(
                &params,
                &["targetProject", "asilLevel", "systemName", "carline"],
            )?;
            let (target_project, asil_level, system_name, carline) =
                (&values[0], &values[1], &values[2], &values[3]);
            info!(
                "Cloning ASIL story for project {target_project} with ASIL level {asil_level} for system {system_name} and carline {carline}"
            );
            replicator
                .clone_asil_story(target_project, asil_level, system_name, carline)
                .await
        }
        "takeoverAsilStory" => {
            let values = required_params(&params, &["epicIssueKey", "carline"])?;
            let (epic_issue_key, carline) = (&values[0], &values[1]);
            info!("Taking over ASIL story for epic {epic_issue_key} with carline {carline}");
            replicator.take_over_asil_story(epic_issue_key, carline).await
        }
        other => Err(AsilSyncError::Validation(format!("Unknown action: {other}"))),
    }
}

/// A parameter counts as present only when it is a non-empty string.
fn string_param(params: &Map<String, Value>, name: &str) -> Option<String> {
    params
        .get(name)
        .and_then(Value::as_str)
        .filter(|value| !value.is_empty())
        .map(ToString::to_string)
}

/// Extracts all named parameters in order, or reports every missing one.
fn required_params(params: &Map<String, Value>, names: &[&str]) -> Result<Vec<String>> {
    let mut values = Vec::with_capacity(names.len());
    let mut missing = Vec::new();
    for name in names {
        match string_param(params, name) {
            Some(value) => values.push(value),
            None => missing.push(*name),
        }
    }
    if !missing.is_empty() {
        return Err(AsilSyncError::Validation(format!(
            "Missing required parameters: {}",
            missing.join(", ")
        )));
    }
    Ok(values)
}

fn error_response(err: &AsilSyncError) -> Response {
    let status = match err {
        AsilSyncError::Validation(_) => StatusCode::BAD_REQUEST,
        AsilSyncError::IssueTypeNotFound { .. } | AsilSyncError::NoIssuesForAsilLevel(_) => {
            StatusCode::NOT_FOUND
        }
        AsilSyncError::Api { .. } => StatusCode::BAD_GATEWAY,
        _ => StatusCode::INTERNAL_SERVER_ERROR,
    };
    error!("Request failed: {err}");
    (status, Json(json!({ "error": err.to_string() }))).into_response()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ReplicationConfig;
    use crate::jira::{JiraClient, TypeCache};

    // Validation happens before any network call, so an unroutable endpoint
    // is good enough for these tests.
    fn replicator() -> Replicator {
        let client = JiraClient::new("http://127.0.0.1:9", None).unwrap();
        Replicator::new(client, TypeCache::new(), ReplicationConfig::default())
    }

    #[tokio::test]
    async fn test_missing_action_is_rejected() {
        let error = dispatch(&replicator(), r#"{"carline": "X"}"#)
            .await
            .unwrap_err();
        assert_eq!(error.to_string(), "Action parameter is required");
    }

    #[tokio::test]
    async fn test_unknown_action_is_rejected() {
        let error = dispatch(&replicator(), r#"{"action": "frobnicate"}"#)
            .await
            .unwrap_err();
        assert_eq!(error.to_string(), "Unknown action: frobnicate");
    }

    #[tokio::test]
    async fn test_clone_without_params_lists_all_missing() {
        let error = dispatch(&replicator(), r#"{"action": "cloneAsilStory"}"#)
            .await
            .unwrap_err();
        assert_eq!(
            error.to_string(),
            "Missing required parameters: targetProject, asilLevel, systemName, carline"
        );
    }

    #[tokio::test]
    async fn test_partially_missing_params_list_only_the_missing() {
        let body = r#"{"action": "cloneAsilStory", "targetProject": "TP", "carline": "X"}"#;
        let error = dispatch(&replicator(), body).await.unwrap_err();
        assert_eq!(
            error.to_string(),
            "Missing required parameters: asilLevel, systemName"
        );
    }

    #[tokio::test]
    async fn test_empty_string_counts_as_missing() {
        let body = r#"{"action": "takeoverAsilStory", "epicIssueKey": "", "carline": "X"}"#;
        let error = dispatch(&replicator(), body).await.unwrap_err();
        assert_eq!(error.to_string(), "Missing required parameters: epicIssueKey");
    }

    #[tokio::test]
    async fn test_malformed_body_is_a_validation_error() {
        let error = dispatch(&replicator(), "not json").await.unwrap_err();
        assert!(matches!(error, AsilSyncError::Validation(_)));
    }

    #[test]
    fn test_error_status_mapping() {
        let cases = [
            (
                AsilSyncError::Validation("bad".to_string()),
                StatusCode::BAD_REQUEST,
            ),
            (
                AsilSyncError::NoIssuesForAsilLevel("D".to_string()),
                StatusCode::NOT_FOUND,
            ),
            (
                AsilSyncError::IssueTypeNotFound {
                    type_name: "Hazard".to_string(),
                    project_key: "TP".to_string(),
                },
                StatusCode::NOT_FOUND,
            ),
            (
                AsilSyncError::Api {
                    status: 500,
                    message: "upstream".to_string(),
                },
                StatusCode::BAD_GATEWAY,
            ),
        ];
        for (error, expected) in cases {
            assert_eq!(error_response(&error).status(), expected);
        }
    }
}
