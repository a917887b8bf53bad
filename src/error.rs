use thiserror::Error;

#[derive(Error, Debug)]
pub enum AsilSyncError {
    #[error("{0}")]
    Validation(String),

    #[error("Jira API error (status {status}): {message}")]
    Api { status: u16, message: String },

    #[error("Issue type \"{type_name}\" not found in project \"{project_key}\"")]
    IssueTypeNotFound {
        type_name: String,
        project_key: String,
    },

    #[error("No issue found for ASIL level {0}")]
    NoIssuesForAsilLevel(String),

    #[error("Invalid configuration: {0}")]
    Config(String),

    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("JSON serialization error: {0}")]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, AsilSyncError>;
