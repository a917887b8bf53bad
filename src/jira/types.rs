use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::config::ReplicationConfig;

/// An issue type as listed on a project, e.g. `{id: "10001", name: "Epic"}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IssueType {
    pub id: String,
    pub name: String,
}

/// Project info as returned by `GET /project/{key}`.
#[derive(Debug, Clone, Deserialize)]
pub struct Project {
    pub key: String,
    #[serde(rename = "issueTypes")]
    pub issue_types: Vec<IssueType>,
}

/// An issue as returned by search or single-issue fetches.
#[derive(Debug, Clone, Deserialize)]
pub struct Issue {
    pub key: String,
    pub fields: IssueFields,
}

/// Issue fields we ask for, plus a flattened map catching the custom fields
/// (the takeover flow copies the ASIL value out of it verbatim).
#[derive(Debug, Clone, Deserialize)]
pub struct IssueFields {
    pub summary: String,
    /// Descriptions are Atlassian Document Format blobs; carried opaquely.
    #[serde(default)]
    pub description: Option<Value>,
    pub issuetype: IssueType,
    #[serde(flatten)]
    pub custom: Map<String, Value>,
}

/// Body for `POST /search`.
#[derive(Debug, Serialize)]
pub struct SearchRequest {
    pub jql: String,
    pub fields: Vec<String>,
    pub expand: Vec<String>,
    #[serde(rename = "maxResults")]
    pub max_results: u32,
}

impl SearchRequest {
    /// Standard search body: the four read-side fields, names expanded,
    /// capped at 1000 results.
    pub fn for_jql(jql: String) -> Self {
        Self {
            jql,
            fields: ["key", "summary", "description", "issuetype"]
                .iter()
                .map(ToString::to_string)
                .collect(),
            expand: vec!["names".to_string()],
            max_results: 1000,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct SearchResponse {
    #[serde(default)]
    pub issues: Vec<Issue>,
}

/// Record returned by `POST /issue` on success.
#[derive(Debug, Clone, Deserialize)]
pub struct CreatedIssue {
    pub id: String,
    pub key: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct ProjectRef {
    pub key: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct IssueTypeRef {
    pub id: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct IssueRef {
    pub key: String,
}

/// Write-side representation submitted to create an issue. Custom fields are
/// flattened into the body next to the standard ones.
#[derive(Debug, Clone, Serialize)]
pub struct IssuePayload {
    pub project: ProjectRef,
    pub summary: String,
    pub issuetype: IssueTypeRef,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub parent: Option<IssueRef>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<Value>,
    #[serde(flatten)]
    pub custom: Map<String, Value>,
}

impl IssuePayload {
    pub fn new(project_key: &str, summary: String, issue_type_id: String) -> Self {
        Self {
            project: ProjectRef {
                key: project_key.to_string(),
            },
            summary,
            issuetype: IssueTypeRef { id: issue_type_id },
            parent: None,
            description: None,
            custom: Map::new(),
        }
    }

    pub fn parent(mut self, parent_key: &str) -> Self {
        self.parent = Some(IssueRef {
            key: parent_key.to_string(),
        });
        self
    }

    pub fn description(mut self, description: Option<Value>) -> Self {
        self.description = description;
        self
    }

    /// Sets a configured custom field. `None` values are dropped, matching
    /// Jira's treatment of absent fields.
    pub fn custom_field(mut self, table: &CustomFieldTable, field: CustomField, value: Option<Value>) -> Self {
        if let Some(value) = value {
            self.custom.insert(table.field_id(field).to_string(), value);
        }
        self
    }
}

/// The custom fields this service writes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CustomField {
    AsilLevel,
    Carline,
}

/// Maps the typed fields to the `customfield_*` ids configured for the site.
#[derive(Debug, Clone)]
pub struct CustomFieldTable {
    asil_level: String,
    carline: String,
}

impl CustomFieldTable {
    pub fn from_config(config: &ReplicationConfig) -> Self {
        Self {
            asil_level: config.asil_field_id.clone(),
            carline: config.carline_field_id.clone(),
        }
    }

    pub fn field_id(&self, field: CustomField) -> &str {
        match field {
            CustomField::AsilLevel => &self.asil_level,
            CustomField::Carline => &self.carline,
        }
    }
}
