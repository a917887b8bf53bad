use log::info;

use super::client::JiraClient;
use super::types::{Issue, SearchRequest, SearchResponse};
use crate::error::{AsilSyncError, Result};

impl JiraClient {
    /// Fetches a single issue with field names expanded.
    pub async fn get_issue(&self, issue_key: &str) -> Result<Issue> {
        self.get_json(&format!("/issue/{issue_key}?expand=names"))
            .await
    }

    /// Fetches the children of a parent issue within a project.
    ///
    /// Zero matches is a valid outcome; an epic without children replicates
    /// to an epic without children.
    pub async fn children_of(&self, parent_key: &str, project_key: &str) -> Result<Vec<Issue>> {
        let jql = format!("project = {project_key} AND parent = {parent_key}");
        info!(
            "Searching for work items with parent issue {parent_key} in project {project_key} with JQL: {jql}"
        );

        let response: SearchResponse = self
            .post_json("/search", &SearchRequest::for_jql(jql))
            .await?;

        info!(
            "Found {} issues for parent issue {parent_key} in project {project_key}",
            response.issues.len()
        );
        Ok(response.issues)
    }

    /// Fetches the children of a parent issue in the source project that
    /// carry the given ASIL level, ordered by key. An empty result means the
    /// template has nothing for that level, which is a hard failure.
    pub async fn children_by_asil_level(
        &self,
        source_project_key: &str,
        parent_key: &str,
        asil_level: &str,
    ) -> Result<Vec<Issue>> {
        let jql = format!(
            "project = {source_project_key} AND parent = {parent_key} AND ASIL_Level = {asil_level} order by key"
        );
        info!("Searching for work items with ASIL level {asil_level} with JQL: {jql}");

        let response: SearchResponse = self
            .post_json("/search", &SearchRequest::for_jql(jql))
            .await?;

        if response.issues.is_empty() {
            return Err(AsilSyncError::NoIssuesForAsilLevel(asil_level.to_string()));
        }

        info!(
            "Found issues for ASIL level {asil_level}: {}",
            response
                .issues
                .iter()
                .map(|issue| issue.key.as_str())
                .collect::<Vec<_>>()
                .join(", ")
        );
        Ok(response.issues)
    }

    /// Hydrates several issues in one search call via a `key in (...)` query.
    /// Empty input short-circuits without touching the network.
    pub async fn issues_by_keys(&self, issue_keys: &[String]) -> Result<Vec<Issue>> {
        if issue_keys.is_empty() {
            return Ok(Vec::new());
        }

        let quoted: Vec<String> = issue_keys.iter().map(|key| format!("\"{key}\"")).collect();
        let jql = format!("key in ({})", quoted.join(","));

        let response: SearchResponse = self
            .post_json("/search", &SearchRequest::for_jql(jql))
            .await?;
        Ok(response.issues)
    }
}
