use std::collections::HashMap;

use futures::future::try_join_all;
use log::debug;
use tokio::sync::Mutex;

use super::client::JiraClient;
use super::types::{IssueType, Project};
use crate::error::{AsilSyncError, Result};

/// Memoizes project issue-type lookups for the lifetime of the process.
///
/// Owned by the server state and injected into the workflows; tests build
/// isolated instances. Entries are never invalidated, so a type created or
/// renamed in Jira mid-run is not seen until restart. Concurrent misses on
/// the same key may fetch twice; the writes are idempotent.
#[derive(Default)]
pub struct TypeCache {
    projects: Mutex<HashMap<String, Vec<IssueType>>>,
    type_ids: Mutex<HashMap<(String, String), String>>,
}

impl TypeCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the issue types of a project, fetching project info on a miss.
    pub async fn project_issue_types(
        &self,
        client: &JiraClient,
        project_key: &str,
    ) -> Result<Vec<IssueType>> {
        {
            let projects = self.projects.lock().await;
            if let Some(types) = projects.get(project_key) {
                debug!("Issue-type cache hit for project {project_key}");
                return Ok(types.clone());
            }
        }

        let project: Project = client.get_json(&format!("/project/{project_key}")).await?;
        debug!(
            "Caching {} issue types for project {project_key}",
            project.issue_types.len()
        );
        self.projects
            .lock()
            .await
            .insert(project_key.to_string(), project.issue_types.clone());
        Ok(project.issue_types)
    }

    /// Resolves an issue-type name to its id within a project.
    ///
    /// The first issue type whose name matches exactly wins. A missing name
    /// is fatal for the calling workflow and is not retried.
    pub async fn issue_type_id_by_name(
        &self,
        client: &JiraClient,
        project_key: &str,
        type_name: &str,
    ) -> Result<String> {
        let cache_key = (project_key.to_string(), type_name.to_string());
        {
            let type_ids = self.type_ids.lock().await;
            if let Some(id) = type_ids.get(&cache_key) {
                return Ok(id.clone());
            }
        }

        let issue_types = self.project_issue_types(client, project_key).await?;
        let found = issue_types
            .iter()
            .find(|issue_type| issue_type.name == type_name)
            .ok_or_else(|| AsilSyncError::IssueTypeNotFound {
                type_name: type_name.to_string(),
                project_key: project_key.to_string(),
            })?;

        self.type_ids
            .lock()
            .await
            .insert(cache_key, found.id.clone());
        Ok(found.id.clone())
    }

    /// Front-loads the cache before a replication run: both projects' issue
    /// types are fetched concurrently, then every name is resolved against
    /// the target project concurrently.
    pub async fn preload_mappings(
        &self,
        client: &JiraClient,
        source_project: &str,
        target_project: &str,
        type_names: &[String],
    ) -> Result<()> {
        tokio::try_join!(
            self.project_issue_types(client, source_project),
            self.project_issue_types(client, target_project),
        )?;

        try_join_all(
            type_names
                .iter()
                .map(|name| self.issue_type_id_by_name(client, target_project, name)),
        )
        .await?;

        Ok(())
    }
}
