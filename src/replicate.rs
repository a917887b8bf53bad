use futures::future::try_join_all;
use log::{info, warn};
use serde::Serialize;
use serde_json::json;

use crate::config::ReplicationConfig;
use crate::error::{AsilSyncError, Result};
use crate::jira::types::{CustomField, CustomFieldTable, Issue, IssuePayload};
use crate::jira::{BatchResult, JiraClient, TypeCache};

/// Outcome reported back through the trigger response. Partial child
/// failures surface only as counts; they never fail the run.
#[derive(Debug, Serialize)]
pub struct ReplicationOutcome {
    pub message: String,
    #[serde(rename = "newIssueKey")]
    pub new_issue_key: String,
    #[serde(rename = "createdSubtasks")]
    pub created_subtasks: usize,
    #[serde(rename = "failedSubtasks")]
    pub failed_subtasks: usize,
}

/// Drives the two replication workflows against the tracker.
///
/// Stateless per run apart from the injected type cache, which persists for
/// the process lifetime.
pub struct Replicator {
    client: JiraClient,
    cache: TypeCache,
    config: ReplicationConfig,
    fields: CustomFieldTable,
}

impl Replicator {
    pub fn new(client: JiraClient, cache: TypeCache, config: ReplicationConfig) -> Self {
        let fields = CustomFieldTable::from_config(&config);
        Self {
            client,
            cache,
            config,
            fields,
        }
    }

    /// Clones the template safety story into `target_project`, keeping only
    /// the children that carry `asil_level`.
    pub async fn clone_asil_story(
        &self,
        target_project: &str,
        asil_level: &str,
        system_name: &str,
        carline: &str,
    ) -> Result<ReplicationOutcome> {
        let (source_issue, children) = tokio::try_join!(
            self.client.get_issue(&self.config.source_epic_key),
            self.client.children_by_asil_level(
                &self.config.source_project_key,
                &self.config.source_epic_key,
                asil_level,
            ),
        )?;

        let type_names = unique_type_names(&source_issue, &children);
        self.cache
            .preload_mappings(
                &self.client,
                &self.config.source_project_key,
                target_project,
                &type_names,
            )
            .await?;

        let parent_type_id = self
            .cache
            .issue_type_id_by_name(
                &self.client,
                target_project,
                &source_issue.fields.issuetype.name,
            )
            .await?;

        let asil_value = json!([{ "value": asil_level }]);
        let parent_payload = IssuePayload::new(
            target_project,
            format!("System {system_name} Safety Plan"),
            parent_type_id,
        )
        .description(source_issue.fields.description.clone())
        .custom_field(&self.fields, CustomField::AsilLevel, Some(asil_value.clone()))
        .custom_field(&self.fields, CustomField::Carline, Some(json!(carline)));

        let new_parent = self.client.create_issue(&parent_payload).await?;
        info!("Created parent issue {}", new_parent.key);

        // Payload construction fans out; the preloaded cache makes the
        // per-child type resolution a lookup. Order matches the input.
        let child_payloads = try_join_all(children.iter().map(|child| {
            let asil_value = asil_value.clone();
            let parent_key = new_parent.key.clone();
            async move {
                let type_id = self
                    .cache
                    .issue_type_id_by_name(
                        &self.client,
                        target_project,
                        &child.fields.issuetype.name,
                    )
                    .await?;
                Ok::<_, AsilSyncError>(
                    IssuePayload::new(target_project, child.fields.summary.clone(), type_id)
                        .parent(&parent_key)
                        .description(child.fields.description.clone())
                        .custom_field(&self.fields, CustomField::AsilLevel, Some(asil_value))
                        .custom_field(&self.fields, CustomField::Carline, Some(json!(carline))),
                )
            }
        }))
        .await?;

        let BatchResult { successful, failed } = self.create_children(child_payloads).await;

        report_child_outcomes(successful.len(), &failed);

        Ok(ReplicationOutcome {
            message: format!(
                "Safety Plan Template {} cloned and moved to project {target_project} successfully with {} sub-elements.",
                self.config.source_epic_key,
                successful.len()
            ),
            new_issue_key: new_parent.key,
            created_subtasks: successful.len(),
            failed_subtasks: failed.len(),
        })
    }

    /// Takes over an existing safety story in place: the replica lands in
    /// the epic's own project and keeps the source ASIL value verbatim.
    pub async fn take_over_asil_story(
        &self,
        epic_issue_key: &str,
        carline: &str,
    ) -> Result<ReplicationOutcome> {
        let project_key = epic_issue_key
            .split('-')
            .next()
            .unwrap_or(epic_issue_key)
            .to_string();

        let (source_issue, children) = tokio::try_join!(
            self.client.get_issue(epic_issue_key),
            self.client.children_of(epic_issue_key, &project_key),
        )?;

        let type_names = unique_type_names(&source_issue, &children);
        self.cache
            .preload_mappings(&self.client, &project_key, &project_key, &type_names)
            .await?;

        let asil_value = source_issue
            .fields
            .custom
            .get(self.fields.field_id(CustomField::AsilLevel))
            .cloned();

        let parent_payload = IssuePayload::new(
            &project_key,
            format!(
                "{} - taken over from {epic_issue_key}",
                source_issue.fields.summary
            ),
            source_issue.fields.issuetype.id.clone(),
        )
        .description(source_issue.fields.description.clone())
        .custom_field(&self.fields, CustomField::AsilLevel, asil_value.clone())
        .custom_field(&self.fields, CustomField::Carline, Some(json!(carline)));

        let new_parent = self.client.create_issue(&parent_payload).await?;
        info!("Created parent issue {}", new_parent.key);

        let child_payloads = try_join_all(children.iter().map(|child| {
            let asil_value = asil_value.clone();
            let parent_key = new_parent.key.clone();
            let project_key = project_key.as_str();
            async move {
                let type_id = self
                    .cache
                    .issue_type_id_by_name(&self.client, project_key, &child.fields.issuetype.name)
                    .await?;
                Ok::<_, AsilSyncError>(
                    IssuePayload::new(project_key, child.fields.summary.clone(), type_id)
                        .parent(&parent_key)
                        .description(child.fields.description.clone())
                        .custom_field(&self.fields, CustomField::AsilLevel, asil_value)
                        .custom_field(&self.fields, CustomField::Carline, Some(json!(carline))),
                )
            }
        }))
        .await?;

        let BatchResult { successful, failed } = self.create_children(child_payloads).await;

        report_child_outcomes(successful.len(), &failed);

        Ok(ReplicationOutcome {
            message: format!(
                "Safety Plan Template {epic_issue_key} taken over successfully with {} sub-elements.",
                successful.len()
            ),
            new_issue_key: new_parent.key,
            created_subtasks: successful.len(),
            failed_subtasks: failed.len(),
        })
    }

    /// Child creation strategy: concurrent batches by default, strictly
    /// ordered one-at-a-time when configured.
    async fn create_children(&self, payloads: Vec<IssuePayload>) -> BatchResult {
        if self.config.sequential {
            self.client
                .create_issues_sequentially(payloads, self.config.batch_delay_ms)
                .await
        } else {
            self.client
                .create_issues_batch(
                    payloads,
                    self.config.batch_size,
                    self.config.batch_delay_ms,
                )
                .await
        }
    }
}

/// Distinct issue-type names across the epic and its children, source order.
fn unique_type_names(source_issue: &Issue, children: &[Issue]) -> Vec<String> {
    let mut names = vec![source_issue.fields.issuetype.name.clone()];
    for child in children {
        let name = &child.fields.issuetype.name;
        if !names.contains(name) {
            names.push(name.clone());
        }
    }
    names
}

fn report_child_outcomes(successful: usize, failed: &[crate::jira::FailedIssue]) {
    info!("Successfully created {successful} subtasks");
    if !failed.is_empty() {
        warn!(
            "Failed to create {} subtasks: {:?}",
            failed.len(),
            failed.iter().map(|f| f.error.as_str()).collect::<Vec<_>>()
        );
    }
}
