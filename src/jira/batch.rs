use std::time::Duration;

use futures::future::join_all;
use log::{error, info};
use serde_json::json;
use tokio::time::sleep;

use super::client::JiraClient;
use super::types::{CreatedIssue, IssuePayload};
use crate::error::Result;

/// A child creation that did not go through; kept with its payload so the
/// caller can report or replay it.
#[derive(Debug)]
pub struct FailedIssue {
    pub payload: IssuePayload,
    pub error: String,
}

/// Aggregate of one batch-creation call. Individual failures never abort the
/// run; they only show up here.
#[derive(Debug, Default)]
pub struct BatchResult {
    pub successful: Vec<CreatedIssue>,
    pub failed: Vec<FailedIssue>,
}

impl JiraClient {
    /// Creates a single issue.
    pub async fn create_issue(&self, payload: &IssuePayload) -> Result<CreatedIssue> {
        self.post_json("/issue", &json!({ "fields": payload })).await
    }

    /// Creates issues in consecutive chunks of at most `batch_size`.
    ///
    /// Each chunk fans out concurrently and waits for every request to
    /// settle; one failed creation neither cancels its siblings nor aborts
    /// the batch. Between chunks (not after the last) the call pauses for
    /// `delay_ms` to stay under the tracker's rate limits.
    pub async fn create_issues_batch(
        &self,
        payloads: Vec<IssuePayload>,
        batch_size: usize,
        delay_ms: u64,
    ) -> BatchResult {
        info!(
            "Creating {} subtasks in batches of {batch_size} with {delay_ms}ms delay...",
            payloads.len()
        );

        let batch_size = batch_size.max(1);
        let mut result = BatchResult::default();

        let mut chunks = payloads.chunks(batch_size).peekable();
        while let Some(chunk) = chunks.next() {
            let outcomes = join_all(chunk.iter().map(|payload| self.create_issue(payload))).await;

            for (payload, outcome) in chunk.iter().zip(outcomes) {
                match outcome {
                    Ok(created) => result.successful.push(created),
                    Err(e) => result.failed.push(FailedIssue {
                        payload: payload.clone(),
                        error: e.to_string(),
                    }),
                }
            }

            if chunks.peek().is_some() && delay_ms > 0 {
                sleep(Duration::from_millis(delay_ms)).await;
            }
        }

        result
    }

    /// Creates issues one at a time, in order, pausing `delay_ms` between
    /// attempts. Same aggregate contract as the batch variant with strict
    /// request ordering.
    pub async fn create_issues_sequentially(
        &self,
        payloads: Vec<IssuePayload>,
        delay_ms: u64,
    ) -> BatchResult {
        let total = payloads.len();
        let mut result = BatchResult::default();

        for (i, payload) in payloads.iter().enumerate() {
            match self.create_issue(payload).await {
                Ok(created) => {
                    info!("Successfully created issue {}/{total}: {}", i + 1, created.key);
                    result.successful.push(created);
                }
                Err(e) => {
                    error!("Failed to create issue {}/{total}: {e}", i + 1);
                    result.failed.push(FailedIssue {
                        payload: payload.clone(),
                        error: e.to_string(),
                    });
                }
            }

            if i + 1 < total && delay_ms > 0 {
                sleep(Duration::from_millis(delay_ms)).await;
            }
        }

        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mockito::Matcher;
    use serde_json::json;
    use std::time::Instant;

    fn payload(summary: &str) -> IssuePayload {
        IssuePayload::new("TP", summary.to_string(), "10002".to_string())
    }

    fn created_body(key: &str) -> String {
        json!({"id": "90001", "key": key}).to_string()
    }

    async fn mock_create(
        server: &mut mockito::Server,
        summary: &str,
        status: usize,
        body: &str,
    ) -> mockito::Mock {
        server
            .mock("POST", "/rest/api/3/issue")
            .match_body(Matcher::PartialJson(json!({
                "fields": {"summary": summary}
            })))
            .with_status(status)
            .with_body(body)
            .create_async()
            .await
    }

    #[tokio::test]
    async fn test_partial_failure_is_classified_not_thrown() {
        let mut server = mockito::Server::new_async().await;
        mock_create(&mut server, "item1", 201, &created_body("TP-1")).await;
        mock_create(&mut server, "item2", 400, "field is required").await;
        mock_create(&mut server, "item3", 201, &created_body("TP-3")).await;

        let client = JiraClient::new(&server.url(), None).unwrap();
        let result = client
            .create_issues_batch(
                vec![payload("item1"), payload("item2"), payload("item3")],
                3,
                0,
            )
            .await;

        assert_eq!(result.successful.len(), 2);
        assert_eq!(result.failed.len(), 1);
        assert_eq!(result.successful[0].key, "TP-1");
        assert_eq!(result.successful[1].key, "TP-3");
        assert_eq!(result.failed[0].payload.summary, "item2");
        assert!(result.failed[0].error.contains("400"));
        assert!(result.failed[0].error.contains("field is required"));
    }

    #[tokio::test]
    async fn test_every_payload_is_accounted_for() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/rest/api/3/issue")
            .with_status(201)
            .with_body(created_body("TP-9"))
            .expect(5)
            .create_async()
            .await;

        let client = JiraClient::new(&server.url(), None).unwrap();
        let payloads: Vec<_> = (0..5).map(|i| payload(&format!("item{i}"))).collect();
        let result = client.create_issues_batch(payloads, 2, 0).await;

        mock.assert_async().await;
        assert_eq!(result.successful.len() + result.failed.len(), 5);
    }

    #[tokio::test]
    async fn test_delay_applies_between_chunks_only() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("POST", "/rest/api/3/issue")
            .with_status(201)
            .with_body(created_body("TP-9"))
            .expect(5)
            .create_async()
            .await;

        let client = JiraClient::new(&server.url(), None).unwrap();
        let payloads: Vec<_> = (0..5).map(|i| payload(&format!("item{i}"))).collect();

        // 5 payloads, batch size 2: three chunks, two inter-chunk pauses
        let start = Instant::now();
        let result = client.create_issues_batch(payloads, 2, 100).await;
        let elapsed = start.elapsed();

        assert_eq!(result.successful.len(), 5);
        assert!(elapsed >= Duration::from_millis(200), "elapsed {elapsed:?}");
    }

    #[tokio::test]
    async fn test_no_trailing_delay_after_single_chunk() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("POST", "/rest/api/3/issue")
            .with_status(201)
            .with_body(created_body("TP-9"))
            .expect(2)
            .create_async()
            .await;

        let client = JiraClient::new(&server.url(), None).unwrap();

        let start = Instant::now();
        client
            .create_issues_batch(vec![payload("a"), payload("b")], 10, 2_000)
            .await;

        // One chunk: the configured delay must never run
        assert!(start.elapsed() < Duration::from_millis(1_500));
    }

    #[tokio::test]
    async fn test_sequential_preserves_order_and_captures_failures() {
        let mut server = mockito::Server::new_async().await;
        mock_create(&mut server, "first", 201, &created_body("TP-1")).await;
        mock_create(&mut server, "second", 500, "boom").await;
        mock_create(&mut server, "third", 201, &created_body("TP-3")).await;

        let client = JiraClient::new(&server.url(), None).unwrap();
        let result = client
            .create_issues_sequentially(
                vec![payload("first"), payload("second"), payload("third")],
                0,
            )
            .await;

        assert_eq!(result.successful.len(), 2);
        assert_eq!(result.successful[0].key, "TP-1");
        assert_eq!(result.successful[1].key, "TP-3");
        assert_eq!(result.failed.len(), 1);
        assert_eq!(result.failed[0].payload.summary, "second");
    }

    #[tokio::test]
    async fn test_batch_size_zero_is_clamped() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("POST", "/rest/api/3/issue")
            .with_status(201)
            .with_body(created_body("TP-9"))
            .expect(2)
            .create_async()
            .await;

        let client = JiraClient::new(&server.url(), None).unwrap();
        let result = client
            .create_issues_batch(vec![payload("a"), payload("b")], 0, 0)
            .await;
        assert_eq!(result.successful.len(), 2);
    }
}
