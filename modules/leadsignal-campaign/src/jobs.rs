//! Batch-job driver: submit, poll to a terminal state, fetch.
//!
//! The only suspension points in a campaign execution are in here, so this
//! is also where the cancellation flag and the poll timeout are checked.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use serde_json::Value;
use tokio::time::Instant;
use tracing::{debug, info};

use crate::traits::{JobRequest, JobStatus, ScrapeJobClient};

const POLL_INTERVAL: Duration = Duration::from_secs(5);

/// Runs batch jobs end to end for one campaign execution. Shared by the
/// primary scrape and both enrichment stages.
pub struct JobRunner {
    client: Arc<dyn ScrapeJobClient>,
    cancelled: Arc<AtomicBool>,
    poll_timeout: Option<Duration>,
}

impl JobRunner {
    pub fn new(
        client: Arc<dyn ScrapeJobClient>,
        cancelled: Arc<AtomicBool>,
        poll_timeout: Option<Duration>,
    ) -> Self {
        Self {
            client,
            cancelled,
            poll_timeout,
        }
    }

    /// Bail out if the campaign has been cancelled. Checked at every
    /// suspension point — there is no clean way to stop an in-flight
    /// external job, but we never start the next step.
    pub fn check_cancelled(&self) -> Result<()> {
        if self.cancelled.load(Ordering::Relaxed) {
            info!("Campaign execution cancelled");
            anyhow::bail!("Campaign execution cancelled");
        }
        Ok(())
    }

    /// Submit a job, poll it to a terminal state, fetch its result set.
    pub async fn run(&self, request: JobRequest) -> Result<Vec<Value>> {
        let kind = request.kind();
        self.check_cancelled()?;

        let handle = self.client.submit(request).await?;
        info!(kind, job_id = %handle.job_id, "Batch job submitted");

        let started = Instant::now();
        loop {
            self.check_cancelled()?;
            match self.client.status(&handle.job_id).await? {
                JobStatus::Succeeded => break,
                JobStatus::Failed => {
                    anyhow::bail!("{kind} job {} reached a failed state", handle.job_id)
                }
                JobStatus::Running => {
                    debug!(kind, job_id = %handle.job_id, "Job still in progress");
                    if let Some(limit) = self.poll_timeout {
                        if started.elapsed() >= limit {
                            anyhow::bail!(
                                "{kind} job {} did not finish within {}s",
                                handle.job_id,
                                limit.as_secs()
                            );
                        }
                    }
                    tokio::time::sleep(POLL_INTERVAL).await;
                }
            }
        }

        self.check_cancelled()?;
        let records = self.client.fetch_result_set(&handle.result_set_id).await?;
        info!(kind, count = records.len(), "Batch job results fetched");
        Ok(records)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::MockJobClient;
    use serde_json::json;

    #[tokio::test]
    async fn runs_a_job_to_completion() {
        let client = Arc::new(MockJobClient::new().on_text_search(vec![json!({"ok": true})]));
        let runner = JobRunner::new(client, Arc::new(AtomicBool::new(false)), None);

        let records = runner
            .run(JobRequest::TextSearch {
                queries: vec!["q".to_string()],
            })
            .await
            .unwrap();
        assert_eq!(records.len(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn polls_through_running_until_the_job_finishes() {
        let client = Arc::new(
            MockJobClient::new()
                .on_text_search(vec![json!({"ok": true})])
                .polls_until_done(3),
        );
        let runner = JobRunner::new(client, Arc::new(AtomicBool::new(false)), None);

        let records = runner
            .run(JobRequest::TextSearch {
                queries: vec!["q".to_string()],
            })
            .await
            .unwrap();
        assert_eq!(records.len(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn poll_timeout_bails_on_a_stalled_job() {
        let client = Arc::new(
            MockJobClient::new()
                .on_text_search(vec![])
                .polls_until_done(u32::MAX),
        );
        let runner = JobRunner::new(
            client,
            Arc::new(AtomicBool::new(false)),
            Some(Duration::from_secs(30)),
        );

        let err = runner
            .run(JobRequest::TextSearch {
                queries: vec!["q".to_string()],
            })
            .await
            .unwrap_err();
        assert!(err.to_string().contains("did not finish within 30s"));
    }

    #[tokio::test]
    async fn cancelled_flag_stops_before_submission() {
        let client = Arc::new(MockJobClient::new().on_text_search(vec![]));
        let runner = JobRunner::new(client.clone(), Arc::new(AtomicBool::new(true)), None);

        let err = runner
            .run(JobRequest::TextSearch {
                queries: vec!["q".to_string()],
            })
            .await
            .unwrap_err();
        assert!(err.to_string().contains("cancelled"));
        assert!(client.submitted().is_empty(), "no job should be submitted");
    }

    #[tokio::test]
    async fn failed_job_surfaces_as_error() {
        let client = Arc::new(MockJobClient::new().fail_social_pages("actor crashed"));
        let runner = JobRunner::new(client, Arc::new(AtomicBool::new(false)), None);

        let err = runner
            .run(JobRequest::SocialPages {
                urls: vec!["https://facebook.com/x".to_string()],
            })
            .await
            .unwrap_err();
        assert!(err.to_string().contains("actor crashed"));
    }
}
