//! Trait abstractions for the campaign pipeline's external collaborators.
//!
//! ScrapeJobClient — the asynchronous batch-job service (submit, poll,
//!   fetch) behind one trait. Implemented for ApifyClient; MockJobClient
//!   in `testing` covers the rest.
//! SearchUnitPlanner — the geographic coverage advisor.
//! CampaignStore — persistence seam for campaigns, businesses, provenance
//!   and run logs.

use anyhow::Result;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

use apify_client::ApifyClient;
use leadsignal_common::{
    Business, Campaign, CoverageProfile, EmailSource, SearchUnit, SocialPageInfo,
};

use crate::run_log::RunLog;

// ---------------------------------------------------------------------------
// ScrapeJobClient
// ---------------------------------------------------------------------------

/// A batch job for the external scrape service. Batching is the cost
/// control: one submission per stage, never one per business.
#[derive(Debug, Clone, PartialEq)]
pub enum JobRequest {
    /// Primary maps scrape, one search string per (keyword × unit).
    MapsContacts {
        queries: Vec<String>,
        max_per_search: u32,
    },
    /// Social page scrape over an already-deduplicated URL list.
    SocialPages { urls: Vec<String> },
    /// Text search, one query per business needing discovery.
    TextSearch { queries: Vec<String> },
}

impl JobRequest {
    pub fn kind(&self) -> &'static str {
        match self {
            JobRequest::MapsContacts { .. } => "maps_contacts",
            JobRequest::SocialPages { .. } => "social_pages",
            JobRequest::TextSearch { .. } => "text_search",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct JobHandle {
    pub job_id: String,
    pub result_set_id: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JobStatus {
    Running,
    Succeeded,
    Failed,
}

#[async_trait]
pub trait ScrapeJobClient: Send + Sync {
    /// Submit a batch job. Returns immediately with a handle.
    async fn submit(&self, request: JobRequest) -> Result<JobHandle>;

    /// One status poll.
    async fn status(&self, job_id: &str) -> Result<JobStatus>;

    /// Fetch the result set of a finished job. Free-form records; callers
    /// access fields through the extractor chains in `extract`.
    async fn fetch_result_set(&self, result_set_id: &str) -> Result<Vec<Value>>;
}

#[async_trait]
impl ScrapeJobClient for ApifyClient {
    async fn submit(&self, request: JobRequest) -> Result<JobHandle> {
        let run = match request {
            JobRequest::MapsContacts {
                queries,
                max_per_search,
            } => self.start_maps_contacts_scrape(queries, max_per_search).await?,
            JobRequest::SocialPages { urls } => self.start_facebook_pages_scrape(urls).await?,
            JobRequest::TextSearch { queries } => self.start_google_search(&queries).await?,
        };
        Ok(JobHandle {
            job_id: run.id,
            result_set_id: run.default_dataset_id,
        })
    }

    async fn status(&self, job_id: &str) -> Result<JobStatus> {
        let run = self.run_status(job_id).await?;
        let status = if run.is_succeeded() {
            JobStatus::Succeeded
        } else if run.is_terminal_failure() {
            JobStatus::Failed
        } else {
            // READY (queued) and RUNNING both mean keep polling.
            JobStatus::Running
        };
        Ok(status)
    }

    async fn fetch_result_set(&self, result_set_id: &str) -> Result<Vec<Value>> {
        Ok(self.get_dataset_items(result_set_id).await?)
    }
}

// ---------------------------------------------------------------------------
// SearchUnitPlanner
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq)]
pub struct PlannedCoverage {
    pub search_units: Vec<SearchUnit>,
    pub cost_estimate: f64,
}

/// Planner failures carry distinct signals: quota exhaustion and "no units
/// determined" must surface as-is, never silently defaulted. Only
/// transport-level unavailability degrades to a full-area fallback.
#[derive(Debug, Clone, thiserror::Error)]
pub enum PlannerError {
    #[error("coverage planner quota exhausted")]
    QuotaExhausted,

    #[error("no search units determined for location")]
    NoUnits,

    #[error("coverage planner unavailable: {0}")]
    Unavailable(String),
}

#[async_trait]
pub trait SearchUnitPlanner: Send + Sync {
    async fn plan(
        &self,
        location: &str,
        keywords: &[String],
        profile: CoverageProfile,
    ) -> std::result::Result<PlannedCoverage, PlannerError>;
}

// ---------------------------------------------------------------------------
// CampaignStore
// ---------------------------------------------------------------------------

/// One provenance row per enriched business: which social page supplied
/// the email, plus the auxiliary page metadata captured alongside it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProvenanceRecord {
    pub external_id: String,
    pub social_url: String,
    pub email: String,
    pub email_source: EmailSource,
    pub page: SocialPageInfo,
}

impl ProvenanceRecord {
    /// Build from an enriched business. None when the business has no
    /// resolved email or no social page behind it.
    pub fn from_business(business: &Business) -> Option<Self> {
        let email = business.email.clone()?;
        let social_url = business.social_url.clone()?;
        if !business.email_source.is_resolved() || business.social_page.is_none() {
            return None;
        }
        Some(Self {
            external_id: business.external_id.clone(),
            social_url,
            email,
            email_source: business.email_source,
            page: business.social_page.clone().unwrap_or_default(),
        })
    }
}

#[async_trait]
pub trait CampaignStore: Send + Sync {
    /// Upsert the campaign record (status, totals, units, cost, error).
    async fn update_campaign(&self, campaign: &Campaign) -> Result<()>;

    /// Upsert one search unit's businesses by external id.
    async fn upsert_businesses(
        &self,
        campaign_id: Uuid,
        unit_id: &str,
        businesses: &[Business],
    ) -> Result<()>;

    /// Insert enrichment provenance records.
    async fn insert_provenance(
        &self,
        campaign_id: Uuid,
        records: &[ProvenanceRecord],
    ) -> Result<()>;

    /// Persist the campaign's run log.
    async fn save_run_log(&self, campaign_id: Uuid, run_log: &RunLog) -> Result<()>;
}
