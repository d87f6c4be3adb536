//! Shared test fixtures: mock collaborators and record builders.
//!
//! Gated behind the `test-support` feature so integration tests and
//! downstream crates can reuse them.

use std::collections::{BTreeMap, HashMap, VecDeque};
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Mutex;

use anyhow::{anyhow, bail, Result};
use async_trait::async_trait;
use serde_json::{json, Value};
use uuid::Uuid;

use leadsignal_common::{
    Business, Campaign, CoverageProfile, EmailSource, EnrichmentStatus, SearchUnit,
};

use crate::run_log::RunLog;
use crate::traits::{
    CampaignStore, JobHandle, JobRequest, JobStatus, PlannedCoverage, PlannerError,
    ProvenanceRecord, ScrapeJobClient, SearchUnitPlanner,
};

/// Opt-in log output for a test run: `RUST_LOG=leadsignal=debug cargo test`.
#[cfg(test)]
pub fn init_tracing() {
    use tracing_subscriber::EnvFilter;
    let _ = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

// ---------------------------------------------------------------------------
// Business builder
// ---------------------------------------------------------------------------

/// Start a Business fixture. Identity-only defaults; chain setters for the
/// fields a test cares about.
pub fn business(external_id: &str) -> BusinessBuilder {
    BusinessBuilder {
        inner: Business {
            external_id: external_id.to_string(),
            name: format!("Business {external_id}"),
            address: String::new(),
            phone: String::new(),
            website: String::new(),
            category: String::new(),
            rating: 0.0,
            review_count: 0,
            city: String::new(),
            postal_code: String::new(),
            social_url: None,
            email: None,
            email_source: EmailSource::Unset,
            source_search_unit: "78704".to_string(),
            source_label: "Direct ZIP".to_string(),
            source_query: String::new(),
            enrichment_status: EnrichmentStatus::Pending,
            social_page: None,
        },
    }
}

pub struct BusinessBuilder {
    inner: Business,
}

impl BusinessBuilder {
    pub fn name(mut self, name: &str) -> Self {
        self.inner.name = name.to_string();
        self
    }

    pub fn email(mut self, email: &str) -> Self {
        self.inner.email = Some(email.to_string());
        self.inner.email_source = EmailSource::PrimaryScrape;
        self
    }

    pub fn social(mut self, url: &str) -> Self {
        self.inner.social_url = Some(url.to_string());
        self
    }

    pub fn unit(mut self, unit_id: &str) -> Self {
        self.inner.source_search_unit = unit_id.to_string();
        self
    }

    pub fn city(mut self, city: &str) -> Self {
        self.inner.city = city.to_string();
        self
    }

    pub fn build(self) -> Business {
        self.inner
    }
}

// ---------------------------------------------------------------------------
// Raw record builders
// ---------------------------------------------------------------------------

/// A bare place record, as the maps scrape returns it.
pub fn place(id: &str, name: &str, search_string: &str) -> Value {
    json!({
        "placeId": id,
        "title": name,
        "searchString": search_string,
        "address": "100 Main St",
        "city": "Austin",
        "postalCode": "78704",
    })
}

pub fn place_with_email(id: &str, name: &str, search_string: &str, email: &str) -> Value {
    let mut record = place(id, name, search_string);
    record["emails"] = json!([email]);
    record
}

pub fn place_with_social(id: &str, name: &str, search_string: &str, url: &str) -> Value {
    let mut record = place(id, name, search_string);
    record["facebooks"] = json!([url]);
    record
}

/// A social page scrape result.
pub fn page_result(url: &str, email: Option<&str>) -> Value {
    let mut record = json!({
        "url": url,
        "likes": 120,
        "phone": "+1 512 555 0100",
        "website": "https://example.com",
    });
    if let Some(email) = email {
        record["email"] = json!(email);
    }
    record
}

/// A text search result: the echoed query plus organic hits.
pub fn search_result(term: &str, urls: &[&str]) -> Value {
    let hits: Vec<Value> = urls.iter().map(|u| json!({ "url": u })).collect();
    json!({
        "searchQuery": { "term": term },
        "organicResults": hits,
    })
}

// ---------------------------------------------------------------------------
// MockJobClient
// ---------------------------------------------------------------------------

/// Scripted ScrapeJobClient. Responses are queued per job kind and popped
/// in submission order; every job reports Succeeded on first poll.
#[derive(Default)]
pub struct MockJobClient {
    responses: Mutex<HashMap<&'static str, VecDeque<std::result::Result<Vec<Value>, String>>>>,
    result_sets: Mutex<HashMap<String, Vec<Value>>>,
    submitted: Mutex<Vec<JobRequest>>,
    next_id: AtomicU32,
    polls_until_done: AtomicU32,
    remaining_polls: Mutex<HashMap<String, u32>>,
}

impl MockJobClient {
    pub fn new() -> Self {
        Self::default()
    }

    fn queue(self, kind: &'static str, response: std::result::Result<Vec<Value>, String>) -> Self {
        self.responses
            .lock()
            .unwrap()
            .entry(kind)
            .or_default()
            .push_back(response);
        self
    }

    pub fn on_maps(self, items: Vec<Value>) -> Self {
        self.queue("maps_contacts", Ok(items))
    }

    pub fn on_social_pages(self, items: Vec<Value>) -> Self {
        self.queue("social_pages", Ok(items))
    }

    pub fn on_text_search(self, items: Vec<Value>) -> Self {
        self.queue("text_search", Ok(items))
    }

    pub fn fail_maps(self, message: &str) -> Self {
        self.queue("maps_contacts", Err(message.to_string()))
    }

    pub fn fail_social_pages(self, message: &str) -> Self {
        self.queue("social_pages", Err(message.to_string()))
    }

    pub fn fail_text_search(self, message: &str) -> Self {
        self.queue("text_search", Err(message.to_string()))
    }

    /// Report Running for the first `n` status polls of each job before
    /// flipping to Succeeded. `u32::MAX` models a stalled job.
    pub fn polls_until_done(self, n: u32) -> Self {
        self.polls_until_done.store(n, Ordering::Relaxed);
        self
    }

    /// Every request submitted so far, in order.
    pub fn submitted(&self) -> Vec<JobRequest> {
        self.submitted.lock().unwrap().clone()
    }

    /// The URL batches of every SocialPages submission, in order.
    pub fn social_page_batches(&self) -> Vec<Vec<String>> {
        self.submitted()
            .into_iter()
            .filter_map(|r| match r {
                JobRequest::SocialPages { urls } => Some(urls),
                _ => None,
            })
            .collect()
    }
}

#[async_trait]
impl ScrapeJobClient for MockJobClient {
    async fn submit(&self, request: JobRequest) -> Result<JobHandle> {
        let kind = request.kind();
        self.submitted.lock().unwrap().push(request);

        let response = self
            .responses
            .lock()
            .unwrap()
            .get_mut(kind)
            .and_then(|q| q.pop_front())
            .ok_or_else(|| anyhow!("no response scripted for {kind} job"))?;

        match response {
            Ok(items) => {
                let id = format!("{kind}-{}", self.next_id.fetch_add(1, Ordering::Relaxed));
                self.result_sets.lock().unwrap().insert(id.clone(), items);
                self.remaining_polls
                    .lock()
                    .unwrap()
                    .insert(id.clone(), self.polls_until_done.load(Ordering::Relaxed));
                Ok(JobHandle {
                    job_id: id.clone(),
                    result_set_id: id,
                })
            }
            Err(message) => bail!("{kind} job failed: {message}"),
        }
    }

    async fn status(&self, job_id: &str) -> Result<JobStatus> {
        let mut remaining = self.remaining_polls.lock().unwrap();
        match remaining.get_mut(job_id) {
            Some(n) if *n > 0 => {
                *n -= 1;
                Ok(JobStatus::Running)
            }
            _ => Ok(JobStatus::Succeeded),
        }
    }

    async fn fetch_result_set(&self, result_set_id: &str) -> Result<Vec<Value>> {
        self.result_sets
            .lock()
            .unwrap()
            .get(result_set_id)
            .cloned()
            .ok_or_else(|| anyhow!("unknown result set {result_set_id}"))
    }
}

// ---------------------------------------------------------------------------
// MockPlanner
// ---------------------------------------------------------------------------

pub struct MockPlanner {
    outcome: std::result::Result<PlannedCoverage, PlannerError>,
    calls: AtomicU32,
}

impl MockPlanner {
    pub fn units(search_units: Vec<SearchUnit>) -> Self {
        Self {
            outcome: Ok(PlannedCoverage {
                search_units,
                cost_estimate: 0.0,
            }),
            calls: AtomicU32::new(0),
        }
    }

    pub fn failing(error: PlannerError) -> Self {
        Self {
            outcome: Err(error),
            calls: AtomicU32::new(0),
        }
    }

    pub fn calls(&self) -> u32 {
        self.calls.load(Ordering::Relaxed)
    }
}

#[async_trait]
impl SearchUnitPlanner for MockPlanner {
    async fn plan(
        &self,
        _location: &str,
        _keywords: &[String],
        _profile: CoverageProfile,
    ) -> std::result::Result<PlannedCoverage, PlannerError> {
        self.calls.fetch_add(1, Ordering::Relaxed);
        self.outcome.clone()
    }
}

// ---------------------------------------------------------------------------
// MemoryStore
// ---------------------------------------------------------------------------

/// In-memory CampaignStore with the same upsert semantics the real store
/// has: businesses keyed by search unit, replaced by external id.
#[derive(Default)]
pub struct MemoryStore {
    campaigns: Mutex<HashMap<Uuid, Campaign>>,
    businesses: Mutex<BTreeMap<String, Vec<Business>>>,
    provenance: Mutex<Vec<ProvenanceRecord>>,
    run_logs: Mutex<HashMap<Uuid, Value>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn campaign(&self, id: Uuid) -> Option<Campaign> {
        self.campaigns.lock().unwrap().get(&id).cloned()
    }

    pub fn all_businesses(&self) -> Vec<Business> {
        self.businesses
            .lock()
            .unwrap()
            .values()
            .flatten()
            .cloned()
            .collect()
    }

    pub fn business(&self, external_id: &str) -> Option<Business> {
        self.all_businesses()
            .into_iter()
            .find(|b| b.external_id == external_id)
    }

    pub fn unit_ids(&self) -> Vec<String> {
        self.businesses.lock().unwrap().keys().cloned().collect()
    }

    pub fn provenance(&self) -> Vec<ProvenanceRecord> {
        self.provenance.lock().unwrap().clone()
    }

    pub fn run_log(&self, campaign_id: Uuid) -> Option<Value> {
        self.run_logs.lock().unwrap().get(&campaign_id).cloned()
    }
}

#[async_trait]
impl CampaignStore for MemoryStore {
    async fn update_campaign(&self, campaign: &Campaign) -> Result<()> {
        self.campaigns
            .lock()
            .unwrap()
            .insert(campaign.id, campaign.clone());
        Ok(())
    }

    async fn upsert_businesses(
        &self,
        _campaign_id: Uuid,
        unit_id: &str,
        businesses: &[Business],
    ) -> Result<()> {
        let mut map = self.businesses.lock().unwrap();
        let bucket = map.entry(unit_id.to_string()).or_default();
        for business in businesses {
            if let Some(existing) = bucket
                .iter_mut()
                .find(|b| b.external_id == business.external_id)
            {
                *existing = business.clone();
            } else {
                bucket.push(business.clone());
            }
        }
        Ok(())
    }

    async fn insert_provenance(
        &self,
        _campaign_id: Uuid,
        records: &[ProvenanceRecord],
    ) -> Result<()> {
        self.provenance.lock().unwrap().extend_from_slice(records);
        Ok(())
    }

    async fn save_run_log(&self, campaign_id: Uuid, run_log: &RunLog) -> Result<()> {
        let json = run_log.to_json()?;
        self.run_logs.lock().unwrap().insert(campaign_id, json);
        Ok(())
    }
}
