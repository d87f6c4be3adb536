//! CampaignOrchestrator — the campaign state machine.
//!
//! `draft → running → {completed, failed}`, terminal. Execution is
//! fire-and-forget: `execute` validates, transitions to running, spawns the
//! pipeline as a task and returns immediately; callers observe completion
//! by polling the campaign record. The two enrichment stages are isolated —
//! their failures degrade the result instead of aborting — while everything
//! outside them marks the campaign failed with a captured message.

use std::sync::atomic::AtomicBool;
use std::sync::{Arc, OnceLock};
use std::time::Duration;

use chrono::Utc;
use regex::Regex;
use tokio::task::JoinHandle;
use tracing::{error, info, warn};
use uuid::Uuid;

use leadsignal_common::{
    Business, Campaign, CampaignStatus, Config, LeadSignalError, SearchUnit,
};

use crate::aggregate;
use crate::categorize::categorize;
use crate::enrichment::{facebook, search};
use crate::jobs::JobRunner;
use crate::normalize::{ingest, SearchQuery};
use crate::run_log::{EventKind, RunLog};
use crate::stats::EnrichmentStats;
use crate::traits::{
    CampaignStore, JobRequest, PlannerError, ProvenanceRecord, ScrapeJobClient, SearchUnitPlanner,
};

fn postal_code_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^\d{5}(-\d{4})?$").expect("static regex"))
}

pub struct CampaignRunner {
    client: Arc<dyn ScrapeJobClient>,
    planner: Arc<dyn SearchUnitPlanner>,
    store: Arc<dyn CampaignStore>,
    config: Config,
}

/// Returned by `execute`. The task handle is mostly useful in tests; the
/// cancel flag is checked at every suspension point of the running
/// pipeline. There is no clean cancellation of an in-flight external job —
/// cancelling stops the execution before its next step.
#[derive(Debug)]
pub struct CampaignHandle {
    pub campaign_id: Uuid,
    pub cancelled: Arc<AtomicBool>,
    pub task: JoinHandle<()>,
}

impl CampaignRunner {
    pub fn new(
        client: Arc<dyn ScrapeJobClient>,
        planner: Arc<dyn SearchUnitPlanner>,
        store: Arc<dyn CampaignStore>,
        config: Config,
    ) -> Self {
        Self {
            client,
            planner,
            store,
            config,
        }
    }

    /// `draft → running`. Rejects without a state change when the scrape
    /// credential is missing or the campaign is not in draft.
    pub async fn execute(&self, mut campaign: Campaign) -> Result<CampaignHandle, LeadSignalError> {
        if self.config.apify_api_key.trim().is_empty() {
            return Err(LeadSignalError::Configuration(
                "scrape service credential is not configured".to_string(),
            ));
        }
        if campaign.status != CampaignStatus::Draft {
            return Err(LeadSignalError::InvalidTransition(format!(
                "cannot execute a campaign in state {}",
                campaign.status
            )));
        }

        campaign.status = CampaignStatus::Running;
        campaign.started_at = Some(Utc::now());
        if let Err(e) = self.store.update_campaign(&campaign).await {
            warn!(error = %e, "Failed to persist running status, continuing");
        }

        let cancelled = Arc::new(AtomicBool::new(false));
        let campaign_id = campaign.id;
        let task = tokio::spawn(run_campaign(
            self.client.clone(),
            self.planner.clone(),
            self.store.clone(),
            self.config.clone(),
            campaign,
            cancelled.clone(),
        ));
        info!(%campaign_id, "Campaign execution started");

        Ok(CampaignHandle {
            campaign_id,
            cancelled,
            task,
        })
    }
}

/// The spawned execution: run the pipeline under the wall-clock bound,
/// then settle the terminal state and persist it.
async fn run_campaign(
    client: Arc<dyn ScrapeJobClient>,
    planner: Arc<dyn SearchUnitPlanner>,
    store: Arc<dyn CampaignStore>,
    config: Config,
    mut campaign: Campaign,
    cancelled: Arc<AtomicBool>,
) {
    let mut run_log = RunLog::new(campaign.id);
    let runner = JobRunner::new(
        client,
        cancelled,
        config.poll_timeout_secs.map(Duration::from_secs),
    );
    let bound = Duration::from_secs(config.execution_timeout_secs);

    let outcome = tokio::time::timeout(
        bound,
        run_pipeline(
            &runner,
            &*planner,
            &*store,
            &config,
            &mut campaign,
            &mut run_log,
        ),
    )
    .await;

    campaign.completed_at = Some(Utc::now());
    match outcome {
        Ok(Ok(())) => {
            campaign.status = CampaignStatus::Completed;
            info!(
                campaign_id = %campaign.id,
                with_email = campaign.totals.with_email,
                total = campaign.totals.businesses_found,
                "Campaign completed"
            );
        }
        Ok(Err(e)) => {
            error!(campaign_id = %campaign.id, error = %e, "Campaign failed");
            campaign.status = CampaignStatus::Failed;
            campaign.error = Some(e.to_string());
        }
        Err(_) => {
            error!(campaign_id = %campaign.id, "Campaign execution timed out");
            campaign.status = CampaignStatus::Failed;
            campaign.error = Some(format!(
                "Execution timeout after {}s",
                config.execution_timeout_secs
            ));
        }
    }

    if let Err(e) = store.update_campaign(&campaign).await {
        warn!(error = %e, "Failed to persist final campaign state");
    }
    if let Err(e) = store.save_run_log(campaign.id, &run_log).await {
        warn!(error = %e, "Failed to save campaign run log");
    }
}

/// Obtain search units. An exact postal code skips the planner entirely;
/// planner unavailability degrades to one full-area unit; quota exhaustion
/// and "no units determined" are distinct fatal signals that are never
/// silently defaulted.
async fn plan_units(
    planner: &dyn SearchUnitPlanner,
    campaign: &Campaign,
    run_log: &mut RunLog,
) -> Result<Vec<SearchUnit>, LeadSignalError> {
    let location = campaign.location.trim();
    if postal_code_re().is_match(location) {
        info!(location, "Location is an exact postal code, skipping planner");
        run_log.log(EventKind::Planning {
            units: 1,
            fallback: false,
        });
        return Ok(vec![SearchUnit::direct_zip(location)]);
    }

    match planner
        .plan(&campaign.location, &campaign.keywords, campaign.coverage_profile)
        .await
    {
        Ok(coverage) if coverage.search_units.is_empty() => {
            Err(LeadSignalError::Planning(PlannerError::NoUnits.to_string()))
        }
        Ok(coverage) => {
            info!(
                units = coverage.search_units.len(),
                cost_estimate = coverage.cost_estimate,
                "Coverage planned"
            );
            run_log.log(EventKind::Planning {
                units: coverage.search_units.len() as u32,
                fallback: false,
            });
            Ok(coverage.search_units)
        }
        Err(e @ (PlannerError::QuotaExhausted | PlannerError::NoUnits)) => {
            Err(LeadSignalError::Planning(e.to_string()))
        }
        Err(PlannerError::Unavailable(msg)) => {
            warn!(error = %msg, "Coverage planning unavailable, falling back to full-area search");
            run_log.log(EventKind::Planning {
                units: 1,
                fallback: true,
            });
            Ok(vec![SearchUnit::full_area(&campaign.location)])
        }
    }
}

/// The single async task chain: plan → scrape → normalize → categorize →
/// enrich (Facebook, then discovery, sequential) → aggregate → persist.
/// The business collection is exclusively owned by this execution.
async fn run_pipeline(
    runner: &JobRunner,
    planner: &dyn SearchUnitPlanner,
    store: &dyn CampaignStore,
    config: &Config,
    campaign: &mut Campaign,
    run_log: &mut RunLog,
) -> Result<(), LeadSignalError> {
    let mut stats = EnrichmentStats::default();

    campaign.search_units = plan_units(planner, campaign, run_log).await?;

    // One query per (keyword × search unit).
    let queries: Vec<SearchQuery> = campaign
        .keywords
        .iter()
        .flat_map(|keyword| {
            campaign.search_units.iter().map(move |unit| SearchQuery {
                query: format!("{} {}", keyword, unit.id),
                unit_id: unit.id.clone(),
                unit_label: unit.label.clone(),
            })
        })
        .collect();
    info!(queries = queries.len(), "Built primary scrape queries");

    // Primary scrape. Outside the per-stage isolation — failures here are
    // fatal to the campaign.
    let records = runner
        .run(JobRequest::MapsContacts {
            queries: queries.iter().map(|q| q.query.clone()).collect(),
            max_per_search: config.max_businesses_per_unit,
        })
        .await?;
    stats.records_fetched = records.len() as u32;

    let mut businesses: Vec<Business> = Vec::new();
    let (ingested, duplicates, dropped) =
        ingest(&records, &queries, &campaign.location, &mut businesses);
    stats.businesses_ingested = ingested;
    stats.duplicates_merged = duplicates;
    stats.records_dropped = dropped;
    run_log.log(EventKind::PrimaryScrape {
        queries: queries.len() as u32,
        records: stats.records_fetched,
        ingested,
        duplicates,
        dropped,
    });

    let cat = categorize(&mut businesses);
    stats.with_email_primary = cat.with_email.len() as u32;
    stats.no_email_with_social = cat.no_email_with_social.len() as u32;
    stats.no_email_no_social = cat.no_email_no_social.len() as u32;
    info!(
        with_email = cat.with_email.len(),
        with_social = cat.no_email_with_social.len(),
        without_social = cat.no_email_no_social.len(),
        "Businesses categorized"
    );
    run_log.log(EventKind::Categorized {
        with_email: stats.with_email_primary,
        with_social: stats.no_email_with_social,
        without_social: stats.no_email_no_social,
    });

    // Stage A: enrich businesses that already reference a social page.
    if let Err(e) = facebook::enrich(
        runner,
        &mut businesses,
        &cat.no_email_with_social,
        run_log,
        &mut stats,
    )
    .await
    {
        warn!(error = %e, "Facebook enrichment failed, continuing");
        stats.stage_warnings += 1;
        run_log.log(EventKind::StageWarning {
            stage: facebook::STAGE_NAME.to_string(),
            message: e.to_string(),
        });
    }

    runner.check_cancelled().map_err(LeadSignalError::Anyhow)?;

    // Stage B: discover social pages for the rest, then enrich them.
    let location = campaign.location.clone();
    if let Err(e) = search::discover(
        runner,
        &mut businesses,
        &cat.no_email_no_social,
        &location,
        run_log,
        &mut stats,
    )
    .await
    {
        warn!(error = %e, "Search discovery failed, continuing");
        stats.stage_warnings += 1;
        run_log.log(EventKind::StageWarning {
            stage: search::STAGE_NAME.to_string(),
            message: e.to_string(),
        });
    }

    runner.check_cancelled().map_err(LeadSignalError::Anyhow)?;

    let agg = aggregate::aggregate(&mut businesses, &mut stats);
    campaign.totals = agg.totals;
    campaign.estimated_cost = agg.estimated_cost;
    run_log.log(EventKind::CostCheckpoint {
        records_fetched: stats.records_fetched,
        social_pages_fetched: stats.social_pages_fetched,
        estimated_cost: agg.estimated_cost,
    });
    info!("{stats}");

    // Persist grouped by search unit. Partial persistence is preferred over
    // losing computed results — store errors never fail the campaign.
    let mut persisted = 0u32;
    for (unit_id, idxs) in &agg.by_unit {
        let group: Vec<Business> = idxs.iter().map(|&i| businesses[i].clone()).collect();
        match store.upsert_businesses(campaign.id, unit_id, &group).await {
            Ok(()) => persisted += group.len() as u32,
            Err(e) => {
                warn!(unit = %unit_id, error = %e, "Failed to persist unit businesses, continuing")
            }
        }
    }

    let provenance: Vec<ProvenanceRecord> = businesses
        .iter()
        .filter_map(ProvenanceRecord::from_business)
        .collect();
    if !provenance.is_empty() {
        if let Err(e) = store.insert_provenance(campaign.id, &provenance).await {
            warn!(error = %e, "Failed to persist enrichment provenance, continuing");
        }
    }
    run_log.log(EventKind::Persisted {
        units: agg.by_unit.len() as u32,
        businesses: persisted,
        provenance: provenance.len() as u32,
    });

    Ok(())
}
