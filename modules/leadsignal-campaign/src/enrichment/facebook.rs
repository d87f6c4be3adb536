//! FacebookEnrichmentStage — resolve emails for businesses that already
//! reference a social page.

use tracing::info;

use leadsignal_common::{Business, EmailSource, LeadSignalError};

use crate::enrichment::{enrich_page_groups, group_by_page};
use crate::jobs::JobRunner;
use crate::run_log::{EventKind, RunLog};
use crate::stats::EnrichmentStats;

pub const STAGE_NAME: &str = "facebook";

/// Enrich the no-email-with-social bucket in place. Deduplication happens
/// before submission — batch size drives cost.
pub async fn enrich(
    runner: &JobRunner,
    businesses: &mut [Business],
    candidates: &[usize],
    run_log: &mut RunLog,
    stats: &mut EnrichmentStats,
) -> Result<(), LeadSignalError> {
    if candidates.is_empty() {
        return Ok(());
    }

    let groups = group_by_page(businesses, candidates);
    info!(
        businesses = candidates.len(),
        unique_pages = groups.len(),
        "Deduplicated social pages for enrichment"
    );
    run_log.log(EventKind::PageDedup {
        businesses: candidates.len() as u32,
        unique_pages: groups.len() as u32,
    });

    enrich_page_groups(
        runner,
        businesses,
        &groups,
        EmailSource::SocialDirect,
        run_log,
        stats,
    )
    .await
    .map_err(|e| LeadSignalError::EnrichmentStage {
        stage: STAGE_NAME.to_string(),
        message: e.to_string(),
    })
}
