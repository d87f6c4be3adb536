//! SearchDiscoveryStage — find a social page by text search for businesses
//! with no email and no social reference, then hand the discoveries to the
//! same enrichment mechanism the Facebook stage uses.

use tracing::{debug, info};

use leadsignal_common::{Business, EmailSource, LeadSignalError};

use crate::enrichment::{enrich_page_groups, group_by_page};
use crate::extract::{DIRECTORY_PATH_SEGMENT, SOCIAL_DOMAIN};
use crate::jobs::JobRunner;
use crate::run_log::{EventKind, RunLog};
use crate::stats::EnrichmentStats;
use crate::traits::JobRequest;

pub const STAGE_NAME: &str = "search_discovery";

/// One site-restricted query per business: exact name, social domain,
/// location disambiguator.
fn discovery_query(business: &Business, fallback_location: &str) -> String {
    let area = if business.city.trim().is_empty() {
        fallback_location
    } else {
        &business.city
    };
    format!("\"{}\" site:{} {}", business.name, SOCIAL_DOMAIN, area)
}

/// Discover social pages for the no-email-no-social bucket and enrich
/// whatever was found, in place.
pub async fn discover(
    runner: &JobRunner,
    businesses: &mut [Business],
    candidates: &[usize],
    fallback_location: &str,
    run_log: &mut RunLog,
    stats: &mut EnrichmentStats,
) -> Result<(), LeadSignalError> {
    if candidates.is_empty() {
        return Ok(());
    }

    let queries: Vec<String> = candidates
        .iter()
        .map(|&i| discovery_query(&businesses[i], fallback_location))
        .collect();
    stats.discovery_queries += queries.len() as u32;
    run_log.log(EventKind::DiscoverySearch {
        queries: queries.len() as u32,
    });
    info!(queries = queries.len(), "Searching for social pages");

    let results = runner
        .run(JobRequest::TextSearch { queries })
        .await
        .map_err(|e| LeadSignalError::EnrichmentStage {
            stage: STAGE_NAME.to_string(),
            message: e.to_string(),
        })?;

    let mut discovered: Vec<usize> = Vec::new();
    for result in &results {
        let term = result
            .get("searchQuery")
            .and_then(|q| q.get("term"))
            .and_then(|t| t.as_str())
            .unwrap_or_default();

        // Approximate heuristic: match the result back to a business by
        // testing whether the echoed query contains the business name.
        // Can mismatch when one name is a substring of another.
        let matched = candidates
            .iter()
            .copied()
            .find(|&i| !businesses[i].name.is_empty() && term.contains(&businesses[i].name));
        let Some(idx) = matched else {
            debug!(term, "Search result matched no business");
            continue;
        };

        let organic = result
            .get("organicResults")
            .and_then(|v| v.as_array())
            .map(|a| a.as_slice())
            .unwrap_or_default();
        for hit in organic {
            let url = hit.get("url").and_then(|u| u.as_str()).unwrap_or("");
            if url.contains(SOCIAL_DOMAIN) && !url.contains(DIRECTORY_PATH_SEGMENT) {
                info!(name = %businesses[idx].name, url, "Found social page via search");
                businesses[idx].social_url = Some(url.to_string());
                if !discovered.contains(&idx) {
                    discovered.push(idx);
                }
                break;
            }
        }
    }

    stats.discovery_pages_found += discovered.len() as u32;
    run_log.log(EventKind::DiscoveryMatched {
        pages_found: discovered.len() as u32,
    });

    if discovered.is_empty() {
        return Ok(());
    }

    // Identical mechanism to the Facebook stage, different provenance.
    let groups = group_by_page(businesses, &discovered);
    run_log.log(EventKind::PageDedup {
        businesses: discovered.len() as u32,
        unique_pages: groups.len() as u32,
    });

    enrich_page_groups(
        runner,
        businesses,
        &groups,
        EmailSource::SocialViaSearch,
        run_log,
        stats,
    )
    .await
    .map_err(|e| LeadSignalError::EnrichmentStage {
        stage: STAGE_NAME.to_string(),
        message: e.to_string(),
    })
}
