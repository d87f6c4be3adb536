//! Cascading email enrichment.
//!
//! Both stages funnel into one shared mechanism: group businesses by
//! normalized social URL, submit one deduplicated batch job, match results
//! back by the same normalization, extract an email through the page
//! chain, and fan the result out to every business in the group. The
//! stages differ only in how their candidates acquired a social URL and in
//! the provenance they stamp.

pub mod facebook;
pub mod search;

use std::collections::BTreeMap;

use serde_json::Value;
use tracing::{debug, info};

use leadsignal_common::{Business, EmailSource, EnrichmentStatus, SocialPageInfo};

use crate::extract::{first_match, normalize_social_url, PAGE_EMAIL, PAGE_URL, SOCIAL_DOMAIN};
use crate::jobs::JobRunner;
use crate::run_log::{EventKind, RunLog};
use crate::stats::EnrichmentStats;
use crate::traits::JobRequest;

/// Normalized social URL → indices of businesses sharing that page.
/// Franchise-style pages routinely collapse many businesses to one entry.
pub type SocialPageGroups = BTreeMap<String, Vec<usize>>;

/// Group candidate businesses by normalized social URL. URLs outside the
/// social domain are skipped — nothing useful comes back for them.
pub fn group_by_page(businesses: &[Business], candidates: &[usize]) -> SocialPageGroups {
    let mut groups = SocialPageGroups::new();
    for &i in candidates {
        let Some(url) = businesses[i].social_url.as_deref() else {
            continue;
        };
        if !url.contains(SOCIAL_DOMAIN) {
            debug!(url, "Skipping non-social URL");
            continue;
        }
        groups.entry(normalize_social_url(url)).or_default().push(i);
    }
    groups
}

/// The shared stage body: one deduplicated batch job over the group keys,
/// results folded back into every member of each matched group.
///
/// Mutation happens only after a successful fetch, so a submit/poll error
/// leaves every candidate exactly as it was before the stage.
pub(crate) async fn enrich_page_groups(
    runner: &JobRunner,
    businesses: &mut [Business],
    groups: &SocialPageGroups,
    provenance: EmailSource,
    run_log: &mut RunLog,
    stats: &mut EnrichmentStats,
) -> anyhow::Result<()> {
    if groups.is_empty() {
        return Ok(());
    }

    let urls: Vec<String> = groups.keys().cloned().collect();
    let items = runner.run(JobRequest::SocialPages { urls }).await?;
    stats.social_pages_fetched += groups.len() as u32;

    apply_page_results(businesses, groups, &items, provenance, run_log, stats);
    Ok(())
}

/// Match each page result to its group and apply the extracted email (or
/// lack of one) to every business sharing the page. Absence of an email is
/// a valid terminal outcome, not an error.
pub(crate) fn apply_page_results(
    businesses: &mut [Business],
    groups: &SocialPageGroups,
    items: &[Value],
    provenance: EmailSource,
    run_log: &mut RunLog,
    stats: &mut EnrichmentStats,
) {
    for item in items {
        let raw_url = first_match(item, PAGE_URL).unwrap_or_default();
        let normalized = normalize_social_url(&raw_url);

        // Retry with the alternate URL field the result may carry.
        let group = groups.get(&normalized).or_else(|| {
            item.get("facebookUrl")
                .and_then(|v| v.as_str())
                .and_then(|alt| groups.get(&normalize_social_url(alt)))
        });

        let Some(members) = group else {
            debug!(url = %normalized, "Page result matched no group");
            run_log.log(EventKind::PageUnmatched { url: normalized });
            continue;
        };

        let email = first_match(item, PAGE_EMAIL);
        run_log.log(EventKind::PageEnriched {
            url: normalized.clone(),
            businesses: members.len() as u32,
            email_found: email.is_some(),
        });

        let Some(email) = email else {
            // Leave unresolved; aggregation stamps the terminal state.
            continue;
        };

        let page_info = SocialPageInfo {
            likes: item.get("likes").and_then(|v| v.as_i64()),
            phone: item
                .get("phone")
                .and_then(|v| v.as_str())
                .map(|s| s.to_string()),
            website: item
                .get("website")
                .and_then(|v| v.as_str())
                .map(|s| s.to_string())
                .or_else(|| {
                    item.get("websites")?
                        .as_array()?
                        .first()?
                        .as_str()
                        .map(|s| s.to_string())
                }),
        };

        for &i in members {
            let business = &mut businesses[i];
            business.email = Some(email.clone());
            business.email_source = provenance;
            business.enrichment_status = EnrichmentStatus::Enriched;
            business.social_page = Some(page_info.clone());
            match provenance {
                EmailSource::SocialViaSearch => stats.enriched_social_via_search += 1,
                _ => stats.enriched_social_direct += 1,
            }
            info!(name = %business.name, email = %email, "Email resolved from social page");
        }
    }
}
