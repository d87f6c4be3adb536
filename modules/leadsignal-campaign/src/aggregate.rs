//! ResultMerger — fold enrichment output into final totals, stamp terminal
//! states, and group businesses by originating search unit for persistence
//! batching.

use std::collections::BTreeMap;

use leadsignal_common::{Business, CampaignTotals, EmailSource, EnrichmentStatus};

use crate::stats::EnrichmentStats;

/// Cost per primary-scrape record fetched, in dollars.
pub const UNIT_COST_PER_RECORD: f64 = 0.007;

/// Cost per social page enriched, in dollars.
pub const UNIT_COST_PER_SOCIAL_PAGE: f64 = 0.003;

/// The documented linear cost model.
pub fn estimated_cost(records_fetched: u32, social_pages_fetched: u32) -> f64 {
    records_fetched as f64 * UNIT_COST_PER_RECORD
        + social_pages_fetched as f64 * UNIT_COST_PER_SOCIAL_PAGE
}

#[derive(Debug)]
pub struct Aggregation {
    pub totals: CampaignTotals,
    pub estimated_cost: f64,
    /// Search unit id → indices of businesses attributed to it.
    pub by_unit: BTreeMap<String, Vec<usize>>,
}

/// Finalize the collection after all stages have run (or been skipped on
/// failure): stamp terminal email-source states, count per-source totals,
/// compute cost, group by unit.
pub fn aggregate(businesses: &mut [Business], stats: &mut EnrichmentStats) -> Aggregation {
    let mut totals = CampaignTotals::default();
    let mut by_unit: BTreeMap<String, Vec<usize>> = BTreeMap::new();

    for (i, business) in businesses.iter_mut().enumerate() {
        if business.has_email() {
            // Backfill for records whose email came from the primary scrape
            // through a path that never stamped a source.
            if business.email_source == EmailSource::Unset {
                business.email_source = EmailSource::PrimaryScrape;
            }
        } else {
            business.email = None;
            business.email_source = EmailSource::Unresolved;
            business.enrichment_status = EnrichmentStatus::Unresolved;
        }

        totals.businesses_found += 1;
        match business.email_source {
            EmailSource::PrimaryScrape => totals.primary_scrape += 1,
            EmailSource::SocialDirect => totals.social_direct += 1,
            EmailSource::SocialViaSearch => totals.social_via_search += 1,
            EmailSource::Unresolved | EmailSource::Unset => totals.unresolved += 1,
        }
        if business.email_source.is_resolved() {
            totals.with_email += 1;
        }

        by_unit
            .entry(business.source_search_unit.clone())
            .or_default()
            .push(i);
    }

    totals.social_pages_discovered = stats.social_pages_fetched;
    stats.still_unresolved = totals.unresolved;

    Aggregation {
        totals,
        estimated_cost: estimated_cost(stats.records_fetched, stats.social_pages_fetched),
        by_unit,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::business;

    #[test]
    fn cost_matches_linear_formula_exactly() {
        let cost = estimated_cost(100, 15);
        assert_eq!(cost, 100.0 * UNIT_COST_PER_RECORD + 15.0 * UNIT_COST_PER_SOCIAL_PAGE);
        assert!((cost - 0.745).abs() < 1e-9);
    }

    #[test]
    fn zero_work_costs_nothing() {
        assert_eq!(estimated_cost(0, 0), 0.0);
    }

    #[test]
    fn unresolved_is_stamped_at_aggregation() {
        let mut businesses = vec![
            business("p1").email("a@x.com").build(),
            business("p2").build(),
        ];
        let mut stats = EnrichmentStats::default();
        let agg = aggregate(&mut businesses, &mut stats);

        assert_eq!(businesses[1].email_source, EmailSource::Unresolved);
        assert_eq!(businesses[1].enrichment_status, EnrichmentStatus::Unresolved);
        assert_eq!(agg.totals.with_email, 1);
        assert_eq!(agg.totals.unresolved, 1);
    }

    #[test]
    fn businesses_group_by_source_unit() {
        let mut businesses = vec![
            business("p1").unit("78704").build(),
            business("p2").unit("78745").build(),
            business("p3").unit("78704").build(),
        ];
        let mut stats = EnrichmentStats::default();
        let agg = aggregate(&mut businesses, &mut stats);

        assert_eq!(agg.by_unit.len(), 2);
        assert_eq!(agg.by_unit["78704"], vec![0, 2]);
        assert_eq!(agg.by_unit["78745"], vec![1]);
    }

    #[test]
    fn resolved_email_always_has_resolved_source() {
        let mut businesses = vec![
            business("p1").email("a@x.com").build(),
            business("p2").build(),
            business("p3").email("c@x.com").build(),
        ];
        let mut stats = EnrichmentStats::default();
        aggregate(&mut businesses, &mut stats);

        for b in &businesses {
            if b.has_email() {
                assert!(b.email_source.is_resolved(), "{} has unresolved source", b.external_id);
            } else {
                assert_eq!(b.email_source, EmailSource::Unresolved);
            }
        }
    }
}
