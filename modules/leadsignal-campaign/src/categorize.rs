//! EnrichmentCategorizer — one-pass partition of ingested businesses by
//! available signal.

use leadsignal_common::{Business, EnrichmentStatus};

/// Index buckets into the campaign's business collection. Exhaustive and
/// disjoint: every business lands in exactly one bucket.
#[derive(Debug, Default, PartialEq)]
pub struct Categorized {
    /// Already has an email. Permanently excluded from enrichment — never
    /// pay to re-enrich a business that is already resolved.
    pub with_email: Vec<usize>,
    /// No email but a social page reference to follow.
    pub no_email_with_social: Vec<usize>,
    /// No email and no social page; needs discovery first.
    pub no_email_no_social: Vec<usize>,
}

pub fn categorize(businesses: &mut [Business]) -> Categorized {
    let mut buckets = Categorized::default();

    for (i, business) in businesses.iter_mut().enumerate() {
        if business.has_email() {
            business.enrichment_status = EnrichmentStatus::NotNeeded;
            buckets.with_email.push(i);
        } else if business
            .social_url
            .as_deref()
            .is_some_and(|u| !u.trim().is_empty())
        {
            buckets.no_email_with_social.push(i);
        } else {
            buckets.no_email_no_social.push(i);
        }
    }

    buckets
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::business;

    #[test]
    fn partition_is_exhaustive_and_disjoint() {
        let mut businesses = vec![
            business("p1").email("a@x.com").build(),
            business("p2").social("https://facebook.com/p2").build(),
            business("p3").build(),
            business("p4")
                .email("b@x.com")
                .social("https://facebook.com/p4")
                .build(),
        ];

        let cat = categorize(&mut businesses);

        let mut all: Vec<usize> = cat
            .with_email
            .iter()
            .chain(&cat.no_email_with_social)
            .chain(&cat.no_email_no_social)
            .copied()
            .collect();
        all.sort_unstable();
        assert_eq!(all, vec![0, 1, 2, 3], "every index in exactly one bucket");

        assert_eq!(cat.with_email, vec![0, 3]);
        assert_eq!(cat.no_email_with_social, vec![1]);
        assert_eq!(cat.no_email_no_social, vec![2]);
    }

    #[test]
    fn with_email_is_marked_not_needed() {
        let mut businesses = vec![business("p1").email("a@x.com").build()];
        categorize(&mut businesses);
        assert_eq!(businesses[0].enrichment_status, EnrichmentStatus::NotNeeded);
    }

    #[test]
    fn blank_email_and_blank_social_count_as_absent() {
        let mut businesses = vec![business("p1").email("   ").social("  ").build()];
        let cat = categorize(&mut businesses);
        assert_eq!(cat.no_email_no_social, vec![0]);
        assert!(cat.with_email.is_empty());
        assert!(cat.no_email_with_social.is_empty());
    }
}
