//! BusinessRecordNormalizer — raw place records into canonical Business
//! entities.
//!
//! `normalize` is a pure function; `ingest` owns the first-seen-wins merge
//! keyed by external id.

use serde_json::Value;
use tracing::debug;

use leadsignal_common::{Business, EmailSource, EnrichmentStatus};

use crate::extract::{first_match, BUSINESS_EMAIL, BUSINESS_SOCIAL_URL};

/// One (keyword × search unit) query submitted to the primary scrape.
/// Result records echo the search string that found them, which is how a
/// business is attributed back to its unit.
#[derive(Debug, Clone, PartialEq)]
pub struct SearchQuery {
    pub query: String,
    pub unit_id: String,
    pub unit_label: String,
}

fn str_or_empty(record: &Value, keys: &[&str]) -> String {
    keys.iter()
        .find_map(|k| record.get(*k).and_then(|v| v.as_str()))
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .unwrap_or_default()
}

/// Resolve which search unit produced this record: exact match on the
/// echoed search string, then the record's own postal code, then the
/// campaign location.
fn resolve_attribution<'a>(
    record: &Value,
    queries: &'a [SearchQuery],
    fallback_location: &str,
) -> (String, String, String) {
    let search_string = str_or_empty(record, &["searchString"]);

    if let Some(matched) = queries.iter().find(|q| q.query == search_string) {
        return (
            matched.unit_id.clone(),
            matched.unit_label.clone(),
            matched.query.clone(),
        );
    }

    let address_zip = str_or_empty(record, &["postalCode", "zipCode"]);
    if !address_zip.is_empty() {
        return (address_zip, "From Address".to_string(), search_string);
    }

    (
        fallback_location.to_string(),
        "Unknown".to_string(),
        search_string,
    )
}

/// Map one raw place record to a Business. Records without a stable
/// external id are dropped (logged, non-fatal).
pub fn normalize(
    record: &Value,
    queries: &[SearchQuery],
    fallback_location: &str,
) -> Option<Business> {
    let external_id = str_or_empty(record, &["placeId", "place_id"]);
    if external_id.is_empty() {
        debug!(
            name = %str_or_empty(record, &["title", "name"]),
            "Dropping record without a stable external id"
        );
        return None;
    }

    let (source_search_unit, source_label, source_query) =
        resolve_attribution(record, queries, fallback_location);

    let email = first_match(record, BUSINESS_EMAIL);
    let email_source = if email.is_some() {
        EmailSource::PrimaryScrape
    } else {
        EmailSource::Unset
    };

    Some(Business {
        external_id,
        name: str_or_empty(record, &["title", "name"]),
        address: str_or_empty(record, &["address"]),
        phone: str_or_empty(record, &["phone", "phoneNumber"]),
        website: str_or_empty(record, &["website", "url"]),
        category: str_or_empty(record, &["category", "categoryName"]),
        rating: record
            .get("rating")
            .or_else(|| record.get("stars"))
            .and_then(|v| v.as_f64())
            .unwrap_or(0.0),
        review_count: record
            .get("reviewsCount")
            .or_else(|| record.get("numberOfReviews"))
            .and_then(|v| v.as_i64())
            .unwrap_or(0),
        city: str_or_empty(record, &["city"]),
        postal_code: str_or_empty(record, &["postalCode", "zipCode"]),
        social_url: first_match(record, BUSINESS_SOCIAL_URL),
        email,
        email_source,
        source_search_unit,
        source_label,
        source_query,
        enrichment_status: EnrichmentStatus::Pending,
        social_page: None,
    })
}

/// Normalize a batch of raw records into `out`, first-seen-wins on
/// external id. Re-ingesting records whose ids are already present is a
/// no-op, so the merge doubles as upsert protection. Returns
/// (ingested, duplicates_skipped, dropped).
pub fn ingest(
    records: &[Value],
    queries: &[SearchQuery],
    fallback_location: &str,
    out: &mut Vec<Business>,
) -> (u32, u32, u32) {
    let mut seen: std::collections::HashSet<String> =
        out.iter().map(|b| b.external_id.clone()).collect();

    let mut ingested = 0u32;
    let mut duplicates = 0u32;
    let mut dropped = 0u32;

    for record in records {
        let Some(business) = normalize(record, queries, fallback_location) else {
            dropped += 1;
            continue;
        };
        if !seen.insert(business.external_id.clone()) {
            duplicates += 1;
            continue;
        }
        out.push(business);
        ingested += 1;
    }

    (ingested, duplicates, dropped)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn queries() -> Vec<SearchQuery> {
        vec![SearchQuery {
            query: "plumber 78704".to_string(),
            unit_id: "78704".to_string(),
            unit_label: "South Austin".to_string(),
        }]
    }

    #[test]
    fn record_without_external_id_is_dropped() {
        let record = json!({"title": "Ghost Business", "email": "x@y.com"});
        assert!(normalize(&record, &queries(), "Austin, TX").is_none());
    }

    #[test]
    fn attribution_via_search_string() {
        let record = json!({"placeId": "p1", "title": "Joe's", "searchString": "plumber 78704"});
        let b = normalize(&record, &queries(), "Austin, TX").unwrap();
        assert_eq!(b.source_search_unit, "78704");
        assert_eq!(b.source_label, "South Austin");
        assert_eq!(b.source_query, "plumber 78704");
    }

    #[test]
    fn attribution_falls_back_to_address_zip_then_location() {
        let record = json!({"placeId": "p2", "searchString": "unknown query", "postalCode": "78745"});
        let b = normalize(&record, &queries(), "Austin, TX").unwrap();
        assert_eq!(b.source_search_unit, "78745");
        assert_eq!(b.source_label, "From Address");

        let record = json!({"placeId": "p3", "searchString": "unknown query"});
        let b = normalize(&record, &queries(), "Austin, TX").unwrap();
        assert_eq!(b.source_search_unit, "Austin, TX");
        assert_eq!(b.source_label, "Unknown");
    }

    #[test]
    fn email_sets_primary_scrape_source() {
        let record = json!({"placeId": "p1", "emails": ["", "hi@joes.com"]});
        let b = normalize(&record, &queries(), "Austin, TX").unwrap();
        assert_eq!(b.email.as_deref(), Some("hi@joes.com"));
        assert_eq!(b.email_source, EmailSource::PrimaryScrape);
    }

    #[test]
    fn no_email_leaves_source_unset() {
        let record = json!({"placeId": "p1", "emails": [""]});
        let b = normalize(&record, &queries(), "Austin, TX").unwrap();
        assert!(b.email.is_none());
        assert_eq!(b.email_source, EmailSource::Unset);
    }

    #[test]
    fn ingest_first_seen_wins() {
        let records = vec![
            json!({"placeId": "p1", "title": "First Name", "email": "first@x.com"}),
            json!({"placeId": "p1", "title": "Second Name", "email": "second@x.com"}),
        ];
        let mut out = Vec::new();
        let (ingested, duplicates, dropped) = ingest(&records, &queries(), "Austin, TX", &mut out);
        assert_eq!((ingested, duplicates, dropped), (1, 1, 0));
        assert_eq!(out[0].name, "First Name");
        assert_eq!(out[0].email.as_deref(), Some("first@x.com"));
    }

    #[test]
    fn reingest_never_duplicates() {
        let records = vec![
            json!({"placeId": "p1", "title": "A"}),
            json!({"placeId": "p2", "title": "B"}),
        ];
        let mut out = Vec::new();
        ingest(&records, &queries(), "Austin, TX", &mut out);
        assert_eq!(out.len(), 2);

        let (ingested, duplicates, _) = ingest(&records, &queries(), "Austin, TX", &mut out);
        assert_eq!(ingested, 0);
        assert_eq!(duplicates, 2);
        assert_eq!(out.len(), 2);
    }
}
