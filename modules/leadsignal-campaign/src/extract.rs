//! Defensive field extraction from free-form scrape records.
//!
//! Actor output schemas drift, so every concept is read through one ordered
//! chain of extractor functions: first non-empty hit wins. The chains are
//! shared between normalization and both enrichment stages — there is
//! exactly one place that knows which fallback keys exist for a concept.

use serde_json::Value;

/// One attempt at pulling a field out of a raw record.
pub type FieldExtractor = fn(&Value) -> Option<String>;

/// The social network used as the fallback contact-discovery source.
pub const SOCIAL_DOMAIN: &str = "facebook.com";

/// Search hits under this path segment are directory listings, not
/// business pages.
pub const DIRECTORY_PATH_SEGMENT: &str = "/directory/";

/// Run an extractor chain; first non-empty result wins.
pub fn first_match(record: &Value, chain: &[FieldExtractor]) -> Option<String> {
    chain.iter().find_map(|extract| extract(record))
}

fn non_blank(s: &str) -> Option<String> {
    let trimmed = s.trim();
    (!trimmed.is_empty()).then(|| trimmed.to_string())
}

fn str_field(record: &Value, key: &str) -> Option<String> {
    record.get(key)?.as_str().and_then(non_blank)
}

// --- Business email (primary scrape records) ---

fn email_field(record: &Value) -> Option<String> {
    str_field(record, "email")
}

fn emails_array_first_non_blank(record: &Value) -> Option<String> {
    record
        .get("emails")?
        .as_array()?
        .iter()
        .filter_map(|e| e.as_str())
        .find_map(non_blank)
}

fn direct_email_field(record: &Value) -> Option<String> {
    str_field(record, "directEmail")
}

/// Email fallback chain for primary-scrape place records.
pub const BUSINESS_EMAIL: &[FieldExtractor] = &[
    email_field,
    emails_array_first_non_blank,
    direct_email_field,
];

// --- Business social URL (primary scrape records) ---

fn facebooks_array_first(record: &Value) -> Option<String> {
    record
        .get("facebooks")?
        .as_array()?
        .first()?
        .as_str()
        .and_then(non_blank)
}

fn facebook_url_field(record: &Value) -> Option<String> {
    str_field(record, "facebookUrl")
}

fn facebook_field(record: &Value) -> Option<String> {
    str_field(record, "facebook")
}

/// Social URL fallback chain: array field first, then legacy singular fields.
pub const BUSINESS_SOCIAL_URL: &[FieldExtractor] = &[
    facebooks_array_first,
    facebook_url_field,
    facebook_field,
];

// --- Page email (social page scrape results) ---

fn emails_array_first(record: &Value) -> Option<String> {
    record
        .get("emails")?
        .as_array()?
        .first()?
        .as_str()
        .and_then(non_blank)
}

fn contact_email_field(record: &Value) -> Option<String> {
    str_field(record, "contact_email")
}

fn business_email_field(record: &Value) -> Option<String> {
    str_field(record, "businessEmail")
}

fn info_email_field(record: &Value) -> Option<String> {
    record
        .get("info")?
        .get("email")?
        .as_str()
        .and_then(non_blank)
}

/// Email fallback chain for social-page scrape results.
pub const PAGE_EMAIL: &[FieldExtractor] = &[
    email_field,
    emails_array_first,
    contact_email_field,
    business_email_field,
    info_email_field,
];

// --- Page URL (social page scrape results) ---

fn url_field(record: &Value) -> Option<String> {
    str_field(record, "url")
}

fn page_url_field(record: &Value) -> Option<String> {
    str_field(record, "pageUrl")
}

/// Which URL a social-page result is for. `facebookUrl` doubles as the
/// alternate match key when the primary `url` misses the group map.
pub const PAGE_URL: &[FieldExtractor] = &[url_field, facebook_url_field, page_url_field];

// --- Social URL normalization ---

/// Canonical form of a social page URL, used both as the dedup grouping key
/// and to match job-result URLs back to their group. Deterministic and
/// idempotent: `normalize_social_url(normalize_social_url(u)) ==
/// normalize_social_url(u)`.
pub fn normalize_social_url(url: &str) -> String {
    let mut u = url.trim().to_ascii_lowercase();
    if let Some(i) = u.find(['?', '#']) {
        u.truncate(i);
    }
    while u.ends_with('/') {
        u.pop();
    }
    if !u.starts_with("http://") && !u.starts_with("https://") {
        u = format!("https://{u}");
    }
    u
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn normalize_strips_query_and_trailing_slash() {
        assert_eq!(
            normalize_social_url("https://facebook.com/joes-plumbing/?ref=page_internal"),
            "https://facebook.com/joes-plumbing"
        );
    }

    #[test]
    fn normalize_adds_scheme() {
        assert_eq!(
            normalize_social_url("facebook.com/joes-plumbing"),
            "https://facebook.com/joes-plumbing"
        );
    }

    #[test]
    fn normalize_lowercases() {
        assert_eq!(
            normalize_social_url("https://Facebook.com/Joes-Plumbing"),
            "https://facebook.com/joes-plumbing"
        );
    }

    #[test]
    fn normalize_is_idempotent() {
        let inputs = [
            "https://facebook.com/a/?x=1",
            "Facebook.com/B/",
            "http://facebook.com/c#about",
            "  https://facebook.com/d//  ",
        ];
        for raw in inputs {
            let once = normalize_social_url(raw);
            assert_eq!(normalize_social_url(&once), once, "not idempotent for {raw}");
        }
    }

    #[test]
    fn business_email_prefers_direct_field() {
        let record = json!({"email": "a@x.com", "emails": ["b@x.com"]});
        assert_eq!(first_match(&record, BUSINESS_EMAIL), Some("a@x.com".into()));
    }

    #[test]
    fn business_email_skips_blank_entries_in_list() {
        let record = json!({"email": "  ", "emails": ["", "  ", "real@x.com"]});
        assert_eq!(first_match(&record, BUSINESS_EMAIL), Some("real@x.com".into()));
    }

    #[test]
    fn business_email_falls_back_to_direct_email() {
        let record = json!({"emails": [], "directEmail": "d@x.com"});
        assert_eq!(first_match(&record, BUSINESS_EMAIL), Some("d@x.com".into()));
    }

    #[test]
    fn business_email_absent() {
        let record = json!({"name": "No Contact LLC"});
        assert_eq!(first_match(&record, BUSINESS_EMAIL), None);
    }

    #[test]
    fn social_url_prefers_array_field() {
        let record = json!({
            "facebooks": ["https://facebook.com/first"],
            "facebookUrl": "https://facebook.com/legacy"
        });
        assert_eq!(
            first_match(&record, BUSINESS_SOCIAL_URL),
            Some("https://facebook.com/first".into())
        );
    }

    #[test]
    fn social_url_legacy_fields() {
        let record = json!({"facebook": "https://facebook.com/oldest"});
        assert_eq!(
            first_match(&record, BUSINESS_SOCIAL_URL),
            Some("https://facebook.com/oldest".into())
        );
    }

    #[test]
    fn page_email_checks_nested_info_object_last() {
        let record = json!({"info": {"email": "nested@x.com"}});
        assert_eq!(first_match(&record, PAGE_EMAIL), Some("nested@x.com".into()));

        let record = json!({"contact_email": "c@x.com", "info": {"email": "nested@x.com"}});
        assert_eq!(first_match(&record, PAGE_EMAIL), Some("c@x.com".into()));
    }

    #[test]
    fn page_url_fallback_order() {
        let record = json!({"pageUrl": "https://facebook.com/p"});
        assert_eq!(first_match(&record, PAGE_URL), Some("https://facebook.com/p".into()));

        let record = json!({"url": "https://facebook.com/u", "pageUrl": "https://facebook.com/p"});
        assert_eq!(first_match(&record, PAGE_URL), Some("https://facebook.com/u".into()));
    }
}
