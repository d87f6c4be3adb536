//! Export rows — one flat record per business for downstream CSV/outreach
//! tooling. Serialization format is the consumer's problem; this module
//! only fixes the shape and the human-readable source labels.

use serde::Serialize;

use leadsignal_common::Business;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ExportRow {
    pub name: String,
    pub address: String,
    pub phone: String,
    pub website: String,
    pub email: String,
    pub social_url: String,
    pub email_source: &'static str,
    pub rating: f64,
    pub review_count: i64,
    pub category: String,
    pub postal_code: String,
    pub source_search_unit: String,
    pub source_label: String,
    pub source_query: String,
}

impl From<&Business> for ExportRow {
    fn from(b: &Business) -> Self {
        Self {
            name: b.name.clone(),
            address: b.address.clone(),
            phone: b.phone.clone(),
            website: b.website.clone(),
            email: b.email.clone().unwrap_or_default(),
            social_url: b.social_url.clone().unwrap_or_default(),
            email_source: b.email_source.label(),
            rating: b.rating,
            review_count: b.review_count,
            category: b.category.clone(),
            postal_code: b.postal_code.clone(),
            source_search_unit: b.source_search_unit.clone(),
            source_label: b.source_label.clone(),
            source_query: b.source_query.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::business;
    use leadsignal_common::EmailSource;

    #[test]
    fn row_carries_provenance_and_label() {
        let mut b = business("p1")
            .email("a@x.com")
            .social("https://facebook.com/p1")
            .unit("78704")
            .build();
        b.email_source = EmailSource::SocialViaSearch;
        b.source_query = "plumber 78704".to_string();

        let row = ExportRow::from(&b);
        assert_eq!(row.email, "a@x.com");
        assert_eq!(row.email_source, "Facebook (via search)");
        assert_eq!(row.source_search_unit, "78704");
        assert_eq!(row.source_query, "plumber 78704");
    }

    #[test]
    fn unresolved_rows_export_empty_email() {
        let mut b = business("p2").build();
        b.email_source = EmailSource::Unresolved;

        let row = ExportRow::from(&b);
        assert_eq!(row.email, "");
        assert_eq!(row.email_source, "Not Found");
    }
}
