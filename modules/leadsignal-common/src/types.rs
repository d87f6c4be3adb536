use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

// --- Coverage types ---

/// One geographic subdivision used as one unit of scraping work. Produced
/// once by the coverage planner (or synthesized, see constructors) and
/// never mutated afterwards.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchUnit {
    /// ZIP code, or the raw campaign location for synthesized units.
    pub id: String,
    /// Neighborhood name from the planner, or a synthesized marker.
    pub label: String,
    pub density_score: f64,
    pub relevance_score: f64,
    pub estimated_business_count: u32,
}

impl SearchUnit {
    /// The campaign location is already an exact postal code — no planner
    /// call needed.
    pub fn direct_zip(zip: &str) -> Self {
        Self {
            id: zip.to_string(),
            label: "Direct ZIP".to_string(),
            density_score: 5.0,
            relevance_score: 10.0,
            estimated_business_count: 250,
        }
    }

    /// Degraded fallback when planning is unavailable: search the whole
    /// location as one unit.
    pub fn full_area(location: &str) -> Self {
        Self {
            id: location.to_string(),
            label: "Full Area".to_string(),
            density_score: 5.0,
            relevance_score: 5.0,
            estimated_business_count: 500,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum CoverageProfile {
    Budget,
    #[default]
    Balanced,
    Thorough,
}

impl std::fmt::Display for CoverageProfile {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CoverageProfile::Budget => write!(f, "budget"),
            CoverageProfile::Balanced => write!(f, "balanced"),
            CoverageProfile::Thorough => write!(f, "thorough"),
        }
    }
}

// --- Business / enrichment types ---

/// Which stage supplied a business's email.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum EmailSource {
    /// Not yet determined — pre-aggregation only.
    #[default]
    Unset,
    /// Email came straight off the primary maps scrape.
    PrimaryScrape,
    /// Resolved from a social page the record already referenced.
    SocialDirect,
    /// Resolved from a social page found via text search.
    SocialViaSearch,
    /// All enrichment exhausted without finding an email. Terminal.
    Unresolved,
}

impl EmailSource {
    pub fn is_resolved(&self) -> bool {
        matches!(
            self,
            EmailSource::PrimaryScrape | EmailSource::SocialDirect | EmailSource::SocialViaSearch
        )
    }

    /// Human-readable label for export rows.
    pub fn label(&self) -> &'static str {
        match self {
            EmailSource::PrimaryScrape => "Google Maps",
            EmailSource::SocialDirect => "Facebook",
            EmailSource::SocialViaSearch => "Facebook (via search)",
            EmailSource::Unset | EmailSource::Unresolved => "Not Found",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum EnrichmentStatus {
    #[default]
    Pending,
    /// Already had an email at categorization; never enters enrichment.
    NotNeeded,
    Enriched,
    Unresolved,
}

/// Auxiliary metadata captured from a scraped social page.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SocialPageInfo {
    pub likes: Option<i64>,
    pub phone: Option<String>,
    pub website: Option<String>,
}

/// Canonical business entity. Identity fields are fixed at normalization;
/// only `email`, `email_source`, `social_url`, `enrichment_status` and
/// `social_page` change afterwards.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Business {
    pub external_id: String,
    pub name: String,
    pub address: String,
    pub phone: String,
    pub website: String,
    pub category: String,
    pub rating: f64,
    pub review_count: i64,
    pub city: String,
    pub postal_code: String,
    pub social_url: Option<String>,
    pub email: Option<String>,
    pub email_source: EmailSource,
    pub source_search_unit: String,
    pub source_label: String,
    pub source_query: String,
    pub enrichment_status: EnrichmentStatus,
    pub social_page: Option<SocialPageInfo>,
}

impl Business {
    pub fn has_email(&self) -> bool {
        self.email.as_deref().is_some_and(|e| !e.trim().is_empty())
    }
}

// --- Campaign ---

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum CampaignStatus {
    #[default]
    Draft,
    Running,
    Completed,
    Failed,
}

impl std::fmt::Display for CampaignStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CampaignStatus::Draft => write!(f, "draft"),
            CampaignStatus::Running => write!(f, "running"),
            CampaignStatus::Completed => write!(f, "completed"),
            CampaignStatus::Failed => write!(f, "failed"),
        }
    }
}

impl CampaignStatus {
    /// Completed and Failed are terminal.
    pub fn is_terminal(&self) -> bool {
        matches!(self, CampaignStatus::Completed | CampaignStatus::Failed)
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct CampaignTotals {
    pub businesses_found: u32,
    pub with_email: u32,
    pub primary_scrape: u32,
    pub social_direct: u32,
    pub social_via_search: u32,
    pub unresolved: u32,
    pub social_pages_discovered: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Campaign {
    pub id: Uuid,
    pub name: String,
    pub location: String,
    pub keywords: Vec<String>,
    pub coverage_profile: CoverageProfile,
    pub status: CampaignStatus,
    pub search_units: Vec<SearchUnit>,
    pub totals: CampaignTotals,
    pub estimated_cost: f64,
    pub error: Option<String>,
    pub created_at: DateTime<Utc>,
    pub started_at: Option<DateTime<Utc>>,
    pub completed_at: Option<DateTime<Utc>>,
}

impl Campaign {
    pub fn new(
        name: impl Into<String>,
        location: impl Into<String>,
        keywords: Vec<String>,
        coverage_profile: CoverageProfile,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            name: name.into(),
            location: location.into(),
            keywords,
            coverage_profile,
            status: CampaignStatus::Draft,
            search_units: Vec::new(),
            totals: CampaignTotals::default(),
            estimated_cost: 0.0,
            error: None,
            created_at: Utc::now(),
            started_at: None,
            completed_at: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn resolved_sources_have_labels() {
        assert_eq!(EmailSource::PrimaryScrape.label(), "Google Maps");
        assert_eq!(EmailSource::SocialDirect.label(), "Facebook");
        assert_eq!(EmailSource::SocialViaSearch.label(), "Facebook (via search)");
        assert_eq!(EmailSource::Unresolved.label(), "Not Found");
        assert_eq!(EmailSource::Unset.label(), "Not Found");
    }

    #[test]
    fn only_three_sources_count_as_resolved() {
        assert!(EmailSource::PrimaryScrape.is_resolved());
        assert!(EmailSource::SocialDirect.is_resolved());
        assert!(EmailSource::SocialViaSearch.is_resolved());
        assert!(!EmailSource::Unset.is_resolved());
        assert!(!EmailSource::Unresolved.is_resolved());
    }

    #[test]
    fn new_campaign_starts_in_draft() {
        let c = Campaign::new("test", "Austin, TX", vec!["plumber".into()], CoverageProfile::Balanced);
        assert_eq!(c.status, CampaignStatus::Draft);
        assert!(!c.status.is_terminal());
        assert!(c.started_at.is_none());
    }
}
