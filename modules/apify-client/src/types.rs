use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Input for the Google Maps with Contact Details actor.
/// One search string per (keyword × area) pair; the actor fans out
/// internally and tags each result with the search that found it.
#[derive(Debug, Clone, Serialize)]
pub struct MapsContactsInput {
    #[serde(rename = "searchStringsArray")]
    pub search_strings_array: Vec<String>,
    #[serde(rename = "maxCrawledPlacesPerSearch")]
    pub max_crawled_places_per_search: u32,
    pub language: String,
    #[serde(rename = "exportPlaceUrls")]
    pub export_place_urls: bool,
    #[serde(rename = "skipClosedPlaces")]
    pub skip_closed_places: bool,
    #[serde(rename = "scrapeDirectEmails")]
    pub scrape_direct_emails: bool,
    #[serde(rename = "scrapeWebsiteEmails")]
    pub scrape_website_emails: bool,
}

impl MapsContactsInput {
    pub fn new(search_strings: Vec<String>, max_per_search: u32) -> Self {
        Self {
            search_strings_array: search_strings,
            max_crawled_places_per_search: max_per_search,
            language: "en".to_string(),
            export_place_urls: false,
            skip_closed_places: true,
            scrape_direct_emails: true,
            scrape_website_emails: true,
        }
    }
}

/// A start URL entry for actors that take URL lists.
#[derive(Debug, Clone, Serialize)]
pub struct StartUrl {
    pub url: String,
}

/// Input for the Facebook Pages actor. One entry per unique page URL —
/// callers deduplicate before building this.
#[derive(Debug, Clone, Serialize)]
pub struct FacebookPagesInput {
    #[serde(rename = "startUrls")]
    pub start_urls: Vec<StartUrl>,
    #[serde(rename = "maxPagesToScrap")]
    pub max_pages_to_scrap: u32,
    #[serde(rename = "scrapeAbout")]
    pub scrape_about: bool,
    #[serde(rename = "scrapeReviews")]
    pub scrape_reviews: bool,
    #[serde(rename = "scrapePosts")]
    pub scrape_posts: bool,
    #[serde(rename = "scrapeServices")]
    pub scrape_services: bool,
    #[serde(rename = "scrapeAdditionalInfo")]
    pub scrape_additional_info: bool,
    #[serde(rename = "scrapeDirectEmails")]
    pub scrape_direct_emails: bool,
    #[serde(rename = "scrapeWebsiteEmails")]
    pub scrape_website_emails: bool,
}

impl FacebookPagesInput {
    pub fn new(urls: Vec<String>) -> Self {
        Self {
            start_urls: urls.into_iter().map(|url| StartUrl { url }).collect(),
            max_pages_to_scrap: 1,
            scrape_about: true,
            scrape_reviews: false,
            scrape_posts: false,
            scrape_services: true,
            scrape_additional_info: true,
            scrape_direct_emails: true,
            scrape_website_emails: true,
        }
    }
}

/// Input for the Google Search Results actor. Queries are submitted as one
/// newline-joined batch; each result echoes its originating query.
#[derive(Debug, Clone, Serialize)]
pub struct GoogleSearchInput {
    pub queries: String,
    #[serde(rename = "maxPagesPerQuery")]
    pub max_pages_per_query: u32,
    #[serde(rename = "resultsPerPage")]
    pub results_per_page: u32,
    #[serde(rename = "languageCode")]
    pub language_code: String,
    #[serde(rename = "mobileResults")]
    pub mobile_results: bool,
}

impl GoogleSearchInput {
    pub fn new(queries: &[String]) -> Self {
        Self {
            queries: queries.join("\n"),
            max_pages_per_query: 1,
            results_per_page: 5,
            language_code: "en".to_string(),
            mobile_results: false,
        }
    }
}

/// Wrapper for Apify API responses.
#[derive(Debug, Clone, Deserialize)]
pub struct ApiResponse<T> {
    pub data: T,
}

/// Apify actor run metadata.
#[derive(Debug, Clone, Deserialize)]
pub struct RunData {
    pub id: String,
    pub status: String,
    #[serde(rename = "defaultDatasetId")]
    pub default_dataset_id: String,
    #[serde(rename = "startedAt")]
    pub started_at: Option<DateTime<Utc>>,
    #[serde(rename = "finishedAt")]
    pub finished_at: Option<DateTime<Utc>>,
}

impl RunData {
    pub fn is_succeeded(&self) -> bool {
        self.status == "SUCCEEDED"
    }

    pub fn is_terminal_failure(&self) -> bool {
        matches!(self.status.as_str(), "FAILED" | "ABORTED" | "TIMED-OUT")
    }
}
