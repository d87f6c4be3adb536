pub mod error;
pub mod types;

pub use error::{ApifyError, Result};
pub use types::{
    FacebookPagesInput, GoogleSearchInput, MapsContactsInput, RunData, StartUrl,
};

use serde::Serialize;
use serde_json::Value;
use types::ApiResponse;

const BASE_URL: &str = "https://api.apify.com/v2";

/// Actor ID for lukaskrivka/google-maps-with-contact-details.
const MAPS_CONTACTS_SCRAPER: &str = "WnMxbsRLNbPeYL6ge";

/// Actor ID for apify/facebook-pages-scraper.
const FACEBOOK_PAGES_SCRAPER: &str = "4Hv5RhChiaDk6iwad";

/// Actor ID for apify/google-search-scraper.
const GOOGLE_SEARCH_SCRAPER: &str = "nFJndFXA5zjCTuudP";

pub struct ApifyClient {
    client: reqwest::Client,
    token: String,
}

impl ApifyClient {
    pub fn new(token: String) -> Self {
        Self {
            client: reqwest::Client::new(),
            token,
        }
    }

    /// Start an actor run. Returns immediately with run metadata.
    pub async fn start_run<I: Serialize>(&self, actor_id: &str, input: &I) -> Result<RunData> {
        let url = format!("{}/acts/{}/runs", BASE_URL, actor_id);
        let resp = self
            .client
            .post(&url)
            .bearer_auth(&self.token)
            .json(input)
            .send()
            .await?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(ApifyError::Api {
                status: status.as_u16(),
                message: body,
            });
        }

        let api_resp: ApiResponse<RunData> = resp.json().await?;
        Ok(api_resp.data)
    }

    /// One status check. Uses `waitForFinish=60` for efficient long-polling.
    pub async fn run_status(&self, run_id: &str) -> Result<RunData> {
        let url = format!("{}/actor-runs/{}?waitForFinish=60", BASE_URL, run_id);
        let resp = self
            .client
            .get(&url)
            .bearer_auth(&self.token)
            .send()
            .await?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(ApifyError::Api {
                status: status.as_u16(),
                message: body,
            });
        }

        let api_resp: ApiResponse<RunData> = resp.json().await?;
        Ok(api_resp.data)
    }

    /// Fetch dataset items from a completed run. Records come back as
    /// free-form JSON — actor output schemas drift, so callers access
    /// fields defensively.
    pub async fn get_dataset_items(&self, dataset_id: &str) -> Result<Vec<Value>> {
        let url = format!("{}/datasets/{}/items?format=json", BASE_URL, dataset_id);
        let resp = self
            .client
            .get(&url)
            .bearer_auth(&self.token)
            .send()
            .await?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(ApifyError::Api {
                status: status.as_u16(),
                message: body,
            });
        }

        let items: Vec<Value> = resp.json().await?;
        Ok(items)
    }

    /// Start a Google Maps contact-details scrape across a batch of search
    /// strings.
    pub async fn start_maps_contacts_scrape(
        &self,
        search_strings: Vec<String>,
        max_per_search: u32,
    ) -> Result<RunData> {
        let input = MapsContactsInput::new(search_strings, max_per_search);
        tracing::info!(
            searches = input.search_strings_array.len(),
            max_per_search,
            "Starting Google Maps contact scrape"
        );
        self.start_run(MAPS_CONTACTS_SCRAPER, &input).await
    }

    /// Start a Facebook pages scrape for a batch of (already deduplicated)
    /// page URLs.
    pub async fn start_facebook_pages_scrape(&self, urls: Vec<String>) -> Result<RunData> {
        let input = FacebookPagesInput::new(urls);
        tracing::info!(pages = input.start_urls.len(), "Starting Facebook pages scrape");
        self.start_run(FACEBOOK_PAGES_SCRAPER, &input).await
    }

    /// Start a Google search batch. One query per line.
    pub async fn start_google_search(&self, queries: &[String]) -> Result<RunData> {
        let input = GoogleSearchInput::new(queries);
        tracing::info!(queries = queries.len(), "Starting Google search batch");
        self.start_run(GOOGLE_SEARCH_SCRAPER, &input).await
    }
}
