//! Campaign run log — a bounded, per-execution timeline of pipeline
//! actions. Owned by the execution that produced it, never shared process
//! state; persisted through the store seam when the campaign finishes.

use std::collections::VecDeque;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Cap on retained events. Oldest events drop first once the bound is hit.
pub const MAX_EVENTS: usize = 1000;

pub struct RunLog {
    pub campaign_id: Uuid,
    pub started_at: DateTime<Utc>,
    events: VecDeque<RunEvent>,
    seq: u32,
    dropped: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunEvent {
    pub seq: u32,
    pub ts: DateTime<Utc>,
    #[serde(flatten)]
    pub kind: EventKind,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum EventKind {
    Planning {
        units: u32,
        fallback: bool,
    },
    PrimaryScrape {
        queries: u32,
        records: u32,
        ingested: u32,
        duplicates: u32,
        dropped: u32,
    },
    Categorized {
        with_email: u32,
        with_social: u32,
        without_social: u32,
    },
    /// N candidate businesses collapsed to M unique social pages.
    PageDedup {
        businesses: u32,
        unique_pages: u32,
    },
    PageEnriched {
        url: String,
        businesses: u32,
        email_found: bool,
    },
    /// A job result URL that matched no grouped page, even via the
    /// alternate URL field.
    PageUnmatched {
        url: String,
    },
    DiscoverySearch {
        queries: u32,
    },
    DiscoveryMatched {
        pages_found: u32,
    },
    StageWarning {
        stage: String,
        message: String,
    },
    Persisted {
        units: u32,
        businesses: u32,
        provenance: u32,
    },
    CostCheckpoint {
        records_fetched: u32,
        social_pages_fetched: u32,
        estimated_cost: f64,
    },
}

impl RunLog {
    pub fn new(campaign_id: Uuid) -> Self {
        Self {
            campaign_id,
            started_at: Utc::now(),
            events: VecDeque::new(),
            seq: 0,
            dropped: 0,
        }
    }

    pub fn log(&mut self, kind: EventKind) {
        if self.events.len() == MAX_EVENTS {
            self.events.pop_front();
            self.dropped += 1;
        }
        self.events.push_back(RunEvent {
            seq: self.seq,
            ts: Utc::now(),
            kind,
        });
        self.seq += 1;
    }

    pub fn events(&self) -> impl Iterator<Item = &RunEvent> {
        self.events.iter()
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    /// Events evicted past the retention bound.
    pub fn dropped(&self) -> u32 {
        self.dropped
    }

    pub fn to_json(&self) -> serde_json::Result<serde_json::Value> {
        serde_json::to_value(self.events.iter().collect::<Vec<_>>())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn events_are_sequenced() {
        let mut log = RunLog::new(Uuid::new_v4());
        log.log(EventKind::Planning {
            units: 3,
            fallback: false,
        });
        log.log(EventKind::DiscoverySearch { queries: 5 });

        let seqs: Vec<u32> = log.events().map(|e| e.seq).collect();
        assert_eq!(seqs, vec![0, 1]);
    }

    #[test]
    fn log_is_bounded_and_drops_oldest() {
        let mut log = RunLog::new(Uuid::new_v4());
        for i in 0..(MAX_EVENTS as u32 + 10) {
            log.log(EventKind::DiscoverySearch { queries: i });
        }

        assert_eq!(log.len(), MAX_EVENTS);
        assert_eq!(log.dropped(), 10);
        assert_eq!(log.events().next().unwrap().seq, 10, "oldest dropped first");
    }

    #[test]
    fn serializes_with_event_type_tag() {
        let mut log = RunLog::new(Uuid::new_v4());
        log.log(EventKind::PageDedup {
            businesses: 4,
            unique_pages: 1,
        });
        let json = log.to_json().unwrap();
        assert_eq!(json[0]["type"], "page_dedup");
        assert_eq!(json[0]["unique_pages"], 1);
    }
}
