use thiserror::Error;

#[derive(Error, Debug)]
pub enum LeadSignalError {
    /// Missing or invalid credential. Raised before any campaign state
    /// transition — a rejected execute leaves the campaign in Draft.
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// The coverage planner returned a distinct failure that must not be
    /// silently defaulted (quota exhausted, no units determined).
    #[error("Planning error: {0}")]
    Planning(String),

    /// A failure inside one enrichment stage. Caught at the stage boundary
    /// and logged; never aborts the campaign.
    #[error("Enrichment stage error ({stage}): {message}")]
    EnrichmentStage { stage: String, message: String },

    /// Store write failure. Logged; computed results are never rolled back.
    #[error("Persistence error: {0}")]
    Persistence(String),

    #[error("Invalid campaign state transition: {0}")]
    InvalidTransition(String),

    #[error(transparent)]
    Anyhow(#[from] anyhow::Error),
}
