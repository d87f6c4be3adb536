pub mod aggregate;
pub mod categorize;
pub mod enrichment;
pub mod export;
pub mod extract;
pub mod jobs;
pub mod normalize;
pub mod orchestrator;
pub mod run_log;
pub mod stats;
#[cfg(any(test, feature = "test-support"))]
pub mod testing;
pub mod traits;
