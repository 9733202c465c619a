//! Harvest orchestration
//!
//! This module contains the run loop that ties the layers together:
//! - Recording the run in the ledger
//! - Fetching and parsing the index page
//! - Fetching, extracting and storing each entry not yet present
//! - Reporting progress and the final summary

mod coordinator;

pub use coordinator::{Coordinator, EntryOutcome, HarvestSummary};

use crate::config::Config;
use crate::HarvestError;

/// Runs a complete harvest with the production stack
///
/// # Arguments
///
/// * `config` - The harvester configuration
/// * `config_hash` - Hash of the configuration file, recorded in the run ledger
///
/// # Returns
///
/// * `Ok(HarvestSummary)` - Harvest completed
/// * `Err(HarvestError)` - Harvest halted
pub async fn harvest(config: Config, config_hash: &str) -> Result<HarvestSummary, HarvestError> {
    let mut coordinator = Coordinator::new(config, config_hash)?;
    coordinator.run().await
}
