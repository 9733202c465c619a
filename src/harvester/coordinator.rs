//! Harvest coordinator - main harvest orchestration logic
//!
//! This module contains the main harvest loop that coordinates all aspects of
//! a run, including:
//! - Opening storage and recording the run
//! - Fetching the index and walking its entry names
//! - Skipping entries already stored, so interrupted runs resume
//! - Fetching, extracting and storing the remaining entries

use crate::config::Config;
use crate::extract::{build_entry, parse_detail, parse_index, ExtractError};
use crate::fetch::{FetchClient, FetchError, ReqwestTransport, Transport};
use crate::identity::{HttpIdentitySource, IdentitySource};
use crate::storage::{RunStatus, SqliteStorage, Storage};
use crate::HarvestError;
use std::fmt;
use std::path::Path;
use std::time::Instant;

/// Counters reported at the end of a run
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct HarvestSummary {
    /// Names read from the index (after the limit is applied)
    pub discovered: usize,

    /// Names skipped because they were stored by an earlier run
    pub already_present: usize,

    /// Entries stored by this run
    pub stored: usize,

    /// Entries whose detail page could not be extracted
    pub skipped: usize,

    /// Entries that could not be fetched or stored
    pub failed: usize,
}

impl fmt::Display for HarvestSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} discovered, {} already present, {} stored, {} skipped, {} failed",
            self.discovered, self.already_present, self.stored, self.skipped, self.failed
        )
    }
}

/// What happened to a single index entry
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntryOutcome {
    AlreadyPresent,
    Stored,
    Skipped,
    Failed,
}

/// Main harvest coordinator structure
pub struct Coordinator<St, S, T> {
    config: Config,
    config_hash: String,
    storage: St,
    client: FetchClient<S, T>,
}

impl Coordinator<SqliteStorage, HttpIdentitySource, ReqwestTransport> {
    /// Creates a coordinator backed by SQLite and the network
    ///
    /// # Arguments
    ///
    /// * `config` - The harvester configuration
    /// * `config_hash` - Hash recorded with each run
    ///
    /// # Returns
    ///
    /// * `Ok(Coordinator)` - Storage opened and fetch client built
    /// * `Err(HarvestError)` - Failed to initialize
    pub fn new(config: Config, config_hash: &str) -> Result<Self, HarvestError> {
        let storage = SqliteStorage::new(Path::new(&config.output.database_path))?;
        let client = FetchClient::from_config(&config)?;
        Ok(Self::with_parts(config, config_hash, storage, client))
    }
}

impl<St, S, T> Coordinator<St, S, T>
where
    St: Storage,
    S: IdentitySource,
    T: Transport,
{
    /// Creates a coordinator from already-built parts
    pub fn with_parts(
        config: Config,
        config_hash: &str,
        storage: St,
        client: FetchClient<S, T>,
    ) -> Self {
        Self {
            config,
            config_hash: config_hash.to_string(),
            storage,
            client,
        }
    }

    pub fn storage(&self) -> &St {
        &self.storage
    }

    pub fn client(&self) -> &FetchClient<S, T> {
        &self.client
    }

    pub fn into_storage(self) -> St {
        self.storage
    }

    /// Runs the harvest loop
    ///
    /// The run is recorded in the ledger and marked completed or failed with
    /// the number of entries stored.
    pub async fn run(&mut self) -> Result<HarvestSummary, HarvestError> {
        self.close_interrupted_run()?;
        let run_id = self.storage.create_run(&self.config_hash)?;
        tracing::info!("Starting harvest run {}", run_id);

        let start_time = Instant::now();
        let mut summary = HarvestSummary::default();
        let result = self.harvest(&mut summary).await;

        let status = match &result {
            Ok(()) => RunStatus::Completed,
            Err(_) => RunStatus::Failed,
        };
        if let Err(e) = self
            .storage
            .finish_run(run_id, status, summary.stored as u64)
        {
            tracing::error!("Failed to record end of run {}: {}", run_id, e);
        }

        match result {
            Ok(()) => {
                tracing::info!(
                    "Harvest completed in {:?}: {}",
                    start_time.elapsed(),
                    summary
                );
                Ok(summary)
            }
            Err(e) => {
                tracing::error!("Harvest run {} halted: {} ({})", run_id, e, summary);
                Err(e)
            }
        }
    }

    /// Marks a run left in the running state by a crashed process
    fn close_interrupted_run(&mut self) -> Result<(), HarvestError> {
        if let Some(latest) = self.storage.get_latest_run()? {
            if latest.status == RunStatus::Running {
                tracing::info!(
                    "Previous run {} did not finish, resuming from stored entries",
                    latest.id
                );
                self.storage
                    .finish_run(latest.id, RunStatus::Interrupted, latest.entries_stored)?;
            }
        }
        Ok(())
    }

    async fn harvest(&mut self, summary: &mut HarvestSummary) -> Result<(), HarvestError> {
        let index_url = self.config.catalog.index_url.clone();
        tracing::info!("Fetching index {}", index_url);
        let index = self.client.fetch(&index_url, true).await?;

        let mut names = parse_index(&index.body)?;
        let limit = self.config.harvest.limit;
        if limit > 0 && names.len() > limit {
            tracing::info!("Limiting harvest to {} of {} entries", limit, names.len());
            names.truncate(limit);
        }
        summary.discovered = names.len();
        tracing::info!("Index lists {} entries", names.len());

        let interval = self.config.harvest.progress_interval.max(1);
        let start_time = Instant::now();

        for (position, name) in names.iter().enumerate() {
            match self.harvest_entry(name).await? {
                EntryOutcome::AlreadyPresent => summary.already_present += 1,
                EntryOutcome::Stored => summary.stored += 1,
                EntryOutcome::Skipped => summary.skipped += 1,
                EntryOutcome::Failed => summary.failed += 1,
            }

            let processed = position + 1;
            if processed % interval == 0 {
                let rate = processed as f64 / start_time.elapsed().as_secs_f64().max(1e-3);
                tracing::info!(
                    "Progress: {}/{} entries processed, {} stored, {:.2} entries/sec",
                    processed,
                    names.len(),
                    summary.stored,
                    rate
                );
            }
        }

        Ok(())
    }

    /// Processes a single index entry
    ///
    /// Per-entry defects (unreachable or malformed detail page, and storage
    /// failures when configured to continue) are reported as an outcome;
    /// everything else halts the run.
    async fn harvest_entry(&mut self, name: &str) -> Result<EntryOutcome, HarvestError> {
        if self.storage.exists(name)? {
            tracing::debug!("'{}' already stored, skipping", name);
            return Ok(EntryOutcome::AlreadyPresent);
        }

        let detail_url = self.config.catalog.detail_url_for(name);
        // Detail pages get a single attempt; only the index is retried
        let page = match self.client.fetch(&detail_url, false).await {
            Ok(page) if page.is_ok() => page,
            Ok(page) => {
                tracing::warn!("Skipping '{}': {} returned HTTP {}", name, detail_url, page.status);
                return Ok(EntryOutcome::Failed);
            }
            Err(e @ FetchError::FetchFailed { .. }) => {
                tracing::warn!("Skipping '{}': {}", name, e);
                return Ok(EntryOutcome::Failed);
            }
            Err(e) => return Err(e.into()),
        };

        let raw = match parse_detail(&page.body) {
            Ok(raw) => raw,
            Err(e @ ExtractError::MalformedDetailPage { .. }) => {
                tracing::warn!("Skipping '{}': {}", name, e);
                return Ok(EntryOutcome::Skipped);
            }
            Err(e) => return Err(e.into()),
        };

        let mut entry = build_entry(name, &raw, &detail_url);
        match self.storage.store(&mut entry) {
            Ok(id) => {
                tracing::debug!(
                    "Stored '{}' as {} with {} dependencies",
                    name,
                    id,
                    entry.dependencies().len()
                );
                Ok(EntryOutcome::Stored)
            }
            Err(e) if self.config.harvest.stop_on_storage_error => Err(e.into()),
            Err(e) => {
                tracing::error!("{}", e);
                Ok(EntryOutcome::Failed)
            }
        }
    }
}
