//! The `Journal` facade: the only surface the view layer calls
//!
//! Pure async operations over the repositories; no rendering, no dispatch.
//! The view layer (CLI, GUI, whatever drives the journal) is expected to
//! await each call before issuing the next.

use crate::config::JournalConfig;
use crate::error::{JournalError, Result};
use crate::repo::{BranchRepository, SeedRepository};
use crate::rollover::{Clock, Rollover, RolloverController, SystemClock};
use crate::search::{self, SearchHit};
use crate::snapshot::{self, Snapshot};
use crate::storage::{libsql::LibsqlStore, JournalStore};
use crate::types::{Branch, BranchId, Seed, SeedId};
use chrono::NaiveDate;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;

/// Journaling core: seeds, branches, rollover, search, snapshots
pub struct Journal {
    store: Arc<dyn JournalStore>,
    seeds: SeedRepository,
    branches: BranchRepository,
    rollover: RolloverController,
    clock: Arc<dyn Clock>,
    config: JournalConfig,
}

impl Journal {
    /// Open the journal at the configured database path
    pub async fn open(config: JournalConfig) -> Result<Self> {
        let store = Arc::new(LibsqlStore::connect(&config.db_path).await?);
        Ok(Self::with_store(store, Arc::new(SystemClock), config))
    }

    /// Assemble a journal over an explicit store and clock (tests inject a
    /// fixed clock here)
    pub fn with_store(
        store: Arc<dyn JournalStore>,
        clock: Arc<dyn Clock>,
        config: JournalConfig,
    ) -> Self {
        Self {
            seeds: SeedRepository::new(store.clone()),
            branches: BranchRepository::new(store.clone()),
            rollover: RolloverController::new(store.clone(), clock.clone()),
            store,
            clock,
            config,
        }
    }

    /// Submit a thought. With `reuse` set this is a recall (carryover or
    /// search pick): the existing seed's count and appearance list advance
    /// and `Ok(Some)` returns it; a missing reuse id is a silent no-op
    /// returning `Ok(None)`. Without `reuse` a fresh seed is created.
    /// Empty text (after trim) is rejected before any write.
    pub async fn add_or_recall_seed(
        &self,
        text: &str,
        continued: bool,
        reuse: Option<&SeedId>,
    ) -> Result<Option<Seed>> {
        let text = text.trim();
        if text.is_empty() {
            return Err(JournalError::Validation("seed text is empty".to_string()));
        }
        let today = self.clock.today();
        match reuse {
            Some(id) => self.seeds.recall(id, continued, today).await,
            None => {
                let mut seed = Seed::new(text, today);
                seed.continued = continued;
                self.seeds.save(&seed).await?;
                Ok(Some(seed))
            }
        }
    }

    /// Replace a seed's text. Missing ids are a silent no-op; empty text is
    /// rejected.
    pub async fn edit_seed_text(&self, id: &SeedId, text: &str) -> Result<()> {
        let text = text.trim();
        if text.is_empty() {
            return Err(JournalError::Validation("seed text is empty".to_string()));
        }
        let Some(mut seed) = self.seeds.get(id).await? else {
            return Ok(());
        };
        seed.text = text.to_string();
        self.seeds.save(&seed).await
    }

    /// Delete a seed (the only destructor), cascading branch membership
    pub async fn delete_seed(&self, id: &SeedId) -> Result<()> {
        self.seeds.delete(id).await
    }

    /// Append a comment to a seed
    pub async fn add_comment(&self, id: &SeedId, text: &str) -> Result<()> {
        self.seeds.add_comment(id, text).await
    }

    /// Remove the comment at `index` (bounds-checked)
    pub async fn delete_comment(&self, id: &SeedId, index: usize) -> Result<()> {
        self.seeds.remove_comment(id, index).await
    }

    /// Case-insensitive substring search over every seed, top 5 by recency
    pub async fn search(&self, query: &str) -> Result<Vec<SearchHit>> {
        let seeds = self.seeds.list_all().await?;
        Ok(search::rank(&seeds, query))
    }

    /// One rollover check against the injected clock (see
    /// [`RolloverController::check`])
    pub async fn check_rollover(&self) -> Result<Rollover> {
        self.rollover.check().await
    }

    /// Spawn the periodic rollover watcher; transitions arrive on the
    /// returned channel. The watcher stops when the receiver is dropped.
    pub fn spawn_rollover_watcher(&self) -> mpsc::Receiver<Rollover> {
        let (tx, rx) = mpsc::channel(4);
        let period = Duration::from_secs(self.config.rollover_check_secs);
        tokio::spawn(self.rollover.clone().watch(period, tx));
        rx
    }

    /// Confirm a carryover selection: each id is recalled onto today with
    /// `continued = true`. Ids that vanished since the candidates were shown
    /// are skipped. Returns the seeds actually carried over.
    pub async fn confirm_carryover(&self, selected: &[SeedId]) -> Result<Vec<Seed>> {
        let today = self.clock.today();
        let mut carried = Vec::new();
        for id in selected {
            if let Some(seed) = self.seeds.recall(id, true, today).await? {
                carried.push(seed);
            }
        }
        Ok(carried)
    }

    /// Create a branch over the given seeds (see
    /// [`BranchRepository::create_branch`])
    pub async fn create_branch(&self, name: &str, seed_ids: &[SeedId]) -> Result<Branch> {
        self.branches.create_branch(name, seed_ids).await
    }

    /// Unlink a seed from a branch, both directions
    pub async fn remove_seed_from_branch(
        &self,
        branch_id: &BranchId,
        seed_id: &SeedId,
    ) -> Result<()> {
        self.branches
            .remove_seed_from_branch(branch_id, seed_id)
            .await
    }

    /// Full snapshot of both stores
    pub async fn export_snapshot(&self) -> Result<Snapshot> {
        snapshot::export(self.store.as_ref()).await
    }

    /// Parse and upsert a snapshot document. Parse failures apply nothing;
    /// a storage failure mid-import leaves earlier upserts committed.
    pub async fn import_snapshot(&self, raw: &str) -> Result<()> {
        let snapshot = Snapshot::from_json(raw)?;
        snapshot::import(self.store.as_ref(), &snapshot).await
    }

    /// Seeds shown on `day` (today when `None`)
    pub async fn list_day(&self, day: Option<NaiveDate>) -> Result<Vec<Seed>> {
        let day = day.unwrap_or_else(|| self.clock.today());
        self.seeds.list_by_day(day).await
    }

    /// Every branch
    pub async fn list_branches(&self) -> Result<Vec<Branch>> {
        self.branches.list_all().await
    }

    /// Fetch one seed (read-only helper for the view layer)
    pub async fn get_seed(&self, id: &SeedId) -> Result<Option<Seed>> {
        self.seeds.get(id).await
    }

    /// Fetch one branch
    pub async fn get_branch(&self, id: &BranchId) -> Result<Option<Branch>> {
        self.branches.get(id).await
    }

    /// Day-grouped feed for the history view, newest day first
    pub async fn history(&self) -> Result<Vec<(NaiveDate, Vec<Seed>)>> {
        self.seeds.history().await
    }
}
