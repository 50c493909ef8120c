//! Seed repository: lifecycle and comment management for journal notes
//!
//! Every mutating call writes exactly one seed record through the store; the
//! one exception is `delete`, which also cleans the owning branch so no
//! dangling member id survives.

use crate::error::{JournalError, Result};
use crate::storage::JournalStore;
use crate::types::{Seed, SeedId};
use chrono::NaiveDate;
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::debug;

/// CRUD and recall semantics over the seed store
#[derive(Clone)]
pub struct SeedRepository {
    store: Arc<dyn JournalStore>,
}

impl SeedRepository {
    pub fn new(store: Arc<dyn JournalStore>) -> Self {
        Self { store }
    }

    /// Fetch a seed by id
    pub async fn get(&self, id: &SeedId) -> Result<Option<Seed>> {
        self.store.seed(id).await
    }

    /// Insert or replace a seed
    pub async fn save(&self, seed: &Seed) -> Result<()> {
        self.store.put_seed(seed).await
    }

    /// Delete a seed. Missing ids are a silent no-op.
    ///
    /// Cascade policy: when the seed belongs to a branch, its id is removed
    /// from that branch's member list before the record goes away, so the
    /// membership invariant holds without waiting for reconciliation.
    pub async fn delete(&self, id: &SeedId) -> Result<()> {
        let Some(seed) = self.store.seed(id).await? else {
            return Ok(());
        };
        if let Some(branch_id) = &seed.branch_id {
            if let Some(mut branch) = self.store.branch(branch_id).await? {
                if branch.remove_member(id) {
                    self.store.put_branch(&branch).await.map_err(|e| {
                        JournalError::PartialConsistency(format!(
                            "unlinking seed {id} from branch {branch_id} before delete: {e}"
                        ))
                    })?;
                }
            }
        }
        self.store.delete_seed(id).await
    }

    /// All seeds shown on `day`
    pub async fn list_by_day(&self, day: NaiveDate) -> Result<Vec<Seed>> {
        self.store.seeds_on(day).await
    }

    /// Full table scan
    pub async fn list_all(&self) -> Result<Vec<Seed>> {
        self.store.all_seeds().await
    }

    /// Re-invoke an existing seed: bump its call count, note `day` in its
    /// appearance list (once), set the continued flag, persist. The single
    /// mutation path for carryover and search picks. A missing id is a
    /// silent no-op and returns `None` with the table untouched.
    pub async fn recall(
        &self,
        id: &SeedId,
        continued: bool,
        day: NaiveDate,
    ) -> Result<Option<Seed>> {
        let Some(mut seed) = self.store.seed(id).await? else {
            debug!(seed = %id, "recall on missing seed; ignoring");
            return Ok(None);
        };
        seed.recall_on(day, continued);
        self.store.put_seed(&seed).await?;
        Ok(Some(seed))
    }

    /// Append a comment. No-op when the seed is absent or the text is empty
    /// after trimming.
    pub async fn add_comment(&self, id: &SeedId, text: &str) -> Result<()> {
        let text = text.trim();
        if text.is_empty() {
            return Ok(());
        }
        let Some(mut seed) = self.store.seed(id).await? else {
            return Ok(());
        };
        seed.comments.push(text.to_string());
        self.store.put_seed(&seed).await
    }

    /// Remove the comment at `index`. Out-of-range indices are rejected
    /// before any write.
    pub async fn remove_comment(&self, id: &SeedId, index: usize) -> Result<()> {
        let Some(mut seed) = self.store.seed(id).await? else {
            return Ok(());
        };
        if index >= seed.comments.len() {
            return Err(JournalError::Validation(format!(
                "comment index {index} out of range for seed {id} ({} comments)",
                seed.comments.len()
            )));
        }
        seed.comments.remove(index);
        self.store.put_seed(&seed).await
    }

    /// Every seed grouped under each day it appeared, newest day first.
    /// Feeds the read-only history view.
    pub async fn history(&self) -> Result<Vec<(NaiveDate, Vec<Seed>)>> {
        let mut by_day: BTreeMap<NaiveDate, Vec<Seed>> = BTreeMap::new();
        for seed in self.store.all_seeds().await? {
            for day in &seed.appeared_on {
                by_day.entry(*day).or_default().push(seed.clone());
            }
        }
        Ok(by_day.into_iter().rev().collect())
    }
}
