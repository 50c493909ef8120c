//! Branch repository: named groupings of seeds
//!
//! Maintains the bidirectional membership invariant: a seed's `branch_id`
//! points at a branch whose member list contains the seed. The composite
//! operations here write multiple records without a wrapping transaction
//! (matching the storage contract); a failure after the first commit surfaces
//! as `PartialConsistency` and is repaired by the startup reconciliation pass.

use crate::error::{JournalError, Result};
use crate::storage::JournalStore;
use crate::types::{Branch, BranchId, SeedId};
use std::sync::Arc;
use tracing::{debug, info};

/// CRUD and membership bookkeeping over the branch store
#[derive(Clone)]
pub struct BranchRepository {
    store: Arc<dyn JournalStore>,
}

impl BranchRepository {
    pub fn new(store: Arc<dyn JournalStore>) -> Self {
        Self { store }
    }

    /// Fetch a branch by id
    pub async fn get(&self, id: &BranchId) -> Result<Option<Branch>> {
        self.store.branch(id).await
    }

    /// Full table scan
    pub async fn list_all(&self) -> Result<Vec<Branch>> {
        self.store.all_branches().await
    }

    /// Insert or replace a branch
    pub async fn save(&self, branch: &Branch) -> Result<()> {
        self.store.put_branch(branch).await
    }

    /// Create a branch over the given seeds and link every member back to it.
    ///
    /// Validation happens before any write. Duplicate ids collapse to one
    /// membership. The branch record is persisted first, then each seed is
    /// linked one by one; ids with no matching seed are skipped. A storage
    /// failure in the linking loop leaves the earlier links committed.
    pub async fn create_branch(&self, name: &str, seed_ids: &[SeedId]) -> Result<Branch> {
        let name = name.trim();
        if name.is_empty() {
            return Err(JournalError::Validation("branch name is empty".to_string()));
        }
        if seed_ids.is_empty() {
            return Err(JournalError::Validation(
                "a branch needs at least one seed".to_string(),
            ));
        }

        let branch = Branch::new(name, seed_ids.to_vec());
        self.store.put_branch(&branch).await?;

        for (linked, seed_id) in branch.seed_ids.iter().enumerate() {
            let seed = match self.store.seed(seed_id).await {
                Ok(seed) => seed,
                Err(e) => return Err(self.partial_create(&branch.id, linked, e)),
            };
            let Some(mut seed) = seed else {
                debug!(seed = %seed_id, "branch member does not exist; skipping link");
                continue;
            };
            seed.branch_id = Some(branch.id.clone());
            if let Err(e) = self.store.put_seed(&seed).await {
                return Err(self.partial_create(&branch.id, linked, e));
            }
        }

        info!(branch = %branch.id, members = branch.seed_ids.len(), "branch created");
        Ok(branch)
    }

    /// Remove a seed from a branch and clear its back-reference.
    ///
    /// Lenient on missing records; re-running after success is a safe no-op.
    pub async fn remove_seed_from_branch(
        &self,
        branch_id: &BranchId,
        seed_id: &SeedId,
    ) -> Result<()> {
        let Some(mut branch) = self.store.branch(branch_id).await? else {
            return Ok(());
        };
        let changed = branch.remove_member(seed_id);
        if changed {
            self.store.put_branch(&branch).await?;
        }

        let seed = self.store.seed(seed_id).await.map_err(|e| {
            if changed {
                JournalError::PartialConsistency(format!(
                    "branch {branch_id} no longer lists {seed_id} but the seed could not be read back: {e}"
                ))
            } else {
                e
            }
        })?;
        let Some(mut seed) = seed else {
            return Ok(());
        };
        if seed.branch_id.as_ref() == Some(branch_id) {
            seed.branch_id = None;
            self.store.put_seed(&seed).await.map_err(|e| {
                if changed {
                    JournalError::PartialConsistency(format!(
                        "branch {branch_id} no longer lists {seed_id} but the seed still points at it: {e}"
                    ))
                } else {
                    e
                }
            })?;
        }
        Ok(())
    }

    fn partial_create(
        &self,
        branch_id: &BranchId,
        linked: usize,
        cause: JournalError,
    ) -> JournalError {
        JournalError::PartialConsistency(format!(
            "branch {branch_id} persisted with {linked} member(s) linked before failing: {cause}"
        ))
    }
}
