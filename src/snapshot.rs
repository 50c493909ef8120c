//! Snapshot export/import: the backup boundary
//!
//! A snapshot is one JSON document `{ "seeds": [...], "branches": [...] }`,
//! always a full dump. Import parses the whole document first (a parse
//! failure applies nothing), then upserts record by record; a storage failure
//! mid-loop leaves the earlier upserts committed. Import is not
//! all-or-nothing.

use crate::error::Result;
use crate::storage::JournalStore;
use crate::types::{Branch, Seed};
use serde::{Deserialize, Serialize};
use tracing::info;

/// Full journal snapshot
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Snapshot {
    #[serde(default)]
    pub seeds: Vec<Seed>,
    #[serde(default)]
    pub branches: Vec<Branch>,
}

impl Snapshot {
    /// Parse a snapshot document. Fields beyond presence are not validated.
    pub fn from_json(raw: &str) -> Result<Self> {
        Ok(serde_json::from_str(raw)?)
    }

    /// Render the document the way the journal has always exported it
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

/// Dump both stores into a snapshot
pub async fn export(store: &dyn JournalStore) -> Result<Snapshot> {
    Ok(Snapshot {
        seeds: store.all_seeds().await?,
        branches: store.all_branches().await?,
    })
}

/// Upsert every record of `snapshot` by id
pub async fn import(store: &dyn JournalStore, snapshot: &Snapshot) -> Result<()> {
    for seed in &snapshot.seeds {
        store.put_seed(seed).await?;
    }
    for branch in &snapshot.branches {
        store.put_branch(branch).await?;
    }
    info!(
        seeds = snapshot.seeds.len(),
        branches = snapshot.branches.len(),
        "snapshot imported"
    );
    Ok(())
}
