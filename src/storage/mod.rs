//! Storage layer for the Seedbed journaling core
//!
//! Provides the record-store abstraction the repositories sit on, and the
//! embedded libSQL backend implementing it. Schema migration from the legacy
//! layouts lives in [`migrate`] and runs inside `connect()`, before any
//! repository call can observe the data.

pub mod libsql;
pub mod migrate;

use crate::error::Result;
use crate::types::{Branch, BranchId, Seed, SeedId};
use async_trait::async_trait;
use chrono::NaiveDate;

/// Meta key holding the persisted schema version
pub const META_SCHEMA_VERSION: &str = "schema_version";

/// Meta key holding the last day the journal was opened (`YYYY-MM-DD`)
pub const META_LAST_OPEN_DAY: &str = "last-open-date";

/// Record-store contract the repositories depend on
///
/// Two stores (seeds, branches) plus a scalar meta table. Every call is
/// atomic on its own: a put is fully visible or not at all, and any failure
/// surfaces as [`crate::JournalError::Storage`] with the operation treated as
/// not having happened. There is no multi-call transaction.
#[async_trait]
pub trait JournalStore: Send + Sync {
    /// Fetch a seed by id
    async fn seed(&self, id: &SeedId) -> Result<Option<Seed>>;

    /// Insert or replace a seed, keyed by id
    async fn put_seed(&self, seed: &Seed) -> Result<()>;

    /// Delete a seed record. Deleting a missing id is not an error.
    async fn delete_seed(&self, id: &SeedId) -> Result<()>;

    /// All seeds whose appearance list contains `day`
    async fn seeds_on(&self, day: NaiveDate) -> Result<Vec<Seed>>;

    /// Full scan of the seed store
    async fn all_seeds(&self) -> Result<Vec<Seed>>;

    /// Fetch a branch by id
    async fn branch(&self, id: &BranchId) -> Result<Option<Branch>>;

    /// Insert or replace a branch, keyed by id
    async fn put_branch(&self, branch: &Branch) -> Result<()>;

    /// Full scan of the branch store
    async fn all_branches(&self) -> Result<Vec<Branch>>;

    /// Read a scalar meta value
    async fn meta(&self, key: &str) -> Result<Option<String>>;

    /// Write a scalar meta value
    async fn set_meta(&self, key: &str, value: &str) -> Result<()>;
}
