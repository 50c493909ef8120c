//! Embedded libSQL backend for the journal stores
//!
//! Seeds and branches live in typed tables; list-valued fields (appearance
//! days, comments, member ids) are stored as JSON text. Upserts are plain
//! `INSERT OR REPLACE`, which is what makes legacy absorption idempotent.

use crate::error::{JournalError, Result};
use crate::storage::{migrate, JournalStore};
use crate::types::{Branch, BranchId, RecordKind, Seed, SeedId};
use async_trait::async_trait;
use chrono::NaiveDate;
use libsql::{params, Builder, Connection};
use std::path::Path;
use tracing::{debug, info, warn};

const DAY_FORMAT: &str = "%Y-%m-%d";

/// libSQL-backed journal store
pub struct LibsqlStore {
    conn: Connection,
}

impl LibsqlStore {
    /// Open (or create) the database at `path` and bring the schema up to
    /// date. Idempotent; safe to call on a database that is already current.
    pub async fn connect(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }
        let db = Builder::new_local(path)
            .build()
            .await
            .map_err(|e| JournalError::Storage(format!("failed to open database: {e}")))?;
        let conn = db
            .connect()
            .map_err(|e| JournalError::Storage(format!("failed to connect: {e}")))?;

        migrate::run(&conn).await?;

        let store = Self { conn };
        store.reconcile().await?;
        info!("journal store ready at {}", path.display());
        Ok(store)
    }

    /// Repair dangling seed↔branch references left by older data or by a
    /// composite operation that failed partway. Runs at every startup.
    async fn reconcile(&self) -> Result<()> {
        let seeds = self.all_seeds().await?;
        let branches = self.all_branches().await?;

        let seed_ids: std::collections::HashSet<&SeedId> = seeds.iter().map(|s| &s.id).collect();

        for branch in &branches {
            let kept: Vec<SeedId> = branch
                .seed_ids
                .iter()
                .filter(|id| seed_ids.contains(id))
                .cloned()
                .collect();
            if kept.len() != branch.seed_ids.len() {
                warn!(
                    branch = %branch.id,
                    dropped = branch.seed_ids.len() - kept.len(),
                    "removing dangling seed references from branch"
                );
                let mut repaired = branch.clone();
                repaired.seed_ids = kept;
                self.put_branch(&repaired).await?;
            }
        }

        for seed in &seeds {
            let Some(branch_id) = &seed.branch_id else {
                continue;
            };
            let linked = branches
                .iter()
                .find(|b| &b.id == branch_id)
                .is_some_and(|b| b.seed_ids.contains(&seed.id));
            if !linked {
                warn!(seed = %seed.id, branch = %branch_id, "clearing dangling branch reference");
                let mut repaired = seed.clone();
                repaired.branch_id = None;
                self.put_seed(&repaired).await?;
            }
        }

        Ok(())
    }
}

/// Write one seed record through an explicit connection. Shared with the
/// migrator, which runs before the store itself exists.
pub(crate) async fn write_seed(conn: &Connection, seed: &Seed) -> Result<()> {
    let appeared_on = serde_json::to_string(&seed.appeared_on)?;
    let comments = serde_json::to_string(&seed.comments)?;
    conn.execute(
        "INSERT OR REPLACE INTO seeds \
         (id, kind, text, continued, call_count, appeared_on, comments, branch_id, tree_id) \
         VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)",
        params![
            seed.id.as_str(),
            seed.kind.as_str(),
            seed.text.as_str(),
            seed.continued as i64,
            seed.call_count as i64,
            appeared_on,
            comments,
            seed.branch_id.as_ref().map(|b| b.as_str().to_string()),
            seed.tree_id.clone(),
        ],
    )
    .await?;
    Ok(())
}

fn row_to_seed(row: &libsql::Row) -> Result<Seed> {
    let id: String = row.get(0)?;
    let kind: String = row.get(1)?;
    let kind = match kind.as_str() {
        "seed" => RecordKind::Seed,
        other => {
            return Err(JournalError::Storage(format!(
                "unknown record kind '{other}' for id {id}"
            )))
        }
    };
    let text: String = row.get(2)?;
    let continued: i64 = row.get(3)?;
    let call_count: i64 = row.get(4)?;

    let appeared_json: String = row.get(5)?;
    let appeared_on: Vec<NaiveDate> = serde_json::from_str(&appeared_json)?;

    let comments_json: String = row.get(6)?;
    let comments: Vec<String> = serde_json::from_str(&comments_json)?;

    let branch_id: Option<String> = row.get(7)?;
    let tree_id: Option<String> = row.get(8)?;

    Ok(Seed {
        id: SeedId::new(id),
        kind,
        text,
        continued: continued != 0,
        call_count: call_count as u32,
        appeared_on,
        comments,
        branch_id: branch_id.map(BranchId::new),
        tree_id,
    })
}

fn row_to_branch(row: &libsql::Row) -> Result<Branch> {
    let id: String = row.get(0)?;
    let name: String = row.get(1)?;

    let seed_ids_json: String = row.get(2)?;
    let seed_ids: Vec<SeedId> = serde_json::from_str(&seed_ids_json)?;

    let created_at: String = row.get(3)?;
    let created_at = chrono::DateTime::parse_from_rfc3339(&created_at)
        .map_err(|e| JournalError::Storage(format!("invalid branch timestamp: {e}")))?
        .with_timezone(&chrono::Utc);

    Ok(Branch {
        id: BranchId::new(id),
        name,
        seed_ids,
        created_at,
    })
}

#[async_trait]
impl JournalStore for LibsqlStore {
    async fn seed(&self, id: &SeedId) -> Result<Option<Seed>> {
        let mut rows = self
            .conn
            .query(
                "SELECT id, kind, text, continued, call_count, appeared_on, comments, branch_id, tree_id \
                 FROM seeds WHERE id = ?",
                params![id.as_str()],
            )
            .await?;
        match rows.next().await? {
            Some(row) => Ok(Some(row_to_seed(&row)?)),
            None => Ok(None),
        }
    }

    async fn put_seed(&self, seed: &Seed) -> Result<()> {
        debug!(seed = %seed.id, "put seed");
        write_seed(&self.conn, seed).await
    }

    async fn delete_seed(&self, id: &SeedId) -> Result<()> {
        debug!(seed = %id, "delete seed");
        self.conn
            .execute("DELETE FROM seeds WHERE id = ?", params![id.as_str()])
            .await?;
        Ok(())
    }

    async fn seeds_on(&self, day: NaiveDate) -> Result<Vec<Seed>> {
        // appeared_on is a JSON array of quoted fixed-width dates, so a LIKE
        // over the quoted form matches exactly one day.
        let pattern = format!("%\"{}\"%", day.format(DAY_FORMAT));
        let mut rows = self
            .conn
            .query(
                "SELECT id, kind, text, continued, call_count, appeared_on, comments, branch_id, tree_id \
                 FROM seeds WHERE appeared_on LIKE ?",
                params![pattern],
            )
            .await?;
        let mut seeds = Vec::new();
        while let Some(row) = rows.next().await? {
            seeds.push(row_to_seed(&row)?);
        }
        Ok(seeds)
    }

    async fn all_seeds(&self) -> Result<Vec<Seed>> {
        let mut rows = self
            .conn
            .query(
                "SELECT id, kind, text, continued, call_count, appeared_on, comments, branch_id, tree_id \
                 FROM seeds",
                params![],
            )
            .await?;
        let mut seeds = Vec::new();
        while let Some(row) = rows.next().await? {
            seeds.push(row_to_seed(&row)?);
        }
        Ok(seeds)
    }

    async fn branch(&self, id: &BranchId) -> Result<Option<Branch>> {
        let mut rows = self
            .conn
            .query(
                "SELECT id, name, seed_ids, created_at FROM branches WHERE id = ?",
                params![id.as_str()],
            )
            .await?;
        match rows.next().await? {
            Some(row) => Ok(Some(row_to_branch(&row)?)),
            None => Ok(None),
        }
    }

    async fn put_branch(&self, branch: &Branch) -> Result<()> {
        debug!(branch = %branch.id, "put branch");
        let seed_ids = serde_json::to_string(&branch.seed_ids)?;
        self.conn
            .execute(
                "INSERT OR REPLACE INTO branches (id, name, seed_ids, created_at) VALUES (?, ?, ?, ?)",
                params![
                    branch.id.as_str(),
                    branch.name.as_str(),
                    seed_ids,
                    branch.created_at.to_rfc3339(),
                ],
            )
            .await?;
        Ok(())
    }

    async fn all_branches(&self) -> Result<Vec<Branch>> {
        let mut rows = self
            .conn
            .query(
                "SELECT id, name, seed_ids, created_at FROM branches",
                params![],
            )
            .await?;
        let mut branches = Vec::new();
        while let Some(row) = rows.next().await? {
            branches.push(row_to_branch(&row)?);
        }
        Ok(branches)
    }

    async fn meta(&self, key: &str) -> Result<Option<String>> {
        let mut rows = self
            .conn
            .query("SELECT value FROM meta WHERE key = ?", params![key])
            .await?;
        match rows.next().await? {
            Some(row) => Ok(Some(row.get::<String>(0)?)),
            None => Ok(None),
        }
    }

    async fn set_meta(&self, key: &str, value: &str) -> Result<()> {
        self.conn
            .execute(
                "INSERT OR REPLACE INTO meta (key, value) VALUES (?, ?)",
                params![key, value],
            )
            .await?;
        Ok(())
    }
}
