//! Schema migration for the journal database
//!
//! Runs once inside `LibsqlStore::connect`, before any repository call.
//! Handles three generations of layout:
//!
//! - version 2 (current): normalized `seeds` / `branches` tables
//! - version 1: one row per day in `thoughts_v1`, each holding a JSON list of
//!   `{id, text, continued}` entries, with comments in a single global map
//! - the flat fallback store `local_fallback`: plain key/value strings keyed
//!   by `memo-<YYYY-MM-DD>` plus one global `comments` blob, from an even
//!   older generation and independent of the version marker
//!
//! Both legacy conversions use the same synthesis rule and write through
//! `INSERT OR REPLACE` keyed by the carried-over ids, so running them twice
//! cannot duplicate seeds.

use crate::error::{JournalError, Result};
use crate::storage::{libsql as store, META_SCHEMA_VERSION};
use crate::types::{RecordKind, Seed, SeedId};
use chrono::NaiveDate;
use libsql::{params, Connection};
use serde::Deserialize;
use std::collections::HashMap;
use tracing::{debug, info, warn};

/// Current schema version
pub const SCHEMA_VERSION: i64 = 2;

/// Key prefix of per-day entries in the fallback store
const FALLBACK_DAY_PREFIX: &str = "memo-";

/// Key of the global comment map in the fallback store
const FALLBACK_COMMENT_KEY: &str = "comments";

const CREATE_CURRENT: &str = r#"
CREATE TABLE IF NOT EXISTS seeds (
    id TEXT PRIMARY KEY NOT NULL,
    kind TEXT NOT NULL DEFAULT 'seed',
    text TEXT NOT NULL,
    continued INTEGER NOT NULL DEFAULT 0,
    call_count INTEGER NOT NULL DEFAULT 1,
    appeared_on TEXT NOT NULL,
    comments TEXT NOT NULL DEFAULT '[]',
    branch_id TEXT,
    tree_id TEXT
);

CREATE TABLE IF NOT EXISTS branches (
    id TEXT PRIMARY KEY NOT NULL,
    name TEXT NOT NULL,
    seed_ids TEXT NOT NULL,
    created_at TEXT NOT NULL
);
"#;

/// One entry of a legacy per-day list
#[derive(Debug, Deserialize)]
struct LegacyEntry {
    id: String,
    text: String,
    #[serde(default)]
    continued: bool,
}

/// Bring the database at `conn` up to the current schema
pub(crate) async fn run(conn: &Connection) -> Result<()> {
    conn.execute_batch(
        "CREATE TABLE IF NOT EXISTS meta (key TEXT PRIMARY KEY NOT NULL, value TEXT NOT NULL);",
    )
    .await?;

    let version = stored_version(conn).await?;
    match version {
        0 => {
            debug!("initializing empty journal schema");
            conn.execute_batch(CREATE_CURRENT).await?;
        }
        1 => {
            info!("migrating v1 per-day layout to normalized seed records");
            conn.execute_batch(CREATE_CURRENT).await?;
            convert_day_lists(conn).await?;
        }
        SCHEMA_VERSION => {}
        other => {
            return Err(JournalError::Storage(format!(
                "unsupported schema version {other} (this build understands up to {SCHEMA_VERSION})"
            )))
        }
    }

    conn.execute(
        "INSERT OR REPLACE INTO meta (key, value) VALUES (?, ?)",
        params![META_SCHEMA_VERSION, SCHEMA_VERSION.to_string()],
    )
    .await?;

    absorb_fallback(conn).await?;
    Ok(())
}

/// Read the persisted schema version. A database without a marker is either
/// brand new (0) or a v1 database written before the marker existed.
async fn stored_version(conn: &Connection) -> Result<i64> {
    let mut rows = conn
        .query(
            "SELECT value FROM meta WHERE key = ?",
            params![META_SCHEMA_VERSION],
        )
        .await?;
    if let Some(row) = rows.next().await? {
        let raw: String = row.get(0)?;
        return raw
            .parse::<i64>()
            .map_err(|_| JournalError::Storage(format!("malformed schema version '{raw}'")));
    }
    if table_exists(conn, "thoughts_v1").await? {
        Ok(1)
    } else {
        Ok(0)
    }
}

/// Convert every `thoughts_v1` day row into normalized seeds, then drop the
/// legacy table.
async fn convert_day_lists(conn: &Connection) -> Result<()> {
    let comments = fallback_comment_map(conn).await?;

    let mut rows = conn
        .query("SELECT day, entries FROM thoughts_v1", params![])
        .await?;
    let mut converted = 0usize;
    while let Some(row) = rows.next().await? {
        let day_raw: String = row.get(0)?;
        let Ok(day) = day_raw.parse::<NaiveDate>() else {
            warn!(day = %day_raw, "skipping v1 row with malformed day");
            continue;
        };
        let entries_raw: String = row.get(1)?;
        let entries: Vec<LegacyEntry> = serde_json::from_str(&entries_raw)?;
        for entry in entries {
            let seed = synthesize_seed(entry, day, &comments);
            store::write_seed(conn, &seed).await?;
            converted += 1;
        }
    }

    conn.execute("DROP TABLE thoughts_v1", params![]).await?;
    info!(converted, "v1 layout converted");
    Ok(())
}

/// Absorb the flat fallback store, when present, then erase its keys.
/// Idempotent: seed ids carry through unchanged and writes are replaces.
async fn absorb_fallback(conn: &Connection) -> Result<()> {
    if !table_exists(conn, "local_fallback").await? {
        return Ok(());
    }

    let comments = fallback_comment_map(conn).await?;

    let mut rows = conn
        .query(
            "SELECT key, value FROM local_fallback WHERE key LIKE ?",
            params![format!("{FALLBACK_DAY_PREFIX}%")],
        )
        .await?;
    let mut day_rows: Vec<(String, String)> = Vec::new();
    while let Some(row) = rows.next().await? {
        day_rows.push((row.get(0)?, row.get(1)?));
    }

    if day_rows.is_empty() && comments.is_empty() {
        return Ok(());
    }
    info!(days = day_rows.len(), "absorbing flat fallback store");

    for (key, value) in day_rows {
        let day_raw = &key[FALLBACK_DAY_PREFIX.len()..];
        let Ok(day) = day_raw.parse::<NaiveDate>() else {
            warn!(key = %key, "skipping fallback key with malformed day");
            continue;
        };
        let entries: Vec<LegacyEntry> = serde_json::from_str(&value)?;
        for entry in entries {
            let seed = synthesize_seed(entry, day, &comments);
            store::write_seed(conn, &seed).await?;
        }
        conn.execute("DELETE FROM local_fallback WHERE key = ?", params![key])
            .await?;
    }

    conn.execute(
        "DELETE FROM local_fallback WHERE key = ?",
        params![FALLBACK_COMMENT_KEY],
    )
    .await?;
    Ok(())
}

/// The shared synthesis rule: one legacy entry becomes one seed with a single
/// appearance and a call count of 1, pulling comments from the global map.
fn synthesize_seed(
    entry: LegacyEntry,
    day: NaiveDate,
    comments: &HashMap<String, Vec<String>>,
) -> Seed {
    Seed {
        comments: comments.get(&entry.id).cloned().unwrap_or_default(),
        id: SeedId::new(entry.id),
        kind: RecordKind::Seed,
        text: entry.text,
        continued: entry.continued,
        call_count: 1,
        appeared_on: vec![day],
        branch_id: None,
        tree_id: None,
    }
}

/// Global comment map from the fallback store, or empty when absent
async fn fallback_comment_map(conn: &Connection) -> Result<HashMap<String, Vec<String>>> {
    if !table_exists(conn, "local_fallback").await? {
        return Ok(HashMap::new());
    }
    let mut rows = conn
        .query(
            "SELECT value FROM local_fallback WHERE key = ?",
            params![FALLBACK_COMMENT_KEY],
        )
        .await?;
    match rows.next().await? {
        Some(row) => {
            let raw: String = row.get(0)?;
            Ok(serde_json::from_str(&raw)?)
        }
        None => Ok(HashMap::new()),
    }
}

async fn table_exists(conn: &Connection, name: &str) -> Result<bool> {
    let mut rows = conn
        .query(
            "SELECT 1 FROM sqlite_master WHERE type = 'table' AND name = ?",
            params![name],
        )
        .await?;
    Ok(rows.next().await?.is_some())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn day(s: &str) -> NaiveDate {
        s.parse().unwrap()
    }

    #[test]
    fn test_synthesis_rule() {
        let mut comments = HashMap::new();
        comments.insert("id-1".to_string(), vec!["later".to_string()]);

        let entry = LegacyEntry {
            id: "id-1".to_string(),
            text: "call the dentist".to_string(),
            continued: true,
        };
        let seed = synthesize_seed(entry, day("2023-11-14"), &comments);

        assert_eq!(seed.id.as_str(), "id-1");
        assert_eq!(seed.call_count, 1);
        assert_eq!(seed.appeared_on, vec![day("2023-11-14")]);
        assert_eq!(seed.comments, vec!["later".to_string()]);
        assert!(seed.continued);
        assert!(seed.branch_id.is_none());
        assert!(seed.tree_id.is_none());
    }

    #[test]
    fn test_synthesis_without_comment_entry() {
        let entry = LegacyEntry {
            id: "id-2".to_string(),
            text: "water plants".to_string(),
            continued: false,
        };
        let seed = synthesize_seed(entry, day("2023-11-15"), &HashMap::new());
        assert!(seed.comments.is_empty());
    }

    #[test]
    fn test_legacy_entry_continued_defaults_false() {
        let entry: LegacyEntry = serde_json::from_str(r#"{"id":"x","text":"t"}"#).unwrap();
        assert!(!entry.continued);
    }
}
