//! Seedbed: a local-first journaling core
//!
//! Short notes ("seeds") go into a daily log, carry over across days, group
//! into named "branches", take comments, and can be searched or dumped to a
//! JSON snapshot. All state lives in one embedded libSQL database file; there
//! is no server, and the view layer is an external collaborator that only
//! calls the [`Journal`] facade.
//!
//! # Architecture
//!
//! - **Types**: seeds, branches, identifiers ([`types`])
//! - **Storage**: the record-store trait and the libSQL backend, including
//!   migration from two older persisted layouts ([`storage`])
//! - **Repositories**: seed lifecycle and branch membership ([`repo`])
//! - **Rollover**: date-boundary detection with an injected clock
//!   ([`rollover`])
//! - **Search / Snapshot**: full-scan ranking and the backup boundary
//!
//! # Example
//!
//! ```ignore
//! use seedbed::{Journal, JournalConfig};
//!
//! #[tokio::main]
//! async fn main() -> seedbed::Result<()> {
//!     let journal = Journal::open(JournalConfig::from_env()).await?;
//!
//!     let seed = journal.add_or_recall_seed("water the plants", false, None).await?;
//!
//!     for hit in journal.search("plants").await? {
//!         println!("{} {}", hit.day.map(|d| d.to_string()).unwrap_or_default(), hit.text);
//!     }
//!     Ok(())
//! }
//! ```

pub mod config;
pub mod error;
pub mod journal;
pub mod repo;
pub mod rollover;
pub mod search;
pub mod snapshot;
pub mod storage;
pub mod types;

// Re-export commonly used types
pub use config::JournalConfig;
pub use error::{JournalError, Result};
pub use journal::Journal;
pub use rollover::{Clock, Rollover, RolloverController, SystemClock};
pub use search::{SearchHit, SEARCH_LIMIT};
pub use snapshot::Snapshot;
pub use storage::{libsql::LibsqlStore, JournalStore};
pub use types::{Branch, BranchId, RecordKind, Seed, SeedId};
