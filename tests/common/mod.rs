//! Common test utilities and helpers

use chrono::NaiveDate;
use seedbed::{Clock, Journal, JournalConfig, LibsqlStore};
use std::sync::{Arc, Mutex};
use tempfile::TempDir;

/// A clock tests can move by hand
pub struct FixedClock(Mutex<NaiveDate>);

impl FixedClock {
    pub fn at(day: &str) -> Arc<Self> {
        Arc::new(Self(Mutex::new(day.parse().expect("valid test date"))))
    }

    pub fn set(&self, day: &str) {
        *self.0.lock().unwrap() = day.parse().expect("valid test date");
    }
}

impl Clock for FixedClock {
    fn today(&self) -> NaiveDate {
        *self.0.lock().unwrap()
    }
}

/// Create a file-backed store in the given temp dir. File-backed rather than
/// `:memory:` because libSQL in-memory databases are per-connection.
pub async fn create_test_store(dir: &TempDir) -> Arc<LibsqlStore> {
    Arc::new(
        LibsqlStore::connect(dir.path().join("journal.db"))
            .await
            .expect("failed to create test store"),
    )
}

/// A journal over a fresh store with an injected clock
pub async fn create_test_journal(dir: &TempDir, clock: Arc<FixedClock>) -> Journal {
    let store = create_test_store(dir).await;
    Journal::with_store(store, clock, JournalConfig::default())
}

pub fn temp_dir() -> TempDir {
    TempDir::new().expect("failed to create temp dir")
}
