//! Daily rollover: detecting the date-boundary crossing
//!
//! The controller compares an injected clock's today against the persisted
//! last-open-day marker. On a crossing it collects yesterday's seeds as
//! carryover candidates and advances the marker in the same call. Checks are
//! serialized behind a mutex held across the read-fetch-write sequence, so a
//! racing second check (timer vs. focus trigger) waits, then observes the
//! updated marker and does nothing.

use crate::error::Result;
use crate::storage::{JournalStore, META_LAST_OPEN_DAY};
use crate::types::Seed;
use chrono::{Days, Local, NaiveDate};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{mpsc, Mutex};
use tracing::{debug, info, warn};

/// Source of "today", injected so rollover is deterministic under test
pub trait Clock: Send + Sync {
    fn today(&self) -> NaiveDate;
}

/// Wall-clock days in the local timezone
pub struct SystemClock;

impl Clock for SystemClock {
    fn today(&self) -> NaiveDate {
        Local::now().date_naive()
    }
}

/// Outcome of one rollover check
#[derive(Debug)]
pub enum Rollover {
    /// The marker already matches today; nothing to do
    Current,
    /// The date rolled over: the marker now reads `today`, and `carryover`
    /// holds the previous day's seeds as display-only candidates
    NewDay {
        today: NaiveDate,
        carryover: Vec<Seed>,
    },
}

/// Detects date-boundary crossings against the persisted marker
#[derive(Clone)]
pub struct RolloverController {
    store: Arc<dyn JournalStore>,
    clock: Arc<dyn Clock>,
    // Serializes check(): the carryover fetch suspends between the marker
    // read and the marker write, and two interleaved checks would both see
    // the stale marker and transition twice.
    gate: Arc<Mutex<()>>,
}

impl RolloverController {
    pub fn new(store: Arc<dyn JournalStore>, clock: Arc<dyn Clock>) -> Self {
        Self {
            store,
            clock,
            gate: Arc::new(Mutex::new(())),
        }
    }

    /// Compare today against the marker and transition when they differ.
    ///
    /// The previous day is the stored marker, or calendar yesterday when no
    /// marker exists yet (first launch). Safe to call from the periodic timer
    /// and a focus trigger at once: whichever runs second waits on the gate,
    /// sees the advanced marker, and reports `Current`.
    pub async fn check(&self) -> Result<Rollover> {
        let _gate = self.gate.lock().await;
        let today = self.clock.today();
        let marker = self.last_open_day().await?;

        if marker == Some(today) {
            return Ok(Rollover::Current);
        }

        let previous = marker.unwrap_or_else(|| yesterday_of(today));
        let carryover = self.store.seeds_on(previous).await?;
        self.store
            .set_meta(META_LAST_OPEN_DAY, &today.to_string())
            .await?;
        info!(%today, %previous, candidates = carryover.len(), "date rolled over");
        Ok(Rollover::NewDay { today, carryover })
    }

    /// Drive `check` on a fixed period, forwarding transitions to `tx`.
    /// Ends when the receiver is dropped.
    pub async fn watch(self, period: Duration, tx: mpsc::Sender<Rollover>) {
        let mut ticker = tokio::time::interval(period);
        ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
        loop {
            ticker.tick().await;
            match self.check().await {
                Ok(Rollover::Current) => {}
                Ok(transition) => {
                    if tx.send(transition).await.is_err() {
                        debug!("rollover receiver dropped; stopping watcher");
                        return;
                    }
                }
                Err(e) => warn!(error = %e, "rollover check failed"),
            }
        }
    }

    async fn last_open_day(&self) -> Result<Option<NaiveDate>> {
        let Some(raw) = self.store.meta(META_LAST_OPEN_DAY).await? else {
            return Ok(None);
        };
        match raw.parse::<NaiveDate>() {
            Ok(day) => Ok(Some(day)),
            Err(_) => {
                warn!(marker = %raw, "malformed last-open-day marker; treating as absent");
                Ok(None)
            }
        }
    }
}

fn yesterday_of(day: NaiveDate) -> NaiveDate {
    day.checked_sub_days(Days::new(1)).unwrap_or(day)
}
