//! Core data types for the Seedbed journaling core
//!
//! Defines seeds (single notes in the daily log), branches (named groupings of
//! seeds), and their identifiers. Field names serialize in camelCase so that
//! snapshot documents stay interchangeable with backups written by earlier
//! generations of the journal.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Unique identifier for seeds
///
/// Wraps an opaque string rather than a UUID: ids minted by older generations
/// of the journal (e.g. `id-1699...`) must survive migration and snapshot
/// round-trips verbatim. Fresh ids are uuid-v4 based.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SeedId(String);

impl SeedId {
    /// Create a new random seed ID
    pub fn generate() -> Self {
        Self(format!("seed-{}", Uuid::new_v4().simple()))
    }

    pub fn new(raw: impl Into<String>) -> Self {
        Self(raw.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for SeedId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Unique identifier for branches
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct BranchId(String);

impl BranchId {
    /// Create a new random branch ID
    pub fn generate() -> Self {
        Self(format!("branch-{}", Uuid::new_v4().simple()))
    }

    pub fn new(raw: impl Into<String>) -> Self {
        Self(raw.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for BranchId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Record discriminator stored alongside each seed
///
/// Currently the seed store holds a single kind; the field is reserved for
/// future record kinds sharing the store and must round-trip unchanged.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RecordKind {
    #[default]
    Seed,
}

impl RecordKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            RecordKind::Seed => "seed",
        }
    }
}

fn default_call_count() -> u32 {
    1
}

/// A single persisted note, the atomic unit of the journal
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Seed {
    /// Stable unique identifier, assigned at creation, never reused
    pub id: SeedId,

    /// Fixed discriminator ("seed")
    #[serde(rename = "type", default)]
    pub kind: RecordKind,

    /// Current note content (mutable)
    pub text: String,

    /// Carried over from a previous day and still open
    #[serde(default)]
    pub continued: bool,

    /// Times this seed has been invoked: fresh = 1, each recall increments.
    /// Monotonically non-decreasing.
    #[serde(default = "default_call_count")]
    pub call_count: u32,

    /// One entry per distinct day the seed was shown, in order of first
    /// appearance. Never empty for a persisted seed, never duplicated.
    pub appeared_on: Vec<NaiveDate>,

    /// Free-text annotations, append-only except explicit index removal
    #[serde(default)]
    pub comments: Vec<String>,

    /// Back-reference to the owning branch, if any
    #[serde(default)]
    pub branch_id: Option<BranchId>,

    /// Reserved field carried from the legacy schema; never populated by
    /// current logic but persists round-trip.
    #[serde(default)]
    pub tree_id: Option<String>,
}

impl Seed {
    /// Create a fresh seed first shown on `day`
    pub fn new(text: impl Into<String>, day: NaiveDate) -> Self {
        Self {
            id: SeedId::generate(),
            kind: RecordKind::Seed,
            text: text.into(),
            continued: false,
            call_count: 1,
            appeared_on: vec![day],
            comments: Vec::new(),
            branch_id: None,
            tree_id: None,
        }
    }

    /// Append `day` to the appearance list unless already present.
    /// Returns true when the day was new.
    pub fn record_appearance(&mut self, day: NaiveDate) -> bool {
        if self.appeared_on.contains(&day) {
            return false;
        }
        self.appeared_on.push(day);
        true
    }

    /// Apply recall semantics: bump the call count, note the day, and update
    /// the continued flag. The single mutation path for reusing a thought.
    pub fn recall_on(&mut self, day: NaiveDate, continued: bool) {
        self.call_count += 1;
        self.record_appearance(day);
        self.continued = continued;
    }

    /// Most recent day this seed was shown
    pub fn last_appeared(&self) -> Option<NaiveDate> {
        self.appeared_on.last().copied()
    }
}

/// A named, user-curated collection of seeds
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Branch {
    /// Stable unique identifier
    pub id: BranchId,

    /// Display label, non-empty
    pub name: String,

    /// Member seed ids, unique within the branch
    pub seed_ids: Vec<SeedId>,

    /// Set once at creation, immutable
    pub created_at: DateTime<Utc>,
}

impl Branch {
    /// Create a new branch over the given members. Duplicate ids collapse to
    /// their first occurrence, keeping the member list unique.
    pub fn new(name: impl Into<String>, seed_ids: Vec<SeedId>) -> Self {
        let mut members: Vec<SeedId> = Vec::with_capacity(seed_ids.len());
        for id in seed_ids {
            if !members.contains(&id) {
                members.push(id);
            }
        }
        Self {
            id: BranchId::generate(),
            name: name.into(),
            seed_ids: members,
            created_at: Utc::now(),
        }
    }

    /// Drop a member id. Returns true when the list changed.
    pub fn remove_member(&mut self, seed_id: &SeedId) -> bool {
        let before = self.seed_ids.len();
        self.seed_ids.retain(|id| id != seed_id);
        self.seed_ids.len() != before
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn day(s: &str) -> NaiveDate {
        s.parse().unwrap()
    }

    #[test]
    fn test_seed_id_uniqueness() {
        let a = SeedId::generate();
        let b = SeedId::generate();
        assert_ne!(a, b);
    }

    #[test]
    fn test_record_appearance_dedupes() {
        let mut seed = Seed::new("water the plants", day("2024-01-01"));
        assert!(!seed.record_appearance(day("2024-01-01")));
        assert!(seed.record_appearance(day("2024-01-02")));
        assert!(!seed.record_appearance(day("2024-01-02")));
        assert_eq!(seed.appeared_on, vec![day("2024-01-01"), day("2024-01-02")]);
    }

    #[test]
    fn test_recall_on_same_day_keeps_one_entry() {
        let mut seed = Seed::new("idea", day("2024-03-05"));
        seed.recall_on(day("2024-03-05"), true);
        seed.recall_on(day("2024-03-05"), true);
        assert_eq!(seed.call_count, 3);
        assert_eq!(seed.appeared_on.len(), 1);
        assert!(seed.continued);
    }

    #[test]
    fn test_last_appeared_is_newest_entry() {
        let mut seed = Seed::new("idea", day("2024-03-05"));
        seed.recall_on(day("2024-03-07"), false);
        assert_eq!(seed.last_appeared(), Some(day("2024-03-07")));
    }

    #[test]
    fn test_seed_serializes_legacy_field_names() {
        let seed = Seed::new("hello", day("2024-01-01"));
        let json = serde_json::to_value(&seed).unwrap();
        assert_eq!(json["type"], "seed");
        assert_eq!(json["callCount"], 1);
        assert_eq!(json["appearedOn"][0], "2024-01-01");
        assert!(json["treeId"].is_null());
    }

    #[test]
    fn test_seed_deserializes_sparse_legacy_record() {
        // Older backups may omit everything but the identity fields
        let seed: Seed = serde_json::from_str(
            r#"{"id":"id-1700000000000abc","text":"old thought","appearedOn":["2023-11-14"]}"#,
        )
        .unwrap();
        assert_eq!(seed.id.as_str(), "id-1700000000000abc");
        assert_eq!(seed.call_count, 1);
        assert!(!seed.continued);
        assert!(seed.comments.is_empty());
        assert!(seed.branch_id.is_none());
    }

    #[test]
    fn test_branch_new_dedupes_members_keeping_order() {
        let s1 = SeedId::new("s1");
        let s2 = SeedId::new("s2");
        let branch = Branch::new("Work", vec![s1.clone(), s2.clone(), s1.clone()]);
        assert_eq!(branch.seed_ids, vec![s1, s2]);
    }

    #[test]
    fn test_branch_remove_member_idempotent() {
        let s1 = SeedId::new("s1");
        let s2 = SeedId::new("s2");
        let mut branch = Branch::new("Work", vec![s1.clone(), s2]);
        assert!(branch.remove_member(&s1));
        assert!(!branch.remove_member(&s1));
        assert_eq!(branch.seed_ids.len(), 1);
    }
}
