//! Integration tests for the snapshot export/import boundary

use seedbed::JournalError;
use std::collections::HashMap;

mod common;
use common::{create_test_journal, temp_dir, FixedClock};

#[tokio::test]
async fn test_export_import_reproduces_both_tables() {
    let source_dir = temp_dir();
    let clock = FixedClock::at("2024-01-01");
    let source = create_test_journal(&source_dir, clock.clone()).await;

    let s1 = source
        .add_or_recall_seed("first thought", false, None)
        .await
        .unwrap()
        .unwrap();
    let s2 = source
        .add_or_recall_seed("second thought", false, None)
        .await
        .unwrap()
        .unwrap();
    clock.set("2024-01-02");
    source
        .add_or_recall_seed("first thought", true, Some(&s1.id))
        .await
        .unwrap();
    source.add_comment(&s2.id, "a remark").await.unwrap();
    source
        .create_branch("Work", &[s1.id.clone(), s2.id.clone()])
        .await
        .unwrap();

    let document = source.export_snapshot().await.unwrap().to_json().unwrap();

    let target_dir = temp_dir();
    let target = create_test_journal(&target_dir, FixedClock::at("2024-01-02")).await;
    target.import_snapshot(&document).await.unwrap();

    let exported = source.export_snapshot().await.unwrap();
    let reimported = target.export_snapshot().await.unwrap();

    let original: HashMap<String, _> = exported
        .seeds
        .into_iter()
        .map(|s| (s.id.to_string(), s))
        .collect();
    assert_eq!(reimported.seeds.len(), original.len());
    for seed in reimported.seeds {
        let source_seed = &original[&seed.id.to_string()];
        assert_eq!(seed.text, source_seed.text);
        assert_eq!(seed.call_count, source_seed.call_count);
        assert_eq!(seed.appeared_on, source_seed.appeared_on);
        assert_eq!(seed.comments, source_seed.comments);
        assert_eq!(seed.branch_id, source_seed.branch_id);
        assert_eq!(seed.continued, source_seed.continued);
    }

    assert_eq!(reimported.branches.len(), 1);
    assert_eq!(exported.branches[0].id, reimported.branches[0].id);
    assert_eq!(exported.branches[0].seed_ids, reimported.branches[0].seed_ids);
    assert_eq!(exported.branches[0].name, reimported.branches[0].name);
}

#[tokio::test]
async fn test_import_is_an_upsert_by_id() {
    let dir = temp_dir();
    let journal = create_test_journal(&dir, FixedClock::at("2024-01-01")).await;
    let seed = journal
        .add_or_recall_seed("original wording", false, None)
        .await
        .unwrap()
        .unwrap();

    let document = format!(
        r#"{{"seeds":[{{"id":"{}","type":"seed","text":"restored wording",
            "continued":false,"callCount":7,"appearedOn":["2023-12-31"],
            "comments":[],"branchId":null,"treeId":null}}],"branches":[]}}"#,
        seed.id
    );
    journal.import_snapshot(&document).await.unwrap();

    let snapshot = journal.export_snapshot().await.unwrap();
    assert_eq!(snapshot.seeds.len(), 1, "import replaced, not appended");
    assert_eq!(snapshot.seeds[0].text, "restored wording");
    assert_eq!(snapshot.seeds[0].call_count, 7);
}

#[tokio::test]
async fn test_malformed_document_applies_nothing() {
    let dir = temp_dir();
    let journal = create_test_journal(&dir, FixedClock::at("2024-01-01")).await;
    journal.add_or_recall_seed("keep me", false, None).await.unwrap();

    let err = journal
        .import_snapshot(r#"{"seeds": [{"id": 42}]}"#)
        .await
        .unwrap_err();
    assert!(matches!(err, JournalError::Serialization(_)));

    let snapshot = journal.export_snapshot().await.unwrap();
    assert_eq!(snapshot.seeds.len(), 1);
    assert_eq!(snapshot.seeds[0].text, "keep me");
}

#[tokio::test]
async fn test_tree_id_round_trips_untouched() {
    let dir = temp_dir();
    let journal = create_test_journal(&dir, FixedClock::at("2024-01-01")).await;

    let document = r#"{"seeds":[{"id":"id-legacy","text":"ancient",
        "appearedOn":["2022-05-01"],"treeId":"tree-7"}],"branches":[]}"#;
    journal.import_snapshot(document).await.unwrap();

    let snapshot = journal.export_snapshot().await.unwrap();
    assert_eq!(snapshot.seeds[0].tree_id.as_deref(), Some("tree-7"));

    let rendered = snapshot.to_json().unwrap();
    assert!(rendered.contains("\"treeId\": \"tree-7\""));
}
