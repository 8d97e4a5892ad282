use crease_terminal::model::{HistoryEntry, Id};
use crease_terminal::persist::{LocalStore, MatchMeta};
use crease_terminal::progression::{Phase, Progression};

fn entry(id: u64, created_at: &str) -> HistoryEntry {
    HistoryEntry {
        id: Id(id),
        team_a: "Hawks".to_string(),
        team_b: "Vipers".to_string(),
        finished: false,
        created_at: created_at.to_string(),
    }
}

#[test]
fn progression_round_trips_through_the_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("store.json");
    let mut p = Progression::new(Id(u64::MAX - 1));
    p.start_innings(Id(1), Id(2), Id(11)).unwrap();
    p.balls_in_over = 4;

    LocalStore::at(&path).save(p.match_id, &p);
    // A fresh handle on the same file sees the record.
    let reopened = LocalStore::at(&path);
    assert_eq!(reopened.load::<Progression>(p.match_id), Some(p.clone()));
    assert_eq!(reopened.load::<Progression>(Id(3)), None);

    reopened.clear(p.match_id);
    assert_eq!(reopened.load::<Progression>(p.match_id), None);
}

#[test]
fn progress_of_other_matches_is_untouched() {
    let dir = tempfile::tempdir().unwrap();
    let store = LocalStore::at(dir.path().join("store.json"));
    let mut a = Progression::new(Id(1));
    a.phase = Phase::AwaitingOverChange;
    let b = Progression::new(Id(2));
    store.save(a.match_id, &a);
    store.save(b.match_id, &b);
    store.clear(b.match_id);
    assert_eq!(store.load::<Progression>(Id(1)), Some(a));
}

#[test]
fn meta_and_history() {
    let dir = tempfile::tempdir().unwrap();
    let store = LocalStore::at(dir.path().join("nested").join("store.json"));
    let meta = MatchMeta {
        team_a: Id(7001),
        team_b: Id(7002),
        team_a_name: "Hawks".to_string(),
        team_b_name: "Vipers".to_string(),
        batting_first: Id(7001),
        team_a_eleven: vec![Id(1), Id(2)],
        team_b_eleven: vec![Id(3), Id(4)],
    };
    store.save_meta(Id(10), &meta);
    assert_eq!(store.load_meta(Id(10)), Some(meta));

    store.upsert_history(entry(10, "2026-05-01T10:00:00+00:00"));
    store.upsert_history(entry(11, "2026-05-03T10:00:00+00:00"));
    store.upsert_history(entry(12, "2026-05-02T10:00:00+00:00"));
    let ids = store.history().iter().map(|e| e.id).collect::<Vec<_>>();
    assert_eq!(ids, vec![Id(11), Id(12), Id(10)]);

    let mut renamed = entry(12, "2026-05-02T10:00:00+00:00");
    renamed.team_b = "Valley Vipers".to_string();
    store.upsert_history(renamed);
    store.mark_finished(Id(10));
    let history = store.history();
    assert_eq!(history.len(), 3);
    assert_eq!(history[1].team_b, "Valley Vipers");
    assert!(history[2].finished);
    assert!(!history[0].finished);

    store.wipe();
    assert!(store.history().is_empty());
    assert_eq!(store.load_meta(Id(10)), None);
}

#[test]
fn corrupt_or_missing_store_reads_as_empty() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("store.json");
    std::fs::write(&path, "{not json").unwrap();
    let store = LocalStore::at(&path);
    assert!(store.history().is_empty());
    assert_eq!(store.load::<Progression>(Id(1)), None);

    // Writing over a corrupt file starts a fresh one.
    store.upsert_history(entry(1, "2026-05-01T10:00:00+00:00"));
    assert_eq!(store.history().len(), 1);

    let missing = LocalStore::at(dir.path().join("absent").join("store.json"));
    assert!(missing.history().is_empty());
}
