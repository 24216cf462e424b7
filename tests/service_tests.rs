//! Integration tests for vault CRUD, query, and backup operations.

use std::sync::Arc;
use std::thread;

use chrono::{Duration, Utc};
use passvault::store::MemoryStore;
use passvault::{CredentialRecord, SortOrder, VaultError, VaultService};

/// Helper: an unlocked vault over a fresh in-memory store.
fn unlocked_vault() -> VaultService<MemoryStore> {
    let vault = VaultService::open(MemoryStore::new()).expect("open vault");
    vault.auth().set_master_passphrase("abcd").unwrap();
    vault
}

/// Helper: a minimal valid record.
fn rec(title: &str) -> CredentialRecord {
    CredentialRecord::new(title, "", "secret", "", "")
}

// ---------------------------------------------------------------------------
// Locked sessions
// ---------------------------------------------------------------------------

#[test]
fn record_operations_require_an_unlocked_session() {
    let vault = VaultService::open(MemoryStore::new()).unwrap();

    assert!(matches!(vault.list(), Err(VaultError::Locked)));
    assert!(matches!(vault.add(rec("Bank")), Err(VaultError::Locked)));
    assert!(matches!(vault.delete("some-id"), Err(VaultError::Locked)));
    assert!(matches!(
        vault.query("", SortOrder::Alphabetical),
        Err(VaultError::Locked)
    ));
    assert!(matches!(vault.export(), Err(VaultError::Locked)));
    assert!(matches!(vault.import("x\n"), Err(VaultError::Locked)));
}

#[test]
fn relocking_shuts_access_again() {
    let vault = unlocked_vault();
    vault.add(rec("Bank")).unwrap();

    vault.auth().lock();
    assert!(matches!(vault.list(), Err(VaultError::Locked)));

    assert!(vault.auth().verify("abcd").unwrap());
    assert_eq!(vault.list().unwrap().len(), 1);
}

// ---------------------------------------------------------------------------
// Add and list
// ---------------------------------------------------------------------------

#[test]
fn add_then_list_preserves_every_field() {
    let vault = unlocked_vault();

    let record = CredentialRecord::new("Bank", "alice", "hunter2", "https://bank.example", "main");
    let stored = vault.add(record.clone()).unwrap();

    let listed = vault.list().unwrap();
    assert_eq!(listed.len(), 1);
    assert_eq!(listed[0].id, stored.id);
    assert_eq!(listed[0].title, "Bank");
    assert_eq!(listed[0].username, "alice");
    assert_eq!(listed[0].password, "hunter2");
    assert_eq!(listed[0].url, "https://bank.example");
    assert_eq!(listed[0].notes, "main");
}

#[test]
fn add_keeps_empty_optional_fields_verbatim() {
    let vault = unlocked_vault();
    vault.add(CredentialRecord::new("Bank", "", "pw", "", "")).unwrap();

    let listed = vault.list().unwrap();
    assert_eq!(listed[0].username, "");
    assert_eq!(listed[0].url, "");
    assert_eq!(listed[0].notes, "");
}

#[test]
fn add_requires_title_and_password() {
    let vault = unlocked_vault();

    let no_title = CredentialRecord::new("", "alice", "pw", "", "");
    assert!(matches!(vault.add(no_title), Err(VaultError::Validation(_))));

    let no_password = CredentialRecord::new("Bank", "alice", "", "", "");
    assert!(matches!(
        vault.add(no_password),
        Err(VaultError::Validation(_))
    ));

    assert!(vault.list().unwrap().is_empty());
}

#[test]
fn add_assigns_a_fresh_id_when_none_given() {
    let vault = unlocked_vault();

    let mut record = rec("Bank");
    record.id = String::new();

    let stored = vault.add(record).unwrap();
    assert!(!stored.id.is_empty());
    assert_eq!(vault.list().unwrap()[0].id, stored.id);
}

#[test]
fn add_rejects_a_duplicate_id() {
    let vault = unlocked_vault();
    let stored = vault.add(rec("Bank")).unwrap();

    let mut clash = rec("Other");
    clash.id = stored.id;
    assert!(matches!(vault.add(clash), Err(VaultError::Validation(_))));
    assert_eq!(vault.list().unwrap().len(), 1);
}

// ---------------------------------------------------------------------------
// Update
// ---------------------------------------------------------------------------

#[test]
fn update_on_a_missing_id_fails_and_changes_nothing() {
    let vault = unlocked_vault();
    vault.add(rec("Bank")).unwrap();
    let before = vault.list().unwrap();

    let ghost = rec("Ghost");
    let err = vault.update(ghost.clone()).unwrap_err();
    assert!(matches!(err, VaultError::NotFound(id) if id == ghost.id));

    let after = vault.list().unwrap();
    assert_eq!(before.len(), after.len());
    assert_eq!(before[0].title, after[0].title);
}

#[test]
fn update_replaces_in_place_and_preserves_creation_time() {
    let vault = unlocked_vault();
    let first = vault.add(rec("First")).unwrap();
    let second = vault.add(rec("Second")).unwrap();
    vault.add(rec("Third")).unwrap();

    let mut changed = second.clone();
    changed.title = "Second, renamed".to_string();
    changed.password = "rotated".to_string();
    let stored = vault.update(changed).unwrap();

    let listed = vault.list().unwrap();
    // Sequence position is preserved.
    assert_eq!(listed[0].id, first.id);
    assert_eq!(listed[1].id, second.id);
    assert_eq!(listed[1].title, "Second, renamed");
    assert_eq!(listed[1].password, "rotated");
    // created_at survives the update; updated_at moves forward.
    assert_eq!(stored.created_at, second.created_at);
    assert!(stored.updated_at >= second.updated_at);
}

// ---------------------------------------------------------------------------
// Delete
// ---------------------------------------------------------------------------

#[test]
fn delete_is_idempotent() {
    let vault = unlocked_vault();
    let stored = vault.add(rec("Bank")).unwrap();
    vault.add(rec("Zoo")).unwrap();

    vault.delete(&stored.id).unwrap();
    assert_eq!(vault.list().unwrap().len(), 1);

    // Deleting the same id again is a no-op, not an error.
    vault.delete(&stored.id).unwrap();
    assert_eq!(vault.list().unwrap().len(), 1);
    assert_eq!(vault.list().unwrap()[0].title, "Zoo");
}

// ---------------------------------------------------------------------------
// Query
// ---------------------------------------------------------------------------

#[test]
fn query_sorts_alphabetically_case_insensitive() {
    let vault = unlocked_vault();
    vault.add(rec("Bank")).unwrap();
    vault.add(rec("amazon")).unwrap();
    vault.add(rec("Zoo")).unwrap();

    let titles: Vec<String> = vault
        .query("", SortOrder::Alphabetical)
        .unwrap()
        .into_iter()
        .map(|r| r.title)
        .collect();
    assert_eq!(titles, ["amazon", "Bank", "Zoo"]);
}

#[test]
fn query_matches_substring_across_title_username_and_url() {
    let vault = unlocked_vault();
    vault.add(rec("Bank")).unwrap();
    vault.add(rec("amazon")).unwrap();
    vault
        .add(CredentialRecord::new("Mail", "stranger", "pw", "", ""))
        .unwrap();
    vault
        .add(CredentialRecord::new("Forum", "", "pw", "https://anvil.example", ""))
        .unwrap();

    let titles: Vec<String> = vault
        .query("an", SortOrder::Alphabetical)
        .unwrap()
        .into_iter()
        .map(|r| r.title)
        .collect();
    // "Bank" by title, "Mail" by username, "Forum" by url; "amazon"
    // has no "an" substring anywhere.
    assert_eq!(titles, ["Bank", "Forum", "Mail"]);
}

#[test]
fn query_is_case_insensitive() {
    let vault = unlocked_vault();
    vault.add(rec("Bank")).unwrap();

    assert_eq!(vault.query("BANK", SortOrder::Alphabetical).unwrap().len(), 1);
    assert_eq!(vault.query("bAnK", SortOrder::Alphabetical).unwrap().len(), 1);
}

#[test]
fn query_orders_by_creation_time_for_recency_sorts() {
    let vault = unlocked_vault();

    let now = Utc::now();
    for (title, age_secs) in [("Middle", 60), ("Newest", 0), ("Oldest", 120)] {
        let mut record = rec(title);
        record.created_at = now - Duration::seconds(age_secs);
        vault.add(record).unwrap();
    }

    let recent: Vec<String> = vault
        .query("", SortOrder::MostRecent)
        .unwrap()
        .into_iter()
        .map(|r| r.title)
        .collect();
    assert_eq!(recent, ["Newest", "Middle", "Oldest"]);

    let oldest: Vec<String> = vault
        .query("", SortOrder::Oldest)
        .unwrap()
        .into_iter()
        .map(|r| r.title)
        .collect();
    assert_eq!(oldest, ["Oldest", "Middle", "Newest"]);
}

#[test]
fn query_never_mutates_the_stored_vault() {
    let vault = unlocked_vault();
    vault.add(rec("Zoo")).unwrap();
    vault.add(rec("amazon")).unwrap();

    vault.query("zo", SortOrder::Alphabetical).unwrap();

    // Persisted order is still insertion order.
    let titles: Vec<String> = vault.list().unwrap().into_iter().map(|r| r.title).collect();
    assert_eq!(titles, ["Zoo", "amazon"]);
}

// ---------------------------------------------------------------------------
// Backup / restore
// ---------------------------------------------------------------------------

#[test]
fn import_appends_additively_and_reports_the_count() {
    let vault = unlocked_vault();
    vault.add(rec("Existing")).unwrap();

    let text = "Title,Username,Password,URL,Notes\n\
                \"Bank\",\"alice\",\"hunter2\",\"https://b\",\"note\"\n\
                garbage line\n\
                \"Zoo\",\"bob\",\"pw\"\n";
    let count = vault.import(text).unwrap();

    assert_eq!(count, 2);
    let titles: Vec<String> = vault.list().unwrap().into_iter().map(|r| r.title).collect();
    assert_eq!(titles, ["Existing", "Bank", "Zoo"]);
}

#[test]
fn export_then_import_reproduces_fields() {
    let vault = unlocked_vault();
    vault
        .add(CredentialRecord::new("Bank", "alice", "hunter2", "https://b", "main"))
        .unwrap();
    vault.add(rec("Zoo")).unwrap();

    let text = vault.export().unwrap();

    let restored = VaultService::open(MemoryStore::new()).unwrap();
    restored.auth().set_master_passphrase("abcd").unwrap();
    assert_eq!(restored.import(&text).unwrap(), 2);

    let original = vault.list().unwrap();
    let copies = restored.list().unwrap();
    for (a, b) in original.iter().zip(&copies) {
        assert_eq!(a.title, b.title);
        assert_eq!(a.username, b.username);
        assert_eq!(a.password, b.password);
        assert_eq!(a.url, b.url);
        assert_eq!(a.notes, b.notes);
    }
}

#[test]
fn erase_all_empties_the_vault() {
    let vault = unlocked_vault();
    vault.add(rec("Bank")).unwrap();
    vault.add(rec("Zoo")).unwrap();

    vault.erase_all().unwrap();
    assert!(vault.list().unwrap().is_empty());
}

// ---------------------------------------------------------------------------
// Concurrency
// ---------------------------------------------------------------------------

#[test]
fn concurrent_adds_lose_no_records() {
    let vault = Arc::new(unlocked_vault());
    const WRITERS: usize = 8;

    let handles: Vec<_> = (0..WRITERS)
        .map(|i| {
            let vault = Arc::clone(&vault);
            thread::spawn(move || {
                vault.add(rec(&format!("record-{i}"))).unwrap();
            })
        })
        .collect();
    for handle in handles {
        handle.join().unwrap();
    }

    // Every writer's record survived: no lost update.
    let listed = vault.list().unwrap();
    assert_eq!(listed.len(), WRITERS);
}
