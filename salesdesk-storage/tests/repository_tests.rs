use pretty_assertions::assert_eq;
use salesdesk_storage::{
    DuckDbRepository, FieldClause, MemoryRepository, OwnerScope, Page, Record, RecordFilter,
    RecordStore, Repository, Sort, StorageError,
};
use salesdesk_types::{EntityType, RecordId, UserId};
use serde::{Deserialize, Serialize};
use serde_json::json;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
struct Note {
    id: RecordId,
    owner_id: UserId,
    title: String,
    priority: i64,
    created_at: i64,
}

impl Record for Note {
    const ENTITY_TYPE: EntityType = EntityType::Activity;

    fn id(&self) -> &RecordId {
        &self.id
    }

    fn owner_id(&self) -> Option<&UserId> {
        Some(&self.owner_id)
    }

    fn created_at(&self) -> i64 {
        self.created_at
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
struct Tag {
    id: RecordId,
    name: String,
    created_at: i64,
}

impl Record for Tag {
    const ENTITY_TYPE: EntityType = EntityType::Label;

    fn id(&self) -> &RecordId {
        &self.id
    }

    fn created_at(&self) -> i64 {
        self.created_at
    }
}

fn note(id: &str, owner: &str, title: &str, priority: i64, created_at: i64) -> Note {
    Note {
        id: RecordId::from(id),
        owner_id: UserId::new(owner),
        title: title.into(),
        priority,
        created_at,
    }
}

async fn seed(repo: &dyn Repository<Note>) {
    repo.create(note("n1", "alice", "Call Acme", 2, 100)).await.unwrap();
    repo.create(note("n2", "alice", "Email Globex", 5, 200)).await.unwrap();
    repo.create(note("n3", "bob", "Acme follow-up", 1, 300)).await.unwrap();
}

fn ids(notes: &[Note]) -> Vec<&str> {
    notes.iter().map(|n| n.id.as_str()).collect()
}

/// Contract checks shared by every repository implementation.
async fn exercise_contract(repo: &dyn Repository<Note>) {
    seed(repo).await;

    // Ownership scope
    let all = repo
        .find_many(&RecordFilter::all(), &Sort::desc("created_at"), None)
        .await
        .unwrap();
    assert_eq!(ids(&all), vec!["n3", "n2", "n1"]);

    let alice = RecordFilter::scoped(OwnerScope::Owner(UserId::new("alice")));
    let mine = repo.find_many(&alice, &Sort::desc("created_at"), None).await.unwrap();
    assert_eq!(ids(&mine), vec!["n2", "n1"]);

    // Field clauses AND with the ownership clause
    let acme_for_alice = alice.clone().with_clause(FieldClause::search(&["title"], "acme"));
    let found = repo
        .find_many(&acme_for_alice, &Sort::desc("created_at"), None)
        .await
        .unwrap();
    assert_eq!(ids(&found), vec!["n1"]);

    // Sort + page
    let by_priority = repo
        .find_many(&RecordFilter::all(), &Sort::asc("priority"), Some(Page::new(2, 1)))
        .await
        .unwrap();
    assert_eq!(ids(&by_priority), vec!["n1", "n2"]);

    // find_one with id + owner
    let foreign = alice.clone().with_id(RecordId::from("n3"));
    assert!(repo.find_one(&foreign).await.unwrap().is_none());
    let own = alice.clone().with_id(RecordId::from("n1"));
    assert_eq!(repo.find_one(&own).await.unwrap().unwrap().title, "Call Acme");

    // find_by_id ignores ownership
    assert!(repo.find_by_id(&RecordId::from("n3")).await.unwrap().is_some());
    assert!(repo.find_by_id(&RecordId::from("nope")).await.unwrap().is_none());

    // count
    assert_eq!(repo.count(&RecordFilter::all()).await.unwrap(), 3);
    assert_eq!(repo.count(&alice).await.unwrap(), 2);

    // update
    let mut n1 = repo.find_by_id(&RecordId::from("n1")).await.unwrap().unwrap();
    n1.title = "Call Acme again".into();
    repo.update(n1).await.unwrap();
    let reloaded = repo.find_by_id(&RecordId::from("n1")).await.unwrap().unwrap();
    assert_eq!(reloaded.title, "Call Acme again");
    assert_eq!(reloaded.owner_id, UserId::new("alice"));

    // duplicate + missing
    let dup = repo.create(note("n1", "bob", "dup", 0, 1)).await;
    assert!(matches!(dup, Err(StorageError::Duplicate { .. })));
    let missing = repo.update(note("ghost", "bob", "x", 0, 1)).await;
    assert!(matches!(missing, Err(StorageError::Missing { .. })));

    // delete
    assert!(repo.delete(&RecordId::from("n2")).await.unwrap());
    assert!(!repo.delete(&RecordId::from("n2")).await.unwrap());
    assert_eq!(repo.count(&RecordFilter::all()).await.unwrap(), 2);
}

// ── Memory ──────────────────────────────────────────────────────

#[tokio::test]
async fn memory_repository_honors_contract() {
    let repo = MemoryRepository::<Note>::new();
    exercise_contract(&repo).await;
    assert_eq!(repo.len().await, 2);
}

#[tokio::test]
async fn memory_clones_share_state() {
    let repo = MemoryRepository::<Note>::new();
    let other = repo.clone();
    repo.create(note("n1", "alice", "x", 0, 1)).await.unwrap();
    assert!(other.find_by_id(&RecordId::from("n1")).await.unwrap().is_some());
}

// ── DuckDB ──────────────────────────────────────────────────────

#[tokio::test]
async fn duckdb_repository_honors_contract() {
    let store = RecordStore::open_in_memory().unwrap();
    let repo: DuckDbRepository<Note> = store.repository();
    exercise_contract(&repo).await;
}

#[tokio::test]
async fn duckdb_keeps_entity_types_apart() {
    let store = RecordStore::open_in_memory().unwrap();
    let notes: DuckDbRepository<Note> = store.repository();
    let tags: DuckDbRepository<Tag> = store.repository();

    notes.create(note("n1", "alice", "x", 0, 1)).await.unwrap();
    tags.create(Tag {
        id: RecordId::from("t1"),
        name: "hot".into(),
        created_at: 2,
    })
    .await
    .unwrap();

    assert_eq!(notes.count(&RecordFilter::all()).await.unwrap(), 1);
    assert_eq!(tags.count(&RecordFilter::all()).await.unwrap(), 1);
    assert!(tags.find_by_id(&RecordId::from("n1")).await.unwrap().is_none());
    assert!(!tags.delete(&RecordId::from("n1")).await.unwrap());
}

#[tokio::test]
async fn duckdb_stores_reference_rows_without_owner() {
    let store = RecordStore::open_in_memory().unwrap();
    let tags: DuckDbRepository<Tag> = store.repository();
    tags.create(Tag {
        id: RecordId::from("t1"),
        name: "hot".into(),
        created_at: 2,
    })
    .await
    .unwrap();

    let rows = store
        .select_rows(EntityType::Label, &OwnerScope::Unrestricted, None)
        .unwrap();
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].owner_id, None);
    assert_eq!(rows[0].data, json!({"id": "t1", "name": "hot", "created_at": 2}));

    // An owner-scoped query never matches ownerless rows
    let scoped = RecordFilter::scoped(OwnerScope::Owner(UserId::new("alice")));
    assert_eq!(tags.count(&scoped).await.unwrap(), 0);
}

#[tokio::test]
async fn duckdb_file_store_survives_reopen() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("records.duckdb");
    {
        let store = RecordStore::open(&path, "64MB", 1).unwrap();
        let repo: DuckDbRepository<Note> = store.repository();
        repo.create(note("n1", "alice", "persisted", 3, 10)).await.unwrap();
        store.checkpoint().unwrap();
    }
    let store = RecordStore::open(&path, "64MB", 1).unwrap();
    let repo: DuckDbRepository<Note> = store.repository();
    let back = repo.find_by_id(&RecordId::from("n1")).await.unwrap().unwrap();
    assert_eq!(back, note("n1", "alice", "persisted", 3, 10));
}
