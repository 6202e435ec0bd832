use arbornote_core::db::open_db_in_memory;
use arbornote_core::{
    ContentType, ItemDraft, ItemPatch, ItemRepository, ItemType, ItemValidationError, RepoError,
    SqliteItemRepository,
};
use serde_json::{json, Map};
use uuid::Uuid;

#[test]
fn create_and_get_roundtrip() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteItemRepository::try_new(&conn).unwrap();

    let created = repo
        .create_item(&ItemDraft::new(ItemType::Book, "Work"))
        .unwrap();
    let loaded = repo.get_item(created.id, false).unwrap().unwrap();

    assert_eq!(loaded.id, created.id);
    assert_eq!(loaded.kind, ItemType::Book);
    assert_eq!(loaded.title, "Work");
    assert_eq!(loaded.parent_id, None);
    assert!(loaded.is_active());
    assert!(!loaded.sort_order.is_empty());
}

#[test]
fn create_trims_title_and_rejects_blank_title() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteItemRepository::try_new(&conn).unwrap();

    let created = repo
        .create_item(&ItemDraft::new(ItemType::Note, "  Plan  "))
        .unwrap();
    assert_eq!(created.title, "Plan");

    let err = repo
        .create_item(&ItemDraft::new(ItemType::Note, "   "))
        .unwrap_err();
    assert!(matches!(
        err,
        RepoError::Validation(ItemValidationError::BlankTitle)
    ));
}

#[test]
fn create_note_derives_plaintext_and_counts() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteItemRepository::try_new(&conn).unwrap();

    let draft = ItemDraft::new(ItemType::Note, "Plan")
        .with_content("# Goals\n\nShip **fast**, ship [well](https://x)", ContentType::Markdown);
    let created = repo.create_item(&draft).unwrap();

    assert_eq!(
        created.content_plaintext.as_deref(),
        Some("Goals Ship fast, ship well")
    );
    assert_eq!(created.word_count, Some(5));
    assert_eq!(created.content_type, Some(ContentType::Markdown));
}

#[test]
fn create_rejects_content_on_container_types() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteItemRepository::try_new(&conn).unwrap();

    let draft =
        ItemDraft::new(ItemType::Section, "Projects").with_content("body", ContentType::Plain);
    let err = repo.create_item(&draft).unwrap_err();
    assert!(matches!(
        err,
        RepoError::Validation(ItemValidationError::ContentOnNonNote(ItemType::Section))
    ));
}

#[test]
fn create_under_missing_parent_fails() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteItemRepository::try_new(&conn).unwrap();

    let ghost = Uuid::new_v4();
    let err = repo
        .create_item(&ItemDraft::new(ItemType::Note, "orphan").with_parent(ghost))
        .unwrap_err();
    assert!(matches!(err, RepoError::ParentNotFound(id) if id == ghost));
}

#[test]
fn create_enforces_nesting_policy() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteItemRepository::try_new(&conn).unwrap();

    let note = repo
        .create_item(&ItemDraft::new(ItemType::Note, "leaf"))
        .unwrap();
    let err = repo
        .create_item(&ItemDraft::new(ItemType::Note, "child").with_parent(note.id))
        .unwrap_err();
    assert!(matches!(
        err,
        RepoError::IllegalNesting {
            child: ItemType::Note,
            parent: Some(ItemType::Note),
        }
    ));

    let section = repo
        .create_item(&ItemDraft::new(ItemType::Section, "Projects"))
        .unwrap();
    let err = repo
        .create_item(&ItemDraft::new(ItemType::Book, "nested book").with_parent(section.id))
        .unwrap_err();
    assert!(matches!(
        err,
        RepoError::IllegalNesting {
            child: ItemType::Book,
            parent: Some(ItemType::Section),
        }
    ));
}

#[test]
fn siblings_are_created_in_stable_tail_order() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteItemRepository::try_new(&conn).unwrap();

    let book = repo
        .create_item(&ItemDraft::new(ItemType::Book, "Work"))
        .unwrap();
    let first = repo
        .create_item(&ItemDraft::new(ItemType::Note, "first").with_parent(book.id))
        .unwrap();
    let second = repo
        .create_item(&ItemDraft::new(ItemType::Note, "second").with_parent(book.id))
        .unwrap();
    let third = repo
        .create_item(&ItemDraft::new(ItemType::Note, "third").with_parent(book.id))
        .unwrap();
    assert!(first.sort_order < second.sort_order);
    assert!(second.sort_order < third.sort_order);

    let children = repo.list_children(Some(book.id)).unwrap();
    let ids: Vec<_> = children.iter().map(|item| item.id).collect();
    assert_eq!(ids, [first.id, second.id, third.id]);
}

#[test]
fn update_patches_only_named_fields() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteItemRepository::try_new(&conn).unwrap();

    let created = repo
        .create_item(
            &ItemDraft::new(ItemType::Note, "Plan").with_content("original", ContentType::Plain),
        )
        .unwrap();

    let patch = ItemPatch {
        title: Some("Plan v2".to_string()),
        ..ItemPatch::default()
    };
    let updated = repo.update_item(created.id, &patch).unwrap();

    assert_eq!(updated.title, "Plan v2");
    assert_eq!(updated.content.as_deref(), Some("original"));
    assert_eq!(updated.sort_order, created.sort_order);
    assert_eq!(updated.created_at, created.created_at);
}

#[test]
fn update_content_rederives_plaintext_and_counts() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteItemRepository::try_new(&conn).unwrap();

    let created = repo
        .create_item(
            &ItemDraft::new(ItemType::Note, "Plan").with_content("one two", ContentType::Plain),
        )
        .unwrap();
    assert_eq!(created.word_count, Some(2));

    let patch = ItemPatch {
        content: Some("<p>now three words</p>".to_string()),
        content_type: Some(ContentType::Html),
        ..ItemPatch::default()
    };
    let updated = repo.update_item(created.id, &patch).unwrap();

    assert_eq!(updated.content_plaintext.as_deref(), Some("now three words"));
    assert_eq!(updated.word_count, Some(3));
    assert_eq!(updated.content_type, Some(ContentType::Html));
}

#[test]
fn update_rejects_content_on_non_note() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteItemRepository::try_new(&conn).unwrap();

    let book = repo
        .create_item(&ItemDraft::new(ItemType::Book, "Work"))
        .unwrap();
    let patch = ItemPatch {
        content: Some("body".to_string()),
        ..ItemPatch::default()
    };
    let err = repo.update_item(book.id, &patch).unwrap_err();
    assert!(matches!(
        err,
        RepoError::Validation(ItemValidationError::ContentOnNonNote(ItemType::Book))
    ));
}

#[test]
fn update_missing_item_returns_not_found() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteItemRepository::try_new(&conn).unwrap();

    let ghost = Uuid::new_v4();
    let patch = ItemPatch {
        title: Some("renamed".to_string()),
        ..ItemPatch::default()
    };
    let err = repo.update_item(ghost, &patch).unwrap_err();
    assert!(matches!(err, RepoError::NotFound(id) if id == ghost));
}

#[test]
fn metadata_roundtrips_as_json() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteItemRepository::try_new(&conn).unwrap();

    let mut metadata = Map::new();
    metadata.insert("pinned".to_string(), json!(true));
    metadata.insert("color".to_string(), json!("teal"));

    let created = repo
        .create_item(&ItemDraft::new(ItemType::Note, "Plan").with_metadata(metadata.clone()))
        .unwrap();
    assert_eq!(created.metadata, metadata);

    let mut replacement = Map::new();
    replacement.insert("pinned".to_string(), json!(false));
    let patch = ItemPatch {
        metadata: Some(replacement.clone()),
        ..ItemPatch::default()
    };
    let updated = repo.update_item(created.id, &patch).unwrap();
    assert_eq!(updated.metadata, replacement);
}

#[test]
fn delete_soft_deletes_whole_subtree() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteItemRepository::try_new(&conn).unwrap();

    let book = repo
        .create_item(&ItemDraft::new(ItemType::Book, "A"))
        .unwrap();
    let section = repo
        .create_item(&ItemDraft::new(ItemType::Section, "B").with_parent(book.id))
        .unwrap();
    let note = repo
        .create_item(&ItemDraft::new(ItemType::Note, "C").with_parent(section.id))
        .unwrap();
    let unrelated = repo
        .create_item(&ItemDraft::new(ItemType::Note, "keep me"))
        .unwrap();

    repo.delete_item(book.id).unwrap();

    let remaining = repo.list_all().unwrap();
    assert_eq!(remaining.len(), 1);
    assert_eq!(remaining[0].id, unrelated.id);

    for id in [book.id, section.id, note.id] {
        assert!(repo.get_item(id, false).unwrap().is_none());
        let tombstoned = repo.get_item(id, true).unwrap().unwrap();
        assert!(tombstoned.deleted_at.is_some());
    }
}

#[test]
fn delete_missing_or_already_deleted_returns_not_found() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteItemRepository::try_new(&conn).unwrap();

    let ghost = Uuid::new_v4();
    let err = repo.delete_item(ghost).unwrap_err();
    assert!(matches!(err, RepoError::NotFound(id) if id == ghost));

    let note = repo
        .create_item(&ItemDraft::new(ItemType::Note, "once"))
        .unwrap();
    repo.delete_item(note.id).unwrap();
    let err = repo.delete_item(note.id).unwrap_err();
    assert!(matches!(err, RepoError::NotFound(id) if id == note.id));
}

#[test]
fn repository_rejects_unmigrated_connection() {
    let conn = rusqlite::Connection::open_in_memory().unwrap();
    let err = SqliteItemRepository::try_new(&conn).unwrap_err();
    assert!(matches!(
        err,
        RepoError::UninitializedConnection {
            actual_version: 0,
            ..
        }
    ));
}
