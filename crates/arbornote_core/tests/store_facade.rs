use arbornote_core::{
    ContentType, ItemDraft, ItemPatch, ItemType, NoteStore, SearchQuery, StoreError,
    TreeServiceError,
};

#[test]
fn open_on_disk_persists_across_reopen() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("arbornote.db");

    let created_id = {
        let store = NoteStore::open(&path).unwrap();
        store
            .create_item(&ItemDraft::new(ItemType::Book, "Durable"))
            .unwrap()
            .id
    };

    let store = NoteStore::open(&path).unwrap();
    let loaded = store.get_item(created_id).unwrap().unwrap();
    assert_eq!(loaded.title, "Durable");
}

#[test]
fn facade_covers_crud_tree_and_search() {
    let store = NoteStore::open_in_memory().unwrap();

    let book = store
        .create_item(&ItemDraft::new(ItemType::Book, "Work"))
        .unwrap();
    let note = store
        .create_item(
            &ItemDraft::new(ItemType::Note, "Plan")
                .with_parent(book.id)
                .with_content("quarterly goals", ContentType::Plain),
        )
        .unwrap();

    let patch = ItemPatch {
        title: Some("Plan v2".to_string()),
        ..ItemPatch::default()
    };
    store.update_item(note.id, &patch).unwrap();

    let tree = store.get_tree_data().unwrap();
    assert_eq!(tree.len(), 1);
    let notes = tree[0].children.as_ref().unwrap();
    assert_eq!(notes[0].name, "Plan v2");

    let hits = store.search_items(&SearchQuery::new("quarterly")).unwrap();
    assert_eq!(hits.len(), 1);
    assert_eq!(hits[0].item_id, note.id);

    store.delete_item(note.id).unwrap();
    assert!(store.get_item(note.id).unwrap().is_none());
    assert_eq!(store.get_all_items().unwrap().len(), 1);
}

#[test]
fn move_and_reorder_through_facade() {
    let store = NoteStore::open_in_memory().unwrap();

    let book = store
        .create_item(&ItemDraft::new(ItemType::Book, "Work"))
        .unwrap();
    let n1 = store
        .create_item(&ItemDraft::new(ItemType::Note, "N1").with_parent(book.id))
        .unwrap();
    let n2 = store
        .create_item(&ItemDraft::new(ItemType::Note, "N2").with_parent(book.id))
        .unwrap();

    store.reorder_tree_item(n2.id, Some(book.id), 0).unwrap();
    let children = store.get_children(Some(book.id)).unwrap();
    let ids: Vec<_> = children.iter().map(|item| item.id).collect();
    assert_eq!(ids, [n2.id, n1.id]);

    store.move_tree_item(n1.id, None, None).unwrap();
    let roots = store.get_children(None).unwrap();
    assert!(roots.iter().any(|item| item.id == n1.id));

    let err = store
        .reorder_tree_item(n2.id, None, 0)
        .unwrap_err();
    assert!(matches!(
        err,
        StoreError::Service(TreeServiceError::ParentMismatch { .. })
    ));
}

#[test]
fn storage_info_reports_counts_and_schema_version() {
    let store = NoteStore::open_in_memory().unwrap();

    let book = store
        .create_item(&ItemDraft::new(ItemType::Book, "Work"))
        .unwrap();
    store
        .create_item(&ItemDraft::new(ItemType::Section, "Projects").with_parent(book.id))
        .unwrap();
    let doomed = store
        .create_item(&ItemDraft::new(ItemType::Note, "temp"))
        .unwrap();
    store
        .create_item(&ItemDraft::new(ItemType::Note, "kept"))
        .unwrap();
    store.delete_item(doomed.id).unwrap();

    let info = store.get_storage_info().unwrap();
    assert_eq!(info.backend, "sqlite-memory");
    assert_eq!(info.book_count, 1);
    assert_eq!(info.section_count, 1);
    assert_eq!(info.note_count, 1);
    assert_eq!(info.deleted_count, 1);
    assert_eq!(
        info.schema_version,
        arbornote_core::db::migrations::latest_version()
    );
}
