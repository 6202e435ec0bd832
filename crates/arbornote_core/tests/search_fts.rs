use arbornote_core::db::open_db_in_memory;
use arbornote_core::{
    search_items, ContentType, ItemDraft, ItemRepository, ItemType, SearchError, SearchQuery,
    SqliteItemRepository,
};

#[test]
fn finds_notes_by_derived_plaintext() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteItemRepository::try_new(&conn).unwrap();

    let hit = repo
        .create_item(
            &ItemDraft::new(ItemType::Note, "Plan")
                .with_content("# Roadmap\n\nShip the **gardening** feature", ContentType::Markdown),
        )
        .unwrap();
    repo.create_item(
        &ItemDraft::new(ItemType::Note, "Other")
            .with_content("unrelated body", ContentType::Plain),
    )
    .unwrap();

    let hits = search_items(&conn, &SearchQuery::new("gardening")).unwrap();
    assert_eq!(hits.len(), 1);
    assert_eq!(hits[0].item_id, hit.id);
    assert_eq!(hits[0].kind, ItemType::Note);
    assert_eq!(hits[0].title, "Plan");
    assert!(hits[0].snippet.contains("[gardening]"));
}

#[test]
fn finds_containers_by_title() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteItemRepository::try_new(&conn).unwrap();

    let book = repo
        .create_item(&ItemDraft::new(ItemType::Book, "Expedition journal"))
        .unwrap();

    let hits = search_items(&conn, &SearchQuery::new("expedition")).unwrap();
    assert_eq!(hits.len(), 1);
    assert_eq!(hits[0].item_id, book.id);
    assert_eq!(hits[0].kind, ItemType::Book);
}

#[test]
fn deleted_items_are_excluded() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteItemRepository::try_new(&conn).unwrap();

    let note = repo
        .create_item(
            &ItemDraft::new(ItemType::Note, "Plan")
                .with_content("ephemeral content", ContentType::Plain),
        )
        .unwrap();
    assert_eq!(
        search_items(&conn, &SearchQuery::new("ephemeral"))
            .unwrap()
            .len(),
        1
    );

    repo.delete_item(note.id).unwrap();
    assert!(search_items(&conn, &SearchQuery::new("ephemeral"))
        .unwrap()
        .is_empty());
}

#[test]
fn kind_filter_narrows_results() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteItemRepository::try_new(&conn).unwrap();

    repo.create_item(&ItemDraft::new(ItemType::Book, "Travel"))
        .unwrap();
    let note = repo
        .create_item(
            &ItemDraft::new(ItemType::Note, "Travel checklist")
                .with_content("passport tickets", ContentType::Plain),
        )
        .unwrap();

    let mut query = SearchQuery::new("travel");
    query.kind = Some(ItemType::Note);
    let hits = search_items(&conn, &query).unwrap();
    assert_eq!(hits.len(), 1);
    assert_eq!(hits[0].item_id, note.id);
}

#[test]
fn blank_query_and_zero_limit_return_empty() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteItemRepository::try_new(&conn).unwrap();
    repo.create_item(&ItemDraft::new(ItemType::Book, "anything"))
        .unwrap();

    assert!(search_items(&conn, &SearchQuery::new("   "))
        .unwrap()
        .is_empty());

    let mut query = SearchQuery::new("anything");
    query.limit = 0;
    assert!(search_items(&conn, &query).unwrap().is_empty());
}

#[test]
fn limit_caps_hit_count() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteItemRepository::try_new(&conn).unwrap();

    for index in 0..5 {
        repo.create_item(
            &ItemDraft::new(ItemType::Note, format!("note {index}"))
                .with_content("repeated keyword", ContentType::Plain),
        )
        .unwrap();
    }

    let mut query = SearchQuery::new("keyword");
    query.limit = 3;
    assert_eq!(search_items(&conn, &query).unwrap().len(), 3);
}

#[test]
fn quoted_terms_do_not_trip_fts_syntax() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteItemRepository::try_new(&conn).unwrap();
    repo.create_item(
        &ItemDraft::new(ItemType::Note, "Plan").with_content("a AND b", ContentType::Plain),
    )
    .unwrap();

    // Operators in user text are treated as literal terms.
    let hits = search_items(&conn, &SearchQuery::new("AND")).unwrap();
    assert_eq!(hits.len(), 1);
}

#[test]
fn raw_syntax_errors_surface_as_invalid_query() {
    let conn = open_db_in_memory().unwrap();

    let mut query = SearchQuery::new("\"unterminated");
    query.raw_fts_syntax = true;
    let err = search_items(&conn, &query).unwrap_err();
    assert!(matches!(err, SearchError::InvalidQuery { .. }));
}
