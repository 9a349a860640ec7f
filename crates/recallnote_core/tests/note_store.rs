use recallnote_core::{
    open_db_in_memory, Annotation, CardRepository, NewCard, NewNote, NoteListQuery, NotePatch,
    NoteRepository, RepoError, SqliteCardRepository, SqliteNoteRepository, ValidationError,
};
use rusqlite::Connection;
use uuid::Uuid;

fn new_note(owner: &str, subject: &str, order_index: i64) -> NewNote {
    NewNote::new(owner, subject, "Title", "<p>body</p>", order_index)
}

#[test]
fn create_then_get_round_trips_fields() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteNoteRepository::try_new(&conn).unwrap();

    let draft = new_note("user-1", "SP1", 3);
    let id = repo.create_note(&draft).unwrap();
    let stored = repo.get_note(id).unwrap().unwrap();

    assert_eq!(stored.id, draft.id);
    assert_eq!(stored.owner_id, "user-1");
    assert_eq!(stored.subject, "SP1");
    assert_eq!(stored.content, "<p>body</p>");
    assert_eq!(stored.order_index, 3);
    assert!(stored.highlights.is_empty());
    assert!(stored.created_at > 0);
}

#[test]
fn get_missing_note_returns_none() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteNoteRepository::try_new(&conn).unwrap();
    assert!(repo.get_note(Uuid::new_v4()).unwrap().is_none());
}

#[test]
fn replace_highlights_swaps_the_whole_list_in_order() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteNoteRepository::try_new(&conn).unwrap();
    let id = repo.create_note(&new_note("user-1", "SP1", 1)).unwrap();

    let first = vec![Annotation::new("a", "qa"), Annotation::new("b", "qb")];
    repo.replace_highlights(id, &first).unwrap();
    let second = vec![Annotation::new("c", "qc"), Annotation::new("a", "qa")];
    repo.replace_highlights(id, &second).unwrap();

    assert_eq!(repo.get_note(id).unwrap().unwrap().highlights, second);
}

#[test]
fn replace_highlights_rejects_invalid_entries_before_writing() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteNoteRepository::try_new(&conn).unwrap();
    let id = repo.create_note(&new_note("user-1", "SP1", 1)).unwrap();
    repo.replace_highlights(id, &[Annotation::new("kept", "q")])
        .unwrap();

    let err = repo
        .replace_highlights(id, &[Annotation::new("x", "  ")])
        .unwrap_err();
    assert!(matches!(
        err,
        RepoError::Validation(ValidationError::EmptyQuestion)
    ));
    assert_eq!(
        repo.get_note(id).unwrap().unwrap().highlights,
        vec![Annotation::new("kept", "q")]
    );
}

#[test]
fn mutations_on_missing_note_report_not_found() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteNoteRepository::try_new(&conn).unwrap();
    let missing = Uuid::new_v4();

    assert!(matches!(
        repo.update_note(missing, &NotePatch::default()),
        Err(RepoError::NoteNotFound(id)) if id == missing
    ));
    assert!(matches!(
        repo.replace_highlights(missing, &[]),
        Err(RepoError::NoteNotFound(_))
    ));
    assert!(matches!(
        repo.delete_note(missing),
        Err(RepoError::NoteNotFound(_))
    ));
}

#[test]
fn update_applies_only_set_fields_and_keeps_highlights() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteNoteRepository::try_new(&conn).unwrap();
    let id = repo.create_note(&new_note("user-1", "SP1", 1)).unwrap();
    repo.replace_highlights(id, &[Annotation::new("body", "q")])
        .unwrap();

    repo.update_note(
        id,
        &NotePatch {
            content: Some("<p>new body</p>".to_string()),
            ..NotePatch::default()
        },
    )
    .unwrap();

    let stored = repo.get_note(id).unwrap().unwrap();
    assert_eq!(stored.title, "Title");
    assert_eq!(stored.content, "<p>new body</p>");
    assert_eq!(stored.highlights.len(), 1);
}

#[test]
fn list_is_scoped_by_owner_and_subject_and_ordered() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteNoteRepository::try_new(&conn).unwrap();
    let second = repo.create_note(&new_note("user-1", "SP1", 2)).unwrap();
    let first = repo.create_note(&new_note("user-1", "SP1", 1)).unwrap();
    repo.create_note(&new_note("user-1", "CM1", 1)).unwrap();
    repo.create_note(&new_note("user-2", "SP1", 1)).unwrap();

    let listed: Vec<_> = repo
        .list_notes(&NoteListQuery::for_subject("user-1", "SP1"))
        .unwrap()
        .into_iter()
        .map(|note| note.id)
        .collect();
    assert_eq!(listed, vec![first, second]);

    let all = repo
        .list_notes(&NoteListQuery {
            owner_id: "user-1".to_string(),
            subject: None,
        })
        .unwrap();
    assert_eq!(all.len(), 3);

    assert_eq!(repo.last_order_index("user-1", "SP1").unwrap(), Some(2));
    assert_eq!(repo.last_order_index("user-3", "SP1").unwrap(), None);
}

#[test]
fn cards_are_listed_per_note_in_creation_order() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteCardRepository::try_new(&conn).unwrap();
    let note_id = Uuid::new_v4();

    let first = repo
        .create_card(&NewCard::new("user-1", note_id, "q1", "a1"))
        .unwrap();
    let second = repo
        .create_card(&NewCard::new("user-1", note_id, "q2", "a2"))
        .unwrap();
    repo.create_card(&NewCard::new("user-1", Uuid::new_v4(), "other", ""))
        .unwrap();
    repo.create_card(&NewCard::new("user-2", note_id, "foreign", ""))
        .unwrap();

    let ids: Vec<_> = repo
        .list_cards_for_note("user-1", note_id)
        .unwrap()
        .into_iter()
        .map(|card| card.id)
        .collect();
    assert_eq!(ids, vec![first, second]);
}

#[test]
fn card_update_and_delete_report_missing_rows() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteCardRepository::try_new(&conn).unwrap();
    let id = repo
        .create_card(&NewCard::new("user-1", Uuid::new_v4(), "q", "a"))
        .unwrap();

    repo.update_card(id, "new q", "<b>new a</b>").unwrap();
    let stored = repo.get_card(id).unwrap().unwrap();
    assert_eq!(stored.question, "new q");
    assert_eq!(stored.answer_content, "<b>new a</b>");

    repo.delete_card(id).unwrap();
    assert!(matches!(repo.delete_card(id), Err(RepoError::CardNotFound(_))));
    assert!(matches!(
        repo.update_card(id, "q", "a"),
        Err(RepoError::CardNotFound(_))
    ));
}

#[test]
fn repositories_require_migrated_connection() {
    let conn = Connection::open_in_memory().unwrap();
    assert!(matches!(
        SqliteNoteRepository::try_new(&conn),
        Err(RepoError::MissingRequiredTable("notes"))
    ));
    assert!(matches!(
        SqliteCardRepository::try_new(&conn),
        Err(RepoError::MissingRequiredTable("cards"))
    ));
}

#[test]
fn invalid_persisted_rows_are_rejected_on_read() {
    let conn = open_db_in_memory().unwrap();
    conn.execute(
        "INSERT INTO notes (uuid, owner_id, subject) VALUES ('not-a-uuid', 'user-1', 'SP1');",
        [],
    )
    .unwrap();
    let repo = SqliteNoteRepository::try_new(&conn).unwrap();

    let err = repo
        .list_notes(&NoteListQuery::for_subject("user-1", "SP1"))
        .unwrap_err();
    assert!(matches!(err, RepoError::InvalidData(_)));
}
