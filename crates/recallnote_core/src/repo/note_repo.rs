//! Note repository contract and SQLite implementation.
//!
//! # Responsibility
//! - Persist notes and their ordered highlight lists.
//! - Serve owner/subject scoped listings in manual order.
//!
//! # Invariants
//! - `replace_highlights` swaps the whole list in one immediate transaction.
//! - Highlight rows keep list order through `position`.
//! - Deleting a note deletes its highlights, never its cards.

use super::{ensure_tables, parse_uuid, RepoError, RepoResult};
use crate::model::note::{Annotation, NewNote, Note, NoteId, NotePatch};
use rusqlite::types::Value;
use rusqlite::{params, params_from_iter, Connection, Row, Transaction, TransactionBehavior};

const NOTE_SELECT_SQL: &str = "SELECT
    uuid,
    owner_id,
    subject,
    title,
    content,
    order_index,
    created_at,
    updated_at
FROM notes";

/// Listing filter. Results are ordered by `order_index` ascending.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NoteListQuery {
    pub owner_id: String,
    /// Restrict to one subject; `None` lists every subject.
    pub subject: Option<String>,
}

impl NoteListQuery {
    pub fn for_subject(owner_id: impl Into<String>, subject: impl Into<String>) -> Self {
        Self {
            owner_id: owner_id.into(),
            subject: Some(subject.into()),
        }
    }
}

/// Document-store operations on notes.
pub trait NoteRepository {
    fn create_note(&self, note: &NewNote) -> RepoResult<NoteId>;
    fn get_note(&self, id: NoteId) -> RepoResult<Option<Note>>;
    /// Applies the set fields of `patch`. Highlights are untouched.
    fn update_note(&self, id: NoteId, patch: &NotePatch) -> RepoResult<()>;
    /// Replaces the full highlight list.
    fn replace_highlights(&self, id: NoteId, highlights: &[Annotation]) -> RepoResult<()>;
    fn delete_note(&self, id: NoteId) -> RepoResult<()>;
    fn list_notes(&self, query: &NoteListQuery) -> RepoResult<Vec<Note>>;
    /// Highest `order_index` in one owner + subject, if any note exists.
    fn last_order_index(&self, owner_id: &str, subject: &str) -> RepoResult<Option<i64>>;
}

pub struct SqliteNoteRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteNoteRepository<'conn> {
    /// Wraps a migrated connection; fails fast when tables are missing.
    pub fn try_new(conn: &'conn Connection) -> RepoResult<Self> {
        ensure_tables(conn, &["notes", "note_highlights"])?;
        Ok(Self { conn })
    }
}

impl NoteRepository for SqliteNoteRepository<'_> {
    fn create_note(&self, note: &NewNote) -> RepoResult<NoteId> {
        note.validate()?;

        self.conn.execute(
            "INSERT INTO notes (
                uuid,
                owner_id,
                subject,
                title,
                content,
                order_index
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6);",
            params![
                note.id.to_string(),
                note.owner_id.as_str(),
                note.subject.as_str(),
                note.title.as_str(),
                note.content.as_str(),
                note.order_index,
            ],
        )?;

        Ok(note.id)
    }

    fn get_note(&self, id: NoteId) -> RepoResult<Option<Note>> {
        let mut stmt = self
            .conn
            .prepare(&format!("{NOTE_SELECT_SQL} WHERE uuid = ?1;"))?;
        let mut rows = stmt.query([id.to_string()])?;
        match rows.next()? {
            Some(row) => Ok(Some(parse_note_row(self.conn, row)?)),
            None => Ok(None),
        }
    }

    fn update_note(&self, id: NoteId, patch: &NotePatch) -> RepoResult<()> {
        let changed = self.conn.execute(
            "UPDATE notes
             SET
                title = COALESCE(?2, title),
                content = COALESCE(?3, content),
                order_index = COALESCE(?4, order_index),
                updated_at = (strftime('%s', 'now') * 1000)
             WHERE uuid = ?1;",
            params![
                id.to_string(),
                patch.title.as_deref(),
                patch.content.as_deref(),
                patch.order_index,
            ],
        )?;

        if changed == 0 {
            return Err(RepoError::NoteNotFound(id));
        }
        Ok(())
    }

    fn replace_highlights(&self, id: NoteId, highlights: &[Annotation]) -> RepoResult<()> {
        for annotation in highlights {
            annotation.validate()?;
        }

        let note_uuid = id.to_string();
        let tx = Transaction::new_unchecked(self.conn, TransactionBehavior::Immediate)?;
        if !note_exists(&tx, &note_uuid)? {
            return Err(RepoError::NoteNotFound(id));
        }

        tx.execute(
            "DELETE FROM note_highlights WHERE note_uuid = ?1;",
            [note_uuid.as_str()],
        )?;
        {
            let mut insert = tx.prepare(
                "INSERT INTO note_highlights (note_uuid, position, anchor_text, question)
                 VALUES (?1, ?2, ?3, ?4);",
            )?;
            for (position, annotation) in highlights.iter().enumerate() {
                insert.execute(params![
                    note_uuid.as_str(),
                    position as i64,
                    annotation.anchor_text.as_str(),
                    annotation.question.as_str(),
                ])?;
            }
        }
        tx.execute(
            "UPDATE notes
             SET updated_at = (strftime('%s', 'now') * 1000)
             WHERE uuid = ?1;",
            [note_uuid.as_str()],
        )?;

        tx.commit()?;
        Ok(())
    }

    fn delete_note(&self, id: NoteId) -> RepoResult<()> {
        let changed = self
            .conn
            .execute("DELETE FROM notes WHERE uuid = ?1;", [id.to_string()])?;
        if changed == 0 {
            return Err(RepoError::NoteNotFound(id));
        }
        Ok(())
    }

    fn list_notes(&self, query: &NoteListQuery) -> RepoResult<Vec<Note>> {
        let mut sql = format!("{NOTE_SELECT_SQL} WHERE owner_id = ?");
        let mut bind_values = vec![Value::Text(query.owner_id.clone())];

        if let Some(subject) = query.subject.as_ref() {
            sql.push_str(" AND subject = ?");
            bind_values.push(Value::Text(subject.clone()));
        }
        sql.push_str(" ORDER BY order_index ASC, created_at ASC, uuid ASC;");

        let mut stmt = self.conn.prepare(&sql)?;
        let mut rows = stmt.query(params_from_iter(bind_values))?;
        let mut notes = Vec::new();
        while let Some(row) = rows.next()? {
            notes.push(parse_note_row(self.conn, row)?);
        }
        Ok(notes)
    }

    fn last_order_index(&self, owner_id: &str, subject: &str) -> RepoResult<Option<i64>> {
        let last = self.conn.query_row(
            "SELECT MAX(order_index)
             FROM notes
             WHERE owner_id = ?1 AND subject = ?2;",
            [owner_id, subject],
            |row| row.get::<_, Option<i64>>(0),
        )?;
        Ok(last)
    }
}

fn parse_note_row(conn: &Connection, row: &Row<'_>) -> RepoResult<Note> {
    let uuid_text: String = row.get("uuid")?;
    let id = parse_uuid(&uuid_text, "notes.uuid")?;

    let note = Note {
        id,
        owner_id: row.get("owner_id")?,
        subject: row.get("subject")?,
        title: row.get("title")?,
        content: row.get("content")?,
        highlights: load_highlights(conn, &uuid_text)?,
        order_index: row.get("order_index")?,
        created_at: row.get("created_at")?,
        updated_at: row.get("updated_at")?,
    };
    note.validate()?;
    Ok(note)
}

fn load_highlights(conn: &Connection, note_uuid: &str) -> RepoResult<Vec<Annotation>> {
    let mut stmt = conn.prepare(
        "SELECT anchor_text, question
         FROM note_highlights
         WHERE note_uuid = ?1
         ORDER BY position ASC;",
    )?;
    let mut rows = stmt.query([note_uuid])?;
    let mut highlights = Vec::new();
    while let Some(row) = rows.next()? {
        highlights.push(Annotation::new(
            row.get::<_, String>("anchor_text")?,
            row.get::<_, String>("question")?,
        ));
    }
    Ok(highlights)
}

fn note_exists(tx: &Transaction<'_>, note_uuid: &str) -> RepoResult<bool> {
    let exists: i64 = tx.query_row(
        "SELECT EXISTS(SELECT 1 FROM notes WHERE uuid = ?1);",
        [note_uuid],
        |row| row.get(0),
    )?;
    Ok(exists == 1)
}
