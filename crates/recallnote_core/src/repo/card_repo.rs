//! Card repository contract and SQLite implementation.
//!
//! # Invariants
//! - Cards are listed per note in creation order.
//! - `note_uuid` is not a foreign key; cards survive note deletion.

use super::{ensure_tables, parse_uuid, RepoError, RepoResult};
use crate::model::card::{Card, CardId, NewCard};
use crate::model::note::NoteId;
use crate::model::ValidationError;
use rusqlite::{params, Connection, Row};

const CARD_SELECT_SQL: &str = "SELECT
    uuid,
    owner_id,
    note_uuid,
    question,
    answer_content,
    created_at
FROM cards";

/// Document-store operations on cards.
pub trait CardRepository {
    fn create_card(&self, card: &NewCard) -> RepoResult<CardId>;
    fn get_card(&self, id: CardId) -> RepoResult<Option<Card>>;
    /// Overwrites question and answer.
    fn update_card(&self, id: CardId, question: &str, answer_content: &str) -> RepoResult<()>;
    fn delete_card(&self, id: CardId) -> RepoResult<()>;
    fn list_cards_for_note(&self, owner_id: &str, note_id: NoteId) -> RepoResult<Vec<Card>>;
}

pub struct SqliteCardRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteCardRepository<'conn> {
    pub fn try_new(conn: &'conn Connection) -> RepoResult<Self> {
        ensure_tables(conn, &["cards"])?;
        Ok(Self { conn })
    }
}

impl CardRepository for SqliteCardRepository<'_> {
    fn create_card(&self, card: &NewCard) -> RepoResult<CardId> {
        card.validate()?;

        self.conn.execute(
            "INSERT INTO cards (
                uuid,
                owner_id,
                note_uuid,
                question,
                answer_content
            ) VALUES (?1, ?2, ?3, ?4, ?5);",
            params![
                card.id.to_string(),
                card.owner_id.as_str(),
                card.note_id.to_string(),
                card.question.as_str(),
                card.answer_content.as_str(),
            ],
        )?;

        Ok(card.id)
    }

    fn get_card(&self, id: CardId) -> RepoResult<Option<Card>> {
        let mut stmt = self
            .conn
            .prepare(&format!("{CARD_SELECT_SQL} WHERE uuid = ?1;"))?;
        let mut rows = stmt.query([id.to_string()])?;
        match rows.next()? {
            Some(row) => Ok(Some(parse_card_row(row)?)),
            None => Ok(None),
        }
    }

    fn update_card(&self, id: CardId, question: &str, answer_content: &str) -> RepoResult<()> {
        if question.trim().is_empty() {
            return Err(ValidationError::EmptyQuestion.into());
        }

        let changed = self.conn.execute(
            "UPDATE cards
             SET question = ?2, answer_content = ?3
             WHERE uuid = ?1;",
            params![id.to_string(), question, answer_content],
        )?;
        if changed == 0 {
            return Err(RepoError::CardNotFound(id));
        }
        Ok(())
    }

    fn delete_card(&self, id: CardId) -> RepoResult<()> {
        let changed = self
            .conn
            .execute("DELETE FROM cards WHERE uuid = ?1;", [id.to_string()])?;
        if changed == 0 {
            return Err(RepoError::CardNotFound(id));
        }
        Ok(())
    }

    fn list_cards_for_note(&self, owner_id: &str, note_id: NoteId) -> RepoResult<Vec<Card>> {
        let mut stmt = self.conn.prepare(&format!(
            "{CARD_SELECT_SQL}
             WHERE owner_id = ?1 AND note_uuid = ?2
             ORDER BY created_at ASC, rowid ASC;"
        ))?;
        let mut rows = stmt.query(params![owner_id, note_id.to_string()])?;
        let mut cards = Vec::new();
        while let Some(row) = rows.next()? {
            cards.push(parse_card_row(row)?);
        }
        Ok(cards)
    }
}

fn parse_card_row(row: &Row<'_>) -> RepoResult<Card> {
    let id_text: String = row.get("uuid")?;
    let note_text: String = row.get("note_uuid")?;

    let card = Card {
        id: parse_uuid(&id_text, "cards.uuid")?,
        owner_id: row.get("owner_id")?,
        note_id: parse_uuid(&note_text, "cards.note_uuid")?,
        question: row.get("question")?,
        answer_content: row.get("answer_content")?,
        created_at: row.get("created_at")?,
    };
    card.validate()?;
    Ok(card)
}
