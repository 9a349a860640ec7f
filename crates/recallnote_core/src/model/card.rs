//! Flashcard records promoted from highlight annotations.
//!
//! # Invariants
//! - A card is a copy: editing it never touches the source note.
//! - `note_id` is a non-owning back-reference; note deletion leaves cards.

use super::note::NoteId;
use super::{OwnerId, ValidationError};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Stable identifier for a card record.
pub type CardId = Uuid;

/// Reviewable question/answer card.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Card {
    pub id: CardId,
    pub owner_id: OwnerId,
    pub note_id: NoteId,
    pub question: String,
    /// Rich answer body captured from the highlight's inner HTML.
    pub answer_content: String,
    /// Epoch milliseconds.
    pub created_at: i64,
}

impl Card {
    pub fn validate(&self) -> Result<(), ValidationError> {
        validate_card_fields(&self.owner_id, &self.question)
    }
}

/// Insert shape for a card.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewCard {
    pub id: CardId,
    pub owner_id: OwnerId,
    pub note_id: NoteId,
    pub question: String,
    pub answer_content: String,
}

impl NewCard {
    pub fn new(
        owner_id: impl Into<OwnerId>,
        note_id: NoteId,
        question: impl Into<String>,
        answer_content: impl Into<String>,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            owner_id: owner_id.into(),
            note_id,
            question: question.into(),
            answer_content: answer_content.into(),
        }
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        validate_card_fields(&self.owner_id, &self.question)
    }
}

fn validate_card_fields(owner_id: &str, question: &str) -> Result<(), ValidationError> {
    if owner_id.trim().is_empty() {
        return Err(ValidationError::EmptyOwner);
    }
    if question.trim().is_empty() {
        return Err(ValidationError::EmptyQuestion);
    }
    Ok(())
}
