//! Note and annotation records.
//!
//! # Responsibility
//! - Describe the stored note shape, including its ordered highlight list.
//! - Describe one highlight annotation as anchor text plus question.
//!
//! # Invariants
//! - `Annotation.anchor_text` is non-empty; `question` is non-blank.
//! - Annotations carry no offsets. They are re-located by literal text match
//!   on every render, in list order.

use super::{OwnerId, ValidationError};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Stable identifier for a note record.
pub type NoteId = Uuid;

/// Title used when a note is saved without one.
pub const DEFAULT_NOTE_TITLE: &str = "Untitled Note";

/// One highlighted span plus the question attached to it.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Annotation {
    /// Raw text of the span as it appeared when it was captured.
    ///
    /// Serialized as `text` to stay compatible with exported highlight lists.
    #[serde(rename = "text")]
    pub anchor_text: String,
    /// Free-form user question.
    pub question: String,
}

impl Annotation {
    pub fn new(anchor_text: impl Into<String>, question: impl Into<String>) -> Self {
        Self {
            anchor_text: anchor_text.into(),
            question: question.into(),
        }
    }

    /// Checks the annotation field rules.
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.anchor_text.is_empty() {
            return Err(ValidationError::EmptyAnchorText);
        }
        if self.question.trim().is_empty() {
            return Err(ValidationError::EmptyQuestion);
        }
        Ok(())
    }

    /// Whether the resolver should try to place this annotation at all.
    pub fn is_renderable(&self) -> bool {
        self.validate().is_ok()
    }
}

/// Canonical stored note.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Note {
    pub id: NoteId,
    pub owner_id: OwnerId,
    pub subject: String,
    pub title: String,
    /// Annotation-free HTML body.
    pub content: String,
    /// Highlights in insertion order; earlier entries claim matches first.
    pub highlights: Vec<Annotation>,
    /// Manual list position within one owner + subject.
    pub order_index: i64,
    /// Epoch milliseconds.
    pub created_at: i64,
    /// Epoch milliseconds.
    pub updated_at: i64,
}

impl Note {
    /// Checks owner/subject presence and every annotation.
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.owner_id.trim().is_empty() {
            return Err(ValidationError::EmptyOwner);
        }
        if self.subject.trim().is_empty() {
            return Err(ValidationError::EmptySubject);
        }
        for annotation in &self.highlights {
            annotation.validate()?;
        }
        Ok(())
    }
}

/// Insert shape for a note that does not exist yet.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewNote {
    pub id: NoteId,
    pub owner_id: OwnerId,
    pub subject: String,
    pub title: String,
    pub content: String,
    pub order_index: i64,
}

impl NewNote {
    /// Builds an insert shape with a fresh id and an empty highlight list.
    pub fn new(
        owner_id: impl Into<OwnerId>,
        subject: impl Into<String>,
        title: impl Into<String>,
        content: impl Into<String>,
        order_index: i64,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            owner_id: owner_id.into(),
            subject: subject.into(),
            title: title.into(),
            content: content.into(),
            order_index,
        }
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.owner_id.trim().is_empty() {
            return Err(ValidationError::EmptyOwner);
        }
        if self.subject.trim().is_empty() {
            return Err(ValidationError::EmptySubject);
        }
        Ok(())
    }
}

/// Partial update for a note. `None` leaves the stored field untouched.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NotePatch {
    pub title: Option<String>,
    pub content: Option<String>,
    pub order_index: Option<i64>,
}

impl NotePatch {
    pub fn is_empty(&self) -> bool {
        self.title.is_none() && self.content.is_none() && self.order_index.is_none()
    }
}
