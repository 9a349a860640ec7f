//! Domain model for study notes, their highlight annotations and cards.
//!
//! # Responsibility
//! - Define canonical data structures shared by markup, store and services.
//! - Own field-level validation rules for every persisted record.
//!
//! # Invariants
//! - `Note.content` never carries highlight markup; highlights are an overlay.
//! - Cards are copies of annotations, never views onto a note.

use std::error::Error;
use std::fmt::{Display, Formatter};

pub mod card;
pub mod note;

/// Identity of the signed-in actor, supplied by the external auth layer.
pub type OwnerId = String;

/// Field-level validation failures for domain records.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    /// Record owner id is blank.
    EmptyOwner,
    /// Note subject is blank.
    EmptySubject,
    /// Annotation anchor text is empty.
    EmptyAnchorText,
    /// Annotation or card question is blank after trim.
    EmptyQuestion,
}

impl Display for ValidationError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::EmptyOwner => write!(f, "owner id must not be empty"),
            Self::EmptySubject => write!(f, "subject must not be empty"),
            Self::EmptyAnchorText => write!(f, "annotation anchor text must not be empty"),
            Self::EmptyQuestion => write!(f, "question must not be empty"),
        }
    }
}

impl Error for ValidationError {}
