//! Action-boundary error taxonomy.
//!
//! # Responsibility
//! - Classify every failure of a user action as not-found, permission,
//!   empty input, unavailable store, invalid selection or storage failure.
//! - Provide the user-facing message shown at the action boundary.
//!
//! # Invariants
//! - `NotFound`, `PermissionDenied` and `EmptyInput` are raised before any
//!   mutation is attempted.
//! - User messages never include note content or question text.

use crate::markup::range::RangeError;
use crate::model::card::CardId;
use crate::model::note::NoteId;
use crate::model::ValidationError;
use crate::repo::RepoError;
use std::error::Error;
use std::fmt::{Display, Formatter};

pub type StudyResult<T> = Result<T, StudyError>;

/// Record addressed by a failed action.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecordRef {
    Note(NoteId),
    Card(CardId),
}

impl Display for RecordRef {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Note(id) => write!(f, "note {id}"),
            Self::Card(id) => write!(f, "card {id}"),
        }
    }
}

/// Input rejected by local validation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputField {
    Question,
    Selection,
    Subject,
    /// Highlight anchor text.
    Highlight,
    /// No note is open for an action that needs one.
    Note,
}

impl InputField {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Question => "question",
            Self::Selection => "selection",
            Self::Subject => "subject",
            Self::Highlight => "highlight",
            Self::Note => "note",
        }
    }
}

#[derive(Debug)]
pub enum StudyError {
    NotFound(RecordRef),
    PermissionDenied(RecordRef),
    EmptyInput(InputField),
    StoreUnavailable,
    InvalidSelection(RangeError),
    Repo(RepoError),
}

impl StudyError {
    /// Stable machine-readable code.
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::NotFound(_) => "not_found",
            Self::PermissionDenied(_) => "permission_denied",
            Self::EmptyInput(_) => "empty_input",
            Self::StoreUnavailable => "store_unavailable",
            Self::InvalidSelection(_) => "invalid_selection",
            Self::Repo(_) => "storage_error",
        }
    }

    /// Message shown to the user at the action boundary.
    pub fn user_message(&self) -> String {
        match self {
            Self::NotFound(RecordRef::Note(_)) => "This note no longer exists.".to_string(),
            Self::NotFound(RecordRef::Card(_)) => "This card no longer exists.".to_string(),
            Self::PermissionDenied(_) => {
                "You do not have permission to change this item.".to_string()
            }
            Self::EmptyInput(InputField::Question) => "Please enter a question.".to_string(),
            Self::EmptyInput(InputField::Selection) => "Please select some text first.".to_string(),
            Self::EmptyInput(InputField::Subject) => "Please choose a subject.".to_string(),
            Self::EmptyInput(InputField::Highlight) => {
                "The highlight has no text to keep.".to_string()
            }
            Self::EmptyInput(InputField::Note) => "Save the note before doing this.".to_string(),
            Self::StoreUnavailable => {
                "Storage is not ready yet. Please try again in a moment.".to_string()
            }
            Self::InvalidSelection(_) => "The selection could not be highlighted.".to_string(),
            Self::Repo(_) => "Saving failed. Please try again.".to_string(),
        }
    }
}

impl Display for StudyError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::NotFound(record) => write!(f, "{record} not found"),
            Self::PermissionDenied(record) => write!(f, "permission denied for {record}"),
            Self::EmptyInput(field) => write!(f, "{} must not be empty", field.as_str()),
            Self::StoreUnavailable => write!(f, "store is not initialized"),
            Self::InvalidSelection(err) => write!(f, "invalid selection: {err}"),
            Self::Repo(err) => write!(f, "{err}"),
        }
    }
}

impl Error for StudyError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::InvalidSelection(err) => Some(err),
            Self::Repo(err) => Some(err),
            Self::NotFound(_)
            | Self::PermissionDenied(_)
            | Self::EmptyInput(_)
            | Self::StoreUnavailable => None,
        }
    }
}

impl From<RepoError> for StudyError {
    fn from(value: RepoError) -> Self {
        match value {
            RepoError::NoteNotFound(id) => Self::NotFound(RecordRef::Note(id)),
            RepoError::CardNotFound(id) => Self::NotFound(RecordRef::Card(id)),
            RepoError::Validation(err) => Self::from(err),
            other => Self::Repo(other),
        }
    }
}

impl From<ValidationError> for StudyError {
    fn from(value: ValidationError) -> Self {
        match value {
            ValidationError::EmptyQuestion => Self::EmptyInput(InputField::Question),
            ValidationError::EmptySubject => Self::EmptyInput(InputField::Subject),
            ValidationError::EmptyAnchorText => Self::EmptyInput(InputField::Highlight),
            other => Self::Repo(RepoError::Validation(other)),
        }
    }
}

impl From<RangeError> for StudyError {
    fn from(value: RangeError) -> Self {
        match value {
            RangeError::Collapsed => Self::EmptyInput(InputField::Selection),
            other => Self::InvalidSelection(other),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{InputField, RecordRef, StudyError};
    use crate::markup::range::RangeError;
    use crate::model::ValidationError;
    use crate::repo::RepoError;
    use uuid::Uuid;

    #[test]
    fn repo_not_found_maps_to_record_not_found() {
        let id = Uuid::new_v4();
        let err = StudyError::from(RepoError::NoteNotFound(id));
        assert!(matches!(err, StudyError::NotFound(RecordRef::Note(found)) if found == id));
        assert_eq!(err.error_code(), "not_found");
    }

    #[test]
    fn validation_failures_map_to_empty_input() {
        let err = StudyError::from(RepoError::Validation(ValidationError::EmptyQuestion));
        assert!(matches!(err, StudyError::EmptyInput(InputField::Question)));

        let err = StudyError::from(ValidationError::EmptyOwner);
        assert_eq!(err.error_code(), "storage_error");
    }

    #[test]
    fn collapsed_range_is_an_empty_selection() {
        let err = StudyError::from(RangeError::Collapsed);
        assert!(matches!(err, StudyError::EmptyInput(InputField::Selection)));
        let err = StudyError::from(RangeError::Reversed);
        assert_eq!(err.error_code(), "invalid_selection");
    }

    #[test]
    fn user_messages_are_plain_sentences() {
        let err = StudyError::StoreUnavailable;
        assert!(err.user_message().ends_with('.'));
        assert_eq!(err.to_string(), "store is not initialized");
    }
}
