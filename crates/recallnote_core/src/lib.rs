//! Core of RecallNote: highlight annotations over rich-text study notes and
//! the flashcards promoted from them.
//! This crate is the single source of truth for annotation and card rules.

pub mod annotate;
pub mod config;
pub mod db;
pub mod error;
pub mod logging;
pub mod markup;
pub mod model;
pub mod repo;
pub mod service;
pub mod session;

pub use annotate::{resolve_highlights, Mode, ModeSynchronizer, Transition};
pub use config::CoreConfig;
pub use db::{open_db, open_db_in_memory, DbError, DbResult};
pub use error::{InputField, RecordRef, StudyError, StudyResult};
pub use logging::{
    default_log_level, init_logging, init_logging_from_config, logging_status, LoggingError,
};
pub use markup::highlight::{collect_annotations, strip_highlights_html};
pub use markup::range::{BoundaryPoint, RangeError, TextRange};
pub use markup::tree::RichDoc;
pub use model::card::{Card, CardId, NewCard};
pub use model::note::{Annotation, NewNote, Note, NoteId, NotePatch, DEFAULT_NOTE_TITLE};
pub use model::{OwnerId, ValidationError};
pub use repo::{
    CardRepository, NoteListQuery, NoteRepository, RepoError, RepoResult, SqliteCardRepository,
    SqliteNoteRepository,
};
pub use service::{Actor, CardService, NoteService};
pub use session::{DeckStatus, NoteSession, QuestionView, ReviewDeck, ReviewKey, StudyServices};

/// Minimal health-check API for early integration.
pub fn ping() -> &'static str {
    "pong"
}

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
