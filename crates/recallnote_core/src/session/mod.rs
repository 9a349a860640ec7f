//! Stateful note workspace driven by UI events.
//!
//! # Responsibility
//! - Own the open note, both surfaces, the capture popup, the question view
//!   and the review deck as one explicit state object.
//! - Persist every annotation change as a full highlight-list replacement.
//!
//! # Invariants
//! - Every store-backed action fails with `StoreUnavailable` before touching
//!   any state when no store is attached.
//! - `&mut self` serializes captures: a second capture cannot start before
//!   the previous persist returned.
//! - A failed persist leaves the surfaces as they are.

mod note_session;
pub mod review;

pub use note_session::{NoteSession, QuestionView, StudyServices};
pub use review::{CardDraft, DeckStatus, ReviewDeck, ReviewKey};
