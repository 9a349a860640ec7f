//! Use-case services over the repositories.
//!
//! # Responsibility
//! - Enforce ownership before every read or mutation of a record.
//! - Turn repository results into the action-boundary taxonomy.
//!
//! # Invariants
//! - A permission or not-found failure happens before any write.

pub mod card_service;
pub mod note_service;

pub use card_service::CardService;
pub use note_service::NoteService;

use crate::model::OwnerId;

/// Signed-in actor, as reported by the external auth layer.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Actor {
    pub id: OwnerId,
}

impl Actor {
    pub fn new(id: impl Into<OwnerId>) -> Self {
        Self { id: id.into() }
    }

    pub fn owns(&self, owner_id: &str) -> bool {
        self.id == owner_id
    }
}
