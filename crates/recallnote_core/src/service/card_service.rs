//! Card use-case service.
//!
//! # Invariants
//! - Cards are created only by promotion and never touch their note.
//! - Stored questions are trimmed and non-blank.

use super::Actor;
use crate::error::{InputField, RecordRef, StudyError, StudyResult};
use crate::model::card::{Card, CardId, NewCard};
use crate::model::note::NoteId;
use crate::repo::CardRepository;

pub struct CardService<R: CardRepository> {
    repo: R,
}

impl<R: CardRepository> CardService<R> {
    pub fn new(repo: R) -> Self {
        Self { repo }
    }

    /// Copies a highlight's question and inner markup into a new card.
    ///
    /// Does not look at the note; `StudyServices::promote_card` checks it.
    pub fn promote(
        &self,
        actor: &Actor,
        note_id: NoteId,
        question: &str,
        answer_content: &str,
    ) -> StudyResult<Card> {
        let question = non_blank_question(question)?;
        let card = NewCard::new(actor.id.clone(), note_id, question, answer_content);
        let id = self.repo.create_card(&card)?;
        self.read_back(id)
    }

    /// Cards promoted from `note_id`, oldest first.
    pub fn list_for_note(&self, actor: &Actor, note_id: NoteId) -> StudyResult<Vec<Card>> {
        Ok(self.repo.list_cards_for_note(&actor.id, note_id)?)
    }

    /// Saves an edited card. Both fields are trimmed.
    pub fn update_card(
        &self,
        actor: &Actor,
        id: CardId,
        question: &str,
        answer_content: &str,
    ) -> StudyResult<Card> {
        let question = non_blank_question(question)?;
        self.ensure_owned(actor, id)?;
        self.repo
            .update_card(id, question, answer_content.trim())?;
        self.read_back(id)
    }

    pub fn delete_card(&self, actor: &Actor, id: CardId) -> StudyResult<()> {
        self.ensure_owned(actor, id)?;
        self.repo.delete_card(id)?;
        Ok(())
    }

    pub fn ensure_owned(&self, actor: &Actor, id: CardId) -> StudyResult<Card> {
        let card = self
            .repo
            .get_card(id)?
            .ok_or(StudyError::NotFound(RecordRef::Card(id)))?;
        if !actor.owns(&card.owner_id) {
            return Err(StudyError::PermissionDenied(RecordRef::Card(id)));
        }
        Ok(card)
    }

    fn read_back(&self, id: CardId) -> StudyResult<Card> {
        self.repo
            .get_card(id)?
            .ok_or(StudyError::NotFound(RecordRef::Card(id)))
    }
}

fn non_blank_question(question: &str) -> StudyResult<&str> {
    let question = question.trim();
    if question.is_empty() {
        return Err(StudyError::EmptyInput(InputField::Question));
    }
    Ok(question)
}
