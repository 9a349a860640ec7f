//! Flashcard review deck.
//!
//! # Responsibility
//! - Hold the working set of cards for one note and the reviewer cursor.
//! - Apply in-place edits and deletions to storage and to the working set.
//!
//! # Invariants
//! - `index < cards.len()` whenever the deck is non-empty; `0` otherwise.
//! - Navigation is bounded at both ends and always hides the answer.
//! - Key input is ignored while a card is being edited.

use crate::error::{InputField, StudyError, StudyResult};
use crate::model::card::Card;
use crate::model::note::NoteId;
use crate::repo::CardRepository;
use crate::service::{Actor, CardService};

/// Editable copy of the current card's fields.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CardDraft {
    pub question: String,
    pub answer_content: String,
}

/// Keys the reviewer reacts to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReviewKey {
    ArrowRight,
    ArrowLeft,
    Space,
    Other,
}

impl ReviewKey {
    /// Maps a DOM-style key name.
    pub fn from_key_name(name: &str) -> Self {
        match name {
            "ArrowRight" => Self::ArrowRight,
            "ArrowLeft" => Self::ArrowLeft,
            " " | "Space" | "Spacebar" => Self::Space,
            _ => Self::Other,
        }
    }
}

/// Whether the reviewer stays open after a deletion.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeckStatus {
    Open,
    Closed,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReviewDeck {
    note_id: NoteId,
    cards: Vec<Card>,
    index: usize,
    answer_visible: bool,
    draft: Option<CardDraft>,
}

impl ReviewDeck {
    pub fn new(note_id: NoteId, cards: Vec<Card>) -> Self {
        Self {
            note_id,
            cards,
            index: 0,
            answer_visible: false,
            draft: None,
        }
    }

    /// Loads every card of `note_id` the actor owns.
    pub fn load<C: CardRepository>(
        cards: &CardService<C>,
        actor: &Actor,
        note_id: NoteId,
    ) -> StudyResult<Self> {
        Ok(Self::new(note_id, cards.list_for_note(actor, note_id)?))
    }

    pub fn note_id(&self) -> NoteId {
        self.note_id
    }

    pub fn cards(&self) -> &[Card] {
        &self.cards
    }

    pub fn len(&self) -> usize {
        self.cards.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cards.is_empty()
    }

    pub fn index(&self) -> usize {
        self.index
    }

    pub fn current(&self) -> Option<&Card> {
        self.cards.get(self.index)
    }

    pub fn answer_visible(&self) -> bool {
        self.answer_visible
    }

    pub fn is_editing(&self) -> bool {
        self.draft.is_some()
    }

    pub fn draft(&self) -> Option<&CardDraft> {
        self.draft.as_ref()
    }

    /// Editable draft, for the UI to write typed values into.
    pub fn draft_mut(&mut self) -> Option<&mut CardDraft> {
        self.draft.as_mut()
    }

    /// `Card i of N`, 1-based; `Card 0 of 0` when empty.
    pub fn position_label(&self) -> String {
        if self.cards.is_empty() {
            return "Card 0 of 0".to_string();
        }
        format!("Card {} of {}", self.index + 1, self.cards.len())
    }

    /// Moves forward; no-op on the last card.
    pub fn next(&mut self) -> bool {
        if self.index + 1 >= self.cards.len() {
            return false;
        }
        self.index += 1;
        self.reset_view();
        true
    }

    /// Moves back; no-op on the first card.
    pub fn prev(&mut self) -> bool {
        if self.index == 0 {
            return false;
        }
        self.index -= 1;
        self.reset_view();
        true
    }

    pub fn toggle_answer(&mut self) {
        if !self.cards.is_empty() {
            self.answer_visible = !self.answer_visible;
        }
    }

    /// Starts editing the current card with its stored values.
    pub fn begin_edit(&mut self) -> Option<&mut CardDraft> {
        let card = self.cards.get(self.index)?;
        self.draft = Some(CardDraft {
            question: card.question.clone(),
            answer_content: card.answer_content.clone(),
        });
        self.draft.as_mut()
    }

    pub fn cancel_edit(&mut self) {
        self.draft = None;
    }

    /// Writes the draft to storage and to the working set.
    ///
    /// Without a draft this is a no-op.
    pub fn save_edit<C: CardRepository>(
        &mut self,
        cards: &CardService<C>,
        actor: &Actor,
    ) -> StudyResult<()> {
        let Some(draft) = self.draft.as_ref() else {
            return Ok(());
        };
        let Some(current) = self.cards.get(self.index) else {
            self.draft = None;
            return Ok(());
        };
        if draft.question.trim().is_empty() {
            return Err(StudyError::EmptyInput(InputField::Question));
        }

        let saved = cards.update_card(actor, current.id, &draft.question, &draft.answer_content)?;
        self.cards[self.index] = saved;
        self.draft = None;
        Ok(())
    }

    /// Deletes the current card from storage and from the working set.
    pub fn delete_current<C: CardRepository>(
        &mut self,
        cards: &CardService<C>,
        actor: &Actor,
    ) -> StudyResult<DeckStatus> {
        let Some(current) = self.cards.get(self.index) else {
            return Ok(DeckStatus::Closed);
        };
        cards.delete_card(actor, current.id)?;

        self.cards.remove(self.index);
        self.draft = None;
        if self.cards.is_empty() {
            self.index = 0;
            return Ok(DeckStatus::Closed);
        }
        if self.index >= self.cards.len() {
            self.index = self.cards.len() - 1;
        }
        self.answer_visible = false;
        Ok(DeckStatus::Open)
    }

    /// Applies a key press. Returns whether the deck state changed.
    pub fn handle_key(&mut self, key: ReviewKey) -> bool {
        if self.is_editing() {
            return false;
        }
        match key {
            ReviewKey::ArrowRight => self.next(),
            ReviewKey::ArrowLeft => self.prev(),
            ReviewKey::Space => {
                let before = self.answer_visible;
                self.toggle_answer();
                before != self.answer_visible
            }
            ReviewKey::Other => false,
        }
    }

    fn reset_view(&mut self) {
        self.answer_visible = false;
        self.draft = None;
    }
}
