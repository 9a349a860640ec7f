//! Note use-case service.
//!
//! # Responsibility
//! - Create, open, save, reorder and delete notes for one actor.
//! - Persist highlight lists as whole-list replacements.
//!
//! # Invariants
//! - Stored content is always annotation-free.
//! - New notes go to the end of their subject (`last order + 1`).
//! - Batch operations stop at the first failure; earlier writes stay.

use super::Actor;
use crate::error::{InputField, RecordRef, StudyError, StudyResult};
use crate::markup::highlight::strip_highlights_html;
use crate::model::note::{Annotation, NewNote, Note, NoteId, NotePatch, DEFAULT_NOTE_TITLE};
use crate::repo::{NoteListQuery, NoteRepository};

/// Note service facade over a repository implementation.
pub struct NoteService<R: NoteRepository> {
    repo: R,
}

impl<R: NoteRepository> NoteService<R> {
    pub fn new(repo: R) -> Self {
        Self { repo }
    }

    /// Notes of `actor` in manual order, optionally for one subject.
    pub fn list_notes(&self, actor: &Actor, subject: Option<&str>) -> StudyResult<Vec<Note>> {
        let query = NoteListQuery {
            owner_id: actor.id.clone(),
            subject: subject.map(str::to_string),
        };
        Ok(self.repo.list_notes(&query)?)
    }

    /// Loads one note the actor owns.
    pub fn open_note(&self, actor: &Actor, id: NoteId) -> StudyResult<Note> {
        self.ensure_owned(actor, id)
    }

    /// Creates a note at the end of `subject`.
    pub fn create_note(
        &self,
        actor: &Actor,
        subject: &str,
        title: &str,
        content: &str,
    ) -> StudyResult<Note> {
        let subject = subject.trim();
        if subject.is_empty() {
            return Err(StudyError::EmptyInput(InputField::Subject));
        }

        let order_index = self
            .repo
            .last_order_index(&actor.id, subject)?
            .map_or(1, |last| last + 1);
        let note = NewNote::new(
            actor.id.clone(),
            subject,
            normalize_title(title),
            strip_highlights_html(content),
            order_index,
        );
        let id = self.repo.create_note(&note)?;
        self.read_back(id)
    }

    /// Saves title and/or content. Stored highlights are kept.
    pub fn update_note(
        &self,
        actor: &Actor,
        id: NoteId,
        title: Option<&str>,
        content: Option<&str>,
    ) -> StudyResult<Note> {
        self.ensure_owned(actor, id)?;
        let patch = NotePatch {
            title: title.map(normalize_title),
            content: content.map(strip_highlights_html),
            order_index: None,
        };
        if !patch.is_empty() {
            self.repo.update_note(id, &patch)?;
        }
        self.read_back(id)
    }

    /// Replaces the full highlight list of one note.
    pub fn replace_highlights(
        &self,
        actor: &Actor,
        id: NoteId,
        highlights: &[Annotation],
    ) -> StudyResult<()> {
        self.ensure_owned(actor, id)?;
        self.repo.replace_highlights(id, highlights)?;
        Ok(())
    }

    /// Deletes one note. Cards promoted from it are kept.
    pub fn delete_note(&self, actor: &Actor, id: NoteId) -> StudyResult<()> {
        self.ensure_owned(actor, id)?;
        self.repo.delete_note(id)?;
        Ok(())
    }

    /// Deletes every listed note; returns how many were deleted.
    pub fn delete_notes(&self, actor: &Actor, ids: &[NoteId]) -> StudyResult<usize> {
        for id in ids {
            self.delete_note(actor, *id)?;
        }
        Ok(ids.len())
    }

    /// Writes `order_index = position + 1` for every listed note.
    pub fn reorder_notes(&self, actor: &Actor, ids: &[NoteId]) -> StudyResult<()> {
        for (position, id) in ids.iter().enumerate() {
            self.ensure_owned(actor, *id)?;
            let patch = NotePatch {
                order_index: Some(position as i64 + 1),
                ..NotePatch::default()
            };
            self.repo.update_note(*id, &patch)?;
        }
        Ok(())
    }

    /// Loads a note and checks that `actor` owns it.
    pub fn ensure_owned(&self, actor: &Actor, id: NoteId) -> StudyResult<Note> {
        let note = self
            .repo
            .get_note(id)?
            .ok_or(StudyError::NotFound(RecordRef::Note(id)))?;
        if !actor.owns(&note.owner_id) {
            return Err(StudyError::PermissionDenied(RecordRef::Note(id)));
        }
        Ok(note)
    }

    fn read_back(&self, id: NoteId) -> StudyResult<Note> {
        self.repo
            .get_note(id)?
            .ok_or(StudyError::NotFound(RecordRef::Note(id)))
    }
}

/// Trimmed title, or the default title when blank.
pub fn normalize_title(title: &str) -> String {
    let title = title.trim();
    if title.is_empty() {
        DEFAULT_NOTE_TITLE.to_string()
    } else {
        title.to_string()
    }
}
