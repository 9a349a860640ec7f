use super::review::{DeckStatus, ReviewDeck, ReviewKey};
use crate::annotate::capture::{
    apply_capture, begin_capture, CaptureRejection, PendingCapture, SelectionRect,
    SurfaceSelection, Viewport,
};
use crate::annotate::mode::{Mode, ModeSynchronizer, Transition};
use crate::annotate::resolver::resolve_highlights;
use crate::error::{InputField, StudyError, StudyResult};
use crate::markup::highlight::{
    collect_annotations, enclosing_highlight, is_highlight, unwrap_at, QUESTION_ATTR,
};
use crate::markup::tree::Node;
use crate::model::card::Card;
use crate::model::note::{Annotation, Note, NoteId};
use crate::repo::{
    CardRepository, NoteRepository, RepoResult, SqliteCardRepository, SqliteNoteRepository,
};
use crate::service::{Actor, CardService, NoteService};
use log::{info, warn};
use rusqlite::Connection;

/// Store-backed services a session works against.
pub struct StudyServices<N: NoteRepository, C: CardRepository> {
    pub notes: NoteService<N>,
    pub cards: CardService<C>,
}

impl<N: NoteRepository, C: CardRepository> StudyServices<N, C> {
    pub fn new(notes: N, cards: C) -> Self {
        Self {
            notes: NoteService::new(notes),
            cards: CardService::new(cards),
        }
    }

    /// Promotes into a card after checking that `actor` owns `note_id`.
    pub fn promote_card(
        &self,
        actor: &Actor,
        note_id: NoteId,
        question: &str,
        answer_content: &str,
    ) -> StudyResult<Card> {
        self.notes.ensure_owned(actor, note_id)?;
        self.cards.promote(actor, note_id, question, answer_content)
    }
}

impl<'conn> StudyServices<SqliteNoteRepository<'conn>, SqliteCardRepository<'conn>> {
    /// Services over one migrated SQLite connection.
    pub fn sqlite(conn: &'conn Connection) -> RepoResult<Self> {
        Ok(Self::new(
            SqliteNoteRepository::try_new(conn)?,
            SqliteCardRepository::try_new(conn)?,
        ))
    }
}

/// Question panel opened by clicking a highlight.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QuestionView {
    /// Wrapper path in the read surface.
    pub wrapper_path: Vec<usize>,
    pub question: String,
}

/// One actor's workspace over a single open note.
pub struct NoteSession<N: NoteRepository, C: CardRepository> {
    actor: Actor,
    services: Option<StudyServices<N, C>>,
    subject: String,
    note_id: Option<NoteId>,
    sync: ModeSynchronizer,
    popup: Option<PendingCapture>,
    question_view: Option<QuestionView>,
    reviewer: Option<ReviewDeck>,
}

impl<N: NoteRepository, C: CardRepository> NoteSession<N, C> {
    /// Session with both surfaces mounted and nothing open.
    pub fn new(
        actor: Actor,
        subject: impl Into<String>,
        services: Option<StudyServices<N, C>>,
    ) -> Self {
        Self {
            actor,
            services,
            subject: subject.into(),
            note_id: None,
            sync: ModeSynchronizer::new(Mode::Edit),
            popup: None,
            question_view: None,
            reviewer: None,
        }
    }

    /// Attaches the store once it finished initializing.
    pub fn attach_services(&mut self, services: StudyServices<N, C>) {
        self.services = Some(services);
    }

    pub fn services(&self) -> StudyResult<&StudyServices<N, C>> {
        self.services.as_ref().ok_or(StudyError::StoreUnavailable)
    }

    pub fn actor(&self) -> &Actor {
        &self.actor
    }

    pub fn subject(&self) -> &str {
        &self.subject
    }

    pub fn note_id(&self) -> Option<NoteId> {
        self.note_id
    }

    pub fn mode(&self) -> Mode {
        self.sync.mode()
    }

    pub fn surfaces(&self) -> &ModeSynchronizer {
        &self.sync
    }

    /// Mount/unmount access for the hosting UI.
    pub fn surfaces_mut(&mut self) -> &mut ModeSynchronizer {
        &mut self.sync
    }

    pub fn popup(&self) -> Option<&PendingCapture> {
        self.popup.as_ref()
    }

    pub fn question_view(&self) -> Option<&QuestionView> {
        self.question_view.as_ref()
    }

    pub fn reviewer(&self) -> Option<&ReviewDeck> {
        self.reviewer.as_ref()
    }

    pub fn reviewer_mut(&mut self) -> Option<&mut ReviewDeck> {
        self.reviewer.as_mut()
    }

    /// Loads a note: edit surface gets the stored content, read surface the
    /// resolved overlay. Starts in `Read`.
    pub fn open_note(&mut self, id: NoteId) -> StudyResult<Note> {
        let note = self.services()?.notes.open_note(&self.actor, id)?;
        let rendered = resolve_highlights(&note.content, &note.highlights);

        self.sync.load(&note.content, &rendered);
        self.sync.reset(Mode::Read);
        self.subject = note.subject.clone();
        self.note_id = Some(note.id);
        self.dismiss_overlays();
        self.reviewer = None;

        info!(
            "event=note_open module=session status=ok note_id={} highlights={}",
            note.id,
            note.highlights.len()
        );
        Ok(note)
    }

    /// Starts an unsaved note in `subject`. Starts in `Edit`.
    pub fn new_note(&mut self, subject: impl Into<String>) {
        self.subject = subject.into();
        self.note_id = None;
        self.sync.load("", "");
        self.sync.reset(Mode::Edit);
        self.dismiss_overlays();
        self.reviewer = None;
    }

    /// Replaces the edit surface markup as the user types.
    pub fn edit_content(&mut self, html: &str) {
        self.sync.set_edit_html(html);
    }

    /// Switches between edit and read. Any open popup is abandoned.
    pub fn switch_mode(&mut self, target: Mode) -> Transition {
        self.dismiss_overlays();
        self.sync.transition(target)
    }

    /// Pointer released over the read surface with `selection` active.
    ///
    /// Opens the question popup when the selection qualifies; otherwise
    /// hides it and reports why.
    pub fn pointer_up(
        &mut self,
        selection: &SurfaceSelection,
        rect: SelectionRect,
        viewport: Viewport,
    ) -> Result<&PendingCapture, CaptureRejection> {
        self.popup = None;
        if self.sync.mode() != Mode::Read {
            return Err(CaptureRejection::NotReadMode);
        }
        if self.note_id.is_none() {
            return Err(CaptureRejection::NoOpenNote);
        }
        let doc = self
            .sync
            .read_doc()
            .ok_or(CaptureRejection::OutsideSurface)?;
        let pending = begin_capture(doc, selection, rect, viewport)?;
        Ok(self.popup.insert(pending))
    }

    /// Pointer pressed. Closes the popup when pressed outside both the popup
    /// and the read surface.
    pub fn pointer_down(&mut self, inside_popup: bool, inside_read_surface: bool) {
        if !inside_popup && !inside_read_surface {
            self.popup = None;
        }
    }

    /// Discards the pending selection.
    pub fn cancel_capture(&mut self) {
        self.popup = None;
    }

    /// Wraps the pending selection with `question` and persists the full
    /// highlight list. Returns that list.
    pub fn confirm_capture(&mut self, question: &str) -> StudyResult<Vec<Annotation>> {
        let Some(pending) = self.popup.clone() else {
            return Err(StudyError::EmptyInput(InputField::Selection));
        };
        if question.trim().is_empty() {
            return Err(StudyError::EmptyInput(InputField::Question));
        }
        self.services()?;
        let note_id = self.note_id.ok_or(StudyError::EmptyInput(InputField::Note))?;
        let doc = self
            .sync
            .read_doc_mut()
            .ok_or(StudyError::EmptyInput(InputField::Selection))?;

        let highlights = match apply_capture(doc, &pending, question) {
            Ok(highlights) => highlights,
            Err(err) => {
                if matches!(err, StudyError::InvalidSelection(_)) {
                    self.popup = None;
                }
                return Err(err);
            }
        };
        self.popup = None;

        self.persist_highlights(note_id, &highlights, "highlight_capture")?;
        Ok(highlights)
    }

    /// Opens the question view when `path` lies inside a highlight.
    pub fn click(&mut self, path: &[usize]) -> Option<&QuestionView> {
        if self.sync.mode() != Mode::Read {
            return None;
        }
        let doc = self.sync.read_doc()?;
        let wrapper_path = enclosing_highlight(doc, path)?;
        let question = doc
            .node(&wrapper_path)
            .and_then(Node::as_element)
            .and_then(|wrapper| wrapper.attr(QUESTION_ATTR))
            .filter(|question| !question.trim().is_empty())?
            .to_string();

        Some(self.question_view.insert(QuestionView {
            wrapper_path,
            question,
        }))
    }

    pub fn close_question_view(&mut self) {
        self.question_view = None;
    }

    /// Copies the opened highlight into a new card. The highlight stays.
    pub fn promote_open_highlight(&mut self) -> StudyResult<Card> {
        let view = self
            .question_view
            .clone()
            .ok_or(StudyError::EmptyInput(InputField::Highlight))?;
        let services = self.services()?;
        let note_id = self.note_id.ok_or(StudyError::EmptyInput(InputField::Note))?;
        let answer_content = self
            .sync
            .read_doc()
            .and_then(|doc| doc.node(&view.wrapper_path))
            .and_then(Node::as_element)
            .filter(|element| is_highlight(element))
            .map(|wrapper| wrapper.inner_html())
            .ok_or(StudyError::EmptyInput(InputField::Highlight))?;

        let card = services
            .promote_card(&self.actor, note_id, &view.question, &answer_content)
            .inspect_err(|err| log_failure("card_promote", err))?;
        self.question_view = None;
        info!(
            "event=card_promote module=session status=ok note_id={note_id} card_id={}",
            card.id
        );
        Ok(card)
    }

    /// Unwraps the opened highlight and persists the remaining list.
    ///
    /// Inner markup such as `<b>` is kept rather than flattened to text.
    /// Cards already promoted from it are not touched.
    pub fn delete_open_highlight(&mut self) -> StudyResult<Vec<Annotation>> {
        let view = self
            .question_view
            .clone()
            .ok_or(StudyError::EmptyInput(InputField::Highlight))?;
        self.services()?;
        let note_id = self.note_id.ok_or(StudyError::EmptyInput(InputField::Note))?;
        let doc = self
            .sync
            .read_doc_mut()
            .ok_or(StudyError::EmptyInput(InputField::Highlight))?;
        if !unwrap_at(doc, &view.wrapper_path) {
            self.question_view = None;
            return Err(StudyError::EmptyInput(InputField::Highlight));
        }
        doc.normalize();
        let highlights = collect_annotations(doc);
        self.question_view = None;

        self.persist_highlights(note_id, &highlights, "highlight_delete")?;
        Ok(highlights)
    }

    /// Saves title and annotation-free content of the visible surface.
    ///
    /// Creates the note when none is open; stored highlights are kept
    /// otherwise.
    pub fn save_note(&mut self, title: &str) -> StudyResult<Note> {
        let services = self.services()?;
        let content = self.sync.current_content().unwrap_or_default();

        let result = match self.note_id {
            Some(id) => services
                .notes
                .update_note(&self.actor, id, Some(title), Some(&content)),
            None => services
                .notes
                .create_note(&self.actor, &self.subject, title, &content),
        };
        let note = result.inspect_err(|err| log_failure("note_save", err))?;

        let created = self.note_id.is_none();
        self.note_id = Some(note.id);
        info!(
            "event=note_save module=session status=ok note_id={} created={created} mode={}",
            note.id,
            self.sync.mode().as_str()
        );
        Ok(note)
    }

    /// Deletes the open note and clears the workspace.
    pub fn delete_open_note(&mut self) -> StudyResult<()> {
        let services = self.services()?;
        let note_id = self.note_id.ok_or(StudyError::EmptyInput(InputField::Note))?;
        services
            .notes
            .delete_note(&self.actor, note_id)
            .inspect_err(|err| log_failure("note_delete", err))?;

        let subject = self.subject.clone();
        self.new_note(subject);
        info!("event=note_delete module=session status=ok note_id={note_id}");
        Ok(())
    }

    /// Loads the cards of the open note into a fresh deck.
    pub fn open_reviewer(&mut self) -> StudyResult<&ReviewDeck> {
        let services = self.services()?;
        let note_id = self.note_id.ok_or(StudyError::EmptyInput(InputField::Note))?;
        let deck = ReviewDeck::load(&services.cards, &self.actor, note_id)?;
        info!(
            "event=reviewer_open module=session status=ok note_id={note_id} cards={}",
            deck.len()
        );
        Ok(self.reviewer.insert(deck))
    }

    pub fn close_reviewer(&mut self) {
        self.reviewer = None;
    }

    /// Key press while the reviewer is open.
    pub fn review_key(&mut self, key: ReviewKey) -> bool {
        self.reviewer
            .as_mut()
            .is_some_and(|deck| deck.handle_key(key))
    }

    /// Saves the current card's draft.
    pub fn save_card_edit(&mut self) -> StudyResult<()> {
        let services = self.services.as_ref().ok_or(StudyError::StoreUnavailable)?;
        let Some(deck) = self.reviewer.as_mut() else {
            return Ok(());
        };
        deck.save_edit(&services.cards, &self.actor)
            .inspect_err(|err| log_failure("card_update", err))
    }

    /// Deletes the current card; closes the reviewer when it was the last.
    pub fn delete_current_card(&mut self) -> StudyResult<DeckStatus> {
        let services = self.services.as_ref().ok_or(StudyError::StoreUnavailable)?;
        let Some(deck) = self.reviewer.as_mut() else {
            return Ok(DeckStatus::Closed);
        };
        let status = deck
            .delete_current(&services.cards, &self.actor)
            .inspect_err(|err| log_failure("card_delete", err))?;
        if status == DeckStatus::Closed {
            self.reviewer = None;
        }
        Ok(status)
    }

    fn persist_highlights(
        &self,
        note_id: NoteId,
        highlights: &[Annotation],
        event: &str,
    ) -> StudyResult<()> {
        self.services()?
            .notes
            .replace_highlights(&self.actor, note_id, highlights)
            .inspect_err(|err| log_failure(event, err))?;
        info!(
            "event={event} module=session status=ok note_id={note_id} highlights={}",
            highlights.len()
        );
        Ok(())
    }

    fn dismiss_overlays(&mut self) {
        self.popup = None;
        self.question_view = None;
    }
}

fn log_failure(event: &str, err: &StudyError) {
    warn!(
        "event={event} module=session status=error error_code={}",
        err.error_code()
    );
}
