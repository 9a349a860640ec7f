//! Two-surface mode synchronizer.
//!
//! # Responsibility
//! - Own the edit surface (annotation-free HTML) and the read surface
//!   (parsed tree with resolved highlights).
//! - Move content between them on `Edit <-> Read` transitions.
//!
//! # Invariants
//! - `Read -> Edit` loads the read markup with every wrapper unwrapped.
//! - `Edit -> Read` keeps a read surface that still shows highlights;
//!   otherwise it copies the edit markup verbatim.
//! - A transition with an unmounted surface changes nothing.

use crate::markup::highlight::{contains_highlight, strip_highlights_html};
use crate::markup::tree::RichDoc;

/// View state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Mode {
    Edit,
    Read,
}

impl Mode {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Edit => "edit",
            Self::Read => "read",
        }
    }
}

/// Editable surface.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EditSurface {
    pub html: String,
    pub visible: bool,
}

/// Read-only surface with highlights rendered.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReadSurface {
    pub doc: RichDoc,
    pub visible: bool,
}

/// Outcome of [`ModeSynchronizer::transition`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transition {
    /// Already in the requested mode.
    Unchanged,
    /// A surface is not mounted; nothing happened.
    Skipped,
    Switched { from: Mode, to: Mode },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModeSynchronizer {
    mode: Mode,
    edit: Option<EditSurface>,
    read: Option<ReadSurface>,
}

impl ModeSynchronizer {
    /// Both surfaces mounted and empty.
    pub fn new(mode: Mode) -> Self {
        let mut sync = Self::unmounted(mode);
        sync.mount_edit("");
        sync.mount_read("");
        sync
    }

    pub fn unmounted(mode: Mode) -> Self {
        Self {
            mode,
            edit: None,
            read: None,
        }
    }

    pub fn mode(&self) -> Mode {
        self.mode
    }

    pub fn mount_edit(&mut self, html: &str) {
        self.edit = Some(EditSurface {
            html: html.to_string(),
            visible: self.mode == Mode::Edit,
        });
    }

    pub fn mount_read(&mut self, html: &str) {
        self.read = Some(ReadSurface {
            doc: RichDoc::parse(html),
            visible: self.mode == Mode::Read,
        });
    }

    pub fn unmount_edit(&mut self) {
        self.edit = None;
    }

    pub fn unmount_read(&mut self) {
        self.read = None;
    }

    pub fn edit_surface(&self) -> Option<&EditSurface> {
        self.edit.as_ref()
    }

    pub fn read_surface(&self) -> Option<&ReadSurface> {
        self.read.as_ref()
    }

    pub fn edit_html(&self) -> Option<&str> {
        self.edit.as_ref().map(|surface| surface.html.as_str())
    }

    pub fn read_doc(&self) -> Option<&RichDoc> {
        self.read.as_ref().map(|surface| &surface.doc)
    }

    pub fn read_doc_mut(&mut self) -> Option<&mut RichDoc> {
        self.read.as_mut().map(|surface| &mut surface.doc)
    }

    pub fn read_html(&self) -> Option<String> {
        self.read_doc().map(RichDoc::to_html)
    }

    /// Replaces the edit surface markup, as typing would. Ignored when the
    /// surface is not mounted.
    pub fn set_edit_html(&mut self, html: &str) {
        if let Some(surface) = self.edit.as_mut() {
            surface.html = html.to_string();
        }
    }

    /// Fills both mounted surfaces for a freshly opened note.
    pub fn load(&mut self, edit_html: &str, read_html: &str) {
        if let Some(surface) = self.edit.as_mut() {
            surface.html = edit_html.to_string();
        }
        if let Some(surface) = self.read.as_mut() {
            surface.doc = RichDoc::parse(read_html);
        }
    }

    /// Annotation-free markup of the surface the user currently sees.
    pub fn current_content(&self) -> Option<String> {
        match self.mode {
            Mode::Edit => self.edit_html().map(str::to_string),
            Mode::Read => self.read_html().map(|html| strip_highlights_html(&html)),
        }
    }

    /// Sets the mode without moving content, for session setup.
    pub fn reset(&mut self, mode: Mode) {
        self.mode = mode;
        self.apply_visibility();
    }

    pub fn transition(&mut self, target: Mode) -> Transition {
        if self.mode == target {
            return Transition::Unchanged;
        }
        let (Some(edit), Some(read)) = (self.edit.as_mut(), self.read.as_mut()) else {
            log::debug!(
                "event=mode_switch module=annotate status=skipped target={}",
                target.as_str()
            );
            return Transition::Skipped;
        };

        match target {
            Mode::Read => {
                if !contains_highlight(&read.doc) {
                    read.doc = RichDoc::parse(&edit.html);
                }
            }
            Mode::Edit => {
                edit.html = strip_highlights_html(&read.doc.to_html());
            }
        }

        let from = self.mode;
        self.mode = target;
        self.apply_visibility();
        log::debug!(
            "event=mode_switch module=annotate status=ok from={} to={}",
            from.as_str(),
            target.as_str()
        );
        Transition::Switched { from, to: target }
    }

    fn apply_visibility(&mut self) {
        let mode = self.mode;
        if let Some(surface) = self.edit.as_mut() {
            surface.visible = mode == Mode::Edit;
        }
        if let Some(surface) = self.read.as_mut() {
            surface.visible = mode == Mode::Read;
        }
    }
}
