//! Selection capture on the read surface.
//!
//! # Responsibility
//! - Decide whether a pointer-up selection opens the question popup, and
//!   where the popup goes.
//! - Wrap the pending selection on confirm and re-derive the highlight list.
//!
//! # Invariants
//! - Rejected selections and blank questions leave the tree untouched.
//! - The returned highlight list reflects every wrapper in the tree, not
//!   only the new one.

use crate::error::{InputField, StudyError, StudyResult};
use crate::markup::highlight::{
    collect_annotations, enclosing_highlight, highlight_wrapper, holds_highlight,
};
use crate::markup::range::{RangeError, TextRange};
use crate::markup::tree::{Node, RichDoc};
use crate::model::note::Annotation;
use std::fmt::{Display, Formatter};

/// Popup width in CSS pixels.
pub const POPUP_WIDTH: f64 = 280.0;
/// Vertical gap between selection and popup.
pub const POPUP_GAP: f64 = 8.0;

/// Viewport-relative bounding box of a selection.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct SelectionRect {
    pub left: f64,
    pub top: f64,
    pub width: f64,
    pub height: f64,
}

impl SelectionRect {
    pub fn bottom(&self) -> f64 {
        self.top + self.height
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Viewport {
    pub width: f64,
    pub scroll_x: f64,
    pub scroll_y: f64,
}

/// Document-relative popup position.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct PopupPlacement {
    pub left: f64,
    pub top: f64,
}

impl PopupPlacement {
    /// Just below the selection, kept inside the viewport's right edge.
    pub fn below(rect: SelectionRect, viewport: Viewport) -> Self {
        Self {
            left: (rect.left + viewport.scroll_x).min(viewport.width - POPUP_WIDTH),
            top: rect.bottom() + viewport.scroll_y + POPUP_GAP,
        }
    }
}

/// Selection reported by the read surface on pointer-up.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SurfaceSelection {
    pub range: TextRange,
    /// Both ends lie inside the read surface.
    pub contained: bool,
}

/// Why a pointer-up did not open the popup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CaptureRejection {
    NotReadMode,
    /// No saved note is open.
    NoOpenNote,
    Empty,
    OutsideSurface,
    InsideHighlight,
    /// An existing highlight lies within the selection.
    ContainsHighlight,
    Invalid(RangeError),
}

impl Display for CaptureRejection {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::NotReadMode => write!(f, "capture is only available in read mode"),
            Self::NoOpenNote => write!(f, "no saved note is open"),
            Self::Empty => write!(f, "selection is empty"),
            Self::OutsideSurface => write!(f, "selection leaves the read surface"),
            Self::InsideHighlight => write!(f, "selection is inside an existing highlight"),
            Self::ContainsHighlight => write!(f, "selection contains an existing highlight"),
            Self::Invalid(err) => write!(f, "{err}"),
        }
    }
}

/// Selection waiting for its question.
#[derive(Debug, Clone, PartialEq)]
pub struct PendingCapture {
    pub range: TextRange,
    /// Trimmed selected text.
    pub selected_text: String,
    pub placement: PopupPlacement,
}

/// Validates a pointer-up selection against the read surface.
pub fn begin_capture(
    doc: &RichDoc,
    selection: &SurfaceSelection,
    rect: SelectionRect,
    viewport: Viewport,
) -> Result<PendingCapture, CaptureRejection> {
    if !selection.contained {
        return Err(CaptureRejection::OutsideSurface);
    }
    let range = &selection.range;
    let mut scratch = doc.clone();
    let extracted = match range.extract(&mut scratch) {
        Ok(extracted) => extracted,
        Err(RangeError::Collapsed) => return Err(CaptureRejection::Empty),
        Err(err) => return Err(CaptureRejection::Invalid(err)),
    };
    let text: String = extracted.nodes.iter().map(Node::text_content).collect();
    let selected_text = text.trim();
    if selected_text.is_empty() {
        return Err(CaptureRejection::Empty);
    }
    if enclosing_highlight(doc, &range.start.path).is_some()
        || enclosing_highlight(doc, &range.end.path).is_some()
    {
        return Err(CaptureRejection::InsideHighlight);
    }
    // Nested wrappers would not survive a reload.
    if holds_highlight(&extracted.nodes) {
        return Err(CaptureRejection::ContainsHighlight);
    }

    Ok(PendingCapture {
        range: range.clone(),
        selected_text: selected_text.to_string(),
        placement: PopupPlacement::below(rect, viewport),
    })
}

/// Wraps the pending selection with `question` and returns the full,
/// re-derived highlight list.
pub fn apply_capture(
    doc: &mut RichDoc,
    pending: &PendingCapture,
    question: &str,
) -> StudyResult<Vec<Annotation>> {
    let question = question.trim();
    if question.is_empty() {
        return Err(StudyError::EmptyInput(InputField::Question));
    }

    let mut scratch = doc.clone();
    pending
        .range
        .extract_and_wrap(&mut scratch, highlight_wrapper(question))?;
    scratch.normalize();
    *doc = scratch;
    Ok(collect_annotations(doc))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::markup::range::BoundaryPoint;

    fn select(range: TextRange) -> SurfaceSelection {
        SurfaceSelection {
            range,
            contained: true,
        }
    }

    #[test]
    fn popup_sits_below_selection_and_clamps_right_edge() {
        let rect = SelectionRect {
            left: 900.0,
            top: 100.0,
            width: 50.0,
            height: 20.0,
        };
        let viewport = Viewport {
            width: 1000.0,
            scroll_x: 0.0,
            scroll_y: 40.0,
        };
        let placement = PopupPlacement::below(rect, viewport);
        assert_eq!(placement.left, 720.0);
        assert_eq!(placement.top, 168.0);
    }

    #[test]
    fn begin_capture_trims_selected_text() {
        let doc = RichDoc::parse("<p>alpha beta</p>");
        let pending = begin_capture(
            &doc,
            &select(TextRange::within_text(vec![0, 0], 5, 10)),
            SelectionRect::default(),
            Viewport::default(),
        )
        .unwrap();
        assert_eq!(pending.selected_text, "beta");
    }

    #[test]
    fn whitespace_only_and_outside_selections_are_rejected() {
        let doc = RichDoc::parse("<p>alpha beta</p>");
        let blank = begin_capture(
            &doc,
            &select(TextRange::within_text(vec![0, 0], 5, 6)),
            SelectionRect::default(),
            Viewport::default(),
        );
        assert_eq!(blank.unwrap_err(), CaptureRejection::Empty);

        let outside = SurfaceSelection {
            range: TextRange::within_text(vec![0, 0], 0, 5),
            contained: false,
        };
        let result = begin_capture(&doc, &outside, SelectionRect::default(), Viewport::default());
        assert_eq!(result.unwrap_err(), CaptureRejection::OutsideSurface);
    }

    #[test]
    fn selection_inside_existing_highlight_is_rejected() {
        let doc = RichDoc::parse(
            "a <span class=\"note-highlight\" data-question=\"q\">inner text</span> b",
        );
        let result = begin_capture(
            &doc,
            &select(TextRange::within_text(vec![1, 0], 0, 5)),
            SelectionRect::default(),
            Viewport::default(),
        );
        assert_eq!(result.unwrap_err(), CaptureRejection::InsideHighlight);
    }

    #[test]
    fn selection_spanning_a_whole_highlight_is_rejected() {
        let doc = RichDoc::parse(
            "<p>a <span class=\"note-highlight\" data-question=\"q\">mid</span> b</p>",
        );
        let range = TextRange::new(
            BoundaryPoint::new(vec![0, 0], 0),
            BoundaryPoint::new(vec![0, 2], 2),
        );
        let result = begin_capture(
            &doc,
            &select(range),
            SelectionRect::default(),
            Viewport::default(),
        );
        assert_eq!(result.unwrap_err(), CaptureRejection::ContainsHighlight);
    }

    #[test]
    fn blank_question_leaves_tree_untouched() {
        let mut doc = RichDoc::parse("<p>alpha</p>");
        let pending = begin_capture(
            &doc,
            &select(TextRange::within_text(vec![0, 0], 0, 5)),
            SelectionRect::default(),
            Viewport::default(),
        )
        .unwrap();
        let err = apply_capture(&mut doc, &pending, "   ").unwrap_err();
        assert!(matches!(err, StudyError::EmptyInput(InputField::Question)));
        assert_eq!(doc.to_html(), "<p>alpha</p>");
    }

    #[test]
    fn confirm_wraps_multi_block_selection_and_lists_all_highlights() {
        let mut doc = RichDoc::parse(concat!(
            "<p>first <span class=\"note-highlight\" data-question=\"old\">kept</span></p>",
            "<p>second</p><p>third</p>"
        ));
        let range = TextRange::new(
            BoundaryPoint::new(vec![1, 0], 3),
            BoundaryPoint::new(vec![2, 0], 2),
        );
        let pending = begin_capture(
            &doc,
            &select(range),
            SelectionRect::default(),
            Viewport::default(),
        )
        .unwrap();
        assert_eq!(pending.selected_text, "ondth");

        let highlights = apply_capture(&mut doc, &pending, "  Why? ").unwrap();
        assert_eq!(
            highlights,
            vec![Annotation::new("kept", "old"), Annotation::new("ondth", "Why?")]
        );
        assert_eq!(
            doc.to_html(),
            concat!(
                "<p>first <span class=\"note-highlight\" data-question=\"old\">kept</span></p>",
                "<p>sec</p><span class=\"note-highlight\" data-question=\"Why?\">",
                "<p>ond</p><p>th</p></span><p>ird</p>"
            )
        );
    }
}
