//! Rich-text markup model used by the read surface.
//!
//! # Responsibility
//! - Parse HTML fragments into an addressable node tree and back.
//! - Express user selections as boundary-point ranges over that tree.
//! - Own the highlight wrapper convention shared by resolver and capture.
//!
//! # Invariants
//! - `RichDoc::parse(html).to_html() == html` for every input.
//! - Highlight wrappers are `span.note-highlight` elements carrying the
//!   question in `data-question`.

pub mod highlight;
pub mod range;
pub mod tree;
