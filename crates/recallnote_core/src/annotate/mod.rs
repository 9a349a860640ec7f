//! Annotation engine: overlay rendering, mode switching and capture.
//!
//! # Responsibility
//! - Render stored highlights over annotation-free content.
//! - Keep the edit and read surfaces mutually derivable.
//! - Turn a read-surface selection into a wrapped highlight.
//!
//! # Invariants
//! - Nothing here touches storage; persistence happens in `session`.
//! - The edit surface never carries highlight wrappers after a transition.

pub mod capture;
pub mod mode;
pub mod resolver;

pub use capture::{
    apply_capture, begin_capture, CaptureRejection, PendingCapture, PopupPlacement,
    SelectionRect, SurfaceSelection, Viewport, POPUP_GAP, POPUP_WIDTH,
};
pub use mode::{EditSurface, Mode, ModeSynchronizer, ReadSurface, Transition};
pub use resolver::resolve_highlights;
