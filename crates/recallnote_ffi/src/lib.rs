//! Flutter-facing bindings for `recallnote_core`.

pub mod api;
