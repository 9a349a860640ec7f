//! FFI use-case API for Flutter-facing calls.
//!
//! # Responsibility
//! - Expose note, highlight and card use-cases to Dart via FRB.
//! - Translate core errors into user-facing messages plus stable codes.
//!
//! # Invariants
//! - Exported functions must not panic across FFI boundary.
//! - Every call opens its own connection to the configured store file.
//! - IDs cross the boundary as hyphenated UUID strings.

use log::warn;
use recallnote_core::db::open_db;
use recallnote_core::{
    collect_annotations, core_version as core_version_inner, init_logging as init_logging_inner,
    ping as ping_inner, resolve_highlights, Actor, Card, CoreConfig, Note, RichDoc, StudyError,
    StudyServices, SqliteCardRepository, SqliteNoteRepository,
};
use std::path::PathBuf;
use std::sync::OnceLock;
use uuid::Uuid;

static STORE_DB_PATH: OnceLock<PathBuf> = OnceLock::new();

type Services<'conn> = StudyServices<SqliteNoteRepository<'conn>, SqliteCardRepository<'conn>>;

/// Minimal health-check API for FRB smoke integration.
///
/// # FFI contract
/// - Sync call, non-blocking.
/// - Never throws; always returns a UTF-8 string.
#[flutter_rust_bridge::frb(sync)]
pub fn ping() -> String {
    ping_inner().to_owned()
}

/// Expose core crate version through FFI.
#[flutter_rust_bridge::frb(sync)]
pub fn core_version() -> String {
    core_version_inner().to_owned()
}

/// Initializes Rust core logging once per process.
///
/// Input semantics:
/// - `level`: one of `trace|debug|info|warn|error` (case-insensitive).
/// - `log_dir`: absolute directory path where rolling logs are written.
///
/// # FFI contract
/// - Safe to call repeatedly with the same `level + log_dir`.
/// - Returns empty string on success and error message on failure.
#[flutter_rust_bridge::frb(sync)]
pub fn init_logging(level: String, log_dir: String) -> String {
    match init_logging_inner(level.as_str(), log_dir.as_str()) {
        Ok(()) => String::new(),
        Err(err) => err.to_string(),
    }
}

/// Note row projected for list and editor screens.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NoteItem {
    pub note_id: String,
    pub subject: String,
    pub title: String,
    /// Stored annotation-free markup.
    pub content: String,
    pub highlight_count: u32,
    pub order_index: i64,
    pub updated_at: i64,
}

/// Flashcard projected for the reviewer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CardItem {
    pub card_id: String,
    pub note_id: String,
    pub question: String,
    pub answer_content: String,
    pub created_at: i64,
}

/// Generic action envelope.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StudyActionResponse {
    pub ok: bool,
    /// ID of the created or touched record, when there is one.
    pub record_id: Option<String>,
    /// Machine-readable failure code; empty on success.
    pub error_code: String,
    /// Human-readable response message for UI.
    pub message: String,
}

impl StudyActionResponse {
    fn success(message: impl Into<String>, record_id: Option<String>) -> Self {
        Self {
            ok: true,
            record_id,
            error_code: String::new(),
            message: message.into(),
        }
    }

    fn failure(failure: CallFailure) -> Self {
        Self {
            ok: false,
            record_id: None,
            error_code: failure.code,
            message: failure.message,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NoteListResponse {
    pub ok: bool,
    pub items: Vec<NoteItem>,
    pub error_code: String,
    pub message: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CardListResponse {
    pub ok: bool,
    pub items: Vec<CardItem>,
    pub error_code: String,
    pub message: String,
}

/// Read-surface markup for one note.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NoteRenderResponse {
    pub ok: bool,
    /// Stored content with every renderable highlight re-applied.
    pub read_html: String,
    pub error_code: String,
    pub message: String,
}

/// Lists notes of `owner_id`, optionally restricted to one subject.
///
/// # FFI contract
/// - Sync call, DB-backed execution.
/// - Blank `subject` lists every subject.
#[flutter_rust_bridge::frb(sync)]
pub fn notes_list(owner_id: String, subject: Option<String>) -> NoteListResponse {
    let actor = Actor::new(owner_id);
    let subject = subject
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty());
    let result = with_services(|services| {
        services
            .notes
            .list_notes(&actor, subject.as_deref())
            .map_err(|err| CallFailure::study("notes_list", err))
    });

    match result {
        Ok(notes) => {
            let items = notes.iter().map(to_note_item).collect::<Vec<_>>();
            let message = if items.is_empty() {
                "No notes yet.".to_string()
            } else {
                format!("Found {} note(s).", items.len())
            };
            NoteListResponse {
                ok: true,
                items,
                error_code: String::new(),
                message,
            }
        }
        Err(failure) => NoteListResponse {
            ok: false,
            items: Vec::new(),
            error_code: failure.code,
            message: failure.message,
        },
    }
}

/// Creates a note at the end of `subject`.
///
/// # FFI contract
/// - Blank title falls back to the default title.
/// - Highlight wrappers in `content` are stripped before storage.
#[flutter_rust_bridge::frb(sync)]
pub fn note_create(
    owner_id: String,
    subject: String,
    title: String,
    content: String,
) -> StudyActionResponse {
    let actor = Actor::new(owner_id);
    let result = with_services(|services| {
        services
            .notes
            .create_note(&actor, &subject, &title, &content)
            .map_err(|err| CallFailure::study("note_create", err))
    });
    match result {
        Ok(note) => StudyActionResponse::success("Note created.", Some(note.id.to_string())),
        Err(failure) => StudyActionResponse::failure(failure),
    }
}

/// Saves title and/or content of one note.
///
/// `content` may be either surface's markup; it is stored stripped.
#[flutter_rust_bridge::frb(sync)]
pub fn note_save(
    owner_id: String,
    note_id: String,
    title: Option<String>,
    content: Option<String>,
) -> StudyActionResponse {
    let actor = Actor::new(owner_id);
    let result = parse_id("note_save", &note_id).and_then(|id| {
        with_services(|services| {
            services
                .notes
                .update_note(&actor, id, title.as_deref(), content.as_deref())
                .map_err(|err| CallFailure::study("note_save", err))
        })
    });
    match result {
        Ok(note) => StudyActionResponse::success("Note saved.", Some(note.id.to_string())),
        Err(failure) => StudyActionResponse::failure(failure),
    }
}

/// Deletes every listed note in order. Stops at the first failure.
#[flutter_rust_bridge::frb(sync)]
pub fn notes_delete(owner_id: String, note_ids: Vec<String>) -> StudyActionResponse {
    let actor = Actor::new(owner_id);
    let result = parse_ids("notes_delete", &note_ids).and_then(|ids| {
        with_services(|services| {
            services
                .notes
                .delete_notes(&actor, &ids)
                .map_err(|err| CallFailure::study("notes_delete", err))
        })
    });
    match result {
        Ok(count) => StudyActionResponse::success(format!("Deleted {count} note(s)."), None),
        Err(failure) => StudyActionResponse::failure(failure),
    }
}

/// Persists manual order: position `i` in `note_ids` becomes order `i + 1`.
#[flutter_rust_bridge::frb(sync)]
pub fn notes_reorder(owner_id: String, note_ids: Vec<String>) -> StudyActionResponse {
    let actor = Actor::new(owner_id);
    let result = parse_ids("notes_reorder", &note_ids).and_then(|ids| {
        with_services(|services| {
            services
                .notes
                .reorder_notes(&actor, &ids)
                .map_err(|err| CallFailure::study("notes_reorder", err))
        })
    });
    match result {
        Ok(()) => StudyActionResponse::success("Order saved.", None),
        Err(failure) => StudyActionResponse::failure(failure),
    }
}

/// Builds read-surface markup: stored content plus resolved highlights.
#[flutter_rust_bridge::frb(sync)]
pub fn note_render(owner_id: String, note_id: String) -> NoteRenderResponse {
    let actor = Actor::new(owner_id);
    let result = parse_id("note_render", &note_id).and_then(|id| {
        with_services(|services| {
            services
                .notes
                .open_note(&actor, id)
                .map_err(|err| CallFailure::study("note_render", err))
        })
    });
    match result {
        Ok(note) => NoteRenderResponse {
            ok: true,
            read_html: resolve_highlights(&note.content, &note.highlights),
            error_code: String::new(),
            message: String::new(),
        },
        Err(failure) => NoteRenderResponse {
            ok: false,
            read_html: String::new(),
            error_code: failure.code,
            message: failure.message,
        },
    }
}

/// Recomputes the highlight list from read-surface markup and stores it.
///
/// # FFI contract
/// - The stored list is replaced as a whole, in document order.
/// - Note content is not touched.
#[flutter_rust_bridge::frb(sync)]
pub fn highlights_sync(owner_id: String, note_id: String, read_html: String) -> StudyActionResponse {
    let actor = Actor::new(owner_id);
    let highlights = collect_annotations(&RichDoc::parse(&read_html));
    let result = parse_id("highlights_sync", &note_id).and_then(|id| {
        with_services(|services| {
            services
                .notes
                .replace_highlights(&actor, id, &highlights)
                .map_err(|err| CallFailure::study("highlights_sync", err))
        })
    });
    match result {
        Ok(()) => StudyActionResponse::success(
            format!("Saved {} highlight(s).", highlights.len()),
            Some(note_id),
        ),
        Err(failure) => StudyActionResponse::failure(failure),
    }
}

/// Promotes one highlight into a flashcard.
///
/// `answer_content` is the highlight's inner markup, stored as given. The
/// note must exist and belong to `owner_id`.
#[flutter_rust_bridge::frb(sync)]
pub fn card_promote(
    owner_id: String,
    note_id: String,
    question: String,
    answer_content: String,
) -> StudyActionResponse {
    let actor = Actor::new(owner_id);
    let result = parse_id("card_promote", &note_id).and_then(|id| {
        with_services(|services| {
            services
                .promote_card(&actor, id, &question, &answer_content)
                .map_err(|err| CallFailure::study("card_promote", err))
        })
    });
    match result {
        Ok(card) => StudyActionResponse::success("Card created.", Some(card.id.to_string())),
        Err(failure) => StudyActionResponse::failure(failure),
    }
}

/// Cards promoted from one note, oldest first.
#[flutter_rust_bridge::frb(sync)]
pub fn cards_for_note(owner_id: String, note_id: String) -> CardListResponse {
    let actor = Actor::new(owner_id);
    let result = parse_id("cards_for_note", &note_id).and_then(|id| {
        with_services(|services| {
            services
                .cards
                .list_for_note(&actor, id)
                .map_err(|err| CallFailure::study("cards_for_note", err))
        })
    });
    match result {
        Ok(cards) => CardListResponse {
            ok: true,
            message: format!("Card count: {}", cards.len()),
            items: cards.iter().map(to_card_item).collect(),
            error_code: String::new(),
        },
        Err(failure) => CardListResponse {
            ok: false,
            items: Vec::new(),
            error_code: failure.code,
            message: failure.message,
        },
    }
}

/// Saves an edited card. Blank questions are rejected.
#[flutter_rust_bridge::frb(sync)]
pub fn card_update(
    owner_id: String,
    card_id: String,
    question: String,
    answer_content: String,
) -> StudyActionResponse {
    let actor = Actor::new(owner_id);
    let result = parse_id("card_update", &card_id).and_then(|id| {
        with_services(|services| {
            services
                .cards
                .update_card(&actor, id, &question, &answer_content)
                .map_err(|err| CallFailure::study("card_update", err))
        })
    });
    match result {
        Ok(card) => StudyActionResponse::success("Card saved.", Some(card.id.to_string())),
        Err(failure) => StudyActionResponse::failure(failure),
    }
}

#[flutter_rust_bridge::frb(sync)]
pub fn card_delete(owner_id: String, card_id: String) -> StudyActionResponse {
    let actor = Actor::new(owner_id);
    let result = parse_id("card_delete", &card_id).and_then(|id| {
        with_services(|services| {
            services
                .cards
                .delete_card(&actor, id)
                .map_err(|err| CallFailure::study("card_delete", err))
        })
    });
    match result {
        Ok(()) => StudyActionResponse::success("Card deleted.", Some(card_id)),
        Err(failure) => StudyActionResponse::failure(failure),
    }
}

/// Failure already translated for the UI.
#[derive(Debug)]
struct CallFailure {
    code: String,
    message: String,
}

impl CallFailure {
    fn study(call: &str, err: StudyError) -> Self {
        warn!(
            "event=ffi_call module=ffi status=error call={call} error_code={}",
            err.error_code()
        );
        Self {
            code: err.error_code().to_string(),
            message: err.user_message(),
        }
    }

    fn store(call: &str, detail: impl std::fmt::Display) -> Self {
        warn!("event=ffi_call module=ffi status=error call={call} error_code=store_unavailable");
        Self {
            code: StudyError::StoreUnavailable.error_code().to_string(),
            message: format!(
                "{} ({detail})",
                StudyError::StoreUnavailable.user_message()
            ),
        }
    }

    fn invalid_id(call: &str, raw: &str) -> Self {
        warn!("event=ffi_call module=ffi status=error call={call} error_code=invalid_id");
        Self {
            code: "invalid_id".to_string(),
            message: format!("invalid id: {raw}"),
        }
    }
}

fn parse_id(call: &str, raw: &str) -> Result<Uuid, CallFailure> {
    Uuid::parse_str(raw.trim()).map_err(|_| CallFailure::invalid_id(call, raw))
}

fn parse_ids(call: &str, raw: &[String]) -> Result<Vec<Uuid>, CallFailure> {
    raw.iter().map(|value| parse_id(call, value)).collect()
}

fn resolve_store_db_path() -> PathBuf {
    STORE_DB_PATH
        .get_or_init(|| CoreConfig::from_env().db_path)
        .clone()
}

fn with_services<T>(
    f: impl FnOnce(&Services<'_>) -> Result<T, CallFailure>,
) -> Result<T, CallFailure> {
    let db_path = resolve_store_db_path();
    let conn = open_db(&db_path).map_err(|err| CallFailure::store("store_open", err))?;
    let services =
        StudyServices::sqlite(&conn).map_err(|err| CallFailure::store("store_init", err))?;
    f(&services)
}

fn to_note_item(note: &Note) -> NoteItem {
    NoteItem {
        note_id: note.id.to_string(),
        subject: note.subject.clone(),
        title: note.title.clone(),
        content: note.content.clone(),
        highlight_count: u32::try_from(note.highlights.len()).unwrap_or(u32::MAX),
        order_index: note.order_index,
        updated_at: note.updated_at,
    }
}

fn to_card_item(card: &Card) -> CardItem {
    CardItem {
        card_id: card.id.to_string(),
        note_id: card.note_id.to_string(),
        question: card.question.clone(),
        answer_content: card.answer_content.clone(),
        created_at: card.created_at,
    }
}
