//! Action enum — all user-initiated intents and internal events.

use crate::app_state::PendingFile;

/// Unique identifier for a focusable component.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ComponentId {
    FilePicker,
    UrlInput,
    TrackTable,
}

/// All actions that can flow through the system.
/// Components produce Actions; the App dispatches them.
#[derive(Debug, Clone)]
pub enum Action {
    // ── Navigation ───────────────────────────────────────────────────────────
    FocusNext,
    FocusPrev,
    FocusPane(ComponentId),

    // ── File picker ──────────────────────────────────────────────────────────
    /// The set of files marked for upload changed.
    PendingChanged(Vec<PendingFile>),

    // ── Lyrics URL ───────────────────────────────────────────────────────────
    UrlChanged(String),

    // ── Upload ───────────────────────────────────────────────────────────────
    /// Submit the pending files + reference URL to the server.
    Submit,

    // ── System ───────────────────────────────────────────────────────────────
    Quit,
    Noop,
}
