//! AppState — shared read-only data passed to all components during render/event.
//!
//! Components read this for session state, but never mutate it.
//! The App event-loop is the only thing that writes to AppState.

use std::path::PathBuf;

use lyrsync_proto::presenter::TrackView;

/// A local audio file marked for upload.  This is the client's pending
/// selection — a separate entity from the registry, which only ever holds
/// what the server reports back.
#[derive(Debug, Clone, PartialEq)]
pub struct PendingFile {
    pub path: PathBuf,
    pub name: String,
    pub size_bytes: u64,
}

/// The full shared state of the application.
/// Components read this; only the App event-loop writes to it.
#[derive(Debug, Default)]
pub struct AppState {
    // ── Server session ──────────────────────────────────────────────────────
    /// Current projection of the registry (valid/invalid buckets).
    pub view: TrackView,
    /// Overall job progress in percent, once the server starts reporting it.
    pub progress: Option<f32>,
    /// True once the stream connection is established.
    pub connected: bool,

    // ── Pending upload ──────────────────────────────────────────────────────
    pub pending: Vec<PendingFile>,
    pub lyrics_url: String,
    /// An upload request is in flight.
    pub uploading: bool,
}

impl AppState {
    /// Submit is possible: at least one file and a non-empty reference URL.
    pub fn can_submit(&self) -> bool {
        !self.uploading && !self.pending.is_empty() && !self.lyrics_url.trim().is_empty()
    }

    pub fn pending_bytes(&self) -> u64 {
        self.pending.iter().map(|f| f.size_bytes).sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_can_submit_requires_files_and_url() {
        let mut state = AppState::default();
        assert!(!state.can_submit());
        state.pending.push(PendingFile {
            path: PathBuf::from("/music/01.mp3"),
            name: "01.mp3".into(),
            size_bytes: 10,
        });
        assert!(!state.can_submit());
        state.lyrics_url = "  ".into();
        assert!(!state.can_submit());
        state.lyrics_url = "https://genius.com/albums/x/y".into();
        assert!(state.can_submit());
        state.uploading = true;
        assert!(!state.can_submit());
    }
}
