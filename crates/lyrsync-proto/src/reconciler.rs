//! Reconciler — dispatches parsed stream events onto the registry.
//!
//! Owns the registry outright so message handlers call methods on one state
//! container instead of closing over globals; the whole engine is testable
//! without a live stream.  Malformed frames never get here — parsing happens
//! in `protocol`, and a parse failure leaves the registry untouched.

use std::collections::BTreeSet;

use tracing::debug;

use crate::protocol::{StreamEvent, TrackStatus, TrackUpdate};
use crate::registry::Registry;

#[derive(Debug, Default)]
pub struct Reconciler {
    registry: Registry,
}

/// What an applied event did — the UI decides from this whether to re-render
/// and whether to move the progress gauge.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Outcome {
    /// Track numbers whose record changed.
    pub changed: BTreeSet<u32>,
    /// Overall job progress forwarded from a `track_update`, 0–100.
    pub progress: Option<f32>,
    /// True when the whole registry was replaced (full re-render needed).
    pub replaced: bool,
}

impl Reconciler {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    /// Discard the registry for a new upload cycle.
    pub fn reset(&mut self) {
        self.registry = Registry::new();
    }

    pub fn apply(&mut self, event: StreamEvent) -> Outcome {
        match event {
            StreamEvent::TrackAnalysis(tracks) => {
                let replaced = !tracks.is_empty();
                self.registry.replace_all(tracks);
                Outcome {
                    replaced,
                    ..Outcome::default()
                }
            }

            StreamEvent::Tracks(patches) => Outcome {
                changed: self.registry.merge_batch(&patches),
                ..Outcome::default()
            },

            StreamEvent::TrackUpdate(update) => self.apply_update(update),

            StreamEvent::AlbumLyrics(verdicts) => {
                // Registry-first: the verification pass patches canonical
                // state and the view re-renders from it, instead of the
                // legacy display-text match against rendered rows.
                let mut changed = BTreeSet::new();
                for verdict in verdicts {
                    let (status, message) = if verdict.is_valid {
                        (verdict.status, verdict.message)
                    } else {
                        let message = if verdict.message.is_empty() {
                            "lyrics not found".to_string()
                        } else {
                            verdict.message
                        };
                        (TrackStatus::Error, message)
                    };
                    if self.registry.patch_one(verdict.track_number, status, &message) {
                        changed.insert(verdict.track_number);
                    } else {
                        debug!("lyrics verdict for unknown track {}", verdict.track_number);
                    }
                }
                Outcome {
                    changed,
                    ..Outcome::default()
                }
            }
        }
    }

    fn apply_update(&mut self, update: TrackUpdate) -> Outcome {
        let message = display_message(&update);
        // Progress is for the overall job; forward it even when the point
        // patch misses (the analysis snapshot may not have arrived yet).
        let progress = update.progress.map(|p| p.clamp(0.0, 100.0));

        let mut changed = BTreeSet::new();
        if self
            .registry
            .patch_one(update.track_number, update.status, &message)
        {
            changed.insert(update.track_number);
        } else {
            debug!("track_update for unknown track {}", update.track_number);
        }
        Outcome {
            changed,
            progress,
            replaced: false,
        }
    }
}

/// Prefer the server's message; fall back to "Artist – Title" when the
/// update carries metadata but no message text.
fn display_message(update: &TrackUpdate) -> String {
    if !update.message.is_empty() {
        return update.message.clone();
    }
    match (update.artist.as_deref(), update.title.as_deref()) {
        (Some(artist), Some(title)) if !artist.is_empty() && !title.is_empty() => {
            format!("{artist} – {title}")
        }
        _ => String::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::protocol::{TrackPatch, TrackRecord};

    fn analysis(tracks: &[u32]) -> StreamEvent {
        StreamEvent::TrackAnalysis(
            tracks
                .iter()
                .map(|&n| TrackRecord {
                    track_number: Some(n),
                    filename: format!("{n:02}.mp3"),
                    size: 1,
                    status: TrackStatus::Uploaded,
                    message: "File uploaded".to_string(),
                })
                .collect(),
        )
    }

    fn update(n: u32, status: TrackStatus, message: &str, progress: Option<f32>) -> StreamEvent {
        StreamEvent::TrackUpdate(TrackUpdate {
            track_number: n,
            status,
            message: message.to_string(),
            progress,
            title: None,
            artist: None,
        })
    }

    #[test]
    fn test_analysis_replaces() {
        let mut rec = Reconciler::new();
        rec.apply(analysis(&[1, 2, 3, 4, 5]));
        let outcome = rec.apply(analysis(&[7, 9]));
        assert!(outcome.replaced);
        assert_eq!(rec.registry().len(), 2);
        assert!(rec.registry().get(1).is_none());
    }

    #[test]
    fn test_empty_analysis_keeps_prior_state() {
        let mut rec = Reconciler::new();
        rec.apply(analysis(&[1, 2]));
        let outcome = rec.apply(StreamEvent::TrackAnalysis(Vec::new()));
        assert!(!outcome.replaced);
        assert_eq!(rec.registry().len(), 2);
    }

    #[test]
    fn test_tracks_batch_merges() {
        let mut rec = Reconciler::new();
        rec.apply(analysis(&[1, 2, 3]));
        let outcome = rec.apply(StreamEvent::Tracks(vec![TrackPatch {
            track_number: 2,
            status: TrackStatus::Success,
            message: "done".to_string(),
        }]));
        assert_eq!(outcome.changed, BTreeSet::from([2]));
        let r = rec.registry().get(2).unwrap();
        assert_eq!(r.status, TrackStatus::Success);
        assert_eq!(r.message, "done");
        assert_eq!(rec.registry().get(1).unwrap().status, TrackStatus::Uploaded);
    }

    #[test]
    fn test_update_on_empty_registry_still_forwards_progress() {
        let mut rec = Reconciler::new();
        let outcome = rec.apply(update(5, TrackStatus::Processing, "...", Some(40.0)));
        assert!(outcome.changed.is_empty());
        assert_eq!(outcome.progress, Some(40.0));
        assert!(rec.registry().is_empty());
    }

    #[test]
    fn test_update_clamps_progress() {
        let mut rec = Reconciler::new();
        let outcome = rec.apply(update(1, TrackStatus::Processing, "", Some(140.0)));
        assert_eq!(outcome.progress, Some(100.0));
    }

    #[test]
    fn test_update_metadata_becomes_message() {
        let mut rec = Reconciler::new();
        rec.apply(analysis(&[4]));
        rec.apply(StreamEvent::TrackUpdate(TrackUpdate {
            track_number: 4,
            status: TrackStatus::Processing,
            message: String::new(),
            progress: None,
            title: Some("Blue Train".to_string()),
            artist: Some("John Coltrane".to_string()),
        }));
        assert_eq!(
            rec.registry().get(4).unwrap().message,
            "John Coltrane – Blue Train"
        );
    }

    #[test]
    fn test_album_lyrics_patches_canonical_state() {
        let mut rec = Reconciler::new();
        rec.apply(analysis(&[1, 2]));
        let outcome = rec.apply(StreamEvent::AlbumLyrics(vec![
            crate::protocol::LyricsVerdict {
                track_number: 1,
                is_valid: true,
                status: TrackStatus::Found,
                message: "lyrics found...".to_string(),
            },
            crate::protocol::LyricsVerdict {
                track_number: 2,
                is_valid: false,
                status: TrackStatus::Found,
                message: String::new(),
            },
        ]));
        assert_eq!(outcome.changed, BTreeSet::from([1, 2]));
        assert_eq!(rec.registry().get(1).unwrap().status, TrackStatus::Found);
        let invalid = rec.registry().get(2).unwrap();
        assert_eq!(invalid.status, TrackStatus::Error);
        assert_eq!(invalid.message, "lyrics not found");
    }

    #[test]
    fn test_reset_discards_session() {
        let mut rec = Reconciler::new();
        rec.apply(analysis(&[1]));
        rec.reset();
        assert!(rec.registry().is_empty());
    }
}
