//! Wire types for the server's SSE push stream and the upload endpoint.
//!
//! The server emits named SSE events, each carrying a JSON payload.  Parsing
//! happens here, before anything touches the registry: a frame that fails to
//! parse is reported to the caller and the local state stays untouched.

use serde::{Deserialize, Serialize};

/// Processing status of one track as reported by the server.
///
/// Unrecognized strings deserialize to `Unknown` so a newer server can add
/// statuses without breaking older clients; `Unknown` renders like `Found`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum TrackStatus {
    Uploaded,
    #[default]
    Found,
    Processing,
    Success,
    Error,
    #[serde(other)]
    Unknown,
}

impl TrackStatus {
    /// Short label for the status badge.
    pub fn label(&self) -> &'static str {
        match self {
            TrackStatus::Uploaded => "uploaded",
            TrackStatus::Found => "found",
            TrackStatus::Processing => "processing",
            TrackStatus::Success => "success",
            TrackStatus::Error => "error",
            TrackStatus::Unknown => "found",
        }
    }

    pub fn is_error(&self) -> bool {
        matches!(self, TrackStatus::Error)
    }
}

/// One audio track as known to the client.
///
/// `track_number` is the registry key.  The analysis snapshot sends `null`
/// for files whose metadata carried no track number; those records are
/// error-only and sort after every keyed record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrackRecord {
    pub track_number: Option<u32>,
    pub filename: String,
    #[serde(default)]
    pub size: u64,
    pub status: TrackStatus,
    #[serde(default)]
    pub message: String,
}

/// A partial status change for a track already in the registry.
#[derive(Debug, Clone, Deserialize)]
pub struct TrackPatch {
    pub track_number: u32,
    pub status: TrackStatus,
    #[serde(default)]
    pub message: String,
}

/// A single-record update, optionally carrying overall job progress.
///
/// The server also sends `title`, `artist`, `url` and `track_id` alongside;
/// only title/artist are kept (they refresh the display message), the rest
/// is ignored.
#[derive(Debug, Clone, Deserialize)]
pub struct TrackUpdate {
    pub track_number: u32,
    pub status: TrackStatus,
    #[serde(default)]
    pub message: String,
    /// Overall job progress in percent (0–100), not per-track.
    #[serde(default)]
    pub progress: Option<f32>,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub artist: Option<String>,
}

/// Lyrics-verification verdict for one track.
#[derive(Debug, Clone, Deserialize)]
pub struct LyricsVerdict {
    pub track_number: u32,
    pub is_valid: bool,
    #[serde(default)]
    pub status: TrackStatus,
    #[serde(default)]
    pub message: String,
}

#[derive(Debug, Deserialize)]
struct TrackList<T> {
    tracks: Vec<T>,
}

/// A parsed, typed stream message.
#[derive(Debug, Clone)]
pub enum StreamEvent {
    /// Full snapshot — replaces the registry wholesale.
    TrackAnalysis(Vec<TrackRecord>),
    /// Partial batch of status changes, ascending by track number.
    Tracks(Vec<TrackPatch>),
    /// Point patch for one track.
    TrackUpdate(TrackUpdate),
    /// Lyrics-verification pass over the valid bucket.
    AlbumLyrics(Vec<LyricsVerdict>),
}

#[derive(Debug, thiserror::Error)]
pub enum ProtocolError {
    #[error("unknown stream event '{0}'")]
    UnknownEvent(String),
    #[error("malformed '{event}' payload: {source}")]
    Malformed {
        event: String,
        #[source]
        source: serde_json::Error,
    },
}

impl StreamEvent {
    /// Map an SSE event name + data payload to a typed event.
    ///
    /// The transport-level `error` event never reaches this function; the
    /// stream task treats it as connection failure.
    pub fn parse(event: &str, data: &str) -> Result<Self, ProtocolError> {
        let malformed = |source| ProtocolError::Malformed {
            event: event.to_string(),
            source,
        };
        match event {
            "track_analysis" => {
                let list: TrackList<TrackRecord> =
                    serde_json::from_str(data).map_err(malformed)?;
                Ok(StreamEvent::TrackAnalysis(list.tracks))
            }
            "tracks" => {
                let list: TrackList<TrackPatch> =
                    serde_json::from_str(data).map_err(malformed)?;
                Ok(StreamEvent::Tracks(list.tracks))
            }
            "track_update" => {
                let update: TrackUpdate = serde_json::from_str(data).map_err(malformed)?;
                Ok(StreamEvent::TrackUpdate(update))
            }
            "album_lyrics" => {
                let list: TrackList<LyricsVerdict> =
                    serde_json::from_str(data).map_err(malformed)?;
                Ok(StreamEvent::AlbumLyrics(list.tracks))
            }
            other => Err(ProtocolError::UnknownEvent(other.to_string())),
        }
    }
}

/// Response of the `/process` upload endpoint.
#[derive(Debug, Clone, Deserialize)]
pub struct ProcessResponse {
    pub success: bool,
    #[serde(default)]
    pub error: Option<String>,
    #[serde(default)]
    pub message: Option<String>,
}
