//! Multipart submission to the server's `/process` endpoint: the selected
//! audio files plus the lyrics-source reference URL.

use anyhow::Context;
use reqwest::multipart::{Form, Part};
use tracing::info;

use lyrsync_proto::protocol::ProcessResponse;

use crate::app_state::PendingFile;

/// Extensions the server accepts.
const AUDIO_EXTENSIONS: &[&str] = &["mp3", "m4a"];

pub fn is_audio_file(path: &std::path::Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .map(|e| {
            let e = e.to_ascii_lowercase();
            AUDIO_EXTENSIONS.contains(&e.as_str())
        })
        .unwrap_or(false)
}

fn mime_for(name: &str) -> &'static str {
    if name.to_ascii_lowercase().ends_with(".m4a") {
        "audio/mp4"
    } else {
        "audio/mpeg"
    }
}

/// Upload `files` and the reference URL.  The server answers
/// `{success, error?}` once the whole job is over; live progress arrives on
/// the event stream in the meantime.
pub async fn submit(
    client: &reqwest::Client,
    process_url: &str,
    files: &[PendingFile],
    lyrics_url: &str,
) -> anyhow::Result<ProcessResponse> {
    let mut form = Form::new().text("url", lyrics_url.trim().to_string());
    for file in files {
        let bytes = tokio::fs::read(&file.path)
            .await
            .with_context(|| format!("reading {}", file.path.display()))?;
        let part = Part::bytes(bytes)
            .file_name(file.name.clone())
            .mime_str(mime_for(&file.name))?;
        form = form.part("files", part);
    }

    info!(
        "submitting {} file(s) to {} (reference: {})",
        files.len(),
        process_url,
        lyrics_url
    );
    let response = client
        .post(process_url)
        .multipart(form)
        .send()
        .await
        .context("upload request failed")?;

    let status = response.status();
    // The server returns structured {success, error} bodies even on 4xx/5xx.
    let body: ProcessResponse = response
        .json()
        .await
        .with_context(|| format!("unreadable response (HTTP {status})"))?;
    Ok(body)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::Path;

    #[test]
    fn test_is_audio_file() {
        assert!(is_audio_file(Path::new("/music/01 Intro.mp3")));
        assert!(is_audio_file(Path::new("track.M4A")));
        assert!(!is_audio_file(Path::new("cover.jpg")));
        assert!(!is_audio_file(Path::new("notes")));
        assert!(!is_audio_file(Path::new("album.flac")));
    }

    #[test]
    fn test_mime_for() {
        assert_eq!(mime_for("a.mp3"), "audio/mpeg");
        assert_eq!(mime_for("b.M4A"), "audio/mp4");
    }
}
