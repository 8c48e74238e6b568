//! SSE stream client — the unidirectional push channel from the server.
//!
//! One long-lived task owns the connection.  Complete frames are forwarded
//! over an mpsc channel to the App, which parses and applies them in arrival
//! order; this task never touches the registry.  Losing the stream is a
//! distinct failure message, never "all tracks done", and after first contact
//! no reconnect is attempted here.

use futures_util::StreamExt;
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use lyrsync_proto::config::ServerConfig;

#[derive(Debug, Clone)]
pub enum StreamMessage {
    /// The stream connection is established.
    Connected,
    /// One complete named frame; payload still unparsed.
    Frame { event: String, data: String },
    /// The transport failed or the server closed the stream.
    ConnectionLost(String),
}

pub fn spawn(server: ServerConfig, tx: mpsc::Sender<StreamMessage>) -> tokio::task::JoinHandle<()> {
    tokio::spawn(run(server, tx))
}

async fn run(server: ServerConfig, tx: mpsc::Sender<StreamMessage>) {
    let client = reqwest::Client::new();
    let url = server.stream_url();
    let retry = std::time::Duration::from_secs(server.connect_retry_secs.max(1));

    // Retry until first contact so the TUI can start before the server does.
    let response = loop {
        match client
            .get(&url)
            .header("Accept", "text/event-stream")
            .send()
            .await
        {
            Ok(resp) if resp.status().is_success() => break resp,
            Ok(resp) => debug!("stream endpoint returned {}, retrying", resp.status()),
            Err(e) => debug!("stream connect failed ({e}), retrying"),
        }
        tokio::time::sleep(retry).await;
    };

    info!("connected to event stream at {url}");
    if tx.send(StreamMessage::Connected).await.is_err() {
        return;
    }

    let mut parser = SseParser::new();
    let mut body = response.bytes_stream();
    while let Some(chunk) = body.next().await {
        let chunk = match chunk {
            Ok(c) => c,
            Err(e) => {
                warn!("stream read error: {e}");
                let _ = tx
                    .send(StreamMessage::ConnectionLost(e.to_string()))
                    .await;
                return;
            }
        };
        for frame in parser.push(&chunk) {
            if frame.event == "error" {
                // Transport-level failure event, whatever the payload.
                warn!("server sent transport error frame");
                let _ = tx
                    .send(StreamMessage::ConnectionLost(
                        "server reported a stream error".to_string(),
                    ))
                    .await;
                return;
            }
            let msg = StreamMessage::Frame {
                event: frame.event,
                data: frame.data,
            };
            if tx.send(msg).await.is_err() {
                return;
            }
        }
    }

    warn!("event stream ended");
    let _ = tx
        .send(StreamMessage::ConnectionLost(
            "stream closed by server".to_string(),
        ))
        .await;
}

// ── SSE frame parser ──────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq)]
pub struct SseFrame {
    pub event: String,
    pub data: String,
}

/// Incremental parser for the `text/event-stream` framing: `event:` and
/// `data:` field lines, a blank line terminating each frame, `:` comment
/// lines, CRLF tolerated, multiple `data:` lines joined with `\n`.
#[derive(Debug, Default)]
pub struct SseParser {
    buf: Vec<u8>,
    event: Option<String>,
    data: Vec<String>,
}

impl SseParser {
    pub fn new() -> Self {
        Self::default()
    }

    /// Feed a chunk of bytes; returns every frame completed by it.
    pub fn push(&mut self, chunk: &[u8]) -> Vec<SseFrame> {
        self.buf.extend_from_slice(chunk);
        let mut frames = Vec::new();
        while let Some(pos) = self.buf.iter().position(|&b| b == b'\n') {
            let line: Vec<u8> = self.buf.drain(..=pos).collect();
            let line = String::from_utf8_lossy(&line);
            let line = line.trim_end_matches(['\n', '\r']);
            if let Some(frame) = self.take_line(line) {
                frames.push(frame);
            }
        }
        frames
    }

    fn take_line(&mut self, line: &str) -> Option<SseFrame> {
        if line.is_empty() {
            // Frame boundary.  A frame with no data dispatches nothing but
            // still resets the pending event name.
            let event = self.event.take().unwrap_or_else(|| "message".to_string());
            if self.data.is_empty() {
                return None;
            }
            let data = std::mem::take(&mut self.data).join("\n");
            return Some(SseFrame { event, data });
        }
        if line.starts_with(':') {
            return None; // comment / keep-alive
        }

        let (field, value) = match line.split_once(':') {
            Some((field, value)) => (field, value.strip_prefix(' ').unwrap_or(value)),
            None => (line, ""),
        };
        match field {
            "event" => self.event = Some(value.to_string()),
            "data" => self.data.push(value.to_string()),
            // id / retry are allowed on the wire but unused here
            _ => {}
        }
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_single_frame() {
        let mut p = SseParser::new();
        let frames = p.push(b"event: tracks\ndata: {\"tracks\": []}\n\n");
        assert_eq!(
            frames,
            vec![SseFrame {
                event: "tracks".to_string(),
                data: "{\"tracks\": []}".to_string(),
            }]
        );
    }

    #[test]
    fn test_frame_split_across_chunks() {
        let mut p = SseParser::new();
        assert!(p.push(b"event: track_up").is_empty());
        assert!(p.push(b"date\ndata: {\"track_number\"").is_empty());
        let frames = p.push(b": 3}\n\n");
        assert_eq!(frames.len(), 1);
        assert_eq!(frames[0].event, "track_update");
        assert_eq!(frames[0].data, "{\"track_number\": 3}");
    }

    #[test]
    fn test_crlf_line_endings() {
        let mut p = SseParser::new();
        let frames = p.push(b"event: tracks\r\ndata: {}\r\n\r\n");
        assert_eq!(frames.len(), 1);
        assert_eq!(frames[0].data, "{}");
    }

    #[test]
    fn test_comment_lines_ignored() {
        let mut p = SseParser::new();
        let frames = p.push(b": keep-alive\n\nevent: tracks\ndata: {}\n\n");
        assert_eq!(frames.len(), 1);
        assert_eq!(frames[0].event, "tracks");
    }

    #[test]
    fn test_multiple_data_lines_joined() {
        let mut p = SseParser::new();
        let frames = p.push(b"data: line one\ndata: line two\n\n");
        assert_eq!(frames[0].event, "message");
        assert_eq!(frames[0].data, "line one\nline two");
    }

    #[test]
    fn test_event_name_resets_between_frames() {
        let mut p = SseParser::new();
        let frames = p.push(b"event: tracks\ndata: a\n\ndata: b\n\n");
        assert_eq!(frames.len(), 2);
        assert_eq!(frames[0].event, "tracks");
        assert_eq!(frames[1].event, "message");
    }

    #[test]
    fn test_two_frames_in_one_chunk() {
        let mut p = SseParser::new();
        let frames =
            p.push(b"event: tracks\ndata: {}\n\nevent: track_update\ndata: {\"n\": 1}\n\n");
        assert_eq!(frames.len(), 2);
        assert_eq!(frames[1].event, "track_update");
    }

    #[test]
    fn test_id_and_retry_fields_ignored() {
        let mut p = SseParser::new();
        let frames = p.push(b"id: 7\nretry: 5000\nevent: tracks\ndata: {}\n\n");
        assert_eq!(frames.len(), 1);
        assert_eq!(frames[0].event, "tracks");
    }
}
