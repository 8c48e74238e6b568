//! App — single-owner event loop for all mutable state.
//!
//! Every stream frame, key press and upload result arrives as an
//! `AppMessage` on one mpsc channel and is handled here, in arrival order.
//! The App owns the Reconciler (and through it the registry) exclusively;
//! components only ever see the read-only `AppState` projection.

use std::io;
use std::time::Duration;

use ratatui::crossterm::{
    event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{
    backend::CrosstermBackend,
    layout::{Constraint, Direction, Layout, Rect},
    text::{Line, Span},
    widgets::Paragraph,
    Frame, Terminal,
};
use tokio::sync::mpsc;
use tracing::{info, warn};

use lyrsync_proto::config::Config;
use lyrsync_proto::presenter::{format_size, partition, TrackView};
use lyrsync_proto::protocol::{ProcessResponse, StreamEvent};
use lyrsync_proto::reconciler::Reconciler;

use crate::action::{Action, ComponentId};
use crate::app_state::AppState;
use crate::component::Component;
use crate::components::{file_picker::FilePicker, track_table::TrackTable, url_input::UrlInput};
use crate::stream::{self, StreamMessage};
use crate::theme::{style_muted, style_secondary, C_ACCENT, C_BADGE_OK, C_MUTED};
use crate::upload;
use crate::widgets::{progress_bar::draw_progress, toast::ToastManager};

/// All inputs into the App loop.
#[derive(Debug)]
pub enum AppMessage {
    /// A terminal input event.
    Event(Event),
    /// A message from the stream task.
    Stream(StreamMessage),
    /// Result of a spawned upload request.
    UploadDone(Result<ProcessResponse, String>),
}

const FOCUS_ORDER: [ComponentId; 3] = [
    ComponentId::FilePicker,
    ComponentId::UrlInput,
    ComponentId::TrackTable,
];

pub struct App {
    config: Config,
    state: AppState,
    reconciler: Reconciler,

    file_picker: FilePicker,
    url_input: UrlInput,
    track_table: TrackTable,
    focus: ComponentId,

    toast: ToastManager,
    http: reqwest::Client,
    tx: Option<mpsc::Sender<AppMessage>>,
    should_quit: bool,
}

impl App {
    pub fn new(config: Config) -> Self {
        let file_picker = FilePicker::new(config.paths.music_dir.clone());
        Self {
            config,
            state: AppState::default(),
            reconciler: Reconciler::new(),
            file_picker,
            url_input: UrlInput::new(),
            track_table: TrackTable::new(),
            focus: ComponentId::FilePicker,
            toast: ToastManager::new(),
            http: reqwest::Client::new(),
            tx: None,
            should_quit: false,
        }
    }

    // ── Main run loop ─────────────────────────────────────────────────────────

    pub async fn run(mut self) -> anyhow::Result<()> {
        enable_raw_mode()?;
        let mut stdout = io::stdout();
        execute!(stdout, EnterAlternateScreen)?;
        let backend = CrosstermBackend::new(stdout);
        let mut terminal = Terminal::new(backend)?;

        let (tx, mut rx) = mpsc::channel::<AppMessage>(1024);
        self.tx = Some(tx.clone());

        // ── Background task: keyboard events ──────────────────────────────────
        let event_tx = tx.clone();
        tokio::task::spawn_blocking(move || loop {
            match event::read() {
                Ok(ev) => {
                    if event_tx.blocking_send(AppMessage::Event(ev)).is_err() {
                        break;
                    }
                }
                Err(_) => break,
            }
        });

        // ── Background task: SSE stream (own channel, forwarded) ──────────────
        let (stream_tx, mut stream_rx) = mpsc::channel::<StreamMessage>(256);
        stream::spawn(self.config.server.clone(), stream_tx);
        let fwd_tx = tx.clone();
        tokio::spawn(async move {
            while let Some(msg) = stream_rx.recv().await {
                if fwd_tx.send(AppMessage::Stream(msg)).await.is_err() {
                    break;
                }
            }
        });

        // Toast expiry + spinner animation.
        let mut ui_tick = tokio::time::interval(Duration::from_millis(100));
        ui_tick.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);

        // ── Main loop ─────────────────────────────────────────────────────────
        let mut needs_redraw = true;
        loop {
            if needs_redraw {
                terminal.draw(|f| self.draw(f))?;
            }
            needs_redraw = false;

            if self.should_quit {
                break;
            }

            tokio::select! {
                Some(msg) = rx.recv() => {
                    needs_redraw = self.handle_message(msg);
                    // Drain whatever queued up so a burst of track updates
                    // costs one redraw, not one per frame.
                    while let Ok(next) = rx.try_recv() {
                        needs_redraw |= self.handle_message(next);
                    }
                }
                _ = ui_tick.tick() => {
                    self.toast.tick();
                    needs_redraw = true;
                }
            }

            if self.should_quit {
                break;
            }
        }

        // ── Teardown ──────────────────────────────────────────────────────────
        disable_raw_mode()?;
        execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
        terminal.show_cursor()?;
        Ok(())
    }

    // ── Message handling ──────────────────────────────────────────────────────

    fn handle_message(&mut self, msg: AppMessage) -> bool {
        match msg {
            AppMessage::Event(Event::Key(key)) => self.handle_key(key),
            AppMessage::Event(Event::Resize(..)) => true,
            AppMessage::Event(_) => false,

            AppMessage::Stream(StreamMessage::Connected) => {
                self.state.connected = true;
                self.toast.info("connected to server");
                true
            }
            AppMessage::Stream(StreamMessage::Frame { event, data }) => {
                self.apply_frame(&event, &data)
            }
            AppMessage::Stream(StreamMessage::ConnectionLost(reason)) => {
                // Distinct failure, not "all tracks done".
                warn!("stream connection lost: {reason}");
                self.state.connected = false;
                self.toast.error(format!("connection lost: {reason}"));
                true
            }

            AppMessage::UploadDone(result) => {
                self.state.uploading = false;
                match result {
                    Ok(resp) if resp.success => {
                        let msg = resp
                            .message
                            .unwrap_or_else(|| "Successfully processed all tracks!".to_string());
                        self.toast
                            .resolve_spinner(crate::widgets::toast::Severity::Success, msg);
                    }
                    Ok(resp) => {
                        let detail = resp
                            .error
                            .or(resp.message)
                            .unwrap_or_else(|| "processing failed".to_string());
                        self.toast
                            .resolve_spinner(crate::widgets::toast::Severity::Error, format!("Error: {detail}"));
                    }
                    Err(e) => {
                        self.toast.resolve_spinner(
                            crate::widgets::toast::Severity::Error,
                            format!("upload failed: {e}"),
                        );
                    }
                }
                true
            }
        }
    }

    /// Parse one stream frame and apply it.  A frame that fails to parse is
    /// surfaced and dropped — the registry is never touched by bad input.
    fn apply_frame(&mut self, event: &str, data: &str) -> bool {
        match StreamEvent::parse(event, data) {
            Ok(parsed) => {
                let outcome = self.reconciler.apply(parsed);
                if let Some(p) = outcome.progress {
                    self.state.progress = Some(p);
                }
                if outcome.replaced || !outcome.changed.is_empty() {
                    if outcome.replaced {
                        self.track_table.reset_scroll();
                    }
                    self.state.view = partition(self.reconciler.registry());
                }
                true
            }
            Err(e) => {
                warn!("dropping stream frame: {e}");
                self.toast.error(format!("bad message from server: {e}"));
                true
            }
        }
    }

    fn handle_key(&mut self, key: KeyEvent) -> bool {
        if key.kind != KeyEventKind::Press {
            return false;
        }
        // Ctrl-C always quits; other globals only when the URL field isn't
        // swallowing text input.
        if key.code == KeyCode::Char('c') && key.modifiers.contains(KeyModifiers::CONTROL) {
            self.should_quit = true;
            return false;
        }
        let typing = self.focus == ComponentId::UrlInput;
        if !typing {
            match key.code {
                KeyCode::Char('q') => {
                    self.should_quit = true;
                    return false;
                }
                KeyCode::Char('u') => {
                    self.focus = ComponentId::UrlInput;
                    return true;
                }
                KeyCode::Char('s') => {
                    self.dispatch(Action::Submit);
                    return true;
                }
                _ => {}
            }
        }
        match key.code {
            KeyCode::Tab => {
                self.cycle_focus(1);
                return true;
            }
            KeyCode::BackTab => {
                self.cycle_focus(-1);
                return true;
            }
            _ => {}
        }

        let actions = match self.focus {
            ComponentId::FilePicker => self.file_picker.handle_key(key, &self.state),
            ComponentId::UrlInput => self.url_input.handle_key(key, &self.state),
            ComponentId::TrackTable => self.track_table.handle_key(key, &self.state),
        };
        for action in actions {
            self.dispatch(action);
        }
        true
    }

    fn cycle_focus(&mut self, dir: isize) {
        let idx = FOCUS_ORDER.iter().position(|&c| c == self.focus).unwrap_or(0);
        let len = FOCUS_ORDER.len() as isize;
        let next = (idx as isize + dir).rem_euclid(len) as usize;
        self.focus = FOCUS_ORDER[next];
    }

    fn dispatch(&mut self, action: Action) {
        match action {
            Action::FocusNext => self.cycle_focus(1),
            Action::FocusPrev => self.cycle_focus(-1),
            Action::FocusPane(id) => self.focus = id,
            Action::PendingChanged(files) => self.state.pending = files,
            Action::UrlChanged(url) => self.state.lyrics_url = url,
            Action::Submit => self.submit(),
            Action::Quit => self.should_quit = true,
            Action::Noop => {}
        }
    }

    /// Kick off an upload: clear the local selection, reset the session
    /// registry, and hand the request to a background task.
    fn submit(&mut self) {
        if !self.state.can_submit() {
            self.toast
                .info("select audio files and enter a lyrics URL first");
            return;
        }
        let files = std::mem::take(&mut self.state.pending);
        let lyrics_url = std::mem::take(&mut self.state.lyrics_url);

        // New upload cycle: the previous session's registry is discarded.
        self.reconciler.reset();
        self.state.view = TrackView::default();
        self.state.progress = Some(0.0);
        self.state.uploading = true;
        self.file_picker.clear_marks();
        self.url_input.clear();
        self.track_table.reset_scroll();
        self.toast.spinner(format!("uploading {} file(s)…", files.len()));
        info!("submitting {} file(s)", files.len());

        let client = self.http.clone();
        let url = self.config.server.process_url();
        let Some(tx) = self.tx.clone() else {
            return;
        };
        tokio::spawn(async move {
            let result = upload::submit(&client, &url, &files, &lyrics_url)
                .await
                .map_err(|e| format!("{e:#}"));
            let _ = tx.send(AppMessage::UploadDone(result)).await;
        });
    }

    // ── Rendering ─────────────────────────────────────────────────────────────

    fn draw(&mut self, frame: &mut Frame) {
        let area = frame.area();
        let rows = Layout::default()
            .direction(Direction::Vertical)
            .constraints([Constraint::Length(1), Constraint::Min(6)])
            .split(area);

        self.draw_header(frame, rows[0]);

        let columns = Layout::default()
            .direction(Direction::Horizontal)
            .constraints([Constraint::Length(44), Constraint::Min(30)])
            .split(rows[1]);

        // Left: picker + URL field + pending summary.
        let left = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Min(4),
                Constraint::Length(3),
                Constraint::Length(1),
            ])
            .split(columns[0]);
        self.file_picker
            .draw(frame, left[0], self.focus == ComponentId::FilePicker, &self.state);
        self.url_input
            .draw(frame, left[1], self.focus == ComponentId::UrlInput, &self.state);
        self.draw_pending_summary(frame, left[2]);

        // Right: track table + overall progress.
        let right = Layout::default()
            .direction(Direction::Vertical)
            .constraints([Constraint::Min(5), Constraint::Length(1)])
            .split(columns[1]);
        self.track_table
            .draw(frame, right[0], self.focus == ComponentId::TrackTable, &self.state);
        draw_progress(frame, right[1], self.state.progress);

        self.toast.draw(frame, area);
    }

    fn draw_header(&self, frame: &mut Frame, area: Rect) {
        let (dot, dot_color) = if self.state.connected {
            ("● connected", C_BADGE_OK)
        } else {
            ("○ offline", C_MUTED)
        };
        let line = Line::from(vec![
            Span::styled(
                " lyrsync ",
                ratatui::style::Style::default()
                    .fg(C_ACCENT)
                    .add_modifier(ratatui::style::Modifier::BOLD),
            ),
            Span::styled(dot, ratatui::style::Style::default().fg(dot_color)),
            Span::styled(
                "   Tab focus · Space mark · u URL · s submit · q quit",
                style_muted(),
            ),
        ]);
        frame.render_widget(Paragraph::new(line), area);
    }

    fn draw_pending_summary(&self, frame: &mut Frame, area: Rect) {
        let line = if self.state.pending.is_empty() {
            Line::from(Span::styled(" no files selected", style_muted()))
        } else {
            Line::from(vec![
                Span::styled(
                    format!(
                        " {} file(s) · {}",
                        self.state.pending.len(),
                        format_size(self.state.pending_bytes())
                    ),
                    style_secondary(),
                ),
                Span::styled(
                    if self.state.can_submit() {
                        " — press s to submit"
                    } else {
                        " — enter a lyrics URL"
                    },
                    style_muted(),
                ),
            ])
        };
        frame.render_widget(Paragraph::new(line), area);
    }
}
