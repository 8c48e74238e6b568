//! TrackTable component — renders the registry projection: the valid bucket
//! with number/filename/size/status/message rows, the failed bucket below.
//!
//! Holds nothing but a scroll cursor: every draw is a projection of the
//! current registry, so drawing the same state twice is identical.

use ratatui::crossterm::event::{KeyCode, KeyEvent, KeyEventKind};
use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, List, ListItem, Paragraph},
    Frame,
};

use lyrsync_proto::presenter::format_size;
use lyrsync_proto::protocol::TrackRecord;

use crate::action::Action;
use crate::app_state::AppState;
use crate::component::Component;
use crate::theme::{
    status_color, style_default, style_focused_border, style_muted, style_secondary,
    style_unfocused_border, C_BADGE_ERR,
};

pub struct TrackTable {
    scroll: usize,
}

impl TrackTable {
    pub fn new() -> Self {
        Self { scroll: 0 }
    }

    pub fn reset_scroll(&mut self) {
        self.scroll = 0;
    }
}

impl Component for TrackTable {
    fn handle_key(&mut self, key: KeyEvent, state: &AppState) -> Vec<Action> {
        if key.kind != KeyEventKind::Press {
            return Vec::new();
        }
        let max = state.view.valid_count().saturating_sub(1);
        match key.code {
            KeyCode::Up | KeyCode::Char('k') => self.scroll = self.scroll.saturating_sub(1),
            KeyCode::Down | KeyCode::Char('j') => self.scroll = (self.scroll + 1).min(max),
            KeyCode::PageUp => self.scroll = self.scroll.saturating_sub(10),
            KeyCode::PageDown => self.scroll = (self.scroll + 10).min(max),
            KeyCode::Char('g') | KeyCode::Home => self.scroll = 0,
            KeyCode::Char('G') | KeyCode::End => self.scroll = max,
            _ => {}
        }
        Vec::new()
    }

    fn draw(&mut self, frame: &mut Frame, area: Rect, focused: bool, state: &AppState) {
        let view = &state.view;
        // The failed bucket only claims space when it has content, capped at
        // a third of the pane.
        let invalid_height = if view.invalid_count() == 0 {
            3
        } else {
            ((view.invalid_count() + 2) as u16).min(area.height / 3)
        };
        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([Constraint::Min(4), Constraint::Length(invalid_height)])
            .split(area);

        let border_style = if focused {
            style_focused_border()
        } else {
            style_unfocused_border()
        };

        // ── Valid bucket ────────────────────────────────────────────────────
        let valid_block = Block::default()
            .borders(Borders::ALL)
            .border_style(border_style)
            .title(Span::styled(
                format!(" Tracks ({}) ", view.valid_count()),
                style_secondary(),
            ));
        let inner = valid_block.inner(chunks[0]);
        frame.render_widget(valid_block, chunks[0]);

        if view.valid.is_empty() {
            frame.render_widget(
                Paragraph::new(Line::from(Span::styled("No tracks found", style_muted()))),
                inner,
            );
        } else {
            let height = inner.height as usize;
            self.scroll = self.scroll.min(view.valid.len().saturating_sub(1));
            let start = self.scroll.min(view.valid.len().saturating_sub(height.max(1)));
            let items: Vec<ListItem> = view.valid[start..]
                .iter()
                .take(height)
                .map(|r| ListItem::new(valid_row(r, inner.width)))
                .collect();
            frame.render_widget(List::new(items), inner);
        }

        // ── Failed bucket ───────────────────────────────────────────────────
        let invalid_block = Block::default()
            .borders(Borders::ALL)
            .border_style(style_unfocused_border())
            .title(Span::styled(
                format!(" Failed ({}) ", view.invalid_count()),
                style_secondary(),
            ));
        let inner = invalid_block.inner(chunks[1]);
        frame.render_widget(invalid_block, chunks[1]);

        if view.invalid.is_empty() {
            frame.render_widget(
                Paragraph::new(Line::from(Span::styled("none", style_muted()))),
                inner,
            );
        } else {
            let items: Vec<ListItem> = view
                .invalid
                .iter()
                .take(inner.height as usize)
                .map(|r| ListItem::new(invalid_row(r)))
                .collect();
            frame.render_widget(List::new(items), inner);
        }
    }
}

fn valid_row(record: &TrackRecord, width: u16) -> Line<'static> {
    let number = match record.track_number {
        Some(n) => format!("{n:>3}  "),
        None => "  ?  ".to_string(),
    };
    let badge = format!("[{}]", record.status.label());
    let mut spans = vec![
        Span::styled(number, style_secondary()),
        Span::styled(record.filename.clone(), style_default()),
        Span::styled(format!("  {}", format_size(record.size)), style_muted()),
        Span::styled(
            format!("  {badge}"),
            Style::default()
                .fg(status_color(record.status))
                .add_modifier(Modifier::BOLD),
        ),
    ];
    if !record.message.is_empty() && width > 50 {
        spans.push(Span::styled(
            format!("  {}", record.message),
            style_secondary(),
        ));
    }
    Line::from(spans)
}

fn invalid_row(record: &TrackRecord) -> Line<'static> {
    let mut spans = vec![
        Span::styled("✗ ", Style::default().fg(C_BADGE_ERR)),
        Span::styled(record.filename.clone(), style_default()),
    ];
    if !record.message.is_empty() {
        spans.push(Span::styled(
            format!(" — {}", record.message),
            style_secondary(),
        ));
    }
    Line::from(spans)
}
