//! UrlInput component — the lyrics-source reference URL field.

use ratatui::crossterm::event::{Event, KeyCode, KeyEvent, KeyEventKind};
use ratatui::{
    layout::Rect,
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph},
    Frame,
};
use tui_input::{backend::crossterm::EventHandler, Input};

use crate::action::{Action, ComponentId};
use crate::app_state::AppState;
use crate::component::Component;
use crate::theme::{
    style_focused_border, style_input, style_muted, style_secondary, style_unfocused_border,
};

pub struct UrlInput {
    input: Input,
}

impl UrlInput {
    pub fn new() -> Self {
        Self {
            input: Input::default(),
        }
    }

    /// Reset the field (a submit clears it, like the web client does).
    pub fn clear(&mut self) {
        self.input = Input::default();
    }
}

impl Component for UrlInput {
    fn handle_key(&mut self, key: KeyEvent, state: &AppState) -> Vec<Action> {
        if key.kind != KeyEventKind::Press {
            return Vec::new();
        }
        match key.code {
            KeyCode::Enter => {
                if state.can_submit() {
                    vec![Action::Submit]
                } else {
                    Vec::new()
                }
            }
            KeyCode::Esc => vec![Action::FocusPane(ComponentId::FilePicker)],
            _ => {
                let before = self.input.value().to_string();
                self.input.handle_event(&Event::Key(key));
                if self.input.value() != before {
                    vec![Action::UrlChanged(self.input.value().to_string())]
                } else {
                    Vec::new()
                }
            }
        }
    }

    fn draw(&mut self, frame: &mut Frame, area: Rect, focused: bool, _state: &AppState) {
        let border_style = if focused {
            style_focused_border()
        } else {
            style_unfocused_border()
        };
        let block = Block::default()
            .borders(Borders::ALL)
            .border_style(border_style)
            .title(Span::styled(" Lyrics URL ", style_secondary()));
        let inner = block.inner(area);
        frame.render_widget(block, area);
        if inner.height == 0 {
            return;
        }

        let width = inner.width.max(1) as usize;
        let scroll = self.input.visual_scroll(width.saturating_sub(1));
        let value = self.input.value();
        let paragraph = if value.is_empty() && !focused {
            Paragraph::new(Line::from(Span::styled(
                "Genius or Musixmatch album URL…",
                style_muted(),
            )))
        } else {
            Paragraph::new(Line::from(Span::styled(value.to_string(), style_input())))
                .scroll((0, scroll as u16))
        };
        frame.render_widget(paragraph, inner);

        if focused {
            let cursor_x = self.input.visual_cursor().saturating_sub(scroll) as u16;
            frame.set_cursor_position((inner.x + cursor_x.min(inner.width.saturating_sub(1)), inner.y));
        }
    }
}
