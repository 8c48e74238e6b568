//! FilePicker component — left pane: browse for audio files and mark them
//! for upload.  The marked set is the client's pending selection; it never
//! mixes with the registry.

use std::path::{Path, PathBuf};

use ratatui::crossterm::event::{KeyCode, KeyEvent, KeyEventKind};
use ratatui::{
    layout::Rect,
    style::Style,
    text::{Line, Span},
    widgets::{Block, Borders, List, ListItem, Paragraph},
    Frame,
};
use tracing::warn;

use lyrsync_proto::presenter::format_size;

use crate::action::Action;
use crate::app_state::{AppState, PendingFile};
use crate::component::Component;
use crate::theme::{
    style_default, style_focused_border, style_muted, style_secondary, style_selected,
    style_selected_focused, style_unfocused_border, C_MARK,
};
use crate::upload::is_audio_file;
use crate::widgets::scrollable_list::ScrollableList;

struct DirEntryItem {
    path: PathBuf,
    name: String,
    size_bytes: u64,
    is_dir: bool,
}

pub struct FilePicker {
    dir: PathBuf,
    list: ScrollableList<DirEntryItem>,
    marked: Vec<PendingFile>,
}

impl FilePicker {
    pub fn new(dir: PathBuf) -> Self {
        let mut picker = Self {
            dir,
            list: ScrollableList::new(),
            marked: Vec::new(),
        };
        picker.rescan();
        picker
    }

    /// Clear the pending selection (after a successful submit).
    pub fn clear_marks(&mut self) {
        self.marked.clear();
    }

    fn rescan(&mut self) {
        self.list.set_items(scan_dir(&self.dir));
    }

    fn toggle_mark(&mut self) -> Option<Action> {
        let item = self.list.selected_item()?;
        if item.is_dir {
            return None;
        }
        if let Some(pos) = self.marked.iter().position(|f| f.path == item.path) {
            self.marked.remove(pos);
        } else {
            self.marked.push(PendingFile {
                path: item.path.clone(),
                name: item.name.clone(),
                size_bytes: item.size_bytes,
            });
        }
        Some(Action::PendingChanged(self.marked.clone()))
    }

    fn mark_all(&mut self) -> Action {
        for item in &self.list.items {
            if !item.is_dir && !self.marked.iter().any(|f| f.path == item.path) {
                self.marked.push(PendingFile {
                    path: item.path.clone(),
                    name: item.name.clone(),
                    size_bytes: item.size_bytes,
                });
            }
        }
        Action::PendingChanged(self.marked.clone())
    }

    fn enter(&mut self) -> Option<Action> {
        let item = self.list.selected_item()?;
        if item.is_dir {
            self.dir = item.path.clone();
            self.list.select_first();
            self.rescan();
            None
        } else {
            self.toggle_mark()
        }
    }

    fn go_parent(&mut self) {
        if let Some(parent) = self.dir.parent() {
            self.dir = parent.to_path_buf();
            self.list.select_first();
            self.rescan();
        }
    }
}

impl Component for FilePicker {
    fn handle_key(&mut self, key: KeyEvent, _state: &AppState) -> Vec<Action> {
        if key.kind != KeyEventKind::Press {
            return Vec::new();
        }
        let action = match key.code {
            KeyCode::Up | KeyCode::Char('k') => {
                self.list.select_up(1);
                None
            }
            KeyCode::Down | KeyCode::Char('j') => {
                self.list.select_down(1);
                None
            }
            KeyCode::PageUp => {
                self.list.select_up(10);
                None
            }
            KeyCode::PageDown => {
                self.list.select_down(10);
                None
            }
            KeyCode::Char('g') | KeyCode::Home => {
                self.list.select_first();
                None
            }
            KeyCode::Char('G') | KeyCode::End => {
                self.list.select_last();
                None
            }
            KeyCode::Enter => self.enter(),
            KeyCode::Char(' ') => self.toggle_mark(),
            KeyCode::Char('a') => Some(self.mark_all()),
            KeyCode::Char('c') => {
                self.marked.clear();
                Some(Action::PendingChanged(Vec::new()))
            }
            KeyCode::Backspace | KeyCode::Left | KeyCode::Char('h') => {
                self.go_parent();
                None
            }
            KeyCode::Char('r') => {
                self.rescan();
                None
            }
            _ => None,
        };
        action.into_iter().collect()
    }

    fn draw(&mut self, frame: &mut Frame, area: Rect, focused: bool, _state: &AppState) {
        let border_style = if focused {
            style_focused_border()
        } else {
            style_unfocused_border()
        };
        let title = format!(
            " Files — {} ({} marked) ",
            short_dir(&self.dir),
            self.marked.len()
        );
        let block = Block::default()
            .borders(Borders::ALL)
            .border_style(border_style)
            .title(Span::styled(title, style_secondary()));
        let inner = block.inner(area);
        frame.render_widget(block, area);

        if self.list.items.is_empty() {
            frame.render_widget(
                Paragraph::new(Line::from(Span::styled(
                    "no audio files here — Backspace for parent directory",
                    style_muted(),
                ))),
                inner,
            );
            return;
        }

        let height = inner.height as usize;
        self.list.ensure_visible(height);
        let selected = self.list.selected;
        let items: Vec<ListItem> = self
            .list
            .visible_items(height)
            .map(|(idx, item)| {
                let row_style = if idx == selected {
                    if focused {
                        style_selected_focused()
                    } else {
                        style_selected()
                    }
                } else {
                    Style::default()
                };
                let line = if item.is_dir {
                    Line::from(vec![
                        Span::styled("  ▸ ", style_secondary()),
                        Span::styled(format!("{}/", item.name), style_default()),
                    ])
                } else {
                    let mark = if self.marked.iter().any(|f| f.path == item.path) {
                        Span::styled("[x] ", Style::default().fg(C_MARK))
                    } else {
                        Span::styled("[ ] ", style_muted())
                    };
                    Line::from(vec![
                        mark,
                        Span::styled(item.name.clone(), style_default()),
                        Span::styled(format!("  {}", format_size(item.size_bytes)), style_muted()),
                    ])
                };
                ListItem::new(line).style(row_style)
            })
            .collect();
        frame.render_widget(List::new(items), inner);
    }
}

/// Subdirectories plus audio files, directories first, names case-insensitive.
fn scan_dir(dir: &Path) -> Vec<DirEntryItem> {
    let entries = match std::fs::read_dir(dir) {
        Ok(e) => e,
        Err(e) => {
            warn!("cannot read {}: {e}", dir.display());
            return Vec::new();
        }
    };
    let mut items: Vec<DirEntryItem> = entries
        .flatten()
        .filter_map(|entry| {
            let path = entry.path();
            let name = entry.file_name().to_string_lossy().to_string();
            if name.starts_with('.') {
                return None;
            }
            let meta = entry.metadata().ok()?;
            if meta.is_dir() {
                Some(DirEntryItem {
                    path,
                    name,
                    size_bytes: 0,
                    is_dir: true,
                })
            } else if is_audio_file(&path) {
                Some(DirEntryItem {
                    path,
                    name,
                    size_bytes: meta.len(),
                    is_dir: false,
                })
            } else {
                None
            }
        })
        .collect();
    items.sort_by(|a, b| {
        b.is_dir
            .cmp(&a.is_dir)
            .then_with(|| a.name.to_lowercase().cmp(&b.name.to_lowercase()))
    });
    items
}

fn short_dir(dir: &Path) -> String {
    match dirs::home_dir() {
        Some(home) => match dir.strip_prefix(&home) {
            Ok(rest) if rest.as_os_str().is_empty() => "~".to_string(),
            Ok(rest) => format!("~/{}", rest.display()),
            Err(_) => dir.display().to_string(),
        },
        None => dir.display().to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scan_dir_filters_and_sorts() {
        let tmp = tempfile::tempdir().unwrap();
        let root = tmp.path();
        std::fs::create_dir(root.join("b-dir")).unwrap();
        std::fs::write(root.join("Zeta.mp3"), b"x").unwrap();
        std::fs::write(root.join("alpha.m4a"), b"xy").unwrap();
        std::fs::write(root.join("cover.jpg"), b"x").unwrap();
        std::fs::write(root.join(".hidden.mp3"), b"x").unwrap();

        let items = scan_dir(root);
        let names: Vec<&str> = items.iter().map(|i| i.name.as_str()).collect();
        assert_eq!(names, vec!["b-dir", "alpha.m4a", "Zeta.mp3"]);
        assert!(items[0].is_dir);
        assert_eq!(items[1].size_bytes, 2);
    }

    #[test]
    fn test_toggle_mark_round_trip() {
        let tmp = tempfile::tempdir().unwrap();
        std::fs::write(tmp.path().join("01.mp3"), b"abc").unwrap();
        let mut picker = FilePicker::new(tmp.path().to_path_buf());

        match picker.toggle_mark() {
            Some(Action::PendingChanged(files)) => {
                assert_eq!(files.len(), 1);
                assert_eq!(files[0].name, "01.mp3");
                assert_eq!(files[0].size_bytes, 3);
            }
            other => panic!("unexpected action: {other:?}"),
        }
        match picker.toggle_mark() {
            Some(Action::PendingChanged(files)) => assert!(files.is_empty()),
            other => panic!("unexpected action: {other:?}"),
        }
    }
}
