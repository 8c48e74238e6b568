//! Smooth Unicode progress bar for the overall embedding job.

use ratatui::{
    layout::Rect,
    style::Style,
    text::{Line, Span},
    widgets::Paragraph,
    Frame,
};

use crate::theme::{C_BADGE_OK, C_MUTED, C_SECONDARY};

/// Render the job progress bar in `area`.  `percent` is 0.0..=100.0; `None`
/// means the server has not reported progress yet.
pub fn draw_progress(frame: &mut Frame, area: Rect, percent: Option<f32>) {
    if area.width < 10 || area.height == 0 {
        return;
    }

    let percent = percent.map(|p| p.clamp(0.0, 100.0));
    let label = match percent {
        Some(p) => format!(" {:>3}%", p.round() as u32),
        None => "  --%".to_string(),
    };
    let bar_w = area.width.saturating_sub(label.len() as u16 + 1).max(4) as usize;

    // Unicode smooth fill: 8 eighths per cell
    const BLOCKS: [char; 9] = [' ', '▏', '▎', '▍', '▌', '▋', '▊', '▉', '█'];
    let eighths = (percent.unwrap_or(0.0) as f64 / 100.0 * bar_w as f64 * 8.0) as usize;
    let full_blocks = (eighths / 8).min(bar_w);
    let partial = eighths % 8;

    let mut bar = String::with_capacity(bar_w + 4);
    for _ in 0..full_blocks {
        bar.push('█');
    }
    if full_blocks < bar_w {
        bar.push(BLOCKS[partial]);
        for _ in (full_blocks + 1)..bar_w {
            bar.push(' ');
        }
    }

    let spans = vec![
        Span::styled(bar, Style::default().fg(C_BADGE_OK)),
        Span::styled(
            label,
            Style::default().fg(if percent.is_some() { C_SECONDARY } else { C_MUTED }),
        ),
    ];
    frame.render_widget(Paragraph::new(Line::from(spans)), area);
}
