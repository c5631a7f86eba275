//! Device status indicator: ● lit, ○ unlit.

use ratatui::style::{Color, Style};
use ratatui::text::{Line, Span};

use crate::theme;

/// A labelled flag row, e.g. `● Online  1`.
pub fn flag_line(label: &'static str, value: u8, color: Color) -> Line<'static> {
    let (symbol, style) = if value > 0 {
        ("●", Style::default().fg(color))
    } else {
        ("○", theme::key_hint())
    };
    Line::from(vec![
        Span::styled(format!(" {symbol} "), style),
        Span::styled(format!("{label:<8}"), theme::text()),
        Span::styled(value.to_string(), style),
    ])
}
