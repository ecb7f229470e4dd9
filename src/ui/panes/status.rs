//! Status bar rendering with keybindings and file state

use crate::ui::theme::DEFAULT_THEME;
use ratatui::{
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::Paragraph,
    Frame,
};
use unicode_width::UnicodeWidthStr;

/// What the status bar shows about the open file
pub struct StatusRenderData<'a> {
    pub file_name: &'a str,
    pub modified: bool,
    /// Zero-based cursor line
    pub line: usize,
    /// Zero-based screen column, tabs expanded
    pub col: usize,
    pub message: &'a str,
    pub is_error: bool,
}

/// Render the status bar at the bottom
pub fn render_status_bar(frame: &mut Frame, area: Rect, data: &StatusRenderData) {
    let layout = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(55), Constraint::Percentage(45)])
        .split(area);

    let bar_bg = DEFAULT_THEME.current_line_bg;
    let file_text = if data.modified {
        format!(" {} [+] ", data.file_name)
    } else {
        format!(" {} ", data.file_name)
    };

    let left_spans = vec![
        Span::styled(
            file_text,
            Style::default()
                .bg(if data.modified {
                    DEFAULT_THEME.secondary
                } else {
                    DEFAULT_THEME.primary
                })
                .fg(Color::Black)
                .add_modifier(Modifier::BOLD),
        ),
        Span::styled(
            format!(" Ln {}, Col {} ", data.line + 1, data.col + 1),
            Style::default().bg(bar_bg).fg(DEFAULT_THEME.comment),
        ),
        Span::styled(" | ", Style::default().bg(bar_bg).fg(DEFAULT_THEME.comment)),
        Span::styled(
            format!(" {} ", data.message),
            Style::default().bg(bar_bg).fg(if data.is_error {
                DEFAULT_THEME.error
            } else {
                DEFAULT_THEME.fg
            }),
        ),
    ];

    let left_paragraph = Paragraph::new(Line::from(left_spans))
        .style(Style::default().bg(bar_bg))
        .alignment(Alignment::Left);
    frame.render_widget(left_paragraph, layout[0]);

    let key_style = Style::default().bg(DEFAULT_THEME.comment).fg(Color::Black);
    let desc_style = Style::default().bg(bar_bg).fg(DEFAULT_THEME.fg);
    let sep_style = Style::default().bg(bar_bg).fg(DEFAULT_THEME.comment);

    let right_spans = vec![
        Span::styled(" F2 ", key_style),
        Span::styled(" focus ", desc_style),
        Span::styled("│", sep_style),
        Span::styled(" ", desc_style),
        Span::styled(" ^L ", key_style),
        Span::styled(" clear ", desc_style),
        Span::styled("│", sep_style),
        Span::styled(" ", desc_style),
        Span::styled(" ^Q ", key_style),
        Span::styled(" quit ", desc_style),
    ];

    let right_paragraph = Paragraph::new(Line::from(right_spans))
        .style(Style::default().bg(bar_bg))
        .alignment(Alignment::Right);
    frame.render_widget(right_paragraph, layout[1]);
}

/// Render the "Save as" prompt in place of the status bar, with `error`
/// after the typed name when the last entry was rejected
pub fn render_save_prompt(frame: &mut Frame, area: Rect, input: &str, error: Option<&str>) {
    let bar_bg = DEFAULT_THEME.current_line_bg;
    let label = " Save as: ";
    let mut spans = vec![
        Span::styled(
            label,
            Style::default()
                .bg(DEFAULT_THEME.secondary)
                .fg(Color::Black)
                .add_modifier(Modifier::BOLD),
        ),
        Span::styled(
            format!(" {}", input),
            Style::default().bg(bar_bg).fg(DEFAULT_THEME.fg),
        ),
    ];
    if let Some(error) = error {
        spans.push(Span::styled(
            format!("  {}", error),
            Style::default().bg(bar_bg).fg(DEFAULT_THEME.error),
        ));
    }
    frame.render_widget(
        Paragraph::new(Line::from(spans)).style(Style::default().bg(bar_bg)),
        area,
    );

    let hint = Line::from(vec![
        Span::styled(" ↵ ", Style::default().bg(DEFAULT_THEME.comment).fg(Color::Black)),
        Span::styled(" save ", Style::default().bg(bar_bg).fg(DEFAULT_THEME.fg)),
        Span::styled(" Esc ", Style::default().bg(DEFAULT_THEME.comment).fg(Color::Black)),
        Span::styled(" cancel ", Style::default().bg(bar_bg).fg(DEFAULT_THEME.fg)),
    ]);
    let hint_width = hint.width() as u16;
    if area.width > hint_width {
        let hint_area = Rect {
            x: area.x + area.width - hint_width,
            width: hint_width,
            ..area
        };
        frame.render_widget(Paragraph::new(hint), hint_area);
    }

    let cursor_x = area.x + (label.width() + 1 + input.width()) as u16;
    frame.set_cursor_position((cursor_x.min(area.x + area.width.saturating_sub(1)), area.y));
}
