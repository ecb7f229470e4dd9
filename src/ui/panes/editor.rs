//! Editor pane rendering with line-number gutter
//!
//! This module renders the script being edited: a gutter of line numbers on
//! the left, the highlighted text on the right, and a full-width background
//! on the line holding the cursor.
//!
//! # Features
//!
//! - Gutter sized from the line count ([`crate::gutter::gutter_width`])
//! - Python syntax highlighting, carrying triple-quote state across lines
//! - Current line highlighting
//! - Scrolling in both directions to keep the cursor on screen
//!
//! Only the lines inside the viewport are tokenized and painted. The
//! highlighter state of the lines above it comes from a [`StateCache`] that
//! the app invalidates from the first edited row.
//!
//! Columns are terminal cells, so a wide glyph advances the cursor by two.

use crate::buffer::{char_width, expand_tabs, TextBuffer};
use crate::gutter::{gutter_width, visible_labels};
use crate::syntax::{tokenize_line, StateCache, Token, TokenKind};
use crate::ui::theme::DEFAULT_THEME;
use ratatui::{
    layout::Rect,
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph},
    Frame,
};

/// Scroll state for the editor pane
#[derive(Debug, Clone, Default)]
pub struct EditorScrollState {
    pub row_offset: usize,
    pub col_offset: usize,
    /// Text rows shown in the last frame, used for page up/down
    pub page_height: usize,
    pub highlight: StateCache,
}

impl EditorScrollState {
    /// Shift the offsets so that (`row`, `col`) is inside a `height` x `width`
    /// viewport
    pub fn follow_cursor(&mut self, row: usize, col: usize, height: usize, width: usize) {
        let height = height.max(1);
        let width = width.max(1);

        if row < self.row_offset {
            self.row_offset = row;
        } else if row >= self.row_offset + height {
            self.row_offset = row + 1 - height;
        }

        if col < self.col_offset {
            self.col_offset = col;
        } else if col >= self.col_offset + width {
            self.col_offset = col + 1 - width;
        }
    }
}

fn token_style(kind: TokenKind) -> Style {
    match kind {
        TokenKind::Keyword => Style::default()
            .fg(DEFAULT_THEME.keyword)
            .add_modifier(Modifier::BOLD),
        TokenKind::Constant | TokenKind::Number => Style::default().fg(DEFAULT_THEME.number),
        TokenKind::SelfRef => Style::default()
            .fg(DEFAULT_THEME.self_ref)
            .add_modifier(Modifier::ITALIC),
        TokenKind::Builtin => Style::default().fg(DEFAULT_THEME.builtin),
        TokenKind::Definition => Style::default()
            .fg(DEFAULT_THEME.function)
            .add_modifier(Modifier::BOLD),
        TokenKind::Call => Style::default().fg(DEFAULT_THEME.function),
        TokenKind::Str => Style::default().fg(DEFAULT_THEME.string),
        TokenKind::Comment => Style::default()
            .fg(DEFAULT_THEME.comment)
            .add_modifier(Modifier::ITALIC),
        TokenKind::Decorator => Style::default().fg(DEFAULT_THEME.decorator),
        TokenKind::Bracket => Style::default().fg(DEFAULT_THEME.primary),
        TokenKind::Operator => Style::default().fg(DEFAULT_THEME.secondary),
        TokenKind::Plain => Style::default().fg(DEFAULT_THEME.fg),
    }
}

/// Turn tokens into spans, dropping the first `skip` cells.
///
/// A wide glyph cut by the left edge is replaced by blanks for its visible
/// half. Returns the spans and their width in cells.
fn token_spans(tokens: Vec<Token>, skip: usize) -> (Vec<Span<'static>>, usize) {
    let mut spans = Vec::with_capacity(tokens.len());
    let mut col = 0;
    let mut width = 0;

    for token in tokens {
        let token_width: usize = token.text.chars().map(char_width).sum();
        let text = if col >= skip {
            col += token_width;
            token.text
        } else if col + token_width <= skip {
            col += token_width;
            continue;
        } else {
            let mut rest = String::new();
            for c in token.text.chars() {
                let w = char_width(c);
                if col >= skip {
                    rest.push(c);
                } else if col + w > skip {
                    rest.push_str(&" ".repeat(col + w - skip));
                }
                col += w;
            }
            rest
        };
        width += text.chars().map(char_width).sum::<usize>();
        spans.push(Span::styled(text, token_style(token.kind)));
    }

    (spans, width)
}

/// Render the editor pane
#[allow(clippy::too_many_arguments)]
pub fn render_editor_pane(
    frame: &mut Frame,
    area: Rect,
    buffer: &TextBuffer,
    title: &str,
    tab_width: usize,
    is_focused: bool,
    show_cursor: bool,
    scroll_state: &mut EditorScrollState,
) {
    let border_style = if is_focused {
        Style::default()
            .fg(DEFAULT_THEME.border_focused)
            .add_modifier(Modifier::BOLD)
    } else {
        Style::default().fg(DEFAULT_THEME.border_normal)
    };

    let block = Block::default()
        .title(format!(" {} ", title))
        .borders(Borders::ALL)
        .border_style(border_style);

    let inner = block.inner(area);
    let visible_height = inner.height.max(1) as usize;
    let line_count = buffer.line_count();
    let gutter = gutter_width(line_count);
    let text_width = inner.width.saturating_sub(gutter).max(1) as usize;

    let cursor = buffer.cursor();
    let cursor_col = buffer.display_col(tab_width);
    scroll_state.page_height = visible_height;
    scroll_state.follow_cursor(cursor.row, cursor_col, visible_height, text_width);

    let mut state = scroll_state
        .highlight
        .state_at(buffer.lines(), scroll_state.row_offset);

    let visible_lines: Vec<Line> = visible_labels(scroll_state.row_offset, visible_height, line_count)
        .into_iter()
        .map(|label| {
            let is_current = label.line == cursor.row;
            let text = expand_tabs(buffer.line(label.line).unwrap_or(""), tab_width);
            let (tokens, next_state) = tokenize_line(&text, state);
            state = next_state;

            let num_style = if is_current {
                Style::default()
                    .bg(DEFAULT_THEME.gutter_bg)
                    .fg(DEFAULT_THEME.secondary)
                    .add_modifier(Modifier::BOLD)
            } else {
                Style::default()
                    .bg(DEFAULT_THEME.gutter_bg)
                    .fg(DEFAULT_THEME.comment)
            };

            let (mut spans, width) = token_spans(tokens, scroll_state.col_offset);

            if is_current {
                let line_bg = Style::default().bg(DEFAULT_THEME.current_line_bg);
                for span in &mut spans {
                    span.style = span.style.patch(line_bg);
                }
                // Stretch the highlight to the right edge
                let pad = text_width.saturating_sub(width);
                if pad > 0 {
                    spans.push(Span::styled(" ".repeat(pad), line_bg));
                }
            }

            let mut final_spans = vec![Span::styled(label.text, num_style)];
            final_spans.extend(spans);
            Line::from(final_spans)
        })
        .collect();

    let paragraph = Paragraph::new(visible_lines).block(block);
    frame.render_widget(paragraph, area);

    if show_cursor {
        let x = inner.x + gutter + (cursor_col - scroll_state.col_offset) as u16;
        let y = inner.y + (cursor.row - scroll_state.row_offset) as u16;
        frame.set_cursor_position((x, y));
    }
}
