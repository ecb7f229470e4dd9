//! Line-based text buffer with a single cursor
//!
//! The buffer always holds at least one line. Columns are counted in
//! characters, not bytes; tabs are kept as-is in the text and only expanded
//! when rendering (see [`expand_tabs`] and [`TextBuffer::display_col`]).
//! Screen widths follow `unicode-width`, so wide glyphs take two cells.

use unicode_width::UnicodeWidthChar;

/// Cursor position in the buffer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Position {
    pub row: usize,
    pub col: usize,
}

impl Position {
    pub const fn new(row: usize, col: usize) -> Self {
        Self { row, col }
    }
}

#[derive(Debug, Clone)]
pub struct TextBuffer {
    lines: Vec<String>,
    cursor: Position,
    /// Column remembered across vertical moves through shorter lines
    desired_col: usize,
    crlf: bool,
    modified: bool,
    /// First row edited since the last [`TextBuffer::take_dirty_row`]
    dirty_from: Option<usize>,
}

impl Default for TextBuffer {
    fn default() -> Self {
        Self::new()
    }
}

impl TextBuffer {
    pub fn new() -> Self {
        TextBuffer {
            lines: vec![String::new()],
            cursor: Position::default(),
            desired_col: 0,
            crlf: false,
            modified: false,
            dirty_from: Some(0),
        }
    }

    pub fn from_text(text: &str) -> Self {
        let crlf = text.contains("\r\n");
        let lines = text
            .split('\n')
            .map(|line| {
                if crlf {
                    line.strip_suffix('\r').unwrap_or(line).to_string()
                } else {
                    line.to_string()
                }
            })
            .collect();
        TextBuffer {
            lines,
            crlf,
            ..TextBuffer::new()
        }
    }

    /// Full buffer contents, with the line endings it was loaded with
    pub fn text(&self) -> String {
        self.lines.join(if self.crlf { "\r\n" } else { "\n" })
    }

    pub fn line_count(&self) -> usize {
        self.lines.len()
    }

    pub fn line(&self, row: usize) -> Option<&str> {
        self.lines.get(row).map(|s| s.as_str())
    }

    pub fn lines(&self) -> impl Iterator<Item = &str> {
        self.lines.iter().map(|s| s.as_str())
    }

    pub fn cursor(&self) -> Position {
        self.cursor
    }

    pub fn is_modified(&self) -> bool {
        self.modified
    }

    pub fn mark_saved(&mut self) {
        self.modified = false;
    }

    /// First row changed since the previous call, if any
    pub fn take_dirty_row(&mut self) -> Option<usize> {
        self.dirty_from.take()
    }

    fn touch(&mut self, row: usize) {
        self.modified = true;
        self.dirty_from = Some(self.dirty_from.map_or(row, |r| r.min(row)));
    }

    fn line_len(&self, row: usize) -> usize {
        self.lines[row].chars().count()
    }

    fn current_line(&self) -> &str {
        &self.lines[self.cursor.row]
    }

    /// Byte offset of the cursor column in the current line
    fn cursor_byte(&self) -> usize {
        byte_index(self.current_line(), self.cursor.col)
    }

    fn set_col(&mut self, col: usize) {
        self.cursor.col = col;
        self.desired_col = col;
    }

    pub fn insert_char(&mut self, c: char) {
        if c == '\n' {
            self.insert_newline(0);
            return;
        }
        let at = self.cursor_byte();
        self.lines[self.cursor.row].insert(at, c);
        self.set_col(self.cursor.col + 1);
        self.touch(self.cursor.row);
    }

    pub fn insert_str(&mut self, s: &str) {
        for c in s.chars() {
            self.insert_char(c);
        }
    }

    /// Split the line at the cursor.
    ///
    /// The new line inherits the leading whitespace of the current one, plus
    /// `indent_width` spaces when the text before the cursor ends in `:`.
    pub fn insert_newline(&mut self, indent_width: usize) {
        let at = self.cursor_byte();
        let row = self.cursor.row;
        let rest = self.lines[row].split_off(at);

        let head = &self.lines[row];
        let mut indent: String = head.chars().take_while(|c| *c == ' ' || *c == '\t').collect();
        if indent_width > 0 && head.trim_end().ends_with(':') {
            indent.push_str(&" ".repeat(indent_width));
        }

        let col = indent.chars().count();
        indent.push_str(rest.trim_start_matches(|c: char| c == ' ' || c == '\t'));
        self.lines.insert(row + 1, indent);
        self.cursor.row = row + 1;
        self.set_col(col);
        self.touch(row);
    }

    /// Insert spaces up to the next multiple of `width`
    pub fn insert_indent(&mut self, width: usize) {
        let width = width.max(1);
        let n = width - self.cursor.col % width;
        self.insert_str(&" ".repeat(n));
    }

    pub fn backspace(&mut self) {
        let row = self.cursor.row;
        if self.cursor.col > 0 {
            let at = byte_index(&self.lines[row], self.cursor.col - 1);
            self.lines[row].remove(at);
            self.set_col(self.cursor.col - 1);
            self.touch(row);
        } else if row > 0 {
            let line = self.lines.remove(row);
            let col = self.line_len(row - 1);
            self.lines[row - 1].push_str(&line);
            self.cursor.row = row - 1;
            self.set_col(col);
            self.touch(row - 1);
        }
    }

    pub fn delete(&mut self) {
        let row = self.cursor.row;
        if self.cursor.col < self.line_len(row) {
            let at = self.cursor_byte();
            self.lines[row].remove(at);
            self.touch(row);
        } else if row + 1 < self.lines.len() {
            let next = self.lines.remove(row + 1);
            self.lines[row].push_str(&next);
            self.touch(row);
        }
    }

    pub fn move_left(&mut self) {
        if self.cursor.col > 0 {
            self.set_col(self.cursor.col - 1);
        } else if self.cursor.row > 0 {
            self.cursor.row -= 1;
            self.set_col(self.line_len(self.cursor.row));
        }
    }

    pub fn move_right(&mut self) {
        if self.cursor.col < self.line_len(self.cursor.row) {
            self.set_col(self.cursor.col + 1);
        } else if self.cursor.row + 1 < self.lines.len() {
            self.cursor.row += 1;
            self.set_col(0);
        }
    }

    pub fn move_up(&mut self) {
        self.move_rows_up(1);
    }

    pub fn move_down(&mut self) {
        self.move_rows_down(1);
    }

    pub fn page_up(&mut self, rows: usize) {
        self.move_rows_up(rows.max(1));
    }

    pub fn page_down(&mut self, rows: usize) {
        self.move_rows_down(rows.max(1));
    }

    fn move_rows_up(&mut self, rows: usize) {
        self.cursor.row = self.cursor.row.saturating_sub(rows);
        self.cursor.col = self.desired_col.min(self.line_len(self.cursor.row));
    }

    fn move_rows_down(&mut self, rows: usize) {
        self.cursor.row = (self.cursor.row + rows).min(self.lines.len() - 1);
        self.cursor.col = self.desired_col.min(self.line_len(self.cursor.row));
    }

    pub fn move_home(&mut self) {
        self.set_col(0);
    }

    pub fn move_end(&mut self) {
        self.set_col(self.line_len(self.cursor.row));
    }

    pub fn move_to_start(&mut self) {
        self.cursor.row = 0;
        self.set_col(0);
    }

    pub fn move_to_end(&mut self) {
        self.cursor.row = self.lines.len() - 1;
        self.set_col(self.line_len(self.cursor.row));
    }

    /// Screen column of the cursor once tabs are expanded
    pub fn display_col(&self, tab_width: usize) -> usize {
        display_width(self.current_line(), self.cursor.col, tab_width)
    }
}

/// Byte offset of character `col` in `line` (end of line when past it)
fn byte_index(line: &str, col: usize) -> usize {
    line.char_indices()
        .nth(col)
        .map(|(i, _)| i)
        .unwrap_or(line.len())
}

/// Terminal cells taken by `c`; control characters count as one
pub fn char_width(c: char) -> usize {
    UnicodeWidthChar::width(c).unwrap_or(1)
}

/// Width of the first `col` characters of `line` with tabs expanded
fn display_width(line: &str, col: usize, tab_width: usize) -> usize {
    let tab_width = tab_width.max(1);
    line.chars().take(col).fold(0, |rx, c| {
        if c == '\t' {
            rx + tab_width - rx % tab_width
        } else {
            rx + char_width(c)
        }
    })
}

/// `line` with every tab replaced by spaces up to the next tab stop
pub fn expand_tabs(line: &str, tab_width: usize) -> String {
    if !line.contains('\t') {
        return line.to_string();
    }
    let tab_width = tab_width.max(1);
    let mut out = String::with_capacity(line.len());
    let mut rx = 0;
    for c in line.chars() {
        if c == '\t' {
            let n = tab_width - rx % tab_width;
            out.push_str(&" ".repeat(n));
            rx += n;
        } else {
            out.push(c);
            rx += char_width(c);
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_text_roundtrip_keeps_trailing_newline() {
        let buffer = TextBuffer::from_text("import machine\nled = 1\n");
        assert_eq!(buffer.line_count(), 3);
        assert_eq!(buffer.line(2), Some(""));
        assert_eq!(buffer.text(), "import machine\nled = 1\n");
    }

    #[test]
    fn test_crlf_preserved() {
        let buffer = TextBuffer::from_text("a\r\nb\r\n");
        assert_eq!(buffer.line(0), Some("a"));
        assert_eq!(buffer.text(), "a\r\nb\r\n");
    }

    #[test]
    fn test_empty_buffer_has_one_line() {
        let mut buffer = TextBuffer::new();
        assert_eq!(buffer.line_count(), 1);
        buffer.backspace();
        buffer.delete();
        assert_eq!(buffer.line_count(), 1);
        assert!(!buffer.is_modified());
    }

    #[test]
    fn test_insert_and_backspace_multibyte() {
        let mut buffer = TextBuffer::new();
        buffer.insert_str("µs=5");
        assert_eq!(buffer.cursor(), Position::new(0, 4));
        buffer.move_home();
        buffer.move_right();
        buffer.backspace();
        assert_eq!(buffer.text(), "s=5");
        assert!(buffer.is_modified());
    }

    #[test]
    fn test_newline_auto_indent_after_colon() {
        let mut buffer = TextBuffer::new();
        buffer.insert_str("while True:");
        buffer.insert_newline(4);
        buffer.insert_str("led.on()");
        buffer.insert_newline(4);

        assert_eq!(buffer.text(), "while True:\n    led.on()\n    ");
        assert_eq!(buffer.cursor(), Position::new(2, 4));
    }

    #[test]
    fn test_backspace_joins_lines() {
        let mut buffer = TextBuffer::from_text("ab\ncd");
        buffer.move_down();
        buffer.move_home();
        buffer.backspace();
        assert_eq!(buffer.text(), "abcd");
        assert_eq!(buffer.cursor(), Position::new(0, 2));
    }

    #[test]
    fn test_delete_joins_next_line() {
        let mut buffer = TextBuffer::from_text("ab\ncd");
        buffer.move_end();
        buffer.delete();
        assert_eq!(buffer.text(), "abcd");
        assert_eq!(buffer.line_count(), 1);
    }

    #[test]
    fn test_vertical_motion_remembers_column() {
        let mut buffer = TextBuffer::from_text("long line here\nab\nanother long one");
        buffer.move_end();
        buffer.move_down();
        assert_eq!(buffer.cursor(), Position::new(1, 2));
        buffer.move_down();
        assert_eq!(buffer.cursor(), Position::new(2, 14));
        buffer.page_down(100);
        assert_eq!(buffer.cursor().row, 2);
        buffer.page_up(100);
        assert_eq!(buffer.cursor().row, 0);
    }

    #[test]
    fn test_left_right_wrap_lines() {
        let mut buffer = TextBuffer::from_text("a\nb");
        buffer.move_end();
        buffer.move_right();
        assert_eq!(buffer.cursor(), Position::new(1, 0));
        buffer.move_left();
        assert_eq!(buffer.cursor(), Position::new(0, 1));
    }

    #[test]
    fn test_indent_to_next_stop() {
        let mut buffer = TextBuffer::new();
        buffer.insert_str("x");
        buffer.insert_indent(4);
        assert_eq!(buffer.text(), "x   ");
        buffer.insert_indent(4);
        assert_eq!(buffer.cursor().col, 8);
    }

    #[test]
    fn test_tabs_expand_for_display() {
        assert_eq!(expand_tabs("\tx\ty", 4), "    x   y");
        let mut buffer = TextBuffer::from_text("\tx");
        buffer.move_end();
        assert_eq!(buffer.display_col(4), 5);
    }

    #[test]
    fn test_wide_chars_take_two_cells() {
        let mut buffer = TextBuffer::from_text("# 温度x");
        buffer.move_end();
        buffer.move_left();
        assert_eq!(buffer.cursor().col, 4);
        assert_eq!(buffer.display_col(4), 6);
        // Tab stops count the wide glyph as two cells
        assert_eq!(expand_tabs("温\tx", 4), "温  x");
    }

    #[test]
    fn test_dirty_row_tracks_earliest_edit() {
        let mut buffer = TextBuffer::from_text("a\nb\nc");
        assert_eq!(buffer.take_dirty_row(), Some(0));
        assert_eq!(buffer.take_dirty_row(), None);

        buffer.move_to_end();
        buffer.insert_char('x');
        buffer.move_up();
        buffer.insert_char('y');
        assert_eq!(buffer.take_dirty_row(), Some(1));

        // Motion alone leaves the buffer clean
        buffer.move_to_start();
        assert_eq!(buffer.take_dirty_row(), None);

        buffer.move_down();
        buffer.move_home();
        buffer.backspace();
        assert_eq!(buffer.take_dirty_row(), Some(0));
    }
}
