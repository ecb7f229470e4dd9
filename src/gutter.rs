//! Line-number gutter geometry
//!
//! The gutter is as wide as the digit count of the last line number plus a
//! fixed padding, so it only ever grows when the buffer crosses a power of
//! ten. Painting walks the visible lines only.

/// Cells of padding around the digits
pub const GUTTER_PADDING: u16 = 3;

/// Number of decimal digits in `n` (at least one)
pub fn digit_count(n: usize) -> u16 {
    let mut digits = 1;
    let mut count = n;
    while count >= 10 {
        count /= 10;
        digits += 1;
    }
    digits
}

/// Gutter width in cells for a buffer of `line_count` lines
pub fn gutter_width(line_count: usize) -> u16 {
    GUTTER_PADDING + digit_count(line_count.max(1))
}

/// One painted gutter row
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GutterLabel {
    /// Zero-based buffer line this label belongs to
    pub line: usize,
    /// Line number, right-aligned, with one trailing space before the text
    pub text: String,
}

/// Labels for the lines visible in a viewport of `height` rows starting at
/// `first_visible`
pub fn visible_labels(first_visible: usize, height: usize, line_count: usize) -> Vec<GutterLabel> {
    let width = gutter_width(line_count) as usize;
    let number_width = width.saturating_sub(1);

    let mut labels = Vec::with_capacity(height);
    let mut line = first_visible;
    while line < line_count && labels.len() < height {
        labels.push(GutterLabel {
            line,
            text: format!("{:>w$} ", line + 1, w = number_width),
        });
        line += 1;
    }
    labels
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_digit_count() {
        assert_eq!(digit_count(0), 1);
        assert_eq!(digit_count(9), 1);
        assert_eq!(digit_count(10), 2);
        assert_eq!(digit_count(99), 2);
        assert_eq!(digit_count(100), 3);
        assert_eq!(digit_count(123_456), 6);
    }

    #[test]
    fn test_empty_buffer_has_one_digit() {
        assert_eq!(gutter_width(0), GUTTER_PADDING + 1);
        assert_eq!(gutter_width(1), GUTTER_PADDING + 1);
    }

    #[test]
    fn test_width_monotonic_in_line_count() {
        let mut prev = gutter_width(0);
        for lines in 1..20_000 {
            let width = gutter_width(lines);
            assert!(width >= prev, "width shrank at {} lines", lines);
            prev = width;
        }
        assert_eq!(gutter_width(9_999), GUTTER_PADDING + 4);
        assert_eq!(gutter_width(10_000), GUTTER_PADDING + 5);
    }

    #[test]
    fn test_labels_cover_visible_lines_only() {
        let labels = visible_labels(8, 5, 11);
        let lines: Vec<usize> = labels.iter().map(|l| l.line).collect();
        assert_eq!(lines, vec![8, 9, 10]);
        assert_eq!(labels[0].text, "   9 ");
        assert_eq!(labels[1].text, "  10 ");
    }

    #[test]
    fn test_label_width_matches_gutter() {
        for label in visible_labels(0, 40, 120) {
            assert_eq!(label.text.len(), gutter_width(120) as usize);
        }
    }
}
