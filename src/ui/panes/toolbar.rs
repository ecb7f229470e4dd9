//! Toolbar with the Save and Run actions and the port selector

use crate::ui::theme::DEFAULT_THEME;
use ratatui::{
    layout::{Alignment, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::Paragraph,
    Frame,
};

/// Text of the port selector: the selected port and its place in the list
pub fn port_label(ports: &[String], selected: Option<usize>) -> String {
    match selected.and_then(|i| ports.get(i).map(|p| (i, p))) {
        Some((i, port)) => format!("◀ {} ▶ ({}/{})", port, i + 1, ports.len()),
        None if ports.is_empty() => "no ports found".to_string(),
        None => "none selected".to_string(),
    }
}

/// Render the toolbar at the top
pub fn render_toolbar(frame: &mut Frame, area: Rect, ports: &[String], selected: Option<usize>) {
    let bar_bg = DEFAULT_THEME.current_line_bg;
    let key_style = Style::default().bg(DEFAULT_THEME.comment).fg(Color::Black);
    let action_style = Style::default()
        .bg(bar_bg)
        .fg(DEFAULT_THEME.fg)
        .add_modifier(Modifier::BOLD);
    let sep_style = Style::default().bg(bar_bg).fg(DEFAULT_THEME.comment);

    let port_style = if selected.is_some() {
        Style::default()
            .bg(DEFAULT_THEME.success)
            .fg(Color::Black)
            .add_modifier(Modifier::BOLD)
    } else {
        Style::default()
            .bg(DEFAULT_THEME.error)
            .fg(Color::Black)
            .add_modifier(Modifier::BOLD)
    };

    let spans = vec![
        Span::styled(" ^S ", key_style),
        Span::styled(" Save ", action_style),
        Span::styled("│", sep_style),
        Span::styled(" ", action_style),
        Span::styled(" ^R ", key_style),
        Span::styled(" Run ", action_style),
        Span::styled("│", sep_style),
        Span::styled(" Port ", action_style),
        Span::styled(format!(" {} ", port_label(ports, selected)), port_style),
        Span::styled(" ", action_style),
        Span::styled(" ^P ", key_style),
        Span::styled(" next ", sep_style),
        Span::styled(" F6 ", key_style),
        Span::styled(" rescan ", sep_style),
    ];

    let paragraph = Paragraph::new(Line::from(spans))
        .style(Style::default().bg(bar_bg))
        .alignment(Alignment::Left);
    frame.render_widget(paragraph, area);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_port_label() {
        let ports = vec!["/dev/ttyACM0".to_string(), "/dev/ttyUSB0".to_string()];
        assert_eq!(port_label(&ports, Some(1)), "◀ /dev/ttyUSB0 ▶ (2/2)");
        assert_eq!(port_label(&ports, None), "none selected");
        assert_eq!(port_label(&[], None), "no ports found");
    }

    #[test]
    fn test_port_chip_colour_follows_selection() {
        use ratatui::{backend::TestBackend, Terminal};

        let chip_bg = |ports: &[String], selected: Option<usize>| {
            let mut terminal = Terminal::new(TestBackend::new(100, 1)).unwrap();
            terminal
                .draw(|f| render_toolbar(f, f.area(), ports, selected))
                .unwrap();
            let cells = &terminal.backend().buffer().content;
            let row: String = cells.iter().map(|c| c.symbol()).collect();
            let at = row.find(&port_label(ports, selected)).unwrap();
            cells[row[..at].chars().count()].bg
        };

        let ports = vec!["/dev/ttyUSB0".to_string()];
        assert_eq!(chip_bg(&ports, Some(0)), DEFAULT_THEME.success);
        assert_eq!(chip_bg(&[], None), DEFAULT_THEME.error);
    }
}
