//! Main TUI application state and logic

use crate::buffer::TextBuffer;
use crate::config::Config;
use crate::console::Console;
use crate::error::EditorError;
use crate::ports;
use crate::runner::UploadTool;
use crate::script::ScriptFile;
use crate::ui::panes::{self, EditorScrollState, StatusRenderData};
use crossterm::event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers};
use ratatui::{
    backend::Backend,
    layout::{Constraint, Direction, Layout},
    Frame, Terminal,
};
use std::io;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{error, info, warn};

/// Which pane is currently focused
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FocusedPane {
    Editor,
    Console,
}

impl FocusedPane {
    pub fn toggle(self) -> Self {
        match self {
            FocusedPane::Editor => FocusedPane::Console,
            FocusedPane::Console => FocusedPane::Editor,
        }
    }
}

/// What to do once the "Save as" prompt has produced a path
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AfterSave {
    Nothing,
    Run,
}

/// State of the "Save as" prompt
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SavePrompt {
    pub input: String,
    pub then: AfterSave,
    /// Shown next to the input after a rejected entry
    pub error: Option<String>,
}

/// The main application state
pub struct App {
    pub buffer: TextBuffer,
    pub script: ScriptFile,
    pub console: Console,

    /// Openable serial ports from the last scan
    pub ports: Vec<String>,
    /// Index into `ports` of the selected port
    pub port_index: Option<usize>,

    tool: UploadTool,
    tab_width: usize,

    pub focused_pane: FocusedPane,
    pub editor_scroll: EditorScrollState,
    pub console_scroll: usize,

    /// Active "Save as" prompt, if any
    pub prompt: Option<SavePrompt>,

    pub should_quit: bool,
    /// Set after a first quit request with unsaved changes
    quit_armed: bool,

    pub status_message: String,
    pub status_is_error: bool,
}

impl App {
    pub fn new(config: &Config, script: ScriptFile, text: &str, ports: Vec<String>) -> Self {
        let mut app = App {
            buffer: TextBuffer::from_text(text),
            script,
            console: Console::new(),
            ports: Vec::new(),
            port_index: None,
            tool: config.upload_tool(),
            tab_width: config.tab_width.max(1),
            focused_pane: FocusedPane::Editor,
            editor_scroll: EditorScrollState::default(),
            console_scroll: 0,
            prompt: None,
            should_quit: false,
            quit_armed: false,
            status_message: String::from("Ready!"),
            status_is_error: false,
        };
        app.set_ports(ports, config.default_port.as_deref());
        app
    }

    /// Currently selected serial port
    pub fn port(&self) -> Option<&str> {
        self.port_index
            .and_then(|i| self.ports.get(i))
            .map(|s| s.as_str())
    }

    /// Replace the port list, keeping `preferred` selected when it is present,
    /// otherwise the first port
    pub fn set_ports(&mut self, ports: Vec<String>, preferred: Option<&str>) {
        self.port_index = preferred
            .and_then(|p| ports.iter().position(|port| port == p))
            .or(if ports.is_empty() { None } else { Some(0) });
        self.ports = ports;
        if let Some(port) = self.port() {
            info!(port, "selected port");
        }
    }

    /// Select the port `offset` places away in the list, wrapping around
    pub fn cycle_port(&mut self, offset: isize) {
        if self.ports.is_empty() {
            self.set_status_error("No serial ports found (F6 to rescan)");
            return;
        }
        let len = self.ports.len() as isize;
        let current = self.port_index.map_or(-1, |i| i as isize);
        let next = (current + offset).rem_euclid(len) as usize;
        self.port_index = Some(next);
        let port = self.ports[next].clone();
        info!(port = %port, "selected port");
        self.set_status(format!("Port: {}", port));
    }

    fn rescan_ports(&mut self) {
        match ports::scan() {
            Ok(found) => {
                let previous = self.port().map(|p| p.to_string());
                self.set_ports(found, previous.as_deref());
                self.set_status(format!("Found {} port(s)", self.ports.len()));
            }
            Err(e) => {
                error!(error = %e, "port scan failed");
                self.set_status_error(format!("Port scan failed: {}", e));
            }
        }
    }

    fn set_status(&mut self, message: impl Into<String>) {
        self.status_message = message.into();
        self.status_is_error = false;
    }

    fn set_status_error(&mut self, message: impl Into<String>) {
        self.status_message = message.into();
        self.status_is_error = true;
    }

    /// Run the TUI application
    pub fn run<B: Backend>(&mut self, terminal: &mut Terminal<B>) -> io::Result<()> {
        loop {
            terminal.draw(|f| self.render(f))?;

            if self.should_quit {
                break;
            }

            if event::poll(Duration::from_millis(250))? {
                if let Event::Key(key) = event::read()? {
                    if key.kind == KeyEventKind::Press {
                        self.handle_key_event(key);
                    }
                }
            }
        }

        Ok(())
    }

    /// Render the UI
    pub fn render(&mut self, frame: &mut Frame) {
        let size = frame.area();

        // Toolbar, panes, status bar
        let main_chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Length(1),
                Constraint::Min(0),
                Constraint::Length(1),
            ])
            .split(size);

        let rows = Layout::default()
            .direction(Direction::Vertical)
            .constraints([Constraint::Percentage(70), Constraint::Percentage(30)])
            .split(main_chunks[1]);

        panes::render_toolbar(frame, main_chunks[0], &self.ports, self.port_index);

        let modified = if self.buffer.is_modified() { "*" } else { "" };
        let title = format!("mpEdit - {}{}", self.script.display_name(), modified);
        if let Some(row) = self.buffer.take_dirty_row() {
            self.editor_scroll.highlight.invalidate_from(row);
        }
        panes::render_editor_pane(
            frame,
            rows[0],
            &self.buffer,
            &title,
            self.tab_width,
            self.focused_pane == FocusedPane::Editor,
            self.focused_pane == FocusedPane::Editor && self.prompt.is_none(),
            &mut self.editor_scroll,
        );

        panes::render_console_pane(
            frame,
            rows[1],
            &self.console,
            self.focused_pane == FocusedPane::Console,
            &mut self.console_scroll,
        );

        match &self.prompt {
            Some(prompt) => panes::render_save_prompt(
                frame,
                main_chunks[2],
                &prompt.input,
                prompt.error.as_deref(),
            ),
            None => {
                let cursor = self.buffer.cursor();
                let file_name = self.script.display_name();
                panes::render_status_bar(
                    frame,
                    main_chunks[2],
                    &StatusRenderData {
                        file_name: &file_name,
                        modified: self.buffer.is_modified(),
                        line: cursor.row,
                        col: self.buffer.display_col(self.tab_width),
                        message: &self.status_message,
                        is_error: self.status_is_error,
                    },
                );
            }
        }
    }

    /// Handle keyboard events
    pub fn handle_key_event(&mut self, key: KeyEvent) {
        if self.prompt.is_some() {
            self.handle_prompt_key(key);
            return;
        }

        let ctrl = key.modifiers.contains(KeyModifiers::CONTROL);
        let is_quit = ctrl && matches!(key.code, KeyCode::Char('q') | KeyCode::Char('Q'));
        if !is_quit {
            self.quit_armed = false;
        }

        match key.code {
            KeyCode::Char('q') | KeyCode::Char('Q') if ctrl => self.request_quit(),
            KeyCode::Char('s') | KeyCode::Char('S') if ctrl => {
                self.save();
            }
            KeyCode::Char('r') | KeyCode::Char('R') if ctrl => self.run_script(),
            KeyCode::F(5) => self.run_script(),
            KeyCode::Char('p') | KeyCode::Char('P') if ctrl => self.cycle_port(1),
            KeyCode::F(4) if key.modifiers.contains(KeyModifiers::SHIFT) => self.cycle_port(-1),
            KeyCode::F(4) => self.cycle_port(1),
            KeyCode::F(6) => self.rescan_ports(),
            KeyCode::Char('l') | KeyCode::Char('L') if ctrl => {
                self.console.clear();
                self.console_scroll = 0;
                self.set_status("Console cleared");
            }
            KeyCode::F(2) => {
                self.focused_pane = self.focused_pane.toggle();
            }
            _ => match self.focused_pane {
                FocusedPane::Editor => self.handle_editor_key(key),
                FocusedPane::Console => self.handle_console_key(key),
            },
        }
    }

    fn handle_editor_key(&mut self, key: KeyEvent) {
        let ctrl = key.modifiers.contains(KeyModifiers::CONTROL);
        let page = self.editor_scroll.page_height.max(1);
        match key.code {
            KeyCode::Char(c) if !ctrl && !key.modifiers.contains(KeyModifiers::ALT) => {
                self.buffer.insert_char(c)
            }
            KeyCode::Enter => self.buffer.insert_newline(self.tab_width),
            KeyCode::Tab => self.buffer.insert_indent(self.tab_width),
            KeyCode::Backspace => self.buffer.backspace(),
            KeyCode::Delete => self.buffer.delete(),
            KeyCode::Left => self.buffer.move_left(),
            KeyCode::Right => self.buffer.move_right(),
            KeyCode::Up => self.buffer.move_up(),
            KeyCode::Down => self.buffer.move_down(),
            KeyCode::Home if ctrl => self.buffer.move_to_start(),
            KeyCode::End if ctrl => self.buffer.move_to_end(),
            KeyCode::Home => self.buffer.move_home(),
            KeyCode::End => self.buffer.move_end(),
            KeyCode::PageUp => self.buffer.page_up(page),
            KeyCode::PageDown => self.buffer.page_down(page),
            _ => {}
        }
    }

    fn handle_console_key(&mut self, key: KeyEvent) {
        match key.code {
            KeyCode::Up => self.console_scroll = self.console_scroll.saturating_sub(1),
            KeyCode::Down => self.console_scroll = self.console_scroll.saturating_add(1),
            KeyCode::PageUp => self.console_scroll = self.console_scroll.saturating_sub(10),
            KeyCode::PageDown => self.console_scroll = self.console_scroll.saturating_add(10),
            KeyCode::Home => self.console_scroll = 0,
            KeyCode::End => self.console_scroll = usize::MAX,
            KeyCode::Esc => self.focused_pane = FocusedPane::Editor,
            _ => {}
        }
    }

    fn handle_prompt_key(&mut self, key: KeyEvent) {
        let Some(prompt) = self.prompt.as_mut() else {
            return;
        };
        match key.code {
            KeyCode::Char(c) if !key.modifiers.contains(KeyModifiers::CONTROL) => {
                prompt.input.push(c);
                prompt.error = None;
            }
            KeyCode::Backspace => {
                prompt.input.pop();
                prompt.error = None;
            }
            KeyCode::Esc => {
                self.prompt = None;
                self.set_status("Save cancelled");
            }
            KeyCode::Enter => {
                let input = prompt.input.trim().to_string();
                let then = prompt.then;
                if input.is_empty() {
                    prompt.error = Some("Enter a file name, or Esc to cancel".to_string());
                    return;
                }
                self.prompt = None;
                if let Some(path) = self.save_as(Path::new(&input)) {
                    if then == AfterSave::Run {
                        self.run_saved(&path);
                    }
                }
            }
            _ => {}
        }
    }

    fn open_prompt(&mut self, then: AfterSave) {
        self.prompt = Some(SavePrompt {
            input: String::new(),
            then,
            error: None,
        });
    }

    fn request_quit(&mut self) {
        if self.buffer.is_modified() && !self.quit_armed {
            self.quit_armed = true;
            self.set_status_error("Unsaved changes, press Ctrl+Q again to quit");
        } else {
            self.should_quit = true;
        }
    }

    /// Save to the known path, or open the "Save as" prompt when there is none
    pub fn save(&mut self) -> Option<PathBuf> {
        if self.script.path().is_none() {
            self.open_prompt(AfterSave::Nothing);
            return None;
        }
        let result = self.script.save(&self.buffer.text());
        self.finish_save(result)
    }

    fn save_as(&mut self, path: &Path) -> Option<PathBuf> {
        let result = self.script.save_as(path, &self.buffer.text());
        self.finish_save(result)
    }

    fn finish_save(&mut self, result: crate::error::Result<PathBuf>) -> Option<PathBuf> {
        match result {
            Ok(path) => {
                self.buffer.mark_saved();
                self.set_status(format!("Saved {}", path.display()));
                Some(path)
            }
            Err(e) => {
                error!(error = %e, "save failed");
                self.console.error(&format!("Save failed: {}", e));
                self.set_status_error(format!("Save failed: {}", e));
                None
            }
        }
    }

    /// Save, then hand the script to the upload tool on the selected port
    pub fn run_script(&mut self) {
        if self.port().is_none() {
            warn!("run requested without a port");
            self.set_status_error(EditorError::NoPortSelected.to_string());
            return;
        }
        if self.script.path().is_none() {
            self.open_prompt(AfterSave::Run);
            return;
        }
        if let Some(path) = self.save() {
            self.run_saved(&path);
        }
    }

    fn run_saved(&mut self, script: &Path) {
        let Some(port) = self.port().map(|p| p.to_string()) else {
            self.set_status_error(EditorError::NoPortSelected.to_string());
            return;
        };

        self.console.info(&format!(
            "$ {} {}",
            self.tool.program(),
            self.tool.command_args(&port, script).join(" ")
        ));

        match self.tool.run(&port, script) {
            Ok(report) => {
                self.console.push_report(&report);
                if report.timed_out() {
                    self.set_status_error(format!(
                        "Run timed out after {:.1}s",
                        self.tool.timeout().as_secs_f64()
                    ));
                } else if report.succeeded() {
                    self.set_status(format!("Ran on {}", port));
                } else {
                    self.set_status_error("Upload tool reported an error");
                }
            }
            Err(e) => {
                error!(error = %e, "run failed");
                self.console.error(&e.to_string());
                self.set_status_error(e.to_string());
            }
        }
        self.console_scroll = usize::MAX;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn key(code: KeyCode) -> KeyEvent {
        KeyEvent::new(code, KeyModifiers::NONE)
    }

    fn ctrl(c: char) -> KeyEvent {
        KeyEvent::new(KeyCode::Char(c), KeyModifiers::CONTROL)
    }

    fn ports(names: &[&str]) -> Vec<String> {
        names.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_first_port_selected_by_default() {
        let app = App::new(
            &Config::default(),
            ScriptFile::new("py"),
            "",
            ports(&["/dev/ttyACM0", "/dev/ttyUSB0"]),
        );
        assert_eq!(app.port(), Some("/dev/ttyACM0"));
    }

    #[test]
    fn test_default_port_from_config() {
        let config = Config {
            default_port: Some("/dev/ttyUSB0".to_string()),
            ..Config::default()
        };
        let app = App::new(
            &config,
            ScriptFile::new("py"),
            "",
            ports(&["/dev/ttyACM0", "/dev/ttyUSB0"]),
        );
        assert_eq!(app.port(), Some("/dev/ttyUSB0"));
    }

    #[test]
    fn test_cycle_port_wraps() {
        let mut app = App::new(
            &Config::default(),
            ScriptFile::new("py"),
            "",
            ports(&["a", "b", "c"]),
        );
        app.handle_key_event(ctrl('p'));
        assert_eq!(app.port(), Some("b"));
        app.handle_key_event(KeyEvent::new(KeyCode::F(4), KeyModifiers::SHIFT));
        app.handle_key_event(KeyEvent::new(KeyCode::F(4), KeyModifiers::SHIFT));
        assert_eq!(app.port(), Some("c"));
    }

    #[test]
    fn test_run_without_port_is_refused() {
        let mut app = App::new(&Config::default(), ScriptFile::new("py"), "print(1)", Vec::new());
        app.handle_key_event(ctrl('r'));
        assert!(app.status_is_error);
        assert!(app.prompt.is_none());
        assert!(app.console.is_empty());
    }

    #[test]
    fn test_typing_marks_modified() {
        let mut app = App::new(&Config::default(), ScriptFile::new("py"), "", Vec::new());
        app.handle_key_event(key(KeyCode::Char('x')));
        app.handle_key_event(ctrl('x'));
        assert_eq!(app.buffer.text(), "x");
        assert!(app.buffer.is_modified());
    }

    #[test]
    fn test_quit_needs_confirmation_when_modified() {
        let mut app = App::new(&Config::default(), ScriptFile::new("py"), "", Vec::new());
        app.handle_key_event(key(KeyCode::Char('x')));
        app.handle_key_event(ctrl('q'));
        assert!(!app.should_quit);
        app.handle_key_event(ctrl('q'));
        assert!(app.should_quit);
    }

    #[test]
    fn test_quit_confirmation_resets_on_other_key() {
        let mut app = App::new(&Config::default(), ScriptFile::new("py"), "", Vec::new());
        app.handle_key_event(key(KeyCode::Char('x')));
        app.handle_key_event(ctrl('q'));
        app.handle_key_event(key(KeyCode::Left));
        app.handle_key_event(ctrl('q'));
        assert!(!app.should_quit);
    }

    #[test]
    fn test_save_prompt_cancel() {
        let mut app = App::new(&Config::default(), ScriptFile::new("py"), "x = 1", Vec::new());
        app.handle_key_event(ctrl('s'));
        assert!(app.prompt.is_some());
        app.handle_key_event(key(KeyCode::Char('a')));
        app.handle_key_event(key(KeyCode::Esc));
        assert!(app.prompt.is_none());
        assert!(app.script.path().is_none());
        // Keys typed into the prompt never reach the buffer
        assert_eq!(app.buffer.text(), "x = 1");
    }

    #[test]
    fn test_focus_toggle_routes_arrows_to_console() {
        let mut app = App::new(&Config::default(), ScriptFile::new("py"), "a\nb", Vec::new());
        app.handle_key_event(key(KeyCode::F(2)));
        assert_eq!(app.focused_pane, FocusedPane::Console);
        app.handle_key_event(key(KeyCode::Down));
        assert_eq!(app.buffer.cursor().row, 0);
        assert_eq!(app.console_scroll, 1);
    }

    #[test]
    fn test_empty_save_name_keeps_prompt_open() {
        let mut app = App::new(&Config::default(), ScriptFile::new("py"), "x = 1", Vec::new());
        app.handle_key_event(ctrl('s'));
        app.handle_key_event(key(KeyCode::Enter));

        let prompt = app.prompt.as_ref().expect("prompt still open");
        assert!(prompt.error.is_some());

        // Typing clears the complaint
        app.handle_key_event(key(KeyCode::Char('a')));
        assert_eq!(app.prompt.as_ref().and_then(|p| p.error.clone()), None);
    }

    #[test]
    fn test_status_column_counts_expanded_tabs() {
        use ratatui::{backend::TestBackend, Terminal};

        let mut app = App::new(&Config::default(), ScriptFile::new("py"), "\tx", Vec::new());
        app.handle_key_event(key(KeyCode::End));
        let mut terminal = Terminal::new(TestBackend::new(80, 10)).unwrap();
        terminal.draw(|f| app.render(f)).unwrap();

        let status: String = terminal.backend().buffer().content[80 * 9..]
            .iter()
            .map(|cell| cell.symbol())
            .collect();
        // Tab to column 4, then past the `x`
        assert!(status.contains("Ln 1, Col 6"), "status was {:?}", status);
    }
}
