// Output log shown in the console pane

use crate::runner::{RunOutcome, RunReport};

/// Where a console line came from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LineKind {
    Info,
    Output,
    Error,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConsoleLine {
    pub kind: LineKind,
    pub text: String,
}

/// Captured output from saves and upload-tool runs
#[derive(Debug, Clone, Default)]
pub struct Console {
    lines: Vec<ConsoleLine>,
}

impl Console {
    pub fn new() -> Self {
        Console { lines: Vec::new() }
    }

    /// Append `text`, one console line per text line
    pub fn push(&mut self, kind: LineKind, text: &str) {
        let text = text.strip_suffix('\n').unwrap_or(text);
        for line in text.split('\n') {
            self.lines.push(ConsoleLine {
                kind,
                text: line.trim_end_matches('\r').to_string(),
            });
        }
    }

    pub fn info(&mut self, text: &str) {
        self.push(LineKind::Info, text);
    }

    pub fn error(&mut self, text: &str) {
        self.push(LineKind::Error, text);
    }

    pub fn lines(&self) -> &[ConsoleLine] {
        &self.lines
    }

    pub fn len(&self) -> usize {
        self.lines.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    pub fn clear(&mut self) {
        self.lines.clear();
    }

    /// Log the captured output of a run
    pub fn push_report(&mut self, report: &RunReport) {
        if !report.stdout.is_empty() {
            self.push(LineKind::Output, &report.stdout);
        }
        match report.outcome {
            RunOutcome::TimedOut => {
                self.error(&format!(
                    "ERROR timed out after {:.1}s, process killed",
                    report.elapsed.as_secs_f64()
                ));
                if !report.stderr.is_empty() {
                    self.error(&format!("ERROR {}", report.stderr));
                }
            }
            RunOutcome::Completed { success, code } => {
                if !report.stderr.is_empty() {
                    self.error(&report.stderr);
                }
                if !success {
                    let code = code.map_or_else(|| "signal".to_string(), |c| c.to_string());
                    self.error(&format!("Upload tool exited with status {}", code));
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    fn report(outcome: RunOutcome, stdout: &str, stderr: &str) -> RunReport {
        RunReport {
            outcome,
            stdout: stdout.to_string(),
            stderr: stderr.to_string(),
            elapsed: Duration::from_millis(2000),
        }
    }

    #[test]
    fn test_push_splits_lines() {
        let mut console = Console::new();
        console.push(LineKind::Output, "one\r\ntwo\n");
        assert_eq!(console.len(), 2);
        assert_eq!(console.lines()[0].text, "one");
        assert_eq!(console.lines()[1].text, "two");
    }

    #[test]
    fn test_successful_run_logs_output_only() {
        let mut console = Console::new();
        console.push_report(&report(
            RunOutcome::Completed {
                code: Some(0),
                success: true,
            },
            "hello\n",
            "",
        ));
        assert_eq!(
            console.lines(),
            &[ConsoleLine {
                kind: LineKind::Output,
                text: "hello".to_string()
            }]
        );
    }

    #[test]
    fn test_timeout_logs_error_text() {
        let mut console = Console::new();
        console.push_report(&report(RunOutcome::TimedOut, "", "could not open port\n"));

        let errors: Vec<&str> = console
            .lines()
            .iter()
            .filter(|l| l.kind == LineKind::Error)
            .map(|l| l.text.as_str())
            .collect();
        assert_eq!(errors.len(), 2);
        assert!(errors[0].contains("timed out"));
        assert_eq!(errors[1], "ERROR could not open port");
    }

    #[test]
    fn test_failed_exit_reports_status() {
        let mut console = Console::new();
        console.push_report(&report(
            RunOutcome::Completed {
                code: Some(2),
                success: false,
            },
            "",
            "",
        ));
        assert_eq!(console.lines()[0].text, "Upload tool exited with status 2");
    }
}
