//! Plain line output for CI logs and pipes.

use super::theme::SetupTheme;
use super::{OutputMode, SpinnerHandle, UserInterface};

/// UI that prints one plain line per event.
///
/// Spinners become a line when started and another when finished, which
/// keeps CI logs readable.
pub struct NonInteractiveUI {
    mode: OutputMode,
}

impl NonInteractiveUI {
    /// Create a new non-interactive UI.
    pub fn new(mode: OutputMode) -> Self {
        Self { mode }
    }
}

impl UserInterface for NonInteractiveUI {
    fn output_mode(&self) -> OutputMode {
        self.mode
    }

    fn message(&mut self, msg: &str) {
        if self.mode.shows_messages() {
            println!("{}", msg);
        }
    }

    fn output(&mut self, text: &str) {
        println!("{}", text);
    }

    fn success(&mut self, msg: &str) {
        if self.mode.shows_status() {
            println!("✓ {}", msg);
        }
    }

    fn warning(&mut self, msg: &str) {
        if self.mode.shows_status() {
            eprintln!("⚠ {}", msg);
        }
    }

    fn error(&mut self, msg: &str) {
        eprintln!("✗ {}", msg);
    }

    fn show_hint(&mut self, hint: &str) {
        if self.mode.shows_status() {
            eprintln!("  hint: {}", hint);
        }
    }

    fn start_spinner(&mut self, message: &str) -> Box<dyn SpinnerHandle> {
        if self.mode.shows_messages() {
            println!("{}", message);
        }
        Box::new(LineSpinner { mode: self.mode })
    }

    fn show_header(&mut self, title: &str) {
        if self.mode.shows_messages() {
            println!("{}", title);
        }
    }

    fn is_interactive(&self) -> bool {
        false
    }
}

/// Spinner that prints only its final line.
struct LineSpinner {
    mode: OutputMode,
}

impl LineSpinner {
    fn print(&self, line: String) {
        if self.mode.shows_status() {
            println!("{}", line);
        }
    }
}

impl SpinnerHandle for LineSpinner {
    fn set_message(&mut self, _msg: &str) {}

    fn finish_success(&mut self, msg: &str) {
        self.print(SetupTheme::plain().format_success(msg));
    }

    fn finish_warning(&mut self, msg: &str) {
        self.print(SetupTheme::plain().format_warning(msg));
    }

    fn finish_error(&mut self, msg: &str) {
        // Failures are always reported
        eprintln!("{}", SetupTheme::plain().format_error(msg));
    }

    fn finish_skipped(&mut self, msg: &str) {
        self.print(SetupTheme::plain().format_skipped(msg));
    }
}
