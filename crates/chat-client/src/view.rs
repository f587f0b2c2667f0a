use crate::client::SubmissionState;
use std::io::Write;

pub const PLACEHOLDER: &str = "...";

/// The surface a submission renders into.
pub trait ChatView {
    fn show_user_message(&mut self, text: &str);
    /// Provisional reply shown until the first real fragment arrives.
    fn show_placeholder(&mut self);
    /// Replaces the whole reply, placeholder included.
    fn replace_reply(&mut self, text: &str);
    fn append_reply(&mut self, fragment: &str);
    /// Replaces the reply with an error indicator.
    fn show_error(&mut self, reason: &str);
    fn set_input_enabled(&mut self, enabled: bool);
    fn set_status(&mut self, status: &str);
    fn focus_input(&mut self);

    fn on_state(&mut self, _state: SubmissionState) {}
}

/// Line-oriented rendering for a terminal. Input is stdin, so enabling and
/// focusing it comes down to printing the prompt.
pub struct TerminalView<W> {
    out:      W,
    input_on: bool,
}

const CLEAR_LINE: &str = "\r\x1b[2K";
const PROMPT: &str = "you> ";
const BOT: &str = "bot> ";

impl<W: Write> TerminalView<W> {
    pub fn new(out: W) -> Self {
        Self {
            out,
            input_on: true,
        }
    }

    pub fn into_inner(self) -> W {
        self.out
    }

    fn emit(&mut self, text: &str) {
        // a broken stdout leaves nothing to report to
        let _ = self.out.write_all(text.as_bytes());
        let _ = self.out.flush();
    }
}

impl<W: Write> ChatView for TerminalView<W> {
    fn show_user_message(&mut self, _text: &str) {
        // already echoed by the terminal as it was typed
    }

    fn show_placeholder(&mut self) {
        self.emit(&format!("{BOT}{PLACEHOLDER}"));
    }

    fn replace_reply(&mut self, text: &str) {
        self.emit(&format!("{CLEAR_LINE}{BOT}{text}"));
    }

    fn append_reply(&mut self, fragment: &str) {
        self.emit(fragment);
    }

    fn show_error(&mut self, reason: &str) {
        self.emit(&format!("{CLEAR_LINE}error: {reason}\n"));
    }

    fn set_input_enabled(&mut self, enabled: bool) {
        self.input_on = enabled;
    }

    fn set_status(&mut self, status: &str) {
        if !status.is_empty() {
            tracing::debug!(status, "status");
        }
    }

    fn focus_input(&mut self) {
        if self.input_on {
            self.emit(PROMPT);
        }
    }

    fn on_state(&mut self, state: SubmissionState) {
        if state == SubmissionState::Completed {
            self.emit("\n");
        }
    }
}
