//! Interactive Prompt Backends
//!
//! The resolver talks to the user through the [`Prompt`] trait. Backends:
//! - [`ConsolePrompt`]: stdin line-read for the username, no-echo read for the
//!   password on a terminal (rpassword); delegates to [`PipedPrompt`] when
//!   stdin is not a terminal
//! - [`PipedPrompt`]: plain line reads from any buffered reader
//! - [`GuiPrompt`]: modal input, password and error boxes (`gui` feature)
//!
//! Prompt text goes to stderr so stdout only ever carries the result.

use std::cell::RefCell;
use std::io::{BufRead, IsTerminal, Write};

use crate::error::{ProbeError, Result};

/// Title shown on graphical dialogs
pub const DIALOG_TITLE: &str = "PostgreSQL";

/// Blocking question/answer channel to the user
pub trait Prompt {
    /// Ask for a visible string. `None` means the user cancelled.
    fn ask(&self, message: &str) -> Result<Option<String>>;

    /// Ask for a string without echoing what is typed. `None` means cancelled.
    fn ask_masked(&self, message: &str) -> Result<Option<String>>;

    /// Show a fatal error through this channel
    fn report_error(&self, message: &str);
}

/// Read one line, without its `\n` or `\r\n` terminator
///
/// EOF before any input yields `None`.
pub fn read_line_from(reader: &mut impl BufRead) -> Result<Option<String>> {
    let mut line = String::new();
    let read = reader
        .read_line(&mut line)
        .map_err(|e| ProbeError::prompt(format!("Failed to read from stdin: {e}")))?;

    if read == 0 {
        return Ok(None);
    }

    let trimmed_len = line.trim_end_matches(['\r', '\n']).len();
    line.truncate(trimmed_len);
    Ok(Some(line))
}

/// Line-per-answer prompt over a non-interactive reader
///
/// Nothing is echoed and no prompt text is written; masking has no meaning
/// without a terminal.
pub struct PipedPrompt<R> {
    reader: RefCell<R>,
}

impl<R: BufRead> PipedPrompt<R> {
    pub const fn new(reader: R) -> Self {
        Self { reader: RefCell::new(reader) }
    }
}

impl<R: BufRead> Prompt for PipedPrompt<R> {
    fn ask(&self, _message: &str) -> Result<Option<String>> {
        read_line_from(&mut *self.reader.borrow_mut())
    }

    fn ask_masked(&self, _message: &str) -> Result<Option<String>> {
        read_line_from(&mut *self.reader.borrow_mut())
    }

    fn report_error(&self, message: &str) {
        eprintln!("Error: {message}");
    }
}

/// Terminal prompt on stdin/stderr
#[derive(Debug, Clone, Copy, Default)]
pub struct ConsolePrompt;

impl ConsolePrompt {
    fn piped() -> PipedPrompt<std::io::StdinLock<'static>> {
        PipedPrompt::new(std::io::stdin().lock())
    }
}

impl Prompt for ConsolePrompt {
    fn ask(&self, message: &str) -> Result<Option<String>> {
        if !std::io::stdin().is_terminal() {
            return Self::piped().ask(message);
        }

        let mut stderr = std::io::stderr();
        write!(stderr, "{message}: ")
            .and_then(|()| stderr.flush())
            .map_err(|e| ProbeError::prompt(format!("Failed to write prompt: {e}")))?;

        read_line_from(&mut std::io::stdin().lock())
    }

    fn ask_masked(&self, message: &str) -> Result<Option<String>> {
        if !std::io::stdin().is_terminal() {
            return Self::piped().ask_masked(message);
        }

        // Prompt and no-echo read both go through the controlling terminal
        rpassword::prompt_password(format!("{message}: "))
            .map(Some)
            .map_err(|e| ProbeError::prompt(format!("Failed to read {message}: {e}")))
    }

    fn report_error(&self, message: &str) {
        eprintln!("Error: {message}");
    }
}

/// Modal dialog prompt
#[derive(Debug, Clone, Copy)]
pub struct GuiPrompt {
    _private: (),
}

impl GuiPrompt {
    /// Obtain the dialog backend, or `CapabilityMissing` if it was compiled out
    pub fn new() -> Result<Self> {
        if cfg!(feature = "gui") {
            Ok(Self { _private: () })
        } else {
            Err(ProbeError::capability_missing("graphical prompt"))
        }
    }
}

#[cfg(feature = "gui")]
impl Prompt for GuiPrompt {
    fn ask(&self, message: &str) -> Result<Option<String>> {
        Ok(tinyfiledialogs::input_box(DIALOG_TITLE, message, ""))
    }

    fn ask_masked(&self, message: &str) -> Result<Option<String>> {
        Ok(tinyfiledialogs::password_box(DIALOG_TITLE, message))
    }

    fn report_error(&self, message: &str) {
        tinyfiledialogs::message_box_ok("Error", message, tinyfiledialogs::MessageBoxIcon::Error);
    }
}

#[cfg(not(feature = "gui"))]
impl Prompt for GuiPrompt {
    fn ask(&self, _message: &str) -> Result<Option<String>> {
        Err(ProbeError::capability_missing("graphical prompt"))
    }

    fn ask_masked(&self, _message: &str) -> Result<Option<String>> {
        Err(ProbeError::capability_missing("graphical prompt"))
    }

    fn report_error(&self, message: &str) {
        eprintln!("Error: {message}");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::io::Cursor;

    #[test]
    fn test_read_line_strips_terminator() {
        for (input, expected) in [("alice\n", "alice"), ("alice\r\n", "alice"), ("alice", "alice")] {
            let line = read_line_from(&mut Cursor::new(input)).unwrap();
            assert_eq!(line.as_deref(), Some(expected), "{input:?}");
        }
    }

    #[test]
    fn test_read_line_keeps_inner_whitespace() {
        let line = read_line_from(&mut Cursor::new(" p@ss w=rd \n")).unwrap();
        assert_eq!(line.as_deref(), Some(" p@ss w=rd "));
    }

    #[test]
    fn test_read_line_eof_is_cancel() {
        assert_eq!(read_line_from(&mut Cursor::new("")).unwrap(), None);
    }

    #[test]
    fn test_read_line_blank_is_empty_answer() {
        assert_eq!(read_line_from(&mut Cursor::new("\n")).unwrap().as_deref(), Some(""));
    }

    #[test]
    fn test_read_line_rejects_invalid_utf8() {
        let err = read_line_from(&mut Cursor::new(&b"\xff\xfe\n"[..])).unwrap_err();
        assert!(matches!(err, ProbeError::Prompt(_)));
    }

    #[test]
    fn test_piped_prompt_reads_one_line_per_answer() {
        let prompt = PipedPrompt::new(Cursor::new("alice\r\nsecret\n"));
        assert_eq!(prompt.ask("Database user").unwrap().as_deref(), Some("alice"));
        assert_eq!(prompt.ask_masked("Database password").unwrap().as_deref(), Some("secret"));
        assert_eq!(prompt.ask_masked("Database password").unwrap(), None);
    }

    #[test]
    #[cfg(not(feature = "gui"))]
    fn test_gui_capability_missing() {
        assert!(matches!(
            GuiPrompt::new().unwrap_err(),
            ProbeError::CapabilityMissing { capability: "graphical prompt" }
        ));
    }

    #[test]
    #[cfg(feature = "gui")]
    fn test_gui_available() {
        assert!(GuiPrompt::new().is_ok());
    }
}
