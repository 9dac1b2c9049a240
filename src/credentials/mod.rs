//! Credential Resolution
//!
//! Produces a validated username/password pair from one of three channels.
//!
//! # Precedence
//! 1. Direct: both `--user` and `--password` supplied (automation only; the
//!    values end up in shell history)
//! 2. Graphical: `--gui`, modal dialogs
//! 3. Console (default): stdin line-read plus no-echo password read
//!
//! # Username Rules
//! The username is trimmed, must be non-empty and must not contain any of
//! [`FORBIDDEN_USERNAME_CHARS`]. A bad username is fatal and never retried.
//! The password is taken as-is and never logged.

pub mod prompt;

use std::fmt;

use zeroize::Zeroizing;

pub use prompt::{read_line_from, ConsolePrompt, GuiPrompt, PipedPrompt, Prompt, DIALOG_TITLE};

use crate::error::{ProbeError, Result};

/// Characters a username may not contain
pub const FORBIDDEN_USERNAME_CHARS: [char; 9] = [' ', '\t', '\r', '\n', ';', '=', '\'', '"', '\\'];

const USER_PROMPT: &str = "Database user";
const PASSWORD_PROMPT: &str = "Database password";

/// Validate and normalize a username
///
/// Returns the trimmed username. The rejected value is never included in the
/// error.
pub fn validate_username(raw: &str) -> Result<String> {
    let username = raw.trim();
    if username.is_empty() || username.contains(FORBIDDEN_USERNAME_CHARS) {
        return Err(ProbeError::InvalidUsername);
    }
    Ok(username.to_string())
}

/// Validated database credentials
///
/// The password is wiped from memory on drop and redacted from `Debug`.
#[derive(Clone, PartialEq, Eq)]
pub struct Credentials {
    username: String,
    password: Zeroizing<String>,
}

impl Credentials {
    /// Validate the username and build credentials
    pub fn new(username: &str, password: impl Into<String>) -> Result<Self> {
        Ok(Self { username: validate_username(username)?, password: Zeroizing::new(password.into()) })
    }

    #[must_use]
    pub fn username(&self) -> &str {
        &self.username
    }

    /// WARNING: Sensitive data, do not log or include in error messages
    #[must_use]
    pub fn password(&self) -> &str {
        &self.password
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .finish()
    }
}

/// Where fatal errors are shown to the user
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureChannel {
    /// Modal error box
    Dialog,
    /// `Error: ...` line on stderr
    Stderr,
}

/// How credentials are acquired, selected once from CLI flags
#[derive(Clone)]
pub enum CredentialMode {
    /// Values supplied up front
    Direct { user: String, password: Zeroizing<String> },
    /// Modal dialogs
    Graphical,
    /// Terminal prompts
    Console,
}

impl CredentialMode {
    /// Pick the mode: Direct (both values present) > Graphical > Console
    ///
    /// A lone `user` or `password` has no effect.
    #[must_use]
    pub fn select(user: Option<String>, password: Option<String>, gui: bool) -> Self {
        match (user, password) {
            (Some(user), Some(password)) => {
                Self::Direct { user, password: Zeroizing::new(password) }
            }
            (user, password) => {
                if user.is_some() || password.is_some() {
                    tracing::warn!("--user and --password only take effect together; prompting instead");
                }
                if gui {
                    Self::Graphical
                } else {
                    Self::Console
                }
            }
        }
    }

    #[must_use]
    pub const fn name(&self) -> &'static str {
        match self {
            Self::Direct { .. } => "direct",
            Self::Graphical => "graphical",
            Self::Console => "console",
        }
    }

    #[must_use]
    pub const fn is_direct(&self) -> bool {
        matches!(self, Self::Direct { .. })
    }

    /// Warning to show before using this mode, if any
    #[must_use]
    pub const fn caveat(&self) -> Option<&'static str> {
        match self {
            Self::Direct { .. } => {
                Some("credentials given on the command line may be kept in shell history")
            }
            Self::Graphical | Self::Console => None,
        }
    }

    /// Channel for fatal errors in this mode
    ///
    /// Graphical mode uses a dialog only when the backend is compiled in.
    #[must_use]
    pub fn failure_channel(&self) -> FailureChannel {
        match self {
            Self::Graphical if GuiPrompt::new().is_ok() => FailureChannel::Dialog,
            Self::Graphical | Self::Direct { .. } | Self::Console => FailureChannel::Stderr,
        }
    }

    /// Report a fatal error through the channel matching this mode
    pub fn report_failure(&self, message: &str) {
        match self.failure_channel() {
            FailureChannel::Dialog => match GuiPrompt::new() {
                Ok(gui) => gui.report_error(message),
                Err(_) => ConsolePrompt.report_error(message),
            },
            FailureChannel::Stderr => ConsolePrompt.report_error(message),
        }
    }
}

impl fmt::Debug for CredentialMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A channel that yields an unvalidated username/password pair
pub trait CredentialSource {
    fn acquire(&mut self) -> Result<(String, Zeroizing<String>)>;
}

/// Pre-supplied values
pub struct DirectSource {
    user: String,
    password: Zeroizing<String>,
}

impl DirectSource {
    pub fn new(user: impl Into<String>, password: impl Into<String>) -> Self {
        Self { user: user.into(), password: Zeroizing::new(password.into()) }
    }
}

impl CredentialSource for DirectSource {
    fn acquire(&mut self) -> Result<(String, Zeroizing<String>)> {
        Ok((self.user.clone(), self.password.clone()))
    }
}

/// Interactive acquisition through any [`Prompt`] backend
pub struct PromptSource<P> {
    prompt: P,
}

impl<P: Prompt> PromptSource<P> {
    pub const fn new(prompt: P) -> Self {
        Self { prompt }
    }
}

impl<P: Prompt> CredentialSource for PromptSource<P> {
    fn acquire(&mut self) -> Result<(String, Zeroizing<String>)> {
        // Cancelled username → empty → rejected by validation
        let user = self.prompt.ask(USER_PROMPT)?.unwrap_or_default();
        let password = Zeroizing::new(self.prompt.ask_masked(PASSWORD_PROMPT)?.unwrap_or_default());
        Ok((user, password))
    }
}

/// Acquire and validate credentials from a source
pub fn resolve_with(source: &mut impl CredentialSource) -> Result<Credentials> {
    let (user, password) = source.acquire()?;
    let username = validate_username(&user)?;
    Ok(Credentials { username, password })
}

/// Acquire and validate credentials for the selected mode
pub fn resolve(mode: &CredentialMode) -> Result<Credentials> {
    tracing::debug!(mode = mode.name(), "resolving credentials");
    match mode {
        CredentialMode::Direct { user, password } => {
            resolve_with(&mut DirectSource { user: user.clone(), password: password.clone() })
        }
        CredentialMode::Graphical => resolve_with(&mut PromptSource::new(GuiPrompt::new()?)),
        CredentialMode::Console => resolve_with(&mut PromptSource::new(ConsolePrompt)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::cell::RefCell;

    /// Scripted prompt returning canned answers in order
    struct ScriptedPrompt {
        answers: RefCell<Vec<Option<String>>>,
        asked: RefCell<Vec<(String, bool)>>,
    }

    impl ScriptedPrompt {
        fn new(answers: &[Option<&str>]) -> Self {
            Self {
                answers: RefCell::new(answers.iter().rev().map(|a| a.map(String::from)).collect()),
                asked: RefCell::new(Vec::new()),
            }
        }

        fn next(&self, message: &str, masked: bool) -> Option<String> {
            self.asked.borrow_mut().push((message.to_string(), masked));
            self.answers.borrow_mut().pop().flatten()
        }
    }

    impl Prompt for ScriptedPrompt {
        fn ask(&self, message: &str) -> Result<Option<String>> {
            Ok(self.next(message, false))
        }

        fn ask_masked(&self, message: &str) -> Result<Option<String>> {
            Ok(self.next(message, true))
        }

        fn report_error(&self, _message: &str) {}
    }

    #[test]
    fn test_validate_username_accepts_plain_names() {
        for name in ["alice", "app_user", "svc-01", "user.name", "пользователь"] {
            assert_eq!(validate_username(name).unwrap(), name);
        }
    }

    #[test]
    fn test_validate_username_trims() {
        assert_eq!(validate_username("  alice\n").unwrap(), "alice");
    }

    #[test]
    fn test_validate_username_rejects_forbidden_chars() {
        for c in FORBIDDEN_USERNAME_CHARS {
            let name = format!("ali{c}ce");
            assert!(matches!(validate_username(&name), Err(ProbeError::InvalidUsername)), "{name:?}");
        }
    }

    #[test]
    fn test_validate_username_rejects_empty() {
        for name in ["", "   ", "\t\r\n", ";", "=';\"\\"] {
            assert!(matches!(validate_username(name), Err(ProbeError::InvalidUsername)), "{name:?}");
        }
    }

    #[test]
    fn test_error_does_not_echo_username() {
        let err = validate_username("x'; DROP ROLE postgres; --").unwrap_err();
        assert!(!err.to_string().contains("DROP"));
    }

    #[test]
    fn test_select_precedence() {
        let mode = CredentialMode::select(Some("alice".into()), Some("secret".into()), true);
        assert!(mode.is_direct());

        let mode = CredentialMode::select(Some("alice".into()), None, true);
        assert!(matches!(mode, CredentialMode::Graphical));

        let mode = CredentialMode::select(None, Some("secret".into()), false);
        assert!(matches!(mode, CredentialMode::Console));

        let mode = CredentialMode::select(None, None, false);
        assert!(matches!(mode, CredentialMode::Console));
    }

    #[test]
    fn test_direct_mode() {
        let mode = CredentialMode::select(Some("alice".into()), Some("secret".into()), false);
        let creds = resolve(&mode).unwrap();
        assert_eq!(creds.username(), "alice");
        assert_eq!(creds.password(), "secret");
    }

    #[test]
    fn test_direct_mode_validates_username() {
        let mode = CredentialMode::select(Some("bad user".into()), Some("secret".into()), false);
        assert!(matches!(resolve(&mode), Err(ProbeError::InvalidUsername)));
    }

    #[test]
    fn test_password_taken_verbatim() {
        let mut source = DirectSource::new("alice", " p@ss; w=rd\"\\ ");
        let creds = resolve_with(&mut source).unwrap();
        assert_eq!(creds.password(), " p@ss; w=rd\"\\ ");
    }

    #[test]
    fn test_prompt_source_asks_user_then_masked_password() {
        let prompt = ScriptedPrompt::new(&[Some("alice"), Some("secret")]);
        let mut source = PromptSource::new(prompt);
        let creds = resolve_with(&mut source).unwrap();

        assert_eq!(creds.username(), "alice");
        assert_eq!(creds.password(), "secret");
        assert_eq!(
            *source.prompt.asked.borrow(),
            vec![(USER_PROMPT.to_string(), false), (PASSWORD_PROMPT.to_string(), true)]
        );
    }

    #[test]
    fn test_prompt_cancelled_username_rejected() {
        let mut source = PromptSource::new(ScriptedPrompt::new(&[None, Some("secret")]));
        assert!(matches!(resolve_with(&mut source), Err(ProbeError::InvalidUsername)));
    }

    #[test]
    fn test_prompt_cancelled_password_is_empty() {
        let mut source = PromptSource::new(ScriptedPrompt::new(&[Some("alice"), None]));
        let creds = resolve_with(&mut source).unwrap();
        assert_eq!(creds.password(), "");
    }

    #[test]
    fn test_piped_answers_resolve() {
        let mut source = PromptSource::new(PipedPrompt::new(std::io::Cursor::new("  alice \r\nsecret\n")));
        let creds = resolve_with(&mut source).unwrap();
        assert_eq!(creds.username(), "alice");
        assert_eq!(creds.password(), "secret");
    }

    #[test]
    fn test_piped_eof_rejects_username() {
        let mut source = PromptSource::new(PipedPrompt::new(std::io::Cursor::new("")));
        assert!(matches!(resolve_with(&mut source), Err(ProbeError::InvalidUsername)));
    }

    #[test]
    fn test_only_direct_mode_has_caveat() {
        let direct = CredentialMode::select(Some("alice".into()), Some("secret".into()), false);
        assert!(direct.caveat().is_some_and(|c| c.contains("shell history")));
        assert_eq!(CredentialMode::Graphical.caveat(), None);
        assert_eq!(CredentialMode::Console.caveat(), None);
    }

    #[test]
    fn test_failure_channel_per_mode() {
        let direct = CredentialMode::select(Some("alice".into()), Some("secret".into()), true);
        assert_eq!(direct.failure_channel(), FailureChannel::Stderr);
        assert_eq!(CredentialMode::Console.failure_channel(), FailureChannel::Stderr);
    }

    #[test]
    #[cfg(feature = "gui")]
    fn test_graphical_failures_use_dialog() {
        assert_eq!(CredentialMode::Graphical.failure_channel(), FailureChannel::Dialog);
    }

    #[test]
    #[cfg(not(feature = "gui"))]
    fn test_graphical_failures_fall_back_to_stderr() {
        assert_eq!(CredentialMode::Graphical.failure_channel(), FailureChannel::Stderr);
    }

    #[test]
    fn test_debug_redacts_password() {
        let creds = Credentials::new("alice", "hunter2").unwrap();
        let rendered = format!("{creds:?}");
        assert!(rendered.contains("alice"));
        assert!(!rendered.contains("hunter2"));

        let mode = CredentialMode::select(Some("alice".into()), Some("hunter2".into()), false);
        assert!(!format!("{mode:?}").contains("hunter2"));
    }
}
