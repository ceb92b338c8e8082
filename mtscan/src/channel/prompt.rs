//! Dynamic prompt detection.
//!
//! Before the device identity is known only the prompt prefix (`[login@`)
//! can be matched. The first line carrying that prefix and the closing
//! suffix reveals the identity; from then on the full prompt delimits
//! command output.

use log::debug;

use crate::platform::routeros::{PROMPT_SUFFIX, prompt_for};

/// How a console line relates to the prompt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LineKind<'a> {
    /// A bare prompt, the console is idle.
    Prompt,
    /// The prompt followed by typed input, i.e. an echoed command.
    Input(&'a str),
    /// Anything else.
    Output,
}

/// Tracks the console prompt for one login.
#[derive(Debug, Clone)]
pub struct PromptTracker {
    login: String,
    identity: Option<String>,
    prompt: String,
}

impl PromptTracker {
    /// Create a tracker that only knows the login name.
    pub fn new(login: impl Into<String>) -> Self {
        let login = login.into();
        let prompt = prompt_for(&login, None);
        Self {
            login,
            identity: None,
            prompt,
        }
    }

    /// The device identity, once captured.
    pub fn identity(&self) -> Option<&str> {
        self.identity.as_deref()
    }

    /// The current prompt text.
    pub fn prompt(&self) -> &str {
        &self.prompt
    }

    /// Classify a line, capturing the identity on the first prompt seen.
    ///
    /// Identity capture happens at most once per tracker.
    pub fn classify<'a>(&mut self, line: &'a str) -> LineKind<'a> {
        if self.identity.is_none() {
            self.capture(line);
        }
        if self.identity.is_none() {
            return LineKind::Output;
        }

        // The console may leave trailing blanks after the prompt.
        let prompt = self.prompt.trim_end();
        match line.strip_prefix(prompt) {
            Some(rest) if rest.trim().is_empty() => LineKind::Prompt,
            Some(rest) => LineKind::Input(rest.trim()),
            None => LineKind::Output,
        }
    }

    /// Whether `text` is a complete prompt with nothing typed after it.
    ///
    /// Before the identity is known any `[login@identity] > ` qualifies.
    pub fn is_bare_prompt(&self, text: &str) -> bool {
        match self.identity {
            Some(_) => text.trim_end() == self.prompt.trim_end(),
            None => text
                .strip_prefix(self.prompt.as_str())
                .and_then(|rest| rest.strip_suffix(PROMPT_SUFFIX))
                .is_some_and(|identity| !identity.is_empty()),
        }
    }

    fn capture(&mut self, line: &str) {
        let Some(rest) = line.strip_prefix(self.prompt.as_str()) else {
            return;
        };
        // The suffix without its trailing blank also closes a prompt that
        // was trimmed by the terminal.
        let closing = PROMPT_SUFFIX.trim_end();
        let Some(end) = rest.find(closing) else {
            return;
        };
        let identity = &rest[..end];
        if identity.is_empty() {
            return;
        }

        debug!("device identity: {:?}", identity);
        self.prompt = prompt_for(&self.login, Some(identity));
        self.identity = Some(identity.to_string());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_identity_capture() {
        let mut tracker = PromptTracker::new("admin");
        assert_eq!(tracker.prompt(), "[admin@");

        assert_eq!(tracker.classify("  MikroTik RouterOS 6.48.6"), LineKind::Output);
        assert_eq!(tracker.identity(), None);

        assert_eq!(tracker.classify("[admin@Tower 1] > "), LineKind::Prompt);
        assert_eq!(tracker.identity(), Some("Tower 1"));
        assert_eq!(tracker.prompt(), "[admin@Tower 1] > ");
    }

    #[test]
    fn test_identity_capture_is_idempotent() {
        let mut tracker = PromptTracker::new("admin");
        tracker.classify("[admin@MikroTik] > ");
        assert_eq!(tracker.identity(), Some("MikroTik"));

        // A different identity later is ordinary output
        assert_eq!(tracker.classify("[admin@Other] > "), LineKind::Output);
        assert_eq!(tracker.identity(), Some("MikroTik"));
        assert_eq!(tracker.prompt(), "[admin@MikroTik] > ");
    }

    #[test]
    fn test_echoed_input() {
        let mut tracker = PromptTracker::new("admin");
        assert_eq!(
            tracker.classify("[admin@MikroTik] > /interface wireless scan \"wlan1\""),
            LineKind::Input("/interface wireless scan \"wlan1\"")
        );
        assert_eq!(tracker.identity(), Some("MikroTik"));
        assert_eq!(tracker.classify("[admin@MikroTik] >"), LineKind::Prompt);
    }

    #[test]
    fn test_bare_prompt() {
        let mut tracker = PromptTracker::new("admin");
        assert!(tracker.is_bare_prompt("[admin@MikroTik] > "));
        assert!(!tracker.is_bare_prompt("[admin@] > "));
        assert!(!tracker.is_bare_prompt("[admin@MikroTik] > /sys"));

        tracker.classify("[admin@MikroTik] > ");
        assert!(tracker.is_bare_prompt("[admin@MikroTik] > "));
        assert!(tracker.is_bare_prompt("[admin@MikroTik] >"));
        assert!(!tracker.is_bare_prompt("[admin@Other] > "));
    }

    #[test]
    fn test_other_login_is_not_a_prompt() {
        let mut tracker = PromptTracker::new("admin");
        assert_eq!(tracker.classify("[guest@MikroTik] > "), LineKind::Output);
        assert_eq!(tracker.classify("[admin@] > "), LineKind::Output);
        assert_eq!(tracker.identity(), None);
    }
}
