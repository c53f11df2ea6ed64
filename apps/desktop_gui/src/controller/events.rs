//! Backend-to-UI events and error modeling for the desktop GUI.

use shared::{
    domain::{CardId, CardInfo},
    protocol::Reading,
};

#[derive(Debug)]
pub enum UiEvent {
    Error(UiError),
    CardLoaded {
        id: CardId,
        result: Result<CardInfo, String>,
    },
    ReadingLoaded(Result<Reading, String>),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UiErrorCategory {
    Transport,
    Validation,
    Server,
    Unknown,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UiErrorContext {
    BackendStartup,
    Reading,
    General,
}

#[derive(Debug, Clone)]
pub struct UiError {
    category: UiErrorCategory,
    context: UiErrorContext,
    message: String,
}

impl UiError {
    pub fn from_message(context: UiErrorContext, message: impl Into<String>) -> Self {
        let message = message.into();
        let lower = message.to_ascii_lowercase();
        let category = if lower.contains("unreachable")
            || lower.contains("connection")
            || lower.contains("timed out")
            || lower.contains("timeout")
            || lower.contains("disconnected")
            || lower.contains("not configured")
        {
            UiErrorCategory::Transport
        } else if lower.contains("please enter")
            || lower.contains("select ")
            || lower.contains("invalid")
            || lower.contains("malformed")
        {
            UiErrorCategory::Validation
        } else if lower.contains("failed to generate")
            || lower.contains("http 5")
            || lower.contains("not found")
        {
            UiErrorCategory::Server
        } else {
            UiErrorCategory::Unknown
        };

        Self {
            category,
            context,
            message,
        }
    }

    pub fn is_retryable(&self) -> bool {
        matches!(
            self.category,
            UiErrorCategory::Transport | UiErrorCategory::Server
        )
    }

    pub fn category(&self) -> UiErrorCategory {
        self.category
    }

    pub fn context(&self) -> UiErrorContext {
        self.context
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    /// Status-bar text: the raw message plus a hint for what to do next.
    pub fn display_text(&self) -> String {
        let hint = match (self.context, self.category) {
            (UiErrorContext::BackendStartup, _) => "restart the app",
            (_, UiErrorCategory::Transport) => "check the server URL and try again",
            (_, UiErrorCategory::Server) => "try revealing again",
            _ => return self.message.clone(),
        };
        format!("{} ({hint})", self.message)
    }
}
