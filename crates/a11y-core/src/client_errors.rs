//! Client-side runtime error buckets
//!
//! The browser layer converts its events into [`ConsoleMessage`], [`PageError`]
//! and [`FailedRequest`] values and records them here. Buckets belong to a
//! single page session and start empty; nothing is shared between sessions.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::assertions::SoftAssertions;

/// Placeholder used when an exception carries no stack trace
pub const NO_STACK_PLACEHOLDER: &str = "<no stack trace>";

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CaptureMode {
    /// Only error-level console messages are kept
    #[default]
    ErrorsOnly,
    /// Every console message is also kept with full metadata
    Extended,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConsoleLevel {
    Error,
    Warning,
    Info,
    Log,
    Debug,
    Other,
}

impl ConsoleLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            ConsoleLevel::Error => "error",
            ConsoleLevel::Warning => "warning",
            ConsoleLevel::Info => "info",
            ConsoleLevel::Log => "log",
            ConsoleLevel::Debug => "debug",
            ConsoleLevel::Other => "other",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceLocation {
    pub url: String,
    pub line: i64,
    pub column: i64,
}

impl std::fmt::Display for SourceLocation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}:{}:{}", self.url, self.line, self.column)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConsoleMessage {
    pub level: ConsoleLevel,
    pub text: String,
    pub location: Option<SourceLocation>,
    /// Serialized console arguments
    #[serde(default)]
    pub args: Vec<serde_json::Value>,
    pub timestamp: DateTime<Utc>,
}

impl ConsoleMessage {
    pub fn new(level: ConsoleLevel, text: impl Into<String>) -> Self {
        Self {
            level,
            text: text.into(),
            location: None,
            args: Vec::new(),
            timestamp: Utc::now(),
        }
    }

    pub fn with_location(mut self, location: SourceLocation) -> Self {
        self.location = Some(location);
        self
    }

    pub fn with_args(mut self, args: Vec<serde_json::Value>) -> Self {
        self.args = args;
        self
    }

    /// Use the browser's own event time, given in milliseconds since the epoch.
    /// Values chrono cannot represent leave the receive time in place.
    pub fn with_epoch_millis(mut self, millis: f64) -> Self {
        if let Some(at) = DateTime::from_timestamp_millis(millis as i64) {
            self.timestamp = at;
        }
        self
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageError {
    pub message: String,
    pub stack: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FailedRequest {
    pub url: String,
    pub failure: String,
}

/// A console message kept in extended mode
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConsoleRecord {
    #[serde(rename = "type")]
    pub level: ConsoleLevel,
    pub text: String,
    pub location: Option<SourceLocation>,
    /// ISO-8601
    pub timestamp: String,
    pub args: Vec<serde_json::Value>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClientErrorBuckets {
    #[serde(skip)]
    mode: CaptureMode,
    pub console_errors: Vec<String>,
    pub page_errors: Vec<String>,
    pub request_failures: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub console_messages: Vec<ConsoleRecord>,
}

impl ClientErrorBuckets {
    pub fn new(mode: CaptureMode) -> Self {
        Self {
            mode,
            ..Self::default()
        }
    }

    pub fn mode(&self) -> CaptureMode {
        self.mode
    }

    pub fn record_console(&mut self, message: &ConsoleMessage) {
        if message.level == ConsoleLevel::Error {
            self.console_errors.push(format_console_error(message));
        }
        if self.mode == CaptureMode::Extended {
            self.console_messages.push(ConsoleRecord {
                level: message.level,
                text: message.text.clone(),
                location: message.location.clone(),
                timestamp: message
                    .timestamp
                    .to_rfc3339_opts(chrono::SecondsFormat::Millis, true),
                args: message.args.clone(),
            });
        }
    }

    pub fn record_page_error(&mut self, error: &PageError) {
        let stack = error
            .stack
            .as_deref()
            .filter(|s| !s.trim().is_empty())
            .unwrap_or(NO_STACK_PLACEHOLDER);
        self.page_errors.push(format!("{}\n{}", error.message, stack));
    }

    pub fn record_request_failure(&mut self, request: &FailedRequest) {
        self.request_failures
            .push(format!("{} {}", request.failure, request.url));
    }

    pub fn clear(&mut self) {
        self.console_errors.clear();
        self.page_errors.clear();
        self.request_failures.clear();
        self.console_messages.clear();
    }

    pub fn is_clean(&self) -> bool {
        self.console_errors.is_empty()
            && self.page_errors.is_empty()
            && self.request_failures.is_empty()
    }

    /// Assert all three buckets are empty, each independently
    pub fn assert_clean(&self, soft: &mut SoftAssertions) -> bool {
        let console = soft.expect_empty("console", "console errors", &self.console_errors);
        let page = soft.expect_empty("page", "uncaught exceptions", &self.page_errors);
        let network = soft.expect_empty("network", "failed requests", &self.request_failures);
        console && page && network
    }
}

fn format_console_error(message: &ConsoleMessage) -> String {
    match &message.location {
        Some(location) => format!("[console.error] {} ({})", message.text, location),
        None => format!("[console.error] {}", message.text),
    }
}
