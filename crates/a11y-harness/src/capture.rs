//! Scoped client-error capture for one page
//!
//! [`ErrorCapture::attach`] subscribes to the CDP events behind the three
//! error buckets and spawns listener tasks for them, the same way the
//! metrics collector listened for `Runtime.consoleAPICalled`. Buffers are owned
//! by the capture and start empty; the listener tasks are aborted when the
//! capture is dropped, so no handler outlives its page session.
//!
//! | Bucket | CDP event |
//! |---|---|
//! | console errors | `Runtime.consoleAPICalled`, `Log.entryAdded` |
//! | uncaught exceptions | `Runtime.exceptionThrown` |
//! | failed requests | `Network.loadingFailed` (URL from `Network.requestWillBeSent`) |

use a11y_core::{
    CaptureMode, ClientErrorBuckets, ConsoleLevel, ConsoleMessage, FailedRequest, PageError,
    SourceLocation,
};
use anyhow::{Context, Result};
use chromiumoxide::cdp::browser_protocol::log::{
    EnableParams as LogEnableParams, EventEntryAdded, LogEntry, LogEntryLevel, LogEntrySource,
};
use chromiumoxide::cdp::browser_protocol::network::{
    EnableParams as NetworkEnableParams, EventLoadingFailed, EventLoadingFinished,
    EventRequestWillBeSent,
};
use chromiumoxide::cdp::js_protocol::runtime::{
    ConsoleApiCalledType, EventConsoleApiCalled, EventExceptionThrown, ExceptionDetails,
    RemoteObject, StackTrace,
};
use chromiumoxide::Page;
use futures::stream::{self, PollNext};
use futures::StreamExt;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tokio::time::Instant;
use tracing::{debug, instrument, trace};

use crate::config::Quiescence;

/// Interval between network-idle polls
const QUIESCENCE_POLL_INTERVAL: Duration = Duration::from_millis(50);

#[derive(Debug, Clone, PartialEq)]
enum NetworkEvent {
    Started { request_id: String, url: String },
    Finished { request_id: String },
    Failed { request_id: String, error_text: String },
}

/// Requests in flight and the time of the last network event
///
/// An ending seen before its start is parked in `early_endings` and matched
/// when the start arrives, so the request never counts as in flight and a
/// failure still gets its URL.
#[derive(Debug)]
struct NetworkTracker {
    in_flight: HashMap<String, String>,
    /// Request id to failure text, `None` for a successful load
    early_endings: HashMap<String, Option<String>>,
    last_activity: Instant,
}

impl NetworkTracker {
    fn new() -> Self {
        Self {
            in_flight: HashMap::new(),
            early_endings: HashMap::new(),
            last_activity: Instant::now(),
        }
    }

    /// Apply one event; returns a failure once both its URL and error are known
    fn apply(&mut self, event: NetworkEvent) -> Option<FailedRequest> {
        self.last_activity = Instant::now();
        match event {
            NetworkEvent::Started { request_id, url } => {
                match self.early_endings.remove(&request_id) {
                    Some(Some(failure)) => Some(FailedRequest { url, failure }),
                    Some(None) => None,
                    None => {
                        self.in_flight.insert(request_id, url);
                        None
                    }
                }
            }
            NetworkEvent::Finished { request_id } => {
                if self.in_flight.remove(&request_id).is_none() {
                    self.early_endings.insert(request_id, None);
                }
                None
            }
            NetworkEvent::Failed {
                request_id,
                error_text,
            } => match self.in_flight.remove(&request_id) {
                Some(url) => Some(FailedRequest {
                    url,
                    failure: error_text,
                }),
                None => {
                    self.early_endings.insert(request_id, Some(error_text));
                    None
                }
            },
        }
    }

    /// Failures whose request start never arrived, keyed by request id
    fn take_unmatched_failures(&mut self) -> Vec<FailedRequest> {
        let mut failures: Vec<FailedRequest> = self
            .early_endings
            .drain()
            .filter_map(|(request_id, failure)| {
                failure.map(|failure| FailedRequest {
                    url: format!("<request {}>", request_id),
                    failure,
                })
            })
            .collect();
        failures.sort_by(|a, b| a.url.cmp(&b.url));
        failures
    }

    fn is_idle_for(&self, window: Duration) -> bool {
        self.in_flight.is_empty() && self.last_activity.elapsed() >= window
    }
}

/// Handle to the running listeners of one page
pub struct ErrorCapture {
    buckets: Arc<Mutex<ClientErrorBuckets>>,
    network: Arc<Mutex<NetworkTracker>>,
    tasks: Vec<JoinHandle<()>>,
}

impl ErrorCapture {
    /// Subscribe to console, log, exception and network events on `page`
    ///
    /// Attach BEFORE navigating so errors raised during load are captured.
    /// Every subscription is made before the first task is spawned.
    #[instrument(skip(page))]
    pub async fn attach(page: &Page, mode: CaptureMode) -> Result<Self> {
        page.execute(NetworkEnableParams::default())
            .await
            .context("Failed to enable network domain")?;
        page.execute(LogEnableParams::default())
            .await
            .context("Failed to enable log domain")?;

        let mut console_events = page
            .event_listener::<EventConsoleApiCalled>()
            .await
            .context("Failed to subscribe to console events")?;
        let mut log_events = page
            .event_listener::<EventEntryAdded>()
            .await
            .context("Failed to subscribe to log entries")?;
        let mut exception_events = page
            .event_listener::<EventExceptionThrown>()
            .await
            .context("Failed to subscribe to exception events")?;
        let request_events = page
            .event_listener::<EventRequestWillBeSent>()
            .await
            .context("Failed to subscribe to request events")?;
        let finished_events = page
            .event_listener::<EventLoadingFinished>()
            .await
            .context("Failed to subscribe to loading events")?;
        let failed_events = page
            .event_listener::<EventLoadingFailed>()
            .await
            .context("Failed to subscribe to loading failures")?;

        let buckets = Arc::new(Mutex::new(ClientErrorBuckets::new(mode)));
        let network = Arc::new(Mutex::new(NetworkTracker::new()));
        let mut tasks = Vec::with_capacity(4);

        let sink = buckets.clone();
        tasks.push(tokio::spawn(async move {
            while let Some(event) = console_events.next().await {
                let message = console_message(&event);
                trace!(level = message.level.as_str(), "console: {}", message.text);
                sink.lock().await.record_console(&message);
            }
        }));

        let sink = buckets.clone();
        tasks.push(tokio::spawn(async move {
            while let Some(event) = log_events.next().await {
                if let Some(message) = log_message(&event.entry) {
                    trace!(level = message.level.as_str(), "log: {}", message.text);
                    sink.lock().await.record_console(&message);
                }
            }
        }));

        let sink = buckets.clone();
        tasks.push(tokio::spawn(async move {
            while let Some(event) = exception_events.next().await {
                let error = page_error(&event.exception_details);
                debug!("Uncaught exception: {}", error.message);
                sink.lock().await.record_page_error(&error);
            }
        }));

        // Starts are drained first: the handler queues events on every
        // listener in protocol order, so a request's start is already waiting
        // by the time its ending is.
        let starts = request_events.map(|e| NetworkEvent::Started {
            request_id: e.request_id.inner().clone(),
            url: e.request.url.clone(),
        });
        let endings = stream::select(
            finished_events.map(|e| NetworkEvent::Finished {
                request_id: e.request_id.inner().clone(),
            }),
            failed_events.map(|e| NetworkEvent::Failed {
                request_id: e.request_id.inner().clone(),
                error_text: e.error_text.clone(),
            }),
        );
        let mut network_events = Box::pin(stream::select_with_strategy(
            starts,
            endings,
            |_: &mut ()| PollNext::Left,
        ));
        let tracker = network.clone();
        let sink = buckets.clone();
        tasks.push(tokio::spawn(async move {
            while let Some(event) = network_events.next().await {
                let failure = tracker.lock().await.apply(event);
                if let Some(failure) = failure {
                    debug!("Request failed: {} {}", failure.failure, failure.url);
                    sink.lock().await.record_request_failure(&failure);
                }
            }
        }));

        debug!("Client error capture attached");
        Ok(Self {
            buckets,
            network,
            tasks,
        })
    }

    /// Wait until no request has been in flight for `idle_window`, at most `max_wait`
    pub async fn wait_for_quiescence(&self, quiescence: Quiescence) -> bool {
        let started = Instant::now();
        loop {
            if self.network.lock().await.is_idle_for(quiescence.idle_window) {
                return true;
            }
            if started.elapsed() >= quiescence.max_wait {
                let pending = self.network.lock().await.in_flight.len();
                debug!(pending, "Network did not settle before quiescence deadline");
                return false;
            }
            tokio::time::sleep(QUIESCENCE_POLL_INTERVAL).await;
        }
    }

    /// Wait for network quiescence, then hand the buckets to the caller and
    /// tear the listeners down
    #[instrument(skip(self))]
    pub async fn finish(self, quiescence: Quiescence) -> ClientErrorBuckets {
        self.wait_for_quiescence(quiescence).await;
        let unmatched = self.network.lock().await.take_unmatched_failures();
        let mut buckets = self.buckets.lock().await.clone();
        for failure in &unmatched {
            buckets.record_request_failure(failure);
        }
        debug!(
            console = buckets.console_errors.len(),
            page = buckets.page_errors.len(),
            network = buckets.request_failures.len(),
            "Client error capture finished"
        );
        buckets
    }
}

impl Drop for ErrorCapture {
    fn drop(&mut self) {
        for task in &self.tasks {
            task.abort();
        }
    }
}

pub(crate) fn console_level(kind: &ConsoleApiCalledType) -> ConsoleLevel {
    match kind {
        ConsoleApiCalledType::Error | ConsoleApiCalledType::Assert => ConsoleLevel::Error,
        ConsoleApiCalledType::Warning => ConsoleLevel::Warning,
        ConsoleApiCalledType::Info => ConsoleLevel::Info,
        ConsoleApiCalledType::Log => ConsoleLevel::Log,
        ConsoleApiCalledType::Debug => ConsoleLevel::Debug,
        _ => ConsoleLevel::Other,
    }
}

/// Text rendering of one console argument
pub(crate) fn argument_text(value: Option<&serde_json::Value>, description: Option<&str>) -> String {
    match (value, description) {
        (Some(serde_json::Value::String(s)), _) => s.clone(),
        (Some(v), _) if !v.is_null() => v.to_string(),
        (_, Some(d)) => d.to_string(),
        _ => String::new(),
    }
}

fn argument_json(arg: &RemoteObject) -> serde_json::Value {
    match (&arg.value, &arg.description) {
        (Some(v), _) => v.clone(),
        (None, Some(d)) => serde_json::Value::String(d.clone()),
        _ => serde_json::Value::Null,
    }
}

fn top_frame(stack: Option<&StackTrace>) -> Option<SourceLocation> {
    stack
        .and_then(|s| s.call_frames.first())
        .map(|frame| SourceLocation {
            url: frame.url.clone(),
            line: frame.line_number + 1,
            column: frame.column_number + 1,
        })
}

/// `    at fn (url:line:col)` lines; CDP positions are zero-based
pub(crate) fn render_frames<'a, I>(frames: I) -> Option<String>
where
    I: IntoIterator<Item = (&'a str, &'a str, i64, i64)>,
{
    let lines: Vec<String> = frames
        .into_iter()
        .map(|(function, url, line, column)| {
            let function = if function.is_empty() {
                "<anonymous>"
            } else {
                function
            };
            format!("    at {} ({}:{}:{})", function, url, line + 1, column + 1)
        })
        .collect();
    if lines.is_empty() {
        None
    } else {
        Some(lines.join("\n"))
    }
}

fn console_message(event: &EventConsoleApiCalled) -> ConsoleMessage {
    let text = event
        .args
        .iter()
        .map(|arg| argument_text(arg.value.as_ref(), arg.description.as_deref()))
        .collect::<Vec<_>>()
        .join(" ");
    let mut message = ConsoleMessage::new(console_level(&event.r#type), text)
        .with_args(event.args.iter().map(argument_json).collect())
        .with_epoch_millis(*event.timestamp.inner());
    if let Some(location) = top_frame(event.stack_trace.as_ref()) {
        message = message.with_location(location);
    }
    message
}

pub(crate) fn log_level(level: &LogEntryLevel) -> ConsoleLevel {
    match level {
        LogEntryLevel::Error => ConsoleLevel::Error,
        LogEntryLevel::Warning => ConsoleLevel::Warning,
        LogEntryLevel::Info => ConsoleLevel::Info,
        LogEntryLevel::Verbose => ConsoleLevel::Debug,
    }
}

/// Browser-generated console output such as `Failed to load resource`
///
/// Worker entries are skipped; they belong to another execution context.
/// Entries without a stack name the resource in the text instead.
fn log_message(entry: &LogEntry) -> Option<ConsoleMessage> {
    if entry.source == LogEntrySource::Worker {
        return None;
    }
    let location = top_frame(entry.stack_trace.as_ref());
    let text = match (&location, entry.url.as_deref()) {
        (None, Some(url)) if !url.is_empty() && !entry.text.contains(url) => {
            format!("{} {}", entry.text, url)
        }
        _ => entry.text.clone(),
    };
    let mut message = ConsoleMessage::new(log_level(&entry.level), text)
        .with_epoch_millis(*entry.timestamp.inner());
    if let Some(location) = location {
        message = message.with_location(location);
    }
    Some(message)
}

/// First line of the exception description, e.g. `TypeError: x is undefined`
pub(crate) fn exception_message(description: Option<&str>, fallback: &str) -> String {
    description
        .and_then(|d| d.lines().next())
        .filter(|line| !line.trim().is_empty())
        .unwrap_or(fallback)
        .to_string()
}

fn page_error(details: &ExceptionDetails) -> PageError {
    let description = details
        .exception
        .as_ref()
        .and_then(|e| e.description.as_deref());
    let stack = details.stack_trace.as_ref().and_then(|s| {
        render_frames(s.call_frames.iter().map(|f| {
            (
                f.function_name.as_str(),
                f.url.as_str(),
                f.line_number,
                f.column_number,
            )
        }))
    });
    PageError {
        message: exception_message(description, &details.text),
        stack,
    }
}
