//! Logging configuration for service-container
//!
//! Every container event is emitted under the [`TARGET`] target: registration
//! and discovery at `DEBUG`, per-parameter resolution and cache hits at
//! `TRACE`, override classes that do not declare the expected interface at
//! `WARN`.
//!
//! # Features
//!
//! - `logging` - Emit events through `tracing` (default)
//! - `logging-json` - Install a JSON subscriber (recommended for production)
//! - `logging-pretty` - Install a colorful pretty subscriber (recommended for development)
//!
//! # Example
//!
//! ```rust,ignore
//! use service_container::logging;
//!
//! // Initialize with default settings (JSON if logging-json, pretty if logging-pretty)
//! logging::init();
//!
//! // Or use builder for custom configuration
//! logging::builder()
//!     .trace()
//!     .container_only()
//!     .pretty()
//!     .init();
//! ```

use tracing::Level;

/// Target every container event is emitted under
pub const TARGET: &str = "service_container";

/// Logging format configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogFormat {
    /// JSON structured logging (production default)
    #[default]
    Json,
    /// Pretty colorful output (development)
    Pretty,
    /// Compact single-line output
    Compact,
}

/// Builder for logging configuration
#[derive(Debug, Clone)]
pub struct LoggingBuilder {
    level: Level,
    format: LogFormat,
    target: Option<&'static str>,
    with_file: bool,
    with_line_number: bool,
    with_thread_ids: bool,
}

impl Default for LoggingBuilder {
    fn default() -> Self {
        Self {
            level: Level::DEBUG,
            format: LogFormat::Json,
            target: None,
            with_file: false,
            with_line_number: false,
            with_thread_ids: false,
        }
    }
}

impl LoggingBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the minimum log level
    pub fn with_level(mut self, level: Level) -> Self {
        self.level = level;
        self
    }

    /// Per-parameter resolution events
    pub fn trace(self) -> Self {
        self.with_level(Level::TRACE)
    }

    /// Registration, discovery and instantiation events
    pub fn debug(self) -> Self {
        self.with_level(Level::DEBUG)
    }

    /// Only warnings about suspicious wiring
    pub fn warn(self) -> Self {
        self.with_level(Level::WARN)
    }

    /// Filter to only show logs from a specific target
    pub fn with_target_filter(mut self, target: &'static str) -> Self {
        self.target = Some(target);
        self
    }

    /// Only show service-container logs
    pub fn container_only(self) -> Self {
        self.with_target_filter(TARGET)
    }

    /// Include file names and line numbers in log output
    pub fn with_source_location(mut self) -> Self {
        self.with_file = true;
        self.with_line_number = true;
        self
    }

    /// Include thread IDs, useful when services resolve concurrently
    pub fn with_thread_ids(mut self) -> Self {
        self.with_thread_ids = true;
        self
    }

    pub fn json(mut self) -> Self {
        self.format = LogFormat::Json;
        self
    }

    pub fn pretty(mut self) -> Self {
        self.format = LogFormat::Pretty;
        self
    }

    pub fn compact(mut self) -> Self {
        self.format = LogFormat::Compact;
        self
    }

    /// Filter directive equivalent to this configuration, e.g. `service_container=trace`
    pub fn directive(&self) -> String {
        let level = self.level.as_str().to_ascii_lowercase();
        match self.target {
            Some(target) => format!("{target}={level}"),
            None => level,
        }
    }

    /// Install the global subscriber.
    ///
    /// Does nothing if a subscriber is already installed. JSON output needs the
    /// `logging-json` feature and falls back to the default text layout
    /// without it.
    #[cfg(any(feature = "logging-json", feature = "logging-pretty"))]
    pub fn init(self) {
        use tracing_subscriber::{EnvFilter, fmt, prelude::*};

        let filter = EnvFilter::new(self.directive());
        let layer = fmt::layer()
            .with_file(self.with_file)
            .with_line_number(self.with_line_number)
            .with_thread_ids(self.with_thread_ids)
            .with_target(true);

        let registry = tracing_subscriber::registry().with(filter);
        let _ = match self.format {
            #[cfg(feature = "logging-json")]
            LogFormat::Json => registry.with(layer.json()).try_init(),
            #[cfg(not(feature = "logging-json"))]
            LogFormat::Json => registry.with(layer).try_init(),
            LogFormat::Pretty => registry.with(layer.pretty()).try_init(),
            LogFormat::Compact => registry.with(layer.compact()).try_init(),
        };
    }

    /// No-op: tracing-subscriber not enabled
    #[cfg(not(any(feature = "logging-json", feature = "logging-pretty")))]
    pub fn init(self) {}
}

/// Create a new logging builder
pub fn builder() -> LoggingBuilder {
    LoggingBuilder::new()
}

/// Initialize logging with default settings
///
/// JSON when `logging-json` is enabled, pretty otherwise.
pub fn init() {
    if cfg!(feature = "logging-json") {
        init_json();
    } else {
        init_pretty();
    }
}

/// Initialize JSON structured logging
///
/// # Example output
/// ```json
/// {"timestamp":"2024-01-01T00:00:00.000Z","level":"DEBUG","fields":{"message":"Registering service","id":"app::Mailer"},"target":"service_container"}
/// ```
pub fn init_json() {
    builder().json().debug().init();
}

/// Initialize pretty colorful logging
///
/// # Example output
/// ```text
///   2024-01-01T00:00:00.000Z DEBUG service_container: Creating new service container
/// ```
pub fn init_pretty() {
    builder().pretty().debug().init();
}

/// Initialize logging for the container only (filters other crates)
pub fn init_container_only() {
    builder().container_only().debug().init();
}
