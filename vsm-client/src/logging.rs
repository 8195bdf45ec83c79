//! Logging utilities for the VSM client.
//!
//! The library itself only emits `tracing` events; applications decide where
//! they go. [`setup::init_logging`] is a convenience for binaries and tests that
//! just want a sensible subscriber.

/// Default cap for response bodies echoed into log events.
pub const DEFAULT_MAX_FIELD_LENGTH: usize = 256;

/// Truncates a string to the maximum field length if needed.
///
/// Cuts on a character boundary so multi-byte bodies never panic.
pub fn truncate_field(value: &str, max_length: usize) -> String {
    if value.len() <= max_length {
        return value.to_string();
    }
    let mut end = max_length;
    while !value.is_char_boundary(end) {
        end -= 1;
    }
    format!("{}...(truncated)", &value[..end])
}

/// Subscriber installation for applications embedding the client.
pub mod setup {
    use std::error::Error;

    use tracing::Level;
    use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer};

    /// Transport crates that are chatty below `warn`.
    const NOISY_DEPENDENCIES: [&str; 3] = ["hyper", "hyper_util", "reqwest"];

    /// How events are written to stderr.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
    pub enum LogFormat {
        #[default]
        Full,
        Compact,
        /// One JSON object per event, fields flattened into the top level.
        Json,
    }

    #[derive(Debug, Clone)]
    pub struct LoggingConfig {
        level: Level,
        client_level: Option<Level>,
        format: LogFormat,
        directives: Vec<String>,
    }

    impl Default for LoggingConfig {
        fn default() -> Self {
            Self {
                level: Level::INFO,
                client_level: None,
                format: LogFormat::Full,
                directives: Vec::new(),
            }
        }
    }

    impl LoggingConfig {
        /// Shows every request the client makes, including retries.
        pub fn verbose() -> Self {
            Self::default().with_client_level(Level::DEBUG)
        }

        pub fn with_level(mut self, level: Level) -> Self {
            self.level = level;
            self
        }

        /// Level for events emitted by `vsm_client` itself.
        pub fn with_client_level(mut self, level: Level) -> Self {
            self.client_level = Some(level);
            self
        }

        pub fn with_format(mut self, format: LogFormat) -> Self {
            self.format = format;
            self
        }

        /// Appends a raw `EnvFilter` directive, e.g. `my_app::db=trace`.
        pub fn with_directive(mut self, directive: impl Into<String>) -> Self {
            self.directives.push(directive.into());
            self
        }

        pub fn format(&self) -> LogFormat {
            self.format
        }

        /// The filter used when `RUST_LOG` is unset.
        ///
        /// Later directives win, so caller directives come last.
        pub fn filter_directives(&self) -> String {
            let mut parts = vec![self.level.as_str().to_lowercase()];
            if self.level > Level::WARN {
                parts.extend(NOISY_DEPENDENCIES.iter().map(|target| format!("{target}=warn")));
            }
            if let Some(level) = self.client_level {
                parts.push(format!("vsm_client={}", level.as_str().to_lowercase()));
            }
            parts.extend(self.directives.iter().cloned());
            parts.join(",")
        }
    }

    /// Installs a global subscriber writing to stderr.
    ///
    /// `RUST_LOG` takes precedence over the configured filter. Fails instead
    /// of panicking when a global subscriber is already set.
    ///
    /// # Examples
    ///
    /// ```rust,no_run
    /// use vsm_client::logging::setup::{init_logging, LogFormat, LoggingConfig};
    ///
    /// init_logging(LoggingConfig::verbose().with_format(LogFormat::Json)).unwrap();
    /// ```
    pub fn init_logging(config: LoggingConfig) -> Result<(), Box<dyn Error + Send + Sync>> {
        let filter = match EnvFilter::try_from_default_env() {
            Ok(filter) => filter,
            Err(_) => EnvFilter::try_new(config.filter_directives())?,
        };

        let layer = fmt::layer().with_writer(std::io::stderr);
        let layer = match config.format {
            LogFormat::Full => layer.boxed(),
            LogFormat::Compact => layer.compact().boxed(),
            LogFormat::Json => layer.json().flatten_event(true).boxed(),
        };

        tracing_subscriber::registry()
            .with(filter)
            .with(layer)
            .try_init()?;
        Ok(())
    }
}
