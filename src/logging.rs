//! Structured logging for wampwire tools.
//!
//! The library itself only emits `tracing` events (frame kind and length at
//! `trace`, rejected frames at `debug`). Binaries call [`init`] once to
//! install a subscriber.
//!
//! Settings are layered: the `[log]` table of the config file, then the
//! environment, then `--verbose`.
//!
//! ## Environment Variables
//!
//! - `WAMPWIRE_LOG` or `RUST_LOG`: filter directive (e.g. `wampwire=trace`)
//! - `WAMPWIRE_LOG_FORMAT`: output format (`pretty`, `compact`, `json`)
//!
//! ## Examples
//!
//! ```bash
//! # See every encoded and decoded frame
//! WAMPWIRE_LOG=wampwire=trace wampwire decode frame.json
//!
//! # JSON output for log aggregation
//! WAMPWIRE_LOG_FORMAT=json wampwire transcode --from json --to msgpack frame.json
//! ```

use serde::{Deserialize, Serialize};
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

const DEFAULT_FILTER: &str = "wampwire=info,warn";

const VERBOSE_FILTER: &str = "wampwire=trace,info";

/// Log output format
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    /// Human-readable with colors and indentation
    #[default]
    Pretty,
    /// Compact single-line output
    Compact,
    /// JSON output for log aggregation
    Json,
}

impl LogFormat {
    /// Parse from string (case-insensitive). Unknown names fall back to
    /// [`LogFormat::Pretty`].
    pub fn parse(s: &str) -> Self {
        match s.to_lowercase().as_str() {
            "json" => Self::Json,
            "compact" => Self::Compact,
            _ => Self::Pretty,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct LogConfig {
    /// Filter directive (e.g., "debug", "wampwire=trace,warn")
    pub filter: String,
    pub format: LogFormat,
    /// Include file/line in logs
    pub with_file: bool,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            filter: DEFAULT_FILTER.to_string(),
            format: LogFormat::Pretty,
            with_file: false,
        }
    }
}

impl LogConfig {
    /// Apply `WAMPWIRE_LOG` / `RUST_LOG` and `WAMPWIRE_LOG_FORMAT` on top of
    /// this config. `var` looks a variable up, usually in the process
    /// environment.
    pub fn with_vars(self, var: impl Fn(&str) -> Option<String>) -> Self {
        let filter = var("WAMPWIRE_LOG")
            .or_else(|| var("RUST_LOG"))
            .unwrap_or(self.filter);
        let format = var("WAMPWIRE_LOG_FORMAT")
            .map(|s| LogFormat::parse(&s))
            .unwrap_or(self.format);
        Self {
            filter,
            format,
            ..self
        }
    }

    /// Trace every frame and show source locations. Keeps the format.
    pub fn verbose(self) -> Self {
        Self {
            filter: VERBOSE_FILTER.to_string(),
            with_file: true,
            ..self
        }
    }
}

/// Initialize the global tracing subscriber, writing to stderr.
///
/// Only the first call installs a subscriber; later calls are ignored.
/// An unparseable filter falls back to `wampwire=info,warn`.
pub fn init(config: LogConfig) {
    let env_filter =
        EnvFilter::try_new(&config.filter).unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER));

    let layer = fmt::layer()
        .with_writer(std::io::stderr)
        .with_file(config.with_file)
        .with_line_number(config.with_file);
    let layer = match config.format {
        LogFormat::Json => layer.json().boxed(),
        LogFormat::Compact => layer.compact().boxed(),
        LogFormat::Pretty => layer.pretty().boxed(),
    };

    let _ = tracing_subscriber::registry()
        .with(env_filter)
        .with(layer)
        .try_init();
}
