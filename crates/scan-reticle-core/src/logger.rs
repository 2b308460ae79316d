//! Stderr logging for the scanner crates.
//!
//! Lines look like `[  1.203s  INFO session] locked on ...`: elapsed time
//! since installation, level, and the last segment of the log target.
//! Records from outside the `scan_reticle*` crates are held to `warn` unless
//! [`LoggerConfig::foreign_level`] says otherwise.

use std::io::Write;
use std::sync::OnceLock;
use std::time::Instant;

use log::{LevelFilter, Log, Metadata, Record};

#[cfg(feature = "tracing")]
use tracing_subscriber::fmt::format::FmtSpan;
#[cfg(feature = "tracing")]
use tracing_subscriber::util::SubscriberInitExt;
#[cfg(feature = "tracing")]
use tracing_subscriber::{fmt, EnvFilter};

/// Environment variable consulted by [`init_from_env`] and [`init_tracing`].
pub const LOG_ENV: &str = "SCAN_RETICLE_LOG";

const OWN_PREFIX: &str = "scan_reticle";

/// Settings for [`init`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct LoggerConfig {
    /// Level for records emitted by the scanner crates.
    pub level: LevelFilter,
    /// Level for every other target.
    pub foreign_level: LevelFilter,
}

impl LoggerConfig {
    pub fn new(level: LevelFilter) -> Self {
        Self {
            level,
            foreign_level: level.min(LevelFilter::Warn),
        }
    }

    fn max_level(&self) -> LevelFilter {
        self.level.max(self.foreign_level)
    }

    fn level_for(&self, target: &str) -> LevelFilter {
        if target.starts_with(OWN_PREFIX) {
            self.level
        } else {
            self.foreign_level
        }
    }
}

struct StderrLogger {
    config: LoggerConfig,
    started: Instant,
}

fn short_target(target: &str) -> &str {
    target.rsplit("::").next().unwrap_or(target)
}

impl Log for StderrLogger {
    fn enabled(&self, metadata: &Metadata) -> bool {
        metadata.level() <= self.config.level_for(metadata.target())
    }

    fn log(&self, record: &Record) {
        if !self.enabled(record.metadata()) {
            return;
        }
        let elapsed = self.started.elapsed().as_secs_f64();
        let mut stderr = std::io::stderr().lock();
        let _ = writeln!(
            stderr,
            "[{:7.3}s {:>5} {}] {}",
            elapsed,
            record.level(),
            short_target(record.target()),
            record.args()
        );
    }

    fn flush(&self) {
        let _ = std::io::stderr().flush();
    }
}

static LOGGER: OnceLock<StderrLogger> = OnceLock::new();

/// Install the stderr logger. Only the first call has any effect.
pub fn init(config: LoggerConfig) -> Result<(), log::SetLoggerError> {
    if LOGGER.get().is_some() {
        return Ok(());
    }
    let logger = LOGGER.get_or_init(|| StderrLogger {
        config,
        started: Instant::now(),
    });
    log::set_logger(logger)?;
    log::set_max_level(config.max_level());
    Ok(())
}

/// Install the stderr logger with `level` for the scanner crates.
pub fn init_with_level(level: LevelFilter) -> Result<(), log::SetLoggerError> {
    init(LoggerConfig::new(level))
}

/// Parse a `SCAN_RETICLE_LOG` value: a bare level (`debug`), or a scanner
/// level and foreign level separated by a comma (`debug,info`).
pub fn parse_log_env(raw: &str) -> Option<LoggerConfig> {
    let mut parts = raw.split(',').map(str::trim);
    let level = parts.next()?.parse::<LevelFilter>().ok()?;
    let mut config = LoggerConfig::new(level);
    if let Some(foreign) = parts.next() {
        config.foreign_level = foreign.parse().ok()?;
    }
    Some(config)
}

/// Install the stderr logger from `SCAN_RETICLE_LOG`, falling back to
/// `default` when the variable is unset or unparsable.
pub fn init_from_env(default: LevelFilter) -> Result<(), log::SetLoggerError> {
    let config = std::env::var(LOG_ENV)
        .ok()
        .and_then(|raw| parse_log_env(&raw))
        .unwrap_or_else(|| LoggerConfig::new(default));
    init(config)
}

/// `EnvFilter` directives equivalent to `config`.
pub fn filter_directives(config: LoggerConfig) -> String {
    let own = config.level.to_string().to_lowercase();
    let foreign = config.foreign_level.to_string().to_lowercase();
    format!("{foreign},scan_reticle={own},scan_reticle_core={own},scan_reticle_overlay={own}")
}

/// Install a `tracing` subscriber. The filter comes from `SCAN_RETICLE_LOG`
/// in `EnvFilter` syntax, falling back to `level` for the scanner crates.
#[cfg(feature = "tracing")]
pub fn init_tracing(json: bool, level: LevelFilter) {
    let filter = EnvFilter::try_from_env(LOG_ENV)
        .unwrap_or_else(|_| EnvFilter::new(filter_directives(LoggerConfig::new(level))));
    let builder = fmt()
        .with_env_filter(filter)
        .with_span_events(FmtSpan::CLOSE);
    let _ = if json {
        builder.json().flatten_event(true).finish().try_init()
    } else {
        builder
            .with_timer(fmt::time::Uptime::default())
            .finish()
            .try_init()
    };
}
