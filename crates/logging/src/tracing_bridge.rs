//! crates/logging/src/tracing_bridge.rs
//! Bridge between the tracing crate and the oc-backup verbosity flags.
//!
//! Core crates emit ordinary `tracing` events under the `backup::*` targets.
//! [`BackupLayer`] maps each target onto a [`LogFlag`], consults the
//! [`VerbosityConfig`] and renders the surviving events as single
//! `oc-backup: ...` lines on the configured writer (stderr by default).
//!
//! Errors are always printed. Warnings are printed unless the configuration
//! is quiet. Everything else needs the mapped flag to be at or above the
//! event's verbosity level (`INFO` = 1, `DEBUG` = 2, `TRACE` = 3).
//!
//! # Usage
//!
//! ```rust,ignore
//! use logging::{VerbosityConfig, init_tracing};
//!
//! init_tracing(VerbosityConfig::from_verbose_level(1));
//! tracing::info!(target: "backup::promote", "promoted daily/5-20240301.snapshot");
//! ```

use std::fmt::Write as _;
use std::io::{self, Write};
use std::sync::Mutex;

use super::config::VerbosityConfig;
use super::levels::LogFlag;
use tracing::{Level, Subscriber};
use tracing_subscriber::layer::{Context, Layer};
use tracing_subscriber::registry::LookupSpan;

/// Program prefix used on every rendered line.
pub const LINE_PREFIX: &str = "oc-backup";

/// A tracing layer that filters events through the verbosity flags and
/// writes them as plain diagnostic lines.
pub struct BackupLayer {
    config: VerbosityConfig,
    writer: Mutex<Box<dyn Write + Send>>,
}

impl BackupLayer {
    /// Create a layer that writes to stderr.
    #[must_use]
    pub fn new(config: VerbosityConfig) -> Self {
        Self::with_writer(config, io::stderr())
    }

    /// Create a layer that writes to the supplied writer.
    #[must_use]
    pub fn with_writer<W>(config: VerbosityConfig, writer: W) -> Self
    where
        W: Write + Send + 'static,
    {
        Self {
            config,
            writer: Mutex::new(Box::new(writer)),
        }
    }

    /// Map a tracing target to a flag.
    fn target_to_flag(target: &str) -> Option<LogFlag> {
        LogFlag::ALL.into_iter().find(|flag| {
            let name = flag.name();
            target == flag.target()
                || target == name
                || target
                    .strip_prefix(flag.target())
                    .is_some_and(|rest| rest.starts_with("::"))
        })
    }

    /// Map a tracing level to a verbosity level.
    const fn level_to_verbosity_level(level: &Level) -> u8 {
        match *level {
            Level::ERROR | Level::WARN => 0,
            Level::INFO => 1,
            Level::DEBUG => 2,
            Level::TRACE => 3,
        }
    }

    fn should_emit(&self, target: &str, level: &Level) -> bool {
        if *level == Level::ERROR {
            return true;
        }
        if self.config.quiet {
            return false;
        }
        if *level == Level::WARN {
            return true;
        }

        Self::target_to_flag(target).is_some_and(|flag| {
            self.config
                .enabled(flag, Self::level_to_verbosity_level(level))
        })
    }

    fn render(level: &Level, visitor: &MessageVisitor) -> String {
        let mut line = String::from(LINE_PREFIX);
        line.push_str(": ");
        match *level {
            Level::ERROR => line.push_str("error: "),
            Level::WARN => line.push_str("warning: "),
            _ => {}
        }
        if let Some(message) = &visitor.message {
            line.push_str(message);
        }
        for (name, value) in &visitor.fields {
            let _ = write!(line, " {name}={value}");
        }
        line.push('\n');
        line
    }
}

impl<S> Layer<S> for BackupLayer
where
    S: Subscriber + for<'a> LookupSpan<'a>,
{
    fn on_event(&self, event: &tracing::Event<'_>, _ctx: Context<'_, S>) {
        let metadata = event.metadata();
        if !self.should_emit(metadata.target(), metadata.level()) {
            return;
        }

        let mut visitor = MessageVisitor::default();
        event.record(&mut visitor);
        let line = Self::render(metadata.level(), &visitor);

        if let Ok(mut writer) = self.writer.lock() {
            let _ = writer.write_all(line.as_bytes());
            let _ = writer.flush();
        }
    }
}

/// Visitor collecting the message and the structured fields of an event.
#[derive(Default)]
struct MessageVisitor {
    message: Option<String>,
    fields: Vec<(&'static str, String)>,
}

impl tracing::field::Visit for MessageVisitor {
    fn record_debug(&mut self, field: &tracing::field::Field, value: &dyn std::fmt::Debug) {
        if field.name() == "message" {
            self.message = Some(format!("{value:?}"));
        } else {
            self.fields.push((field.name(), format!("{value:?}")));
        }
    }

    fn record_str(&mut self, field: &tracing::field::Field, value: &str) {
        if field.name() == "message" {
            self.message = Some(value.to_owned());
        } else {
            self.fields.push((field.name(), value.to_owned()));
        }
    }
}

/// Initialize tracing with the oc-backup verbosity configuration.
///
/// Returns `false` when a global subscriber was already installed, which
/// happens when the CLI entry point runs more than once in a process.
pub fn init_tracing(config: VerbosityConfig) -> bool {
    use tracing_subscriber::layer::SubscriberExt;
    use tracing_subscriber::util::SubscriberInitExt;

    tracing_subscriber::registry()
        .with(BackupLayer::new(config))
        .try_init()
        .is_ok()
}

/// Initialize tracing with a custom filter in front of the verbosity layer.
///
/// ```rust,ignore
/// use logging::{VerbosityConfig, init_tracing_with_filter};
/// use tracing_subscriber::EnvFilter;
///
/// let config = VerbosityConfig::from_verbose_level(2);
/// init_tracing_with_filter(config, EnvFilter::from_default_env());
/// ```
pub fn init_tracing_with_filter<F>(config: VerbosityConfig, filter: F) -> bool
where
    F: Layer<tracing_subscriber::Registry> + Send + Sync + 'static,
{
    use tracing_subscriber::layer::SubscriberExt;
    use tracing_subscriber::util::SubscriberInitExt;

    tracing_subscriber::registry()
        .with(filter)
        .with(BackupLayer::new(config))
        .try_init()
        .is_ok()
}
