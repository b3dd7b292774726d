//! Log output for the command line.

use tracing_subscriber::filter::{LevelFilter, Targets};
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, Layer, Registry};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogLevel {
    Debug,
    Info,
    Error,
}

impl From<LogLevel> for tracing::Level {
    fn from(level: LogLevel) -> Self {
        match level {
            LogLevel::Debug => tracing::Level::DEBUG,
            LogLevel::Info => tracing::Level::INFO,
            LogLevel::Error => tracing::Level::ERROR,
        }
    }
}

pub fn init_with_level(level: LogLevel) {
    let default = LevelFilter::from_level(level.into());
    // Emitter warnings are printed as diagnostics; their events only show when debugging.
    let emitter = match level {
        LogLevel::Debug => default,
        LogLevel::Info | LogLevel::Error => LevelFilter::ERROR,
    };
    let filter = Targets::new()
        .with_default(default)
        .with_target("as3ts_emitter", emitter);

    let layer = fmt::layer()
        .without_time()
        .with_target(false)
        .with_level(true)
        .with_ansi(false)
        .compact()
        .with_filter(filter);

    Registry::default().with(layer).init();
}
