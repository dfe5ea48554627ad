//! Logger bootstrap for the binaries. The library itself only speaks the
//! `log` facade.

use std::sync::Once;

/// `env_filter` uses the `env_logger` syntax (`"info"`, `"framecast=debug"`).
/// Without one, `RUST_LOG` is honoured, then `info`.
#[derive(Debug, Clone)]
pub struct LoggingConfig {
    pub env_filter: Option<String>,
    pub write_style: env_logger::WriteStyle,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            env_filter: None,
            write_style: env_logger::WriteStyle::Auto,
        }
    }
}

static INIT: Once = Once::new();

/// Install the global logger. Later calls are ignored.
pub fn init_logging(config: LoggingConfig) {
    INIT.call_once(|| {
        let mut builder = env_logger::Builder::new();

        match config.env_filter.or_else(|| std::env::var("RUST_LOG").ok()) {
            Some(filter) => {
                builder.parse_filters(&filter);
            }
            None => {
                builder.filter_level(log::LevelFilter::Info);
            }
        }

        builder.write_style(config.write_style).format_timestamp_millis();
        if builder.try_init().is_err() {
            // Someone else (a test harness) already owns the logger.
            return;
        }
        log::debug!("logging initialized");
    });
}
