//! Structured logging on top of `tracing`.
//!
//! Logs always go to stderr so command output on stdout stays clean.

use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Registry};

use crate::config::AppConfig;
use crate::error::{NoteError, Result};

/// Environment variable holding a full `EnvFilter` directive string.
pub const LOG_ENV: &str = "NOTETREE_LOG";

/// Install the global subscriber.
///
/// `NOTETREE_LOG` replaces the configured level and module directives when
/// set. A subscriber installed earlier is left in place.
pub fn init_logging(config: &AppConfig) -> Result<()> {
    if !config.logging_enabled() {
        return Ok(());
    }

    let filter = build_env_filter(config)?;
    let registry = Registry::default().with(filter);
    let installed = match config.log_format() {
        "json" => registry
            .with(
                fmt::layer()
                    .json()
                    .with_target(true)
                    .with_writer(std::io::stderr),
            )
            .try_init(),
        "text" => registry
            .with(
                fmt::layer()
                    .with_target(true)
                    .with_writer(std::io::stderr),
            )
            .try_init(),
        other => {
            return Err(NoteError::Config(format!(
                "Invalid log format: {} (must be 'json' or 'text')",
                other
            )))
        }
    };
    // Err here means a subscriber is already set, which is fine.
    let _ = installed;
    Ok(())
}

/// Build the filter from `NOTETREE_LOG` or, failing that, the config.
fn build_env_filter(config: &AppConfig) -> Result<EnvFilter> {
    if let Ok(filter) = EnvFilter::try_from_env(LOG_ENV) {
        return Ok(filter);
    }
    filter_from_config(config)
}

fn filter_from_config(config: &AppConfig) -> Result<EnvFilter> {
    let level = config.log_level();
    if level == "off" {
        return Ok(EnvFilter::new("off"));
    }

    let mut filter = EnvFilter::try_new(level)
        .map_err(|e| NoteError::Config(format!("Invalid log level {:?}: {}", level, e)))?;
    for (module, module_level) in config.log_modules() {
        let directive = format!("{}={}", module, module_level);
        filter = filter.add_directive(
            directive
                .parse()
                .map_err(|e| NoteError::Config(format!("Invalid log directive: {}", e)))?,
        );
    }
    Ok(filter)
}
