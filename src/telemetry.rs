use crate::config::LoggingConfig;
use std::fs::OpenOptions;
use std::sync::OnceLock;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::fmt::time::UtcTime;

static TRACING_INIT: OnceLock<()> = OnceLock::new();

/// `RUST_LOG` wins over the configured level.
fn env_filter(level: &str) -> EnvFilter {
    filter_from(std::env::var("RUST_LOG").ok().as_deref(), level)
}

/// First directive that parses, falling back to `warn`.
fn filter_from(env: Option<&str>, level: &str) -> EnvFilter {
    env.filter(|directives| !directives.trim().is_empty())
        .and_then(|directives| EnvFilter::try_new(directives).ok())
        .or_else(|| EnvFilter::try_new(level).ok())
        .unwrap_or_else(|| EnvFilter::new("warn"))
}

pub(crate) fn init_tracing(config: &LoggingConfig) {
    let _ = TRACING_INIT.get_or_init(|| {
        let filter = env_filter(&config.level);

        if let Some(path) = &config.file {
            match OpenOptions::new().create(true).append(true).open(path) {
                Ok(file) => {
                    let subscriber = tracing_subscriber::fmt()
                        .json()
                        .with_env_filter(filter)
                        .with_timer(UtcTime::rfc_3339())
                        .with_writer(file)
                        .with_current_span(false)
                        .with_span_list(false)
                        .finish();
                    let _ = tracing::subscriber::set_global_default(subscriber);
                    return;
                }
                Err(e) => {
                    eprintln!("Warning: cannot open log file {}: {e}", path.display());
                }
            }
        }

        let subscriber = tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_writer(std::io::stderr)
            .with_target(false)
            .finish();
        let _ = tracing::subscriber::set_global_default(subscriber);
    });
}
