//! Logging setup
//!
//! `RUST_LOG` wins when set; otherwise the filter is built from `LOG_LEVEL`.
//! With `LOG_DIR` pointing at an existing directory, output goes to a daily
//! rolling file instead of stdout.

use std::path::Path;

use tracing_subscriber::EnvFilter;

/// Default filter directive for a level name
pub fn default_directive(level: &str) -> String {
    format!("bistro_server={level},tower_http=info,security=info")
}

/// Initialize the global subscriber
pub fn init_logger(log_level: &str, log_dir: Option<&str>) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_directive(log_level)));

    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_file(false)
        .with_line_number(false)
        .with_thread_ids(false);

    if let Some(dir) = log_dir.map(Path::new)
        && dir.is_dir()
    {
        let file_appender = tracing_appender::rolling::daily(dir, "bistro-server");
        subscriber
            .with_ansi(false)
            .with_writer(file_appender)
            .init();
        return;
    }

    subscriber.init();
}
