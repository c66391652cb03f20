use crate::config::AppConfig;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_appender::rolling;
use tracing_subscriber::fmt::writer::MakeWriterExt;
use tracing_subscriber::EnvFilter;

/// Log to stdout and a daily file in the cache directory.
///
/// Keep the returned guard alive for the life of the process or buffered file
/// output is lost.
pub fn init(cfg: &AppConfig) -> Result<Option<WorkerGuard>, Box<dyn std::error::Error>> {
    #[cfg(feature = "tokio-console")]
    if cfg.debug_console {
        console_subscriber::init();
        return Ok(None);
    }

    std::fs::create_dir_all(&cfg.cache_path)?;
    let file_appender = rolling::daily(&cfg.cache_path, "cloudsorter.log");
    let (file_writer, guard) = tracing_appender::non_blocking(file_appender);

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(cfg.log_level.clone()))
        .with_writer(std::io::stdout.and(file_writer))
        .try_init()
        .map_err(|e| e.to_string())?;

    #[cfg(not(feature = "tokio-console"))]
    if cfg.debug_console {
        tracing::warn!("debug_console is set but the tokio-console feature is not compiled in");
    }
    if cfg.trace_spans && !cfg!(feature = "trace-spans") {
        tracing::warn!("trace_spans is set but the trace-spans feature is not compiled in");
    }
    Ok(Some(guard))
}
