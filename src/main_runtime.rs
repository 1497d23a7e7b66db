use pyramid::config::LoggingConfig;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::EnvFilter;

/// Console + daily rolling file logging.
///
/// The returned guard flushes the file writer on drop; keep it alive for
/// the life of the process.
pub fn init_logging(cfg: &LoggingConfig) -> Option<WorkerGuard> {
    use tracing_subscriber::layer::SubscriberExt;
    use tracing_subscriber::util::SubscriberInitExt;

    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&cfg.level))
        .unwrap_or_else(|_| EnvFilter::new("info"));

    // `tracing_appender::rolling::daily` panics if it can't create the
    // initial file, so check writability first.
    let mut guard = None;
    let file_layer = if std::fs::create_dir_all(&cfg.dir).is_ok() {
        let test_path = std::path::Path::new(&cfg.dir).join(".pyramid_write_test");
        match std::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&test_path)
        {
            Ok(_) => {
                let _ = std::fs::remove_file(&test_path);

                let file_appender = tracing_appender::rolling::daily(&cfg.dir, "pyramid.log");
                let (non_blocking, file_guard) = tracing_appender::non_blocking(file_appender);
                guard = Some(file_guard);

                Some(
                    tracing_subscriber::fmt::layer()
                        .with_writer(non_blocking)
                        .with_ansi(false) // No color codes in file
                        .with_target(true),
                )
            }
            Err(e) => {
                eprintln!(
                    "Warning: Could not write to log directory {} ({}), file logging disabled",
                    cfg.dir, e
                );
                None
            }
        }
    } else {
        eprintln!(
            "Warning: Could not create log directory {}, file logging disabled",
            cfg.dir
        );
        None
    };

    let console_plain = (!cfg.json).then(|| {
        tracing_subscriber::fmt::layer()
            .with_target(true)
            .with_thread_ids(false)
            .with_file(false)
            .with_line_number(false)
    });
    let console_json = cfg
        .json
        .then(|| tracing_subscriber::fmt::layer().json().with_target(true));

    let file_logging_enabled = file_layer.is_some();
    tracing_subscriber::registry()
        .with(filter)
        .with(console_plain)
        .with(console_json)
        .with(file_layer)
        .init();

    if file_logging_enabled {
        eprintln!("Logging to: {}/pyramid.log", cfg.dir);
    }

    guard
}

pub fn init_logging_simple() {
    // Minimal logging for CLI commands
    let _ = tracing_subscriber::fmt()
        .with_max_level(tracing::Level::WARN)
        .try_init();
}
