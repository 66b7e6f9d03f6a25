use {
    crate::error::{DqnError, Result},
    std::{
        fs::File,
        path::Path,
        sync::Arc,
    },
    tracing::Level,
    tracing_subscriber::{
        fmt::{
            layer,
            writer::MakeWriterExt,
        },
        layer::SubscriberExt,
        util::SubscriberInitExt,
    },
};

/// Install the global subscriber: compact stdout output, plus a plain-text
/// copy in `file` when one is given. Fails if a subscriber is already set.
pub fn setup_logging(level: Level, file: Option<&Path>) -> Result<()> {
    let file_layer = match file {
        Some(path) => {
            let log_file = Arc::new(File::create(path)?);
            Some(
                layer()
                    .with_writer(log_file.with_max_level(level))
                    .with_ansi(false),
            )
        }
        None => None,
    };

    tracing_subscriber::registry()
        // File writer
        .with(file_layer)
        // Stdout writer
        .with(
            layer()
                .with_writer(std::io::stdout.with_max_level(level))
                .compact()
                .with_line_number(true)
                .with_thread_ids(false)
                .with_target(false),
        )
        .try_init()
        .map_err(|e| DqnError::IoError(format!("failed to install logger: {}", e)))
}
