use thiserror::Error;
use tracing::error;
use tracing_error::SpanTrace;

/// Failures that stop the server before or while serving.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("server io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("configuration error: {0}")]
    Config(#[from] crate::config::ConfigError),
    #[error("database error: {0}")]
    Database(#[from] crate::model::DatabaseError),
}

pub type AppResult<T> = std::result::Result<T, AppError>;

pub async fn run_with_error_handler<F, T>(run: F) -> T
where
    F: AsyncFn() -> AppResult<T>,
    T: Send + Sync,
{
    match run().await {
        Ok(value) => value,
        Err(e) => {
            log_error(&e);
            error!(app = crate::APPLICATION_NAME, "stopped on a fatal error");
            std::process::exit(1);
        }
    }
}

/// Logs `error` together with the span trace it surfaced in.
pub fn log_error<E: std::error::Error>(error: &E) {
    let span = SpanTrace::capture();
    error!(%error, "{span}");
}
