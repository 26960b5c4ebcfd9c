use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Error, Debug)]
pub enum Error {
    #[error("configuration error: {0}")]
    Config(String),

    #[error("database error: {0}")]
    Database(String),

    #[error("unable to upgrade timeseries database, unsupported fromVersion: {0}")]
    UnsupportedVersion(String),

    #[error("failed to load upgrade routines: {0}")]
    RoutineLoad(String),

    #[error("routine not found: {0}")]
    RoutineNotFound(String),

    #[error("failed to execute function {invocation} (step {index}): {message}")]
    Step {
        index: usize,
        invocation: String,
        message: String,
    },

    #[error("failed to execute cleanup statement {statement} (action {index}): {message}")]
    Cleanup {
        index: usize,
        statement: String,
        message: String,
    },

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}
