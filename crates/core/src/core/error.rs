use thiserror::Error;

pub type Result<T, E = Error> = std::result::Result<T, E>;

#[derive(Debug, Error)]
pub enum Error {
    #[error("payload is not valid JSON: {0}")]
    Payload(#[from] serde_json::Error),

    #[error("payload field `{field}` has the wrong shape: {reason}")]
    PayloadShape { field: &'static str, reason: String },

    #[error("program `{0}` is not in the current snapshot")]
    UnknownProgram(String),

    #[error("metric `{0}` is not reported by any program in the current snapshot")]
    UnknownMetric(String),

    #[error("invalid configuration: {0}")]
    Config(String),

    #[error("fetch failed: {0}")]
    Fetch(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl Error {
    /// Errors worth retrying on the next poll tick rather than surfacing to the user.
    pub fn is_transient(&self) -> bool {
        matches!(self, Error::Fetch(_) | Error::Io(_))
    }
}
