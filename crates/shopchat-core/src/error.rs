use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Error)]
pub enum Error {
    /// Network failure, non-2xx status, or a body that isn't the expected JSON.
    #[error("request failed: {0}")]
    RequestFailed(String),

    #[error("invalid configuration: {0}")]
    Config(String),
}

impl From<reqwest::Error> for Error {
    fn from(err: reqwest::Error) -> Self {
        Error::RequestFailed(err.to_string())
    }
}
