use faststr::FastStr;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("API error {status}: {detail}")]
    Api { status: u16, detail: FastStr },

    #[error("network error: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("invalid relay url {url:?}: {reason}")]
    InvalidEndpoint { url: FastStr, reason: &'static str },
}

pub type Result<T> = std::result::Result<T, Error>;
