use faststr::FastStr;
use reqwest_eventsource::CannotCloneRequestError;
use thiserror::Error;

use crate::stream::sse::SseEvent;

#[derive(Debug, Error)]
pub enum Error {
    #[error("{0}")]
    MsgError(FastStr),
    #[error("missing required environment variable: {0}")]
    MissingEnv(&'static str),
    #[error("invalid value for {name}: {value}")]
    InvalidEnv { name: &'static str, value: FastStr },
    #[error("{0}")]
    CannotCloneRequestError(#[from] CannotCloneRequestError),
    #[error("Reqwest error: {0}")]
    ReqwestError(#[from] reqwest::Error),
    #[error("Invalid response data: {0} status: {1}")]
    InvalidResponseData(FastStr, u16),
    #[error("Invalid response event-stream: content-type: {0}, data: {1}")]
    InvalidResponseEventStream(FastStr, FastStr),
    #[error("Reqwest eventsource error: {0}")]
    ReqwestEventsourceError(#[from] Box<reqwest_eventsource::Error>),
    #[error("serde error: {0}")]
    SerdeError(#[from] serde_json::Error),
    #[error("Failed to send SseEvent: {0}")]
    SendSseEventError(SseEvent),
}

impl Error {
    /// Client-facing description of the failure. Raw error text may carry
    /// upstream bodies or urls, so only this goes over the wire.
    pub fn category(&self) -> &'static str {
        match self {
            Self::InvalidResponseData(_, 401 | 403) => "inference provider rejected the credentials",
            Self::InvalidResponseData(_, 404) => "model unavailable",
            Self::InvalidResponseData(_, 429) => "inference provider is rate limiting requests",
            Self::InvalidResponseData(..) | Self::InvalidResponseEventStream(..) => {
                "inference provider returned an error"
            }
            Self::ReqwestError(_) | Self::ReqwestEventsourceError(_) => {
                "inference provider unreachable"
            }
            Self::SerdeError(_) => "malformed response from inference provider",
            _ => "internal server error",
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_category_hides_upstream_body() {
        let err = Error::InvalidResponseData(r#"{"error":"bad token hf_xxx"}"#.into(), 401);
        assert_eq!(err.category(), "inference provider rejected the credentials");
        assert!(!err.category().contains("hf_xxx"));
    }

    #[test]
    fn test_category_by_status() {
        assert_eq!(Error::InvalidResponseData("".into(), 404).category(), "model unavailable");
        assert_eq!(
            Error::InvalidResponseData("".into(), 503).category(),
            "inference provider returned an error"
        );
        assert_eq!(Error::MsgError("boom".into()).category(), "internal server error");
    }
}
