use faststr::FastStr;
use reqwest::StatusCode;
use serde_json::json;
use thiserror::Error;
use volo_http::{response::Response, server::IntoResponse};

use crate::tools::json_response;

#[derive(Debug, Error)]
pub enum Error {
    #[error("Invalid Requst Body: {0}")]
    InvalidRequestBody(#[from] serde_json::Error),

    #[error("message is required")]
    EmptyMessage,

    #[error("provider error: {0}")]
    Provider(#[from] common::error::Error),

    #[error("server error: {0}")]
    Serve(FastStr),
}

impl Error {
    pub fn status(&self) -> StatusCode {
        match self {
            Self::InvalidRequestBody(_) | Self::EmptyMessage => StatusCode::BAD_REQUEST,
            Self::Provider(_) | Self::Serve(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Text safe to hand to the caller; provider details stay in the logs.
    pub fn public_message(&self) -> FastStr {
        match self {
            Self::InvalidRequestBody(e) => format!("invalid request body: {e}").into(),
            Self::EmptyMessage => "message is required".into(),
            Self::Provider(e) => e.category().into(),
            Self::Serve(_) => "internal server error".into(),
        }
    }
}

impl IntoResponse for Error {
    fn into_response(self) -> Response {
        json_response(self.status(), &json!({ "error": self.public_message() }))
    }
}

pub type Result<T> = std::result::Result<T, Error>;
