use bytes::Bytes;
use chrono::Timelike;
use faststr::FastStr;
use http_body::Frame;
use reqwest::StatusCode;
use reqwest::header::{CACHE_CONTROL, CONTENT_TYPE, HeaderValue, X_CONTENT_TYPE_OPTIONS};
use serde_json::Value;
use tokio::sync::mpsc::Receiver;
use tokio_stream::wrappers::ReceiverStream;
use volo_http::{body::Body, response::Response};

pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// One item of a streamed response body. An `Err` aborts the connection.
pub type BodyFrame = Result<Frame<Bytes>, BoxError>;

#[inline]
pub fn generate_request_id() -> FastStr {
    let random_id = chrono::Utc::now().nanosecond();
    format!("chat-{random_id}").into()
}

#[inline]
pub fn text_frame(text: &str) -> Frame<Bytes> {
    Frame::data(Bytes::copy_from_slice(text.as_bytes()))
}

pub fn json_response(status: StatusCode, value: &Value) -> Response {
    let mut response = Response::new(Body::from(value.to_string()));
    *response.status_mut() = status;
    response.headers_mut().insert(
        CONTENT_TYPE,
        HeaderValue::from_static("application/json; charset=utf-8"),
    );
    response
}

/// `200` with a plain-text body fed by `rx`; no length is known, so the
/// body goes out chunked.
pub fn streaming_text_response(rx: Receiver<BodyFrame>) -> Response {
    let mut response = Response::new(Body::from_stream(ReceiverStream::new(rx)));
    *response.status_mut() = StatusCode::OK;
    let headers = response.headers_mut();
    headers.insert(
        CONTENT_TYPE,
        HeaderValue::from_static("text/plain; charset=utf-8"),
    );
    headers.insert(CACHE_CONTROL, HeaderValue::from_static("no-cache"));
    headers.insert(X_CONTENT_TYPE_OPTIONS, HeaderValue::from_static("nosniff"));
    response
}
