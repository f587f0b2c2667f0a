use crate::{
    error::{Error, Result},
    relay::ChatRelay,
    requests::ChatRequest,
    tools::{BodyFrame, BoxError, generate_request_id, streaming_text_response, text_frame},
};
use bytes::Bytes;
use common::{DeltaStream, Provider, data::ChatCompletionsData, stream::sse::SseEvent};
use faststr::FastStr;
use futures_util::StreamExt;
use tokio::sync::mpsc::{self, Sender};
use tracing::{Instrument, Span, debug, error, info, info_span, warn};
use volo_http::{
    response::Response,
    server::{
        IntoResponse,
        route::{Router, post},
    },
    utils::Extension,
};

/// Frames buffered between the pump and the connection.
const PUMP_CAPACITY: usize = 32;

async fn chat_handler<P: Provider>(
    Extension(relay): Extension<ChatRelay<P>>,
    body: Bytes,
) -> Response {
    let request_id = generate_request_id();
    let span = info_span!("chat", request_id = %request_id);
    relay_chat(relay, request_id, body).instrument(span).await
}

async fn relay_chat<P: Provider>(relay: ChatRelay<P>, request_id: FastStr, body: Bytes) -> Response {
    let message = match ChatRequest::from_slice(&body).and_then(ChatRequest::into_message) {
        Ok(message) => message,
        Err(err) => {
            warn!(error = %err, "rejected chat request");
            return err.into_response();
        }
    };
    info!(message = %message, "recv chat request");

    let data = ChatCompletionsData::single_turn(&relay.params, request_id, message);
    let opened = match open_reply(relay.provider.as_ref(), data).await {
        Ok(opened) => opened,
        Err(err) => {
            error!(error = %err, "provider failed before the reply started");
            return err.into_response();
        }
    };

    let (tx, rx) = mpsc::channel(PUMP_CAPACITY);
    match opened {
        Some((first, deltas)) => {
            tokio::spawn(pump_deltas(first, deltas, tx).instrument(Span::current()));
        }
        None => {
            info!("provider finished without any text");
        }
    }
    streaming_text_response(rx)
}

/// Opens the provider session and waits for its first text delta, so that a
/// failure up to that point can still be answered with a status code.
/// `None` means the provider completed without producing text.
async fn open_reply<P: Provider>(
    provider: &P,
    data: ChatCompletionsData,
) -> Result<Option<(FastStr, DeltaStream)>> {
    let mut deltas = provider.stream_chat(data).await?;
    loop {
        match deltas.next().await {
            Some(Ok(SseEvent::Text(text))) if !text.is_empty() => return Ok(Some((text, deltas))),
            Some(Ok(SseEvent::Text(_))) => continue,
            Some(Ok(SseEvent::Done)) | None => return Ok(None),
            Some(Err(e)) => return Err(Error::Provider(e)),
        }
    }
}

/// Moves deltas into the response body one frame each, in arrival order.
/// Stops at the completion marker, on client disconnect, or on provider
/// failure; in the last case the body is aborted instead of finished.
async fn pump_deltas(first: FastStr, mut deltas: DeltaStream, tx: Sender<BodyFrame>) {
    let mut written = first.len();
    if tx.send(Ok(text_frame(&first))).await.is_err() {
        warn!("client went away before the first delta");
        return;
    }

    loop {
        let event = tokio::select! {
            biased;
            _ = tx.closed() => {
                warn!(written, "client disconnected, abandoning provider stream");
                return;
            }
            event = deltas.next() => event,
        };

        match event {
            Some(Ok(SseEvent::Text(text))) => {
                if text.is_empty() {
                    continue;
                }
                written += text.len();
                if tx.send(Ok(text_frame(&text))).await.is_err() {
                    warn!(written, "client disconnected, abandoning provider stream");
                    return;
                }
            }
            Some(Ok(SseEvent::Done)) => {
                debug!("completion marker received");
                break;
            }
            None => {
                debug!("provider stream exhausted");
                break;
            }
            Some(Err(err)) => {
                error!(error = %err, written, "provider stream failed mid-reply");
                let _ = tx
                    .send(Err(BoxError::from("provider stream interrupted")))
                    .await;
                return;
            }
        }
    }

    // the transport may still be open after the marker
    drop(deltas);
    info!(written, "reply streamed");
}

pub fn chat_router<P: Provider>() -> Router {
    Router::new().route("/api/chat", post(chat_handler::<P>))
}
