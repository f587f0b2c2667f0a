use crate::error::{Error, Result};
use faststr::FastStr;
use futures_util::StreamExt;
use reqwest::RequestBuilder;
use reqwest_eventsource::{Error as EventSourceError, Event, RequestBuilderExt};
use std::fmt::Display;
use tokio::sync::mpsc::UnboundedSender;
use tracing::{debug, warn};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SseEvent {
    Text(FastStr),
    /// Completion marker: nothing follows for this request.
    Done,
}

impl Display for SseEvent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Text(t) => write!(f, "{t}"),
            Self::Done => write!(f, "Done"),
        }
    }
}

#[derive(Debug)]
pub struct SseMmessage {
    #[allow(unused)]
    pub event: FastStr,
    pub data:  FastStr,
}

/// Sending half of a provider session. Once the receiver is dropped every
/// send fails, which is how the consumer learns to stop.
pub struct SseHandler {
    sender: UnboundedSender<Result<SseEvent>>,
}

impl SseHandler {
    pub fn new(sender: UnboundedSender<Result<SseEvent>>) -> Self {
        Self { sender }
    }

    pub fn text(&mut self, text: &str) -> Result<()> {
        if text.is_empty() {
            return Ok(());
        }

        let message = SseEvent::Text(text.to_owned().into());
        if self.sender.send(Ok(message.clone())).is_err() {
            return Err(Error::SendSseEventError(message));
        }
        Ok(())
    }

    pub fn done(&mut self) {
        debug!("SseEvent: Done");
        if self.sender.send(Ok(SseEvent::Done)).is_err() {
            debug!("failed to send SseEvent:Done, rx maybe closed")
        }
    }

    pub fn error(&mut self, err: Error) {
        if self.sender.send(Err(err)).is_err() {
            debug!("failed to forward provider error, rx maybe closed")
        }
    }
}

/// Drives an event-source request, handing each message to `handle` until it
/// returns `true` or the upstream ends.
pub async fn sse_stream<F>(builder: RequestBuilder, mut handle: F) -> Result<()>
where
    F: FnMut(SseMmessage) -> Result<bool>,
{
    let mut es = builder.eventsource()?;
    while let Some(event) = es.next().await {
        match event {
            Ok(Event::Open) => {
                debug!("event stream opened");
            }
            Ok(Event::Message(message)) => {
                let message = SseMmessage {
                    event: message.event.into(),
                    data:  message.data.into(),
                };
                if handle(message)? {
                    es.close();
                    break;
                }
            }
            Err(err) => {
                es.close();
                match err {
                    EventSourceError::StreamEnded => {
                        debug!("Stream End");
                    }
                    EventSourceError::InvalidStatusCode(status, res) => {
                        let text = res.text().await.unwrap_or_default();
                        warn!(status = %status, body = %text, "provider rejected the request");
                        return Err(Error::InvalidResponseData(text.into(), status.as_u16()));
                    }
                    EventSourceError::InvalidContentType(header_value, res) => {
                        let text = res.text().await?;
                        return Err(Error::InvalidResponseEventStream(
                            header_value.to_str().unwrap_or_default().to_owned().into(),
                            text.into(),
                        ));
                    }
                    _ => {
                        return Err(Error::ReqwestEventsourceError(err.into()));
                    }
                }
            }
        }
    }

    Ok(())
}
