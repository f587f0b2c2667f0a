use crate::{
    decoder::Utf8StreamDecoder,
    endpoint::Endpoint,
    error::{Error, Result},
    view::ChatView,
};
use bytes::Bytes;
use futures_util::{Stream, StreamExt, pin_mut};
use serde_json::json;
use std::time::Duration;
use tracing::{debug, info, warn};

const CONNECT_TIMEOUT: Duration = Duration::from_secs(10);
const WAITING_STATUS: &str = "waiting for reply...";

/// Lifecycle of one submission. Every terminal state goes back to `Idle`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubmissionState {
    Idle,
    Sending,
    Streaming,
    Completed,
    Failed,
}

#[derive(Debug)]
pub enum Outcome {
    /// Blank input: nothing was sent and the view was left alone.
    Rejected,
    Completed(String),
    Failed(Error),
}

/// Accumulated reply text plus whether the placeholder is still showing.
#[derive(Debug)]
struct ReplyBuffer {
    content:     String,
    placeholder: bool,
}

impl ReplyBuffer {
    fn new() -> Self {
        Self {
            content:     String::new(),
            placeholder: true,
        }
    }

    fn push<V: ChatView>(&mut self, view: &mut V, fragment: &str) {
        if fragment.is_empty() {
            return;
        }
        self.content.push_str(fragment);
        if !self.placeholder {
            view.append_reply(fragment);
        } else if !fragment.trim().is_empty() {
            // leading whitespace waits behind the placeholder and is shown now
            self.placeholder = false;
            view.replace_reply(&self.content);
        }
    }
}

pub struct StreamClient {
    http:     reqwest::Client,
    endpoint: Endpoint,
}

impl StreamClient {
    pub fn new(endpoint: Endpoint) -> Result<Self> {
        let http = reqwest::Client::builder()
            .connect_timeout(CONNECT_TIMEOUT)
            .build()?;
        Ok(Self { http, endpoint })
    }

    pub fn endpoint(&self) -> &Endpoint {
        &self.endpoint
    }

    /// Submits one message and renders the streamed reply into `view`.
    ///
    /// The view's input is disabled for the duration and re-enabled exactly
    /// once afterwards, whatever the result. Blank input is rejected without
    /// touching the view or the network.
    pub async fn send<V: ChatView>(&self, view: &mut V, user_text: &str) -> Outcome {
        let text = user_text.trim();
        if text.is_empty() {
            debug!("ignoring blank submission");
            return Outcome::Rejected;
        }

        view.set_input_enabled(false);
        view.on_state(SubmissionState::Sending);
        view.show_user_message(text);
        view.set_status(WAITING_STATUS);
        view.show_placeholder();

        let mut reply = ReplyBuffer::new();
        let outcome = match self.exchange(view, &mut reply, text).await {
            Ok(()) => {
                info!(chars = reply.content.chars().count(), "reply completed");
                view.on_state(SubmissionState::Completed);
                Outcome::Completed(reply.content)
            }
            Err(err) => {
                warn!(error = %err, "submission failed");
                view.show_error(&err.to_string());
                view.on_state(SubmissionState::Failed);
                Outcome::Failed(err)
            }
        };

        view.set_input_enabled(true);
        view.set_status("");
        view.focus_input();
        view.on_state(SubmissionState::Idle);
        outcome
    }

    async fn exchange<V: ChatView>(
        &self,
        view: &mut V,
        reply: &mut ReplyBuffer,
        text: &str,
    ) -> Result<()> {
        let res = self
            .http
            .post(self.endpoint.as_str())
            .json(&json!({ "message": text }))
            .send()
            .await?;

        let status = res.status();
        if !status.is_success() {
            // error bodies are short JSON or text, never a stream
            let body = res.text().await.unwrap_or_default();
            let detail = if body.is_empty() {
                status.canonical_reason().unwrap_or_default().to_owned()
            } else {
                body
            };
            return Err(Error::Api {
                status: status.as_u16(),
                detail: detail.into(),
            });
        }

        render_body(res.bytes_stream(), view, reply).await
    }
}

/// Reads the body to its end, decoding and rendering every chunk as it comes.
async fn render_body<S, E, V>(body: S, view: &mut V, reply: &mut ReplyBuffer) -> Result<()>
where
    S: Stream<Item = std::result::Result<Bytes, E>>,
    Error: From<E>,
    V: ChatView,
{
    pin_mut!(body);
    let mut decoder = Utf8StreamDecoder::default();
    let mut streaming = false;
    while let Some(chunk) = body.next().await {
        let chunk = chunk?;
        if !streaming {
            streaming = true;
            view.on_state(SubmissionState::Streaming);
        }
        reply.push(view, &decoder.decode(&chunk));
    }
    reply.push(view, &decoder.finish());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use api_server::ChatRelay;
    use common::{
        DeltaStream, Provider, config::InferenceParams, data::ChatCompletionsData,
        error::Error as ProviderError, stream::sse::SseEvent,
    };
    use futures_util::stream;
    use std::convert::Infallible;
    use std::net::SocketAddr;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[derive(Debug, Default)]
    struct RecordingView {
        reply:     String,
        snapshots: Vec<String>,
        users:     Vec<String>,
        errors:    Vec<String>,
        toggles:   Vec<bool>,
        status:    String,
        focused:   usize,
        states:    Vec<SubmissionState>,
    }

    impl RecordingView {
        fn is_untouched(&self) -> bool {
            self.reply.is_empty()
                && self.users.is_empty()
                && self.toggles.is_empty()
                && self.states.is_empty()
                && self.focused == 0
        }
    }

    impl ChatView for RecordingView {
        fn show_user_message(&mut self, text: &str) {
            self.users.push(text.to_owned());
        }

        fn show_placeholder(&mut self) {
            self.reply = crate::view::PLACEHOLDER.to_owned();
        }

        fn replace_reply(&mut self, text: &str) {
            self.reply = text.to_owned();
            self.snapshots.push(self.reply.clone());
        }

        fn append_reply(&mut self, fragment: &str) {
            self.reply.push_str(fragment);
            self.snapshots.push(self.reply.clone());
        }

        fn show_error(&mut self, reason: &str) {
            self.reply = format!("Error: {reason}");
            self.errors.push(reason.to_owned());
        }

        fn set_input_enabled(&mut self, enabled: bool) {
            self.toggles.push(enabled);
        }

        fn set_status(&mut self, status: &str) {
            self.status = status.to_owned();
        }

        fn focus_input(&mut self) {
            self.focused += 1;
        }

        fn on_state(&mut self, state: SubmissionState) {
            self.states.push(state);
        }
    }

    /// Streams `steps` with a pause before each; `"!"` fails the session and
    /// an empty script rejects the call outright.
    struct ScriptedProvider {
        steps: Vec<&'static str>,
        pause: Duration,
        calls: Arc<AtomicUsize>,
    }

    impl ScriptedProvider {
        fn new(steps: Vec<&'static str>) -> Self {
            Self {
                steps,
                pause: Duration::from_millis(100),
                calls: Arc::new(AtomicUsize::new(0)),
            }
        }
    }

    impl Provider for ScriptedProvider {
        async fn stream_chat(&self, _: ChatCompletionsData) -> common::error::Result<DeltaStream> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if self.steps.is_empty() {
                return Err(ProviderError::InvalidResponseData("unauthorized".into(), 401));
            }
            let pause = self.pause;
            Ok(stream::iter(self.steps.clone())
                .then(move |step| async move {
                    tokio::time::sleep(pause).await;
                    match step {
                        "!" => Err(ProviderError::MsgError("connection reset".into())),
                        text => Ok(SseEvent::Text(text.into())),
                    }
                })
                .chain(stream::once(async { Ok(SseEvent::Done) }))
                .boxed())
        }
    }

    async fn spawn_relay<P: Provider>(provider: P) -> Endpoint {
        let addr: SocketAddr = std::net::TcpListener::bind("127.0.0.1:0")
            .unwrap()
            .local_addr()
            .unwrap();
        tokio::spawn(api_server::run_api_server(
            addr,
            ChatRelay::new(provider, InferenceParams::default()),
        ));
        for _ in 0..200 {
            if tokio::net::TcpStream::connect(addr).await.is_ok() {
                return Endpoint::parse(&format!("http://{addr}/api/chat")).unwrap();
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        panic!("relay did not start on {addr}");
    }

    fn chunks(parts: &[&'static str]) -> impl Stream<Item = std::result::Result<Bytes, Infallible>> {
        stream::iter(parts.to_vec()).map(|p| Ok(Bytes::from_static(p.as_bytes())))
    }

    impl From<Infallible> for Error {
        fn from(e: Infallible) -> Self {
            match e {}
        }
    }

    #[tokio::test]
    async fn test_render_progression() {
        let mut view = RecordingView::default();
        let mut reply = ReplyBuffer::new();
        render_body(chunks(&["A", "B", "C"]), &mut view, &mut reply)
            .await
            .unwrap();
        assert_eq!(view.snapshots, ["A", "AB", "ABC"]);
        assert_eq!(view.states, [SubmissionState::Streaming]);
        assert_eq!(reply.content, "ABC");
    }

    #[tokio::test]
    async fn test_placeholder_kept_through_leading_whitespace() {
        let mut view = RecordingView::default();
        view.show_placeholder();
        let mut reply = ReplyBuffer::new();
        render_body(chunks(&["\n", " ", "Hi", "!"]), &mut view, &mut reply)
            .await
            .unwrap();
        assert_eq!(view.snapshots, ["\n Hi", "\n Hi!"]);
    }

    #[tokio::test]
    async fn test_render_split_utf8() {
        let mut view = RecordingView::default();
        let mut reply = ReplyBuffer::new();
        let body = stream::iter([&b"caf\xC3"[..], &b"\xA9"[..]])
            .map(|p| Ok::<_, Infallible>(Bytes::copy_from_slice(p)));
        render_body(body, &mut view, &mut reply).await.unwrap();
        assert_eq!(view.reply, "café");
    }

    #[tokio::test]
    async fn test_round_trip() {
        let endpoint = spawn_relay(ScriptedProvider::new(vec!["A", "B", "C"])).await;
        let client = StreamClient::new(endpoint).unwrap();
        let mut view = RecordingView::default();

        let outcome = client.send(&mut view, "  hello  ").await;
        assert!(matches!(outcome, Outcome::Completed(ref text) if text == "ABC"));
        assert_eq!(view.users, ["hello"]);
        assert_eq!(view.snapshots, ["A", "AB", "ABC"]);
        assert_eq!(view.reply, "ABC");
        assert_eq!(view.toggles, [false, true]);
        assert_eq!(view.focused, 1);
        assert_eq!(view.status, "");
        assert_eq!(
            view.states,
            [
                SubmissionState::Sending,
                SubmissionState::Streaming,
                SubmissionState::Completed,
                SubmissionState::Idle,
            ]
        );
    }

    #[tokio::test]
    async fn test_blank_input_is_rejected() {
        let provider = ScriptedProvider::new(vec!["A"]);
        let calls = provider.calls.clone();
        let endpoint = spawn_relay(provider).await;
        let client = StreamClient::new(endpoint).unwrap();
        let mut view = RecordingView::default();

        for text in ["", "   ", "\n\t"] {
            assert!(matches!(client.send(&mut view, text).await, Outcome::Rejected));
        }
        assert!(view.is_untouched());
        assert_eq!(calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_error_status_is_surfaced() {
        let endpoint = spawn_relay(ScriptedProvider::new(vec![])).await;
        let client = StreamClient::new(endpoint).unwrap();
        let mut view = RecordingView::default();

        let outcome = client.send(&mut view, "hi").await;
        assert!(matches!(outcome, Outcome::Failed(Error::Api { status: 500, .. })));
        assert!(view.snapshots.is_empty());
        assert_eq!(view.errors.len(), 1);
        assert!(view.errors[0].starts_with("API error 500"));
        assert!(view.errors[0].contains("inference provider rejected the credentials"));
        assert_eq!(view.toggles, [false, true]);
        assert_eq!(
            view.states,
            [SubmissionState::Sending, SubmissionState::Failed, SubmissionState::Idle]
        );
    }

    #[tokio::test]
    async fn test_mid_stream_failure() {
        let endpoint = spawn_relay(ScriptedProvider::new(vec!["A", "!"])).await;
        let client = StreamClient::new(endpoint).unwrap();
        let mut view = RecordingView::default();

        let outcome = client.send(&mut view, "hi").await;
        assert!(matches!(outcome, Outcome::Failed(Error::Transport(_))));
        assert_eq!(view.snapshots, ["A"]);
        assert!(view.reply.starts_with("Error: network error"));
        assert_eq!(view.toggles, [false, true]);
        assert_eq!(
            view.states,
            [
                SubmissionState::Sending,
                SubmissionState::Streaming,
                SubmissionState::Failed,
                SubmissionState::Idle,
            ]
        );
    }

    #[tokio::test]
    async fn test_unreachable_relay() {
        let addr = std::net::TcpListener::bind("127.0.0.1:0")
            .unwrap()
            .local_addr()
            .unwrap();
        // nothing listens there once the listener is dropped
        let endpoint = Endpoint::parse(&format!("http://{addr}/api/chat")).unwrap();
        let client = StreamClient::new(endpoint).unwrap();
        let mut view = RecordingView::default();

        let outcome = client.send(&mut view, "hi").await;
        assert!(matches!(outcome, Outcome::Failed(Error::Transport(_))));
        assert_eq!(view.errors.len(), 1);
        assert_eq!(view.toggles, [false, true]);
        assert_eq!(view.focused, 1);
    }
}
