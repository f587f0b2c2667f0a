use super::{DeltaStream, Provider};
use crate::error::{Error, Result};
use crate::{
    config::{Credential, RelayConfig},
    data::{ChatCompletionsData, RequestData},
    stream::sse::{SseHandler, SseMmessage, sse_stream},
};
use faststr::FastStr;
use futures_util::StreamExt;
use reqwest::RequestBuilder;
use serde_json::Value;
use std::time::Duration;
use tokio::sync::mpsc::unbounded_channel;
use tokio_stream::wrappers::UnboundedReceiverStream;
use tracing::{Instrument, debug, error, info_span};

const CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

#[derive(Debug, Clone)]
pub struct OpenAIClientConfig {
    pub name:     FastStr,
    pub api_key:  Option<Credential>,
    pub api_base: FastStr,
}

impl OpenAIClientConfig {
    pub fn new(name: &str, api_key: Option<Credential>, api_base: &str) -> Self {
        Self {
            name: name.to_owned().into(),
            api_key,
            api_base: api_base.trim_end_matches('/').to_owned().into(),
        }
    }
}

impl From<&RelayConfig> for OpenAIClientConfig {
    fn from(config: &RelayConfig) -> Self {
        Self::new("huggingface", Some(config.credential.clone()), &config.api_base)
    }
}

/// Streaming client for an OpenAI-compatible `/chat/completions` endpoint,
/// such as the Hugging Face inference router.
#[derive(Debug, Clone)]
pub struct OpenAIClient {
    pub config: OpenAIClientConfig,
    http:       reqwest::Client,
}

impl OpenAIClient {
    pub fn new(config: OpenAIClientConfig) -> Result<Self> {
        Ok(Self {
            config,
            http: build_http_client()?,
        })
    }

    fn request_builder(&self, data: ChatCompletionsData) -> Result<RequestBuilder> {
        let request_data = prepare_chat_completions(&self.config, data)?;
        debug!(request = ?request_data, "prepared provider request");
        Ok(request_builder(request_data, &self.http))
    }
}

impl Provider for OpenAIClient {
    async fn stream_chat(&self, data: ChatCompletionsData) -> Result<DeltaStream> {
        let span = info_span!("provider", name = %self.config.name, task_id = %data.task_id);
        let builder = self.request_builder(data)?;

        let (tx, rx) = unbounded_channel();
        tokio::spawn(
            async move {
                let mut handler = SseHandler::new(tx);
                match openai_chat_completions_streaming(builder, &mut handler).await {
                    Ok(()) => handler.done(),
                    Err(Error::SendSseEventError(_)) => {
                        debug!("session receiver dropped, abandoning upstream stream");
                    }
                    Err(e) => {
                        error!(error = %e, "provider stream failed");
                        handler.error(e);
                    }
                }
            }
            .instrument(span),
        );

        Ok(UnboundedReceiverStream::new(rx).boxed())
    }
}

/// Connect timeout only: generation may legitimately take a long time.
pub fn build_http_client() -> Result<reqwest::Client> {
    let client = reqwest::Client::builder()
        .connect_timeout(CONNECT_TIMEOUT)
        .build()?;
    Ok(client)
}

fn request_builder(request_data: RequestData, client: &reqwest::Client) -> RequestBuilder {
    let RequestData {
        url, body, headers, ..
    } = request_data;
    let mut builder = client.post(url.as_str());
    for (k, v) in headers {
        builder = builder.header(k.as_str(), v.as_str());
    }
    builder = builder.json(&body);
    builder
}

fn prepare_chat_completions(
    config: &OpenAIClientConfig,
    data: ChatCompletionsData,
) -> Result<RequestData> {
    let url = format!("{}/chat/completions", config.api_base);
    let body = serde_json::to_value(data)?;

    let mut request_data = RequestData::new(url, body);
    if let Some(key) = &config.api_key {
        request_data.bearer_auth(key);
    }
    Ok(request_data)
}

/// What a single upstream chunk contributes to the reply.
#[derive(Debug, PartialEq, Eq)]
pub(crate) struct ChunkDelta<'a> {
    pub text:     Option<&'a str>,
    pub finished: bool,
}

pub(crate) fn parse_chunk(data: &Value) -> ChunkDelta<'_> {
    let choice = &data["choices"][0];
    ChunkDelta {
        text:     choice["delta"]["content"].as_str().filter(|v| !v.is_empty()),
        finished: !choice["finish_reason"].is_null(),
    }
}

pub async fn openai_chat_completions_streaming(
    builder: RequestBuilder,
    handler: &mut SseHandler,
) -> Result<()> {
    let handle = |message: SseMmessage| -> Result<bool> {
        if message.data == "[DONE]" {
            return Ok(true);
        }
        let data: Value = serde_json::from_str(&message.data)?;
        if let Some(err) = data.get("error") {
            return Err(Error::MsgError(format!("provider error event: {err}").into()));
        }
        let delta = parse_chunk(&data);
        if let Some(text) = delta.text {
            handler.text(text)?;
        }
        Ok(delta.finished)
    };

    sse_stream(builder, handle).await
}
