pub mod chat_openai;

use crate::{data::ChatCompletionsData, error::Result, stream::sse::SseEvent};
use futures_util::stream::BoxStream;

/// Deltas of one provider session, in arrival order. Dropping it abandons the
/// session.
pub type DeltaStream = BoxStream<'static, Result<SseEvent>>;

/// An inference backend that turns a prompt into a stream of text deltas.
///
/// Errors returned from `stream_chat` itself, or yielded before the first
/// text delta, happen before anything reached the caller. Errors yielded
/// later interrupt an already started reply.
pub trait Provider: Send + Sync + 'static {
    fn stream_chat(
        &self,
        req: ChatCompletionsData,
    ) -> impl Future<Output = Result<DeltaStream>> + Send;
}
