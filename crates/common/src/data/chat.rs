use crate::config::InferenceParams;
use crate::messages::Message;
use faststr::FastStr;
use serde::{Deserialize, Serialize};

/// Outbound `/chat/completions` body.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatCompletionsData {
    #[serde(skip)]
    pub task_id:     FastStr,
    #[serde(rename = "model")]
    pub model_name:  FastStr,
    pub messages:    Vec<Message>,
    pub temperature: Option<f32>,
    pub top_p:       Option<f32>,
    pub max_tokens:  Option<u32>,
    pub stream:      bool,
}

impl ChatCompletionsData {
    /// A single-turn streaming request: the user message is the whole context.
    pub fn single_turn(params: &InferenceParams, task_id: FastStr, message: FastStr) -> Self {
        Self {
            task_id,
            model_name: params.routed_model(),
            messages: vec![Message::user(message)],
            temperature: Some(params.temperature),
            top_p: Some(params.top_p),
            max_tokens: Some(params.max_tokens),
            stream: true,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_single_turn_body() {
        let params = InferenceParams {
            model:         "meta-llama/Llama-3.1-8B-Instruct".into(),
            provider_hint: Some("novita".into()),
            temperature:   0.5,
            max_tokens:    64,
            top_p:         0.9,
        };
        let data = ChatCompletionsData::single_turn(&params, "chat-1".into(), "hi".into());
        let body = serde_json::to_value(&data).unwrap();
        assert_eq!(body["model"], "meta-llama/Llama-3.1-8B-Instruct:novita");
        assert_eq!(body["messages"], json!([{ "role": "user", "content": "hi" }]));
        assert_eq!(body["temperature"], 0.5);
        assert_eq!(body["max_tokens"], 64);
        assert_eq!(body["stream"], true);
        assert!((body["top_p"].as_f64().unwrap() - 0.9).abs() < 1e-6);
        assert!(body.get("task_id").is_none());
    }
}
