use crate::error::{Error, Result};
use faststr::FastStr;
use serde::{Deserialize, Serialize};

#[derive(Default, Debug, Clone, Serialize, Deserialize)]
pub struct ChatRequest {
    #[serde(default)]
    pub message: Option<FastStr>,
}

impl ChatRequest {
    pub fn from_slice(body: &[u8]) -> Result<Self> {
        Ok(serde_json::from_slice(body)?)
    }

    /// The message to forward, or `EmptyMessage` if there is nothing to say.
    pub fn into_message(self) -> Result<FastStr> {
        match self.message {
            Some(message) if !message.trim().is_empty() => Ok(message),
            _ => Err(Error::EmptyMessage),
        }
    }
}
