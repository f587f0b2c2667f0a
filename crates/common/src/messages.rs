use faststr::FastStr;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum MessageRole {
    System,
    Assistant,
    User,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct Message {
    pub role:    MessageRole,
    pub content: FastStr,
}

impl Message {
    pub fn new(role: MessageRole, content: FastStr) -> Self {
        Self { role, content }
    }

    pub fn user(content: FastStr) -> Self {
        Self::new(MessageRole::User, content)
    }
}
