mod chat;

pub use chat::ChatRequest;
