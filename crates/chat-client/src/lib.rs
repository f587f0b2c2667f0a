pub mod client;
pub mod decoder;
pub mod endpoint;
pub mod error;
pub mod view;

pub use client::{Outcome, StreamClient, SubmissionState};
pub use endpoint::{DEFAULT_RELAY_URL, Endpoint};
pub use view::{ChatView, TerminalView};
