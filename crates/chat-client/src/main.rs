use anyhow::Result;
use chat_client::{ChatView, DEFAULT_RELAY_URL, Endpoint, Outcome, StreamClient, TerminalView};
use common::LevelFilter;
use common::config::log_level_from_env_or;
use dotenvy::dotenv;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::info;

#[tokio::main]
async fn main() -> Result<()> {
    dotenv().ok();
    // stdout is shared with the conversation, keep it quiet by default
    let _guard = common::logging_stdout(log_level_from_env_or(LevelFilter::WARN));

    let url = std::env::var("CHAT_RELAY_URL").unwrap_or_else(|_| DEFAULT_RELAY_URL.to_owned());
    let client = StreamClient::new(Endpoint::parse(&url)?)?;
    info!(endpoint = client.endpoint().as_str(), "chat client ready");

    let mut view = TerminalView::new(std::io::stdout());
    view.focus_input();

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while let Some(line) = lines.next_line().await? {
        if let Outcome::Rejected = client.send(&mut view, &line).await {
            view.focus_input();
        }
    }

    Ok(())
}
