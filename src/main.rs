use anyhow::{Context, Result};
use api_server::ChatRelay;
use common::config::{RelayConfig, log_level_from_env};
use common::proxy::chat_openai::{OpenAIClient, OpenAIClientConfig};
use dotenvy::dotenv;
use tracing::{error, info};

#[tokio::main]
async fn main() -> Result<()> {
    dotenv().ok();
    let _guard = api_server::logging_stdout(log_level_from_env());

    let config = match RelayConfig::from_env() {
        Ok(config) => config,
        Err(e) => {
            error!("refusing to start: {e}");
            return Err(e).context("invalid configuration");
        }
    };
    info!(
        model = %config.params.routed_model(),
        api_base = %config.api_base,
        "inference provider configured"
    );

    let provider = OpenAIClient::new(OpenAIClientConfig::from(&config))?;
    let relay = ChatRelay::new(provider, config.params);

    api_server::run_api_server(config.listen, relay).await?;

    Ok(())
}
