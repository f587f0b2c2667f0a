pub use common::logging_stdout;
use common::Provider;
use std::net::SocketAddr;
use tracing::info;
use volo_http::Address;
use volo_http::server::{Router, Server};
use volo_http::utils::Extension;

pub mod error;
pub mod handlers;
pub mod relay;
pub mod requests;
pub mod tools;

pub use relay::ChatRelay;

use error::{Error, Result};

pub async fn run_api_server<P: Provider>(addr: SocketAddr, relay: ChatRelay<P>) -> Result<()> {
    let app = Router::new()
        .merge(handlers::chat_router::<P>())
        .layer(Extension(relay));
    info!("Relay server listening on {}", addr);
    let addr = Address::from(addr);
    Server::new(app)
        .run(addr)
        .await
        .map_err(|e| Error::Serve(e.to_string().into()))
}
