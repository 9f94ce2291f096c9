use std::net::{SocketAddr, TcpListener};
use std::sync::Arc;

use birdfacts::{
    config::Config,
    dotenv,
    server::{run_server, Context},
};
use log::{error, info};

async fn run() -> anyhow::Result<()> {
    let config = Config::from_env()?;
    info!(
        "Serving birds from {} with images from {}",
        config.bird_source, config.image_search_url
    );
    let ctx = Arc::new(Context::from_config(&config)?);
    let listener = TcpListener::bind(SocketAddr::from(([0, 0, 0, 0], config.port)))?;
    run_server(ctx, listener).await
}

#[tokio::main]
async fn main() {
    better_panic::install();
    dotenv().ok();
    env_logger::init();

    if let Err(err) = run().await {
        error!("{:?}", err);
        std::process::exit(1);
    }
}
