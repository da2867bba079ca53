use clap::Parser;
use net::StreamBus;
use runtime::{app, cli::Args, logger::init_logging};
use std::sync::Arc;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let args = Args::parse();
    let bus = Arc::new(StreamBus::new(256));
    init_logging(bus.sender());
    app::run(args, bus).await
}
