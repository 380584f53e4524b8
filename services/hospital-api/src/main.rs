mod api;
mod config;

use anyhow::Result;
use clap::Parser;
use hospitalkit::database::schema;
use hospitalkit::{ConnectionManager, Registry};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser, Debug)]
#[command(name = "hospital-api")]
#[command(about = "JSON API for hospital records stored in ScyllaDB")]
struct Args {
    #[arg(short, long, default_value = "config/hospital.yaml")]
    config: String,

    /// Overrides `server.port` from the configuration.
    #[arg(short, long)]
    port: Option<u16>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    let config = config::load_config(&args.config)?;

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                format!(
                    "hospital_api={level},hospitalkit={level},tower_http=debug",
                    level = config.observability.log_level
                )
                .into()
            }),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let port = args.port.unwrap_or(config.server.port);
    info!("Starting hospital API on port {}", port);

    let mut manager = ConnectionManager::new(config.database.clone());
    let connection = manager.connect_default().await?;
    schema::initialize(
        &connection,
        &config.database.keyspace,
        config.database.replication_factor,
    )
    .await?;

    let state = api::AppState::new(Registry::new(connection.clone()), connection);
    let result = api::start_server(state, port).await;

    manager.close();
    result
}
