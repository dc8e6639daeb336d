mod api;
mod db;
mod error;
mod handlers;
mod inventory;
mod repository;
mod settings;

use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;

use anyhow::Result;
use clap::Parser;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use crate::db::MongoStore;
use crate::inventory::InventoryManager;
use crate::settings::DbSettings;

#[derive(Parser)]
#[command(name = "collections-service")]
struct Args {
    #[arg(long, env = "PORT", default_value = "3000")]
    port: u16,

    /// Properties file holding the connection-string components.
    #[arg(long, env = "DB_PROPERTIES", default_value = "db.properties")]
    properties: PathBuf,

    #[arg(long, env = "STATIC_DIR", default_value = "static")]
    static_dir: PathBuf,

    #[arg(long, default_value = "products")]
    products_collection: String,

    #[arg(long, default_value = "orders")]
    orders_collection: String,
}

#[tokio::main]
async fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("info,tower_http=debug")),
        )
        .init();
    let args = Args::parse();

    match run(args).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("Collections service failed: {:#}", e);
            ExitCode::FAILURE
        }
    }
}

async fn run(args: Args) -> Result<()> {
    let settings = DbSettings::load(&args.properties)?;
    info!("Connecting to MongoDB host {}", settings.host);
    let database = db::connect(&settings).await?;

    let store = Arc::new(MongoStore::new(
        database,
        args.products_collection.clone(),
        args.orders_collection,
    ));
    let app_state = api::AppState {
        documents: store.clone(),
        products: store.clone(),
        inventory: InventoryManager::new(store.clone(), store),
        products_collection: args.products_collection,
    };

    let app = api::create_router(app_state, &args.static_dir);
    let listener = tokio::net::TcpListener::bind(format!("0.0.0.0:{}", args.port)).await?;

    info!("Server is running on port {}", args.port);
    info!("Serving static assets from {}", args.static_dir.display());

    axum::serve(listener, app).await?;

    Ok(())
}
