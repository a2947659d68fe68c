mod bird;
mod config;
mod control;
mod error;
mod publisher;
mod routes;
mod store;
mod sync;

use clap::Parser;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

use bird::{Birdc, RouteDaemon, StaticRoute};
use config::{Action, CliArgs, Config};
use control::RouteController;
use error::AppError;
use publisher::RecordPublisher;
use routes::lookup::LookupService;
use store::RouteStore;
use store::redis_store::RedisStore;
use sync::SyncService;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli_args = CliArgs::parse();
    let config = Config::load(&cli_args)?;

    // Initialize logging; an unparsable RUST_LOG falls back to the configured level
    let filter = EnvFilter::try_new(&config.log_filter)
        .unwrap_or_else(|_| EnvFilter::new(config.log_level.to_string().to_lowercase()));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    tracing::info!("BIRD route sync starting");
    if let Some(path) = &config.config_path {
        tracing::info!("Loaded configuration from: {}", path.display());
    }
    tracing::info!("Local node ID: {}", config.node_id);
    if !config.ttl_outlives_interval() {
        tracing::warn!(
            "TTL ({}s) does not exceed the sync interval ({}s); routes will disappear between cycles",
            config.ttl.as_secs(),
            config.sync_interval.as_secs()
        );
    }

    let store: Arc<dyn RouteStore> = Arc::new(RedisStore::connect(&config.redis).await?);
    let daemon: Arc<dyn RouteDaemon> =
        Arc::new(Birdc::new(config.birdc.clone(), config.bird_socket.clone()));
    let publisher = RecordPublisher::new(
        store.clone(),
        config.namespace.clone(),
        config.node_id.clone(),
        config.ttl,
    );

    match cli_args.action {
        Action::Run => {
            SyncService::new(daemon, publisher, config.sync_interval)
                .run()
                .await?;
        }
        Action::Once => {
            let report = SyncService::new(daemon, publisher, config.sync_interval)
                .run_cycle()
                .await?;
            println!("{}", serde_json::to_string(&report)?);
        }
        action => {
            let lookup = LookupService::new(store, config.namespace.clone());
            let controller = RouteController::new(daemon, publisher, lookup);
            if let Err(e) = run_action(&controller, action).await {
                if e.is_fatal() {
                    tracing::error!("{} ({})", e, e.user_message());
                } else {
                    tracing::warn!("Operation aborted: {} ({})", e, e.user_message());
                }
                return Err(e.into());
            }
        }
    }

    Ok(())
}

async fn run_action(controller: &RouteController, action: Action) -> Result<(), AppError> {
    match action {
        Action::Add(args) => {
            let record = controller.add_route(&StaticRoute::from(args)).await?;
            tracing::info!("Published route {}", record.network);
        }
        Action::Delete { network } => controller.delete_route(&network).await?,
        Action::Lookup { network, node } => {
            let entries = match node {
                Some(node) => controller.lookup_node_route(&node, &network).await?,
                None => controller.lookup_route(&network).await?,
            };
            println!("{}", serde_json::to_string_pretty(&entries)?);
        }
        Action::Run | Action::Once => {
            return Err(AppError::Config("sync actions are not operator actions".to_string()));
        }
    }
    Ok(())
}
