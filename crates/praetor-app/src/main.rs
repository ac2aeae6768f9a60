use std::sync::Arc;

use salvo::conn::TcpListener;
use salvo::{Listener, Router};

use praetor_app::app::api::routes;
use praetor_app::catalog::{build_resolver, seed_privileges};
use praetor_app::config::ConfigHandler;
use praetor_app::db_handler::DbProviderHandler;
use praetor_core::config::load_config;
use praetor_db::db::{DbProvider, connection::create_pool, migrate::run_migrations};
use praetor_service::auth::{Authorizer, AuthorizerHandler, DatabasePrivilegeSource};
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, reload, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let (filter_layer, filter_handle) = reload::Layer::new(EnvFilter::new("debug"));

    tracing_subscriber::registry()
        .with(filter_layer)
        .with(
            fmt::layer()
                .with_target(true)
                .with_thread_ids(true)
                .with_file(true)
                .with_line_number(true),
        )
        .init();

    tracing::info!("Starting Praetor authorization service");

    let config = load_config()?;

    tracing::info!(config = ?config, "Configuration loaded");

    if let Ok(filter) = EnvFilter::try_new(config.logging.level.as_str()) {
        if let Err(e) = filter_handle.modify(|current| *current = filter) {
            tracing::warn!(error = %e, "Failed to update log filter from config");
        }
    } else {
        tracing::warn!(level = %config.logging.level, "Invalid log level in config, keeping debug");
    }

    run_migrations(&config.database.url).await?;

    let pool = create_pool(&config.database).await?;
    let provider: Arc<dyn DbProvider + Send + Sync> = Arc::new(pool.clone());

    let resolver = build_resolver()?;

    if config.authorization.seed_privileges {
        let inserted = seed_privileges(provider.as_ref(), &resolver).await?;
        tracing::info!(inserted, "Privileges seeded");
    }

    let authorizer = Arc::new(Authorizer::new(
        resolver,
        Arc::new(DatabasePrivilegeSource::new(provider)),
    ));

    if config.authorization.refresh_on_start {
        authorizer.refresh().await?;
    } else {
        tracing::warn!("Privilege cache starts empty; only public actions are reachable until refreshed");
    }

    let bind_addr = config.server.bind_addr();
    let acceptor = TcpListener::new(bind_addr.clone()).bind().await;

    let router = Router::new()
        .hoop(DbProviderHandler::new(pool))
        .hoop(ConfigHandler::new(config.clone()))
        .hoop(AuthorizerHandler { authorizer })
        .push(routes());

    tracing::info!(origin = %config.server.origin(), "Server listening on {bind_addr}");

    salvo::Server::new(acceptor).serve(router).await;

    Ok(())
}
