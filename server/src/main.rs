use dotenvy::dotenv;
use sqlx::postgres::PgPoolOptions;
use std::sync::Arc;
use tokio::net::TcpListener;
use tracing_subscriber::EnvFilter;

use settlement_server::config::Config;
use settlement_server::notify::{LogNotifier, NotificationDispatcher, Notifier, WebhookNotifier};
use settlement_server::settlement::BookingFinalizer;
use settlement_server::store::{PgSettlementStore, SettlementStore};
use settlement_server::{create_routes, AppState, HttpPolicy};

#[tokio::main]
async fn main() {
    dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("settlement_server=info,tower_http=info")),
        )
        .init();

    let config = Config::from_env().expect("Invalid configuration");

    let pool = PgPoolOptions::new()
        .max_connections(config.max_connections)
        .connect(&config.database_url)
        .await
        .expect("Failed to connect to database");

    tracing::info!("Successfully connected to database");

    sqlx::migrate!()
        .run(&pool)
        .await
        .expect("Failed to run migrations");

    tracing::info!("Migrations run successfully");

    let notifier: Arc<dyn Notifier> = match &config.notification.webhook_url {
        Some(url) => {
            tracing::info!(endpoint = %url, "Confirmations delivered through webhook");
            Arc::new(
                WebhookNotifier::new(url.clone(), config.notification.timeout)
                    .expect("Failed to build notification client"),
            )
        }
        None => {
            tracing::warn!("NOTIFICATION_WEBHOOK_URL not set, confirmations are only logged");
            Arc::new(LogNotifier)
        }
    };
    let dispatcher = NotificationDispatcher::new(notifier, config.notification.timeout);

    let store: Arc<dyn SettlementStore> = Arc::new(PgSettlementStore::new(pool));
    let finalizer = BookingFinalizer::new(
        Arc::clone(&store),
        config.gateway_secret.clone(),
        dispatcher,
    );

    let policy = HttpPolicy {
        include_hsts: config.environment.is_production(),
        cors_allowed_origins: config.cors_allowed_origins.clone(),
    };
    let app = create_routes(AppState::new(finalizer, store), &policy);

    tracing::info!("Settlement API listening on http://{}", config.bind_addr);

    let listener = TcpListener::bind(config.bind_addr)
        .await
        .expect("Failed to bind address");

    axum::serve(listener, app).await.expect("Server failed");
}
