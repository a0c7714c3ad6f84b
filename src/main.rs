//! Bouquet Configurator - pricing, quotes and the payment gate for the storefront

use anyhow::Result;
use sqlx::postgres::PgPoolOptions;
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use bouquet_configurator::api::{build_router, AppState};
use bouquet_configurator::config::load_app_config;
use bouquet_configurator::domain::services::DiscountGate;
use bouquet_configurator::infrastructure::{HttpEmailSender, HttpPaymentGateway, PgStore};

#[tokio::main]
async fn main() -> Result<()> {
    let config = load_app_config()?;
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| config.log_level.clone().into()))
        .with(tracing_subscriber::fmt::layer())
        .init();

    let db = PgPoolOptions::new().max_connections(config.db_max_connections).connect(&config.database_url).await?;
    sqlx::migrate!("./migrations").run(&db).await?;
    let store = Arc::new(PgStore::new(db));

    let state = AppState {
        catalog: store.clone(),
        discounts: DiscountGate::new(store),
        payments: Arc::new(HttpPaymentGateway::new(&config.payment_api_url, &config.payment_secret_key, config.http_timeout_secs)?),
        email: Arc::new(HttpEmailSender::new(&config.email_api_url, &config.email_api_key, config.http_timeout_secs)?),
        currency: config.payment_currency.clone(),
        email_from: config.email_from.clone(),
    };

    tracing::info!(addr = %config.bind_addr, currency = %config.payment_currency, "bouquet configurator listening");
    axum::serve(tokio::net::TcpListener::bind(config.bind_addr).await?, build_router(state)).await?;
    Ok(())
}
