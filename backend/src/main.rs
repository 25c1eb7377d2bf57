//! Backend entry-point: loads settings, wires adapters and starts the server.

mod server;

use std::sync::Arc;

use actix_web::web;
use ortho_config::OrthoConfig;
use tracing::{info, warn};
use tracing_subscriber::{EnvFilter, fmt};

use server::{ServerConfig, create_server};
use tally::inbound::http::health::HealthState;
use tally::inbound::http::session_config::{BuildMode, session_settings};
use tally::inbound::http::state::{HttpState, HttpStatePorts};
use tally::outbound::memory::{InMemoryIdentityConnector, MemoryDocumentStore};
use tally::settings::AppSettings;

/// Application bootstrap.
#[actix_web::main]
async fn main() -> std::io::Result<()> {
    if let Err(e) = fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .json()
        .try_init()
    {
        warn!(error = %e, "tracing init failed");
    }

    let settings = AppSettings::load().map_err(|e| std::io::Error::other(e.to_string()))?;
    let session = session_settings(&settings, BuildMode::from_debug_assertions())
        .map_err(std::io::Error::other)?;
    let bind_addr = settings.bind_addr().map_err(std::io::Error::other)?;
    let account = settings
        .identity_account()
        .map_err(std::io::Error::other)?;
    let consent_url = settings.consent_url().map_err(std::io::Error::other)?;

    let store = Arc::new(MemoryDocumentStore::new());
    let http_state = web::Data::new(HttpState::new(HttpStatePorts {
        identity: Arc::new(InMemoryIdentityConnector::new(account, consent_url)),
        profiles: store.clone(),
        categories: store.clone(),
        transactions: store,
        clock: Arc::new(mockable::DefaultClock),
    }));

    let config = ServerConfig::new(session, bind_addr);
    info!(bind_addr = %config.bind_addr(), "starting server");
    let health_state = web::Data::new(HealthState::new());
    create_server(health_state, config, http_state)?.await
}
