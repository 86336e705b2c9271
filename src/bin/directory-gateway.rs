//! # Directory Gateway
//!
//! Serves the user directory API over HTTP.
//!
//! ## Usage
//!
//! ```bash
//! FIREBASE_SERVICE_ACCOUNT="$(cat service-account.json)" directory-gateway
//! ```
//!
//! Against local emulators:
//!
//! ```bash
//! FIREBASE_PROJECT_ID=demo-local \
//! FIREBASE_AUTH_EMULATOR_HOST=127.0.0.1:9099 \
//! FIREBASE_DATABASE_EMULATOR_HOST=127.0.0.1:9000 \
//! directory-gateway
//! ```
//!
//! With no external services at all:
//!
//! ```bash
//! DIRECTORY_BACKEND=memory directory-gateway
//! ```
//!
//! Log verbosity follows `RUST_LOG` and defaults to `info`.

use directory_gateway::config::{Backend, FirebaseSettings, GatewayConfig};
use directory_gateway::credentials::TokenSource;
use directory_gateway::providers::{
    FirebaseAuthProvider, IdentityProvider, InMemoryIdentityProvider,
};
use directory_gateway::store::{InMemoryTreeStore, RealtimeDatabaseStore, TreeStore};
use directory_gateway::{DirectoryGateway, server};
use log::info;
use std::sync::Arc;
use tokio::net::TcpListener;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let config = GatewayConfig::from_env()?;
    info!("Starting directory gateway with {} backend", config.backend);

    match config.backend {
        Backend::Memory => {
            let gateway =
                DirectoryGateway::new(InMemoryIdentityProvider::new(), InMemoryTreeStore::new());
            run(&config, gateway).await
        }
        Backend::Firebase => {
            let (provider, store) = firebase_clients(&config.firebase()?)?;
            run(&config, DirectoryGateway::new(provider, store)).await
        }
    }
}

fn firebase_clients(
    settings: &FirebaseSettings,
) -> Result<(FirebaseAuthProvider, RealtimeDatabaseStore), Box<dyn std::error::Error>> {
    let tokens = match &settings.service_account {
        Some(account) => TokenSource::from_service_account(account.clone())?,
        None => TokenSource::emulator(),
    };

    let provider = match &settings.auth_emulator_host {
        Some(host) => {
            info!("Using Auth emulator at {}", host);
            FirebaseAuthProvider::emulator(host, &settings.project_id)?
        }
        None => FirebaseAuthProvider::new(&settings.project_id, tokens.clone())?,
    };

    let store = match &settings.database_emulator_host {
        Some(host) => {
            info!("Using Database emulator at {}", host);
            RealtimeDatabaseStore::emulator(host, &settings.database_url)?
        }
        None => RealtimeDatabaseStore::new(&settings.database_url, tokens)?,
    };

    Ok((provider, store))
}

async fn run<P, S>(
    config: &GatewayConfig,
    gateway: DirectoryGateway<P, S>,
) -> Result<(), Box<dyn std::error::Error>>
where
    P: IdentityProvider + 'static,
    S: TreeStore + 'static,
{
    let listener = TcpListener::bind(config.bind_address()).await?;
    server::serve(listener, Arc::new(gateway), server::shutdown_signal()).await?;
    Ok(())
}
