// Copyright (c) 2025-2026 Adrian Robinson. Licensed under the AGPL-3.0.
// See LICENSE file in the project root for full license text.

//! Delete every confession from the configured store.
//!
//! ```bash
//! CONFESSIONS_STORE_URL=sqlite:confessions.db cargo run --bin clear-confessions
//! ```

use std::process::ExitCode;

use confession_board::{ConfessionStore, StoreProvider};
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

const STORE_URL_VAR: &str = "CONFESSIONS_STORE_URL";

#[tokio::main]
async fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_target(false)
        .compact()
        .init();

    let url = match std::env::var(STORE_URL_VAR) {
        Ok(url) if !url.trim().is_empty() => url,
        _ => {
            error!("{STORE_URL_VAR} environment variable is not defined");
            return ExitCode::FAILURE;
        }
    };

    info!("Starting confession cleanup");
    let provider = StoreProvider::new(Some(url));
    let store = match provider.connect().await {
        Ok(store) => store,
        Err(e) => {
            error!(error = %e, "Failed to connect to confession store");
            return ExitCode::FAILURE;
        }
    };

    match wipe(store.as_ref()).await {
        Ok(deleted) => {
            info!(deleted, "Cleanup complete");
            ExitCode::SUCCESS
        }
        Err(e) => {
            error!(error = %e, "Cleanup failed");
            ExitCode::FAILURE
        }
    }
}

async fn wipe(store: &dyn ConfessionStore) -> Result<u64, confession_board::StorageError> {
    let before = store.count().await?;
    info!(found = before, "Deleting confessions");
    Ok(store.delete_all().await?.deleted)
}
