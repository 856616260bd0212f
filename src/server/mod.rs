use std::io;
use std::sync::Arc;

use thiserror::Error;
use tokio::net::TcpListener;
use tracing::info;

use crate::config::ServerConfig;
use crate::data::store::{RecordStore, StoreError};

pub mod api;
pub mod error;
pub mod routes;

/// Shared state handed to every handler.
#[derive(Debug, Clone)]
pub struct AppState {
    pub store: Arc<RecordStore>,
}

impl AppState {
    pub fn new(store: RecordStore) -> Self {
        Self {
            store: Arc::new(store),
        }
    }
}

#[derive(Debug, Error)]
pub enum ServeError {
    #[error(transparent)]
    Store(#[from] StoreError),
    #[error("failed to bind {addr}: {source}")]
    Bind { addr: String, source: io::Error },
    #[error("server error: {0}")]
    Io(#[from] io::Error),
}

pub async fn run_server(config: ServerConfig) -> Result<(), ServeError> {
    let store = RecordStore::open(&config.data_dir)?;
    let app = routes::router(AppState::new(store), &config);

    let addr = config.bind_addr();
    let listener = TcpListener::bind(&addr)
        .await
        .map_err(|source| ServeError::Bind {
            addr: addr.clone(),
            source,
        })?;
    info!(
        data_dir = %config.data_dir.display(),
        "statdash API listening on http://{addr}"
    );

    axum::serve(listener, app).await?;
    Ok(())
}
