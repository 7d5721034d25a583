use anyhow::Result;
use axum::{
    routing::{get, put},
    Router,
};
use std::{net::SocketAddr, sync::Arc};
use tower::ServiceBuilder;
use tower_http::trace::{DefaultMakeSpan, DefaultOnRequest, DefaultOnResponse, TraceLayer};
use tracing::{info, Level};

use crate::{
    actions::EventActions,
    config::ServerConfig,
    routes,
    sled_store::SledEventStore,
    state::ServerState,
    store::{EventStore, MemoryEventStore},
};

pub struct Server {
    bind_address: SocketAddr,
    state: ServerState,
}

impl Server {
    pub fn builder() -> ServerBuilder { ServerBuilder::default() }

    /// A server for `config`: sled-backed when a data directory is set, in-memory otherwise.
    pub fn from_config(config: &ServerConfig) -> Result<Self> {
        let builder = Self::builder().bind_address(config.bind_addr);
        let builder = match &config.data_dir {
            Some(dir) => {
                info!("storing events under {}", dir.display());
                builder.with_store(SledEventStore::open(dir)?)
            }
            None => {
                info!("storing events in memory");
                builder.with_store(MemoryEventStore::new())
            }
        };
        builder.build()
    }

    pub fn router(&self) -> Router { router(self.state.clone()) }

    pub async fn run(self) -> Result<()> {
        let app = self.router();

        let listener = tokio::net::TcpListener::bind(&self.bind_address).await?;
        info!("listening on {}", listener.local_addr()?);

        axum::serve(listener, app).await?;

        Ok(())
    }
}

/// The JSON surface over the event actions, with request tracing.
pub fn router(state: ServerState) -> Router {
    Router::new()
        .route("/health", get(routes::health))
        .route("/events", get(routes::list_events).post(routes::create_event))
        .route("/events/{id}", put(routes::edit_event).delete(routes::delete_event))
        .with_state(state)
        .layer(
            ServiceBuilder::new()
                .layer(
                    TraceLayer::new_for_http()
                        .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
                        .on_request(DefaultOnRequest::new().level(Level::INFO))
                        .on_response(DefaultOnResponse::new().level(Level::INFO)),
                )
                .into_inner(),
        )
}

#[derive(Default)]
pub struct ServerBuilder {
    bind_address: Option<SocketAddr>,
    store: Option<Arc<dyn EventStore>>,
}

impl ServerBuilder {
    pub fn bind_address(mut self, addr: SocketAddr) -> Self {
        self.bind_address = Some(addr);
        self
    }

    pub fn with_store(mut self, store: impl EventStore + 'static) -> Self {
        self.store = Some(Arc::new(store));
        self
    }

    pub fn build(self) -> Result<Server> {
        let bind_address = self.bind_address.ok_or_else(|| anyhow::anyhow!("bind_address is required"))?;

        let store = self.store.ok_or_else(|| anyhow::anyhow!("store is required"))?;

        let state = ServerState::new(EventActions::new(store));

        Ok(Server { bind_address, state })
    }
}
