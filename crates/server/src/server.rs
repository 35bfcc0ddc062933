use axum::{
    Router,
    routing::{delete, get, post},
};

use std::sync::Arc;

use crate::{accounts, deals, debts, persons, transfers};
use engine::Engine;

#[derive(Clone)]
pub struct ServerState {
    pub engine: Arc<Engine>,
}

async fn greeting() -> &'static str {
    "Hello, this is buycycle!"
}

pub fn router(state: ServerState) -> Router {
    Router::new()
        .route("/", get(greeting))
        .route("/api/addPerson", post(persons::person_new))
        .route("/api/updatePerson", post(persons::person_update))
        .route("/api/getPersons", get(persons::persons_get))
        .route("/api/addAccount", post(accounts::account_new))
        .route("/api/updateAccount", post(accounts::account_update))
        .route("/api/getAccount", get(accounts::account_get))
        .route("/api/addTransfer", post(transfers::transfer_new))
        .route("/api/updateTransfer", post(transfers::transfer_update))
        .route("/api/deleteTransfer", delete(transfers::transfer_delete))
        .route("/api/getTransfers", get(transfers::transfers_get))
        .route("/api/addDeal", post(deals::deal_new))
        .route("/api/updateDeal", post(deals::deal_update))
        .route("/api/deleteDeal", delete(deals::deal_delete))
        .route("/api/getDeals", get(deals::deals_get))
        .route("/api/getDebts", get(debts::debts_get))
        .route("/api/getOptimizedDebts", get(debts::optimized_debts_get))
        .route("/api/getBalances", get(debts::balances_get))
        .with_state(state)
}

pub async fn run(engine: Engine, addr: &str) {
    let listener = match tokio::net::TcpListener::bind(addr).await {
        Ok(listener) => listener,
        Err(err) => {
            tracing::error!("failed to bind server listener on {addr}: {err}");
            return;
        }
    };
    if let Err(err) = run_with_listener(engine, listener).await {
        tracing::error!("server failed: {err}");
    }
}

pub async fn run_with_listener(
    engine: Engine,
    listener: tokio::net::TcpListener,
) -> Result<(), std::io::Error> {
    let addr = listener.local_addr()?;
    tracing::info!("Server listening on {}", addr);

    let state = ServerState {
        engine: Arc::new(engine),
    };

    axum::serve(listener, router(state)).await
}

pub fn spawn_with_listener(
    engine: Engine,
    listener: tokio::net::TcpListener,
) -> Result<std::net::SocketAddr, std::io::Error> {
    let addr = listener.local_addr()?;

    tokio::spawn(async move {
        if let Err(err) = run_with_listener(engine, listener).await {
            tracing::error!("server failed: {err}");
        }
    });

    Ok(addr)
}
