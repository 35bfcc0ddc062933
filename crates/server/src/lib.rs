use axum::{
    Json,
    extract::rejection::{JsonRejection, QueryRejection},
    http::StatusCode,
    response::IntoResponse,
};
use engine::EngineError;

use serde::Serialize;
pub use server::{ServerState, router, run, run_with_listener, spawn_with_listener};

mod accounts;
mod deals;
mod debts;
mod persons;
mod server;
mod transfers;

pub mod types {
    pub mod account {
        pub use api_types::account::{AccountNew, AccountView};
    }

    pub mod person {
        pub use api_types::person::{
            DebtEntry, PersonNew, PersonUpdate, PersonView, PersonWithDebts, PersonsResponse,
        };
    }

    pub mod transfer {
        pub use api_types::transfer::{TransferNew, TransferView, TransfersResponse};
    }

    pub mod deal {
        pub use api_types::deal::{DealNew, DealView, DealsResponse};
    }

    pub mod debt {
        pub use api_types::debt::{
            BalanceView, BalancesResponse, DebtsResponse, OptimizedDebtView,
            OptimizedDebtsResponse, RawDebtView, SourceKind,
        };
    }
}

#[derive(Debug)]
pub enum ServerError {
    Engine(EngineError),
    Generic(String),
}

#[derive(Serialize)]
struct Error {
    error: String,
}

fn status_for_engine_error(err: &EngineError) -> StatusCode {
    match err {
        EngineError::KeyNotFound(_) => StatusCode::NOT_FOUND,
        EngineError::StoreUnavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
        EngineError::InvalidAmount(_) | EngineError::SelfDebt(_) | EngineError::InvalidName(_) => {
            StatusCode::UNPROCESSABLE_ENTITY
        }
    }
}

fn message_for_engine_error(err: EngineError) -> String {
    match err {
        EngineError::StoreUnavailable(reason) => {
            tracing::error!("store unavailable: {reason}");
            "service unavailable".to_string()
        }
        other => other.to_string(),
    }
}

impl IntoResponse for ServerError {
    fn into_response(self) -> axum::response::Response {
        let (status, error) = match self {
            ServerError::Engine(err) => (status_for_engine_error(&err), message_for_engine_error(err)),
            ServerError::Generic(err) => (StatusCode::BAD_REQUEST, err),
        };

        (status, Json(Error { error })).into_response()
    }
}

impl From<EngineError> for ServerError {
    fn from(value: EngineError) -> Self {
        Self::Engine(value)
    }
}

impl From<JsonRejection> for ServerError {
    fn from(value: JsonRejection) -> Self {
        Self::Generic(value.body_text())
    }
}

impl From<QueryRejection> for ServerError {
    fn from(value: QueryRejection) -> Self {
        Self::Generic(value.body_text())
    }
}
