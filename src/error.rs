// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 YieldWay Labs

//! API error type and domain-error mapping.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;

use crate::blockchain::ChainError;
use crate::custody::CustodyError;
use crate::orchestrator::OrchestratorError;
use crate::providers::SettlementError;
use crate::storage::StorageError;

#[derive(Debug)]
pub struct ApiError {
    pub status: StatusCode,
    pub message: String,
}

#[derive(Serialize)]
struct ErrorBody {
    error: String,
}

impl ApiError {
    pub fn new(status: StatusCode, message: impl Into<String>) -> Self {
        Self {
            status,
            message: message.into(),
        }
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new(StatusCode::NOT_FOUND, message)
    }

    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, message)
    }

    pub fn conflict(message: impl Into<String>) -> Self {
        Self::new(StatusCode::CONFLICT, message)
    }

    pub fn unprocessable(message: impl Into<String>) -> Self {
        Self::new(StatusCode::UNPROCESSABLE_ENTITY, message)
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self::new(StatusCode::INTERNAL_SERVER_ERROR, message)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        if self.status.is_server_error() {
            tracing::error!(status = %self.status, message = %self.message, "request failed");
        }
        let body = Json(ErrorBody {
            error: self.message,
        });
        (self.status, body).into_response()
    }
}

impl From<StorageError> for ApiError {
    fn from(e: StorageError) -> Self {
        match &e {
            StorageError::NotFound(_) => Self::not_found(e.to_string()),
            StorageError::AlreadyExists(_) | StorageError::Conflict(_) => {
                Self::conflict(e.to_string())
            }
            StorageError::Io(_) | StorageError::Json(_) => Self::internal(e.to_string()),
        }
    }
}

impl From<ChainError> for ApiError {
    fn from(e: ChainError) -> Self {
        match &e {
            ChainError::InvalidAddress(_)
            | ChainError::InvalidKey(_)
            | ChainError::InvalidAmount(_) => Self::bad_request(e.to_string()),
            ChainError::Rpc(_) | ChainError::Reverted(_) => {
                Self::new(StatusCode::BAD_GATEWAY, e.to_string())
            }
            // Neither success nor failure: the transaction may still land.
            ChainError::Unconfirmed { .. } => {
                Self::new(StatusCode::GATEWAY_TIMEOUT, e.to_string())
            }
        }
    }
}

impl From<CustodyError> for ApiError {
    fn from(e: CustodyError) -> Self {
        match e {
            CustodyError::Storage(inner) => inner.into(),
            CustodyError::MissingWallet(_) => Self::not_found(e.to_string()),
            CustodyError::Cipher(_) | CustodyError::CorruptKey(_) => {
                Self::internal(e.to_string())
            }
        }
    }
}

impl From<SettlementError> for ApiError {
    fn from(e: SettlementError) -> Self {
        match e {
            SettlementError::UnsupportedCorridor { .. } => Self::unprocessable(e.to_string()),
        }
    }
}

impl From<OrchestratorError> for ApiError {
    fn from(e: OrchestratorError) -> Self {
        match e {
            OrchestratorError::Chain(inner) => inner.into(),
            OrchestratorError::Storage(inner) => inner.into(),
            OrchestratorError::Custody(inner) => inner.into(),
            OrchestratorError::Settlement(inner) => inner.into(),
            OrchestratorError::NotFound(_) => Self::not_found(e.to_string()),
            OrchestratorError::InsufficientFunds { .. } => Self::unprocessable(e.to_string()),
            OrchestratorError::Invalid(_) => Self::bad_request(e.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::to_bytes;

    #[test]
    fn domain_errors_map_to_expected_statuses() {
        let e: ApiError = StorageError::NotFound("User u1".to_string()).into();
        assert_eq!(e.status, StatusCode::NOT_FOUND);

        let e: ApiError = StorageError::AlreadyExists("Account a1".to_string()).into();
        assert_eq!(e.status, StatusCode::CONFLICT);

        let e: ApiError = OrchestratorError::InsufficientFunds {
            available: 1.0,
            requested: 2.0,
        }
        .into();
        assert_eq!(e.status, StatusCode::UNPROCESSABLE_ENTITY);

        let e: ApiError = ChainError::Unconfirmed {
            tx_hash: "0xabc".to_string(),
            reason: "timeout".to_string(),
        }
        .into();
        assert_eq!(e.status, StatusCode::GATEWAY_TIMEOUT);

        let e: ApiError = ChainError::Reverted("nope".to_string()).into();
        assert_eq!(e.status, StatusCode::BAD_GATEWAY);

        let e: ApiError = SettlementError::UnsupportedCorridor {
            from: "USD".to_string(),
            to: "JPY".to_string(),
        }
        .into();
        assert_eq!(e.status, StatusCode::UNPROCESSABLE_ENTITY);
    }

    #[tokio::test]
    async fn into_response_returns_json_body() {
        let response = ApiError::bad_request("bad data").into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);

        let body_bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let body = String::from_utf8(body_bytes.to_vec()).unwrap();
        assert_eq!(body, r#"{"error":"bad data"}"#);
    }
}
