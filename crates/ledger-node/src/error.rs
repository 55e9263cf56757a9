use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use ledger_core::LedgerError;
use serde_json::json;

#[derive(Debug)]
pub enum ApiError {
    Ledger(LedgerError),
    BadRequest(String),
    NotFound(String),
    Internal(String),
}

impl From<LedgerError> for ApiError {
    fn from(err: LedgerError) -> Self {
        ApiError::Ledger(err)
    }
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::Ledger(LedgerError::InvalidSignature(_))
            | ApiError::Ledger(LedgerError::InvalidAddress(_))
            | ApiError::Ledger(LedgerError::InvalidConfiguration(_))
            | ApiError::Ledger(LedgerError::InvalidKey(_)) => StatusCode::BAD_REQUEST,
            ApiError::Ledger(LedgerError::InsufficientBalance { .. }) => {
                StatusCode::PAYMENT_REQUIRED
            }
            ApiError::Ledger(LedgerError::BlockInvalid { .. })
            | ApiError::Ledger(LedgerError::StorageFailure(_)) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn message(&self) -> String {
        match self {
            ApiError::Ledger(err) => err.to_string(),
            ApiError::BadRequest(msg) | ApiError::NotFound(msg) | ApiError::Internal(msg) => {
                msg.clone()
            }
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            tracing::error!(error = %self.message(), "request failed");
        }
        (status, Json(json!({ "error": self.message() }))).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ledger_errors_map_to_status_codes() {
        let cases = [
            (
                ApiError::from(LedgerError::InvalidSignature("ab".into())),
                StatusCode::BAD_REQUEST,
            ),
            (
                ApiError::from(LedgerError::InvalidAddress("x".into())),
                StatusCode::BAD_REQUEST,
            ),
            (
                ApiError::from(LedgerError::InsufficientBalance {
                    address: "a".into(),
                    balance: 0,
                    required: 1,
                }),
                StatusCode::PAYMENT_REQUIRED,
            ),
            (
                ApiError::from(LedgerError::StorageFailure(anyhow::anyhow!("disk"))),
                StatusCode::INTERNAL_SERVER_ERROR,
            ),
            (
                ApiError::from(LedgerError::InvalidKey("short".into())),
                StatusCode::BAD_REQUEST,
            ),
            (ApiError::NotFound("block 9".into()), StatusCode::NOT_FOUND),
        ];
        for (err, status) in cases {
            assert_eq!(err.status(), status);
        }
    }
}
