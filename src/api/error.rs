//! HTTP mapping of core and authentication errors.
//!
//! | kind                              | status |
//! |-----------------------------------|--------|
//! | missing / invalid token           | 401    |
//! | not the owner, not a party, role  | 403    |
//! | product / order absent            | 404    |
//! | not found or not yours (orders)   | 404    |
//! | validation, stock, seller, status | 400    |
//! | store failure                     | 500    |

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;

use crate::identity::AuthError;
use crate::MarketError;

#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error(transparent)]
    Market(#[from] MarketError),

    #[error(transparent)]
    Auth(#[from] AuthError),

    #[error("Access denied. Farmer role required.")]
    FarmerRequired,

    #[error("{0}")]
    BadRequest(String),
}

#[derive(Debug, Serialize)]
struct ErrorBody {
    message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
}

impl ApiError {
    fn status(&self) -> StatusCode {
        match self {
            Self::Auth(_) => StatusCode::UNAUTHORIZED,
            Self::FarmerRequired => StatusCode::FORBIDDEN,
            Self::BadRequest(_) => StatusCode::BAD_REQUEST,
            Self::Market(e) => match e {
                MarketError::ProductNotFound(_) | MarketError::OrderNotFound | MarketError::NotFoundOrUnauthorized => {
                    StatusCode::NOT_FOUND
                }
                MarketError::Unauthorized(_) => StatusCode::FORBIDDEN,
                MarketError::MultiSellerOrder
                | MarketError::InsufficientStock { .. }
                | MarketError::Validation(_)
                | MarketError::InvalidTransition(_) => StatusCode::BAD_REQUEST,
                MarketError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
            },
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let body = match &self {
            Self::Market(MarketError::Internal(detail)) => {
                tracing::error!(error = %detail, "internal error");
                ErrorBody { message: "Internal server error".to_string(), error: Some(detail.clone()) }
            }
            other => ErrorBody { message: other.to_string(), error: None },
        };
        (status, Json(body)).into_response()
    }
}

pub type ApiResult<T> = std::result::Result<T, ApiError>;

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    #[test]
    fn test_status_mapping() {
        let cases = [
            (ApiError::from(MarketError::ProductNotFound(Uuid::nil())), StatusCode::NOT_FOUND),
            (MarketError::NotFoundOrUnauthorized.into(), StatusCode::NOT_FOUND),
            (MarketError::Unauthorized("no".into()).into(), StatusCode::FORBIDDEN),
            (MarketError::MultiSellerOrder.into(), StatusCode::BAD_REQUEST),
            (MarketError::InvalidTransition("no".into()).into(), StatusCode::BAD_REQUEST),
            (MarketError::Internal("db down".into()).into(), StatusCode::INTERNAL_SERVER_ERROR),
            (AuthError::MissingToken.into(), StatusCode::UNAUTHORIZED),
            (ApiError::FarmerRequired, StatusCode::FORBIDDEN),
        ];
        for (err, status) in cases {
            assert_eq!(err.into_response().status(), status);
        }
    }
}
