//! REST error mapping
//!
//! Converts the domain error taxonomy into HTTP responses. Rate limits get
//! the `Retry-After` header plus the violation body the clients key off.

use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;
use types::errors::ExchangeError;

#[derive(Debug)]
pub struct ApiError(pub ExchangeError);

impl From<ExchangeError> for ApiError {
    fn from(error: ExchangeError) -> Self {
        Self(error)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let error = self.0;
        if let ExchangeError::RateLimited {
            retry_after,
            violation_count,
        } = &error
        {
            let body = Json(json!({
                "error": error.kind(),
                "retry_after": retry_after,
                "violation_count": violation_count,
            }));
            let mut response = (StatusCode::TOO_MANY_REQUESTS, body).into_response();
            if let Some(secs) = retry_after {
                if let Ok(value) = secs.to_string().parse() {
                    response.headers_mut().insert(header::RETRY_AFTER, value);
                }
            }
            return response;
        }

        let status = match &error {
            ExchangeError::UnknownSymbol(_)
            | ExchangeError::InvalidOrder(_)
            | ExchangeError::FokUnfillable
            | ExchangeError::Malformed(_)
            | ExchangeError::UnknownMessageType(_) => StatusCode::BAD_REQUEST,
            ExchangeError::InsufficientBalance { .. } => StatusCode::PAYMENT_REQUIRED,
            ExchangeError::NotFound => StatusCode::NOT_FOUND,
            ExchangeError::Forbidden => StatusCode::FORBIDDEN,
            ExchangeError::RateLimited { .. } => StatusCode::TOO_MANY_REQUESTS,
            ExchangeError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };
        let body = Json(json!({
            "error": error.kind(),
            "message": error.to_string(),
        }));
        (status, body).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_mapping() {
        let cases = [
            (ExchangeError::UnknownSymbol("X/Y".into()), StatusCode::BAD_REQUEST),
            (
                ExchangeError::InsufficientBalance {
                    asset: "USD".into(),
                    required: "1".into(),
                    available: "0".into(),
                },
                StatusCode::PAYMENT_REQUIRED,
            ),
            (ExchangeError::NotFound, StatusCode::NOT_FOUND),
            (ExchangeError::Forbidden, StatusCode::FORBIDDEN),
            (ExchangeError::Internal("boom".into()), StatusCode::INTERNAL_SERVER_ERROR),
        ];
        for (error, expected) in cases {
            let response = ApiError(error).into_response();
            assert_eq!(response.status(), expected);
        }
    }

    #[test]
    fn rate_limit_carries_retry_after_header() {
        let response = ApiError(ExchangeError::RateLimited {
            retry_after: Some(10),
            violation_count: 1,
        })
        .into_response();
        assert_eq!(response.status(), StatusCode::TOO_MANY_REQUESTS);
        assert_eq!(response.headers()[header::RETRY_AFTER], "10");
    }

    #[test]
    fn permanent_ban_omits_retry_after_header() {
        let response = ApiError(ExchangeError::RateLimited {
            retry_after: None,
            violation_count: 3,
        })
        .into_response();
        assert_eq!(response.status(), StatusCode::TOO_MANY_REQUESTS);
        assert!(response.headers().get(header::RETRY_AFTER).is_none());
    }
}
