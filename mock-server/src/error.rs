use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};

use crate::envelope::ErrorResponse;

/// Failures raised by the in-memory store.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum StoreError {
    #[error("no such index [{0}]")]
    IndexNotFound(String),

    #[error("failed to parse query [{0}]")]
    InvalidQuery(String),
}

/// Everything a handler can fail with, rendered as a store error envelope.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error(transparent)]
    Store(#[from] StoreError),

    /// The request body is not a JSON object.
    #[error("failed to parse document: {0}")]
    MapperParsing(String),

    /// A bulk body line is malformed or incomplete.
    #[error("{0}")]
    InvalidBulk(String),
}

impl ApiError {
    fn status(&self) -> StatusCode {
        match self {
            ApiError::Store(StoreError::IndexNotFound(_)) => StatusCode::NOT_FOUND,
            _ => StatusCode::BAD_REQUEST,
        }
    }

    fn kind(&self) -> &'static str {
        match self {
            ApiError::Store(StoreError::IndexNotFound(_)) => "index_not_found_exception",
            ApiError::Store(StoreError::InvalidQuery(_)) => "query_parsing_exception",
            ApiError::MapperParsing(_) => "mapper_parsing_exception",
            ApiError::InvalidBulk(_) => "action_request_validation_exception",
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        tracing::debug!(status = status.as_u16(), error = %self, "request failed");
        let body = ErrorResponse::new(self.kind(), self.to_string(), status.as_u16());
        (status, Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn index_not_found_maps_to_404() {
        let err = ApiError::from(StoreError::IndexNotFound("test".into()));
        assert_eq!(err.status(), StatusCode::NOT_FOUND);
        assert_eq!(err.kind(), "index_not_found_exception");
        assert_eq!(err.to_string(), "no such index [test]");
    }

    #[test]
    fn bad_input_maps_to_400() {
        assert_eq!(ApiError::MapperParsing("x".into()).status(), StatusCode::BAD_REQUEST);
        assert_eq!(ApiError::from(StoreError::InvalidQuery("x".into())).kind(), "query_parsing_exception");
    }
}
