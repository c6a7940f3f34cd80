use axum::response::{IntoResponse, Response};
use axum_helpers::AppError;
use mongodb::error::{ErrorKind, WriteFailure};
use thiserror::Error;
use validator::ValidationErrors;

/// MongoDB server code for a unique index violation.
const DUPLICATE_KEY_CODE: i32 = 11000;

#[derive(Debug, Error)]
pub enum ProductError {
    #[error("Product not found: {0}")]
    NotFound(String),

    #[error("Product with id '{0}' already exists")]
    DuplicateId(String),

    #[error("Invalid input: {0}")]
    Validation(#[from] ValidationErrors),

    #[error("Database error: {0}")]
    Database(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

pub type ProductResult<T> = Result<T, ProductError>;

/// Convert ProductError to AppError for standardized error responses
impl From<ProductError> for AppError {
    fn from(err: ProductError) -> Self {
        match err {
            ProductError::NotFound(id) => AppError::NotFound(format!("Product {} not found", id)),
            ProductError::DuplicateId(id) => {
                AppError::Conflict(format!("Product with id '{}' already exists", id))
            }
            ProductError::Validation(errors) => AppError::ValidationError(errors),
            ProductError::Database(msg) => AppError::Database(msg),
            ProductError::Internal(msg) => AppError::InternalServerError(msg),
        }
    }
}

impl IntoResponse for ProductError {
    fn into_response(self) -> Response {
        let app_error: AppError = self.into();
        app_error.into_response()
    }
}

impl From<mongodb::error::Error> for ProductError {
    fn from(err: mongodb::error::Error) -> Self {
        ProductError::Database(err.to_string())
    }
}

/// True when `err` is a unique-key violation on write.
pub(crate) fn is_duplicate_key(err: &mongodb::error::Error) -> bool {
    matches!(
        err.kind.as_ref(),
        ErrorKind::Write(WriteFailure::WriteError(e)) if e.code == DUPLICATE_KEY_CODE
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::StatusCode;
    use http_body_util::BodyExt;
    use validator::ValidationError;

    #[test]
    fn test_status_codes() {
        let cases = [
            (ProductError::NotFound("p-1".into()), StatusCode::NOT_FOUND),
            (ProductError::DuplicateId("p-1".into()), StatusCode::CONFLICT),
            (
                ProductError::Validation(ValidationErrors::new()),
                StatusCode::BAD_REQUEST,
            ),
            (
                ProductError::Database("down".into()),
                StatusCode::INTERNAL_SERVER_ERROR,
            ),
            (
                ProductError::Internal("oops".into()),
                StatusCode::INTERNAL_SERVER_ERROR,
            ),
        ];

        for (err, status) in cases {
            assert_eq!(err.into_response().status(), status);
        }
    }

    #[tokio::test]
    async fn test_validation_uses_validation_error_code() {
        let mut errors = ValidationErrors::new();
        errors.add("name", ValidationError::new("length"));

        let response = ProductError::Validation(errors).into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);

        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        let body: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(body["error"], "VALIDATION_ERROR");
        assert!(body["details"]["name"].is_array());
    }

    #[test]
    fn test_driver_errors_are_not_duplicates() {
        let err = mongodb::error::Error::custom("boom");
        assert!(!is_duplicate_key(&err));
        assert!(matches!(ProductError::from(err), ProductError::Database(_)));
    }
}
