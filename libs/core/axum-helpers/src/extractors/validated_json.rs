//! JSON extractor that runs `validator` rules after deserializing.

use crate::errors::AppError;
use axum::{
    extract::{FromRequest, Json, Request},
    response::{IntoResponse, Response},
};
use serde::de::DeserializeOwned;
use validator::Validate;

/// `Json<T>` plus `T::validate()`.
///
/// Rejections use the standard error body: the JSON rejection's own status
/// (400/415/422) for unreadable bodies, 400 with per-field details when
/// validation fails.
///
/// ```ignore
/// async fn create(ValidatedJson(input): ValidatedJson<CreateProduct>) -> StatusCode {
///     StatusCode::CREATED
/// }
/// ```
pub struct ValidatedJson<T>(pub T);

impl<T, S> FromRequest<S> for ValidatedJson<T>
where
    T: DeserializeOwned + Validate,
    S: Send + Sync,
{
    type Rejection = Response;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let Json(data) = Json::<T>::from_request(req, state)
            .await
            .map_err(|rejection| AppError::from(rejection).into_response())?;

        data.validate()
            .map_err(|errors| AppError::from(errors).into_response())?;

        Ok(ValidatedJson(data))
    }
}
