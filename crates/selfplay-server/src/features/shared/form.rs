//! Urlencoded form extractor that tolerates bodiless requests
//!
//! Old workers post `/next_game` with no body and no `Content-Type`. Such a
//! request deserializes to `T::default()`. A body sent without a
//! `Content-Type` is still parsed as a urlencoded form; a declared
//! `Content-Type` goes through axum's [`Form`] unchanged.

use crate::api::response::ErrorResponse;
use axum::{
    async_trait,
    body::Bytes,
    extract::{FromRequest, Request},
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    Form,
};
use serde::de::DeserializeOwned;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LenientForm<T>(pub T);

#[async_trait]
impl<T, S> FromRequest<S> for LenientForm<T>
where
    T: DeserializeOwned + Default,
    S: Send + Sync,
{
    type Rejection = Response;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        if req.headers().contains_key(header::CONTENT_TYPE) {
            return Form::<T>::from_request(req, state)
                .await
                .map(|Form(value)| LenientForm(value))
                .map_err(IntoResponse::into_response);
        }

        let body = Bytes::from_request(req, state)
            .await
            .map_err(IntoResponse::into_response)?;

        if body.iter().all(u8::is_ascii_whitespace) {
            return Ok(LenientForm(T::default()));
        }

        serde_urlencoded::from_bytes(&body).map(LenientForm).map_err(|e| {
            ErrorResponse::new("VALIDATION_ERROR", format!("Malformed form body: {}", e))
                .into_response_with(StatusCode::BAD_REQUEST)
        })
    }
}
