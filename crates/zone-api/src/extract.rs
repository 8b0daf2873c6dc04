//! Body extractor: reads the raw body and decodes it into a [`RequestBody`],
//! turning decode failures into `INVALID_REQUEST` envelopes instead of axum's
//! plain-text rejections. `Content-Type` is not checked.

use crate::error::ApiError;
use axum::body::Bytes;
use axum::extract::{FromRequest, Request};
use zone_types::{FieldError, RequestBody};

pub struct ZoneBody(pub RequestBody);

#[async_trait::async_trait]
impl<S> FromRequest<S> for ZoneBody
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let bytes = Bytes::from_request(req, state)
            .await
            .map_err(|e| ApiError::InvalidRequest(FieldError::Malformed(e.body_text())))?;
        Ok(Self(RequestBody::from_slice(&bytes)?))
    }
}
