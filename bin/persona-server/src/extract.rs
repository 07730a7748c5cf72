//! JSON body extractor whose rejections render as `ServerError`.

use axum::extract::FromRequest;

use crate::error::ServerError;

/// Like [`axum::Json`], but malformed bodies become a 422 `{"detail"}`.
#[derive(Debug, FromRequest)]
#[from_request(via(axum::Json), rejection(ServerError))]
pub struct ApiJson<T>(pub T);
