/// Extractors whose rejections render as the JSON error envelope
///
/// Axum's own `Json`, `Path` and `Query` reject with plain-text bodies.
/// These wrappers route the rejection through [`ApiError`] instead, so a
/// malformed body or a bad UUID in the path gets the same envelope as every
/// other error.

use crate::error::ApiError;
use axum::extract::{FromRequest, FromRequestParts};

/// JSON body extractor
#[derive(Debug, FromRequest)]
#[from_request(via(axum::Json), rejection(ApiError))]
pub struct AppJson<T>(pub T);

/// Path parameter extractor
#[derive(Debug, FromRequestParts)]
#[from_request(via(axum::extract::Path), rejection(ApiError))]
pub struct AppPath<T>(pub T);

/// Query string extractor
#[derive(Debug, FromRequestParts)]
#[from_request(via(axum::extract::Query), rejection(ApiError))]
pub struct AppQuery<T>(pub T);
