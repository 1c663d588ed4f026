//! Extractors whose rejections use the [`AppError`] JSON envelope.
//!
//! Drop-in replacements for axum's `Json`, `Path` and `Query` in handler
//! arguments. A malformed body, path segment or query string becomes
//! `400 BAD_REQUEST` with `{ "error", "code" }` instead of axum's plain-text
//! rejection.

use axum::extract::{FromRequest, FromRequestParts};

use crate::error::AppError;

#[derive(Debug, FromRequest)]
#[from_request(via(axum::Json), rejection(AppError))]
pub struct JsonBody<T>(pub T);

#[derive(Debug, FromRequestParts)]
#[from_request(via(axum::extract::Path), rejection(AppError))]
pub struct PathParams<T>(pub T);

#[derive(Debug, FromRequestParts)]
#[from_request(via(axum::extract::Query), rejection(AppError))]
pub struct QueryParams<T>(pub T);
