//! API handlers module

pub mod accounts;
pub mod health;
pub mod papers;

use axum::extract::FromRequest;
use papersmith_common::errors::AppError;

/// JSON body extractor whose rejections use the API error format
#[derive(FromRequest)]
#[from_request(via(axum::Json), rejection(AppError))]
pub struct ApiJson<T>(pub T);
