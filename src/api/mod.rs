//! REST API module.
//!
//! Contains all API routes and handlers. Successful responses are the bare JSON payload,
//! failures are rendered by [`AppError`](crate::errors::AppError).

mod ai;
mod dashboard;
mod events;
mod impact;
mod tasks;
mod volunteers;

pub use ai::*;
pub use dashboard::*;
pub use events::*;
pub use impact::*;
pub use tasks::*;
pub use volunteers::*;

use axum::extract::{FromRequest, FromRequestParts, Query};
use axum::Json;

use crate::errors::AppError;

/// Response type that can be either success or error.
pub type ApiResult<T> = Result<Json<T>, AppError>;

/// JSON body extractor whose rejections render as `{ "error", "code" }`.
#[derive(Debug, FromRequest)]
#[from_request(via(Json), rejection(AppError))]
pub struct ApiJson<T>(pub T);

/// Query string extractor whose rejections render as `{ "error", "code" }`.
#[derive(Debug, FromRequestParts)]
#[from_request(via(Query), rejection(AppError))]
pub struct ApiQuery<T>(pub T);
