// src/error.rs
use std::convert::Infallible;
use std::fmt;

use log::error;
use serde_json::json;
use warp::http::StatusCode;
use warp::reject::Reject;
use warp::{Rejection, Reply};

#[derive(Debug)]
pub enum ApiError {
    /// Missing asset id, or a symbol absent from a provider's result set.
    NotFound(String),
    /// The upstream price provider answered with a non-success status or
    /// could not be reached within the request timeout.
    UpstreamUnavailable(String),
    /// A configured bond mock price that does not parse as a float.
    InvalidConfig(String),
    /// A request payload that violates the data-model invariants.
    InvalidRequest(String),
    Database(String),
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::UpstreamUnavailable(_) => StatusCode::BAD_GATEWAY,
            ApiError::InvalidConfig(_) => StatusCode::BAD_REQUEST,
            ApiError::InvalidRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::Database(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl fmt::Display for ApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ApiError::NotFound(msg)
            | ApiError::UpstreamUnavailable(msg)
            | ApiError::InvalidConfig(msg)
            | ApiError::InvalidRequest(msg)
            | ApiError::Database(msg) => write!(f, "{}", msg),
        }
    }
}

impl std::error::Error for ApiError {}

impl Reject for ApiError {}

/// Maps rejections onto the error taxonomy: every failure leaves the
/// service as a JSON body with a matching status code.
pub async fn handle_rejection(err: Rejection) -> Result<impl Reply, Infallible> {
    let (status, message) = if err.is_not_found() {
        (StatusCode::NOT_FOUND, "Not found".to_string())
    } else if let Some(api_err) = err.find::<ApiError>() {
        (api_err.status(), api_err.to_string())
    } else if let Some(body_err) = err.find::<warp::filters::body::BodyDeserializeError>() {
        (StatusCode::BAD_REQUEST, body_err.to_string())
    } else if err.find::<warp::reject::MethodNotAllowed>().is_some() {
        (StatusCode::METHOD_NOT_ALLOWED, "Method not allowed".to_string())
    } else {
        error!("Unhandled rejection: {:?}", err);
        (
            StatusCode::INTERNAL_SERVER_ERROR,
            "Internal server error".to_string(),
        )
    };

    let body = warp::reply::json(&json!({ "error": message }));
    Ok(warp::reply::with_status(body, status))
}
