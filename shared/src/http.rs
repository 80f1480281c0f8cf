//! HTTP helpers for the Lambda handler.

use lambda_http::{Body, Request, RequestPayloadExt, Response};
use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::{Error, Result};

/// Error envelope returned by the JSON endpoints.
#[derive(Debug, Serialize)]
pub struct ApiResponse {
    pub success: bool,
    pub error: String,
}

impl ApiResponse {
    pub fn error(message: impl Into<String>) -> Self {
        Self {
            success: false,
            error: message.into(),
        }
    }
}

/// Create a JSON response with the given status code and data.
pub fn json_response<T: Serialize>(status: u16, data: &T) -> Result<Response<Body>> {
    let json = serde_json::to_string(data)?;
    Response::builder()
        .status(status)
        .header("Content-Type", "application/json")
        .body(Body::from(json))
        .map_err(|e| Error::Internal(format!("Failed to build response: {}", e)))
}

/// Create a JSON error response with the given status code and message.
pub fn error_response(status: u16, message: impl Into<String>) -> Result<Response<Body>> {
    json_response(status, &ApiResponse::error(message))
}

/// Create an HTML page response.
pub fn html_response(status: u16, html: String) -> Result<Response<Body>> {
    Response::builder()
        .status(status)
        .header("Content-Type", "text/html; charset=utf-8")
        .body(Body::from(html))
        .map_err(|e| Error::Internal(format!("Failed to build response: {}", e)))
}

/// Redirect the browser after a form post.
pub fn redirect_response(location: &str) -> Result<Response<Body>> {
    Response::builder()
        .status(302)
        .header("Location", location)
        .body(Body::Empty)
        .map_err(|e| Error::Internal(format!("Failed to build response: {}", e)))
}

/// Parse a form (`application/x-www-form-urlencoded`) or JSON request body.
pub fn parse_form<T: DeserializeOwned>(event: &Request) -> Result<T> {
    match event.payload::<T>() {
        Ok(Some(parsed)) => Ok(parsed),
        Ok(None) => Err(Error::Validation(
            "Expected a form-encoded or JSON request body".to_string(),
        )),
        Err(e) => Err(Error::Validation(format!("Invalid request body: {}", e))),
    }
}
