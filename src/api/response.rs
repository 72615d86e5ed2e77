//! JSend envelopes for every API response.
//!
//! Successes carry `data`. Client errors (4xx) are `fail` with `data.message`;
//! server errors (5xx) are `error` with a top-level `message`.

use axum::extract::rejection::JsonRejection;
use axum::extract::{FromRequest, FromRequestParts, Request};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::de::DeserializeOwned;
use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum JSendStatus {
    Error,
    Fail,
    Success,
}

#[derive(Debug, Serialize)]
pub struct JSend<T: Serialize> {
    pub data: T,
    pub status: JSendStatus,
}

impl<T: Serialize> JSend<T> {
    pub fn success(data: T) -> Json<JSend<T>> {
        Json(JSend {
            data,
            status: JSendStatus::Success,
        })
    }
}

/// A page of a user's videos.
#[derive(Debug, Serialize)]
pub struct Page<T: Serialize> {
    pub items: Vec<T>,
    pub pagination: Pagination,
}

#[derive(Debug, Serialize)]
pub struct Pagination {
    pub limit: u32,
    pub offset: u32,
    pub total: u64,
}

impl<T: Serialize> JSend<Page<T>> {
    pub fn page(items: Vec<T>, pagination: Pagination) -> Json<JSend<Page<T>>> {
        JSend::success(Page { items, pagination })
    }
}

#[derive(Debug, Serialize)]
struct FailBody {
    data: FailData,
    status: JSendStatus,
}

#[derive(Debug, Serialize)]
struct FailData {
    message: String,
}

#[derive(Debug, Serialize)]
struct ErrorBody {
    message: String,
    status: JSendStatus,
}

// ============================================================================
// Handler errors
// ============================================================================

/// A handler failure. The status code picks the envelope: 5xx renders as a
/// JSend `error`, everything else as a `fail`.
#[derive(Debug)]
pub struct ApiError {
    status: StatusCode,
    message: String,
}

impl ApiError {
    fn new(status: StatusCode, message: impl Into<String>) -> Self {
        Self {
            status,
            message: message.into(),
        }
    }

    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, message)
    }

    pub fn unauthorized(message: impl Into<String>) -> Self {
        Self::new(StatusCode::UNAUTHORIZED, message)
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self::new(StatusCode::INTERNAL_SERVER_ERROR, message)
    }

    /// A 500 whose cause is logged but not returned to the client.
    pub fn internal_cause(message: impl Into<String>, cause: impl std::fmt::Display) -> Self {
        let message = message.into();
        tracing::error!(error = %cause, "{message}");
        Self::internal(message)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        if self.status.is_server_error() {
            let body = ErrorBody {
                message: self.message,
                status: JSendStatus::Error,
            };
            (self.status, Json(body)).into_response()
        } else {
            let body = FailBody {
                data: FailData {
                    message: self.message,
                },
                status: JSendStatus::Fail,
            };
            (self.status, Json(body)).into_response()
        }
    }
}

// ============================================================================
// Extractors that reject with JSend failures
// ============================================================================

/// `axum::Json` with JSend rejections.
pub struct AppJson<T>(pub T);

#[axum::async_trait]
impl<S, T> FromRequest<S> for AppJson<T>
where
    axum::Json<T>: FromRequest<S, Rejection = JsonRejection>,
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request(req: Request, state: &S) -> Result<Self, ApiError> {
        let rejection = match axum::Json::<T>::from_request(req, state).await {
            Ok(Json(value)) => return Ok(AppJson(value)),
            Err(rejection) => rejection,
        };

        // Every body problem is a 400, whatever axum's own status would be
        let message = match rejection {
            JsonRejection::JsonDataError(err) => {
                format!("Invalid request body: {}", err.body_text())
            }
            JsonRejection::JsonSyntaxError(_) => "Malformed JSON in request body".to_string(),
            JsonRejection::MissingJsonContentType(_) => {
                "Expected Content-Type: application/json".to_string()
            }
            _ => "Couldn't read request body".to_string(),
        };
        Err(ApiError::bad_request(message))
    }
}

/// Query string extractor backed by serde_qs, with JSend rejections.
pub struct AppQuery<T>(pub T);

#[axum::async_trait]
impl<S, T> FromRequestParts<S> for AppQuery<T>
where
    T: DeserializeOwned + Send,
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut axum::http::request::Parts,
        _state: &S,
    ) -> Result<Self, ApiError> {
        serde_qs::from_str(parts.uri.query().unwrap_or_default())
            .map(AppQuery)
            .map_err(|e| ApiError::bad_request(query_error_message(&e.to_string())))
    }
}

/// Replace Rust type names in serde errors with words a client understands.
fn query_error_message(raw: &str) -> String {
    let readable = raw.replace("u32", "non-negative integer");
    format!("Invalid query parameter: {readable}")
}
