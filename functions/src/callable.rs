//! Callable envelope: requests arrive as `{"data": ...}`, successes leave as
//! `{"result": ...}` and failures as `{"error": {"status", "message"}}`.

use axum::Json;
use axum::http::HeaderMap;
use axum::http::StatusCode;
use axum::http::header::AUTHORIZATION;
use axum::response::IntoResponse;
use axum::response::Response;
use memorial_core::DecodedToken;
use memorial_core::ErrorKind;
use memorial_core::GrantError;
use memorial_core::TokenKeys;
use serde::Deserialize;
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::json;
use tracing::debug;

#[derive(Debug, Deserialize)]
struct CallableRequest<T> {
    #[serde(default = "Option::default")]
    data: Option<T>,
}

/// Extracts `data` from a callable body. A body that is empty, not JSON, or
/// missing `data` yields `T::default()` so the operation still performs its
/// own checks in order.
pub fn parse_data<T>(body: &[u8]) -> T
where
    T: DeserializeOwned + Default,
{
    serde_json::from_slice::<CallableRequest<T>>(body)
        .ok()
        .and_then(|request| request.data)
        .unwrap_or_default()
}

pub fn result<T: Serialize>(result: T) -> Response {
    (StatusCode::OK, Json(json!({ "result": result }))).into_response()
}

#[derive(Debug)]
pub struct CallableError {
    http_status: StatusCode,
    status: &'static str,
    message: String,
}

impl CallableError {
    pub fn unauthenticated(message: impl Into<String>) -> Self {
        Self {
            http_status: StatusCode::UNAUTHORIZED,
            status: "UNAUTHENTICATED",
            message: message.into(),
        }
    }
}

impl From<GrantError> for CallableError {
    fn from(err: GrantError) -> Self {
        let kind = err.kind();
        let http_status = match kind {
            ErrorKind::PermissionDenied => StatusCode::FORBIDDEN,
            ErrorKind::InvalidArgument => StatusCode::BAD_REQUEST,
            ErrorKind::NotFound => StatusCode::NOT_FOUND,
            ErrorKind::Internal => StatusCode::INTERNAL_SERVER_ERROR,
        };
        Self {
            http_status,
            status: kind.status(),
            message: err.to_string(),
        }
    }
}

impl IntoResponse for CallableError {
    fn into_response(self) -> Response {
        let body = json!({
            "error": {
                "status": self.status,
                "message": self.message,
            }
        });
        (self.http_status, Json(body)).into_response()
    }
}

/// Verifies the bearer token on a callable request.
pub fn authenticate(headers: &HeaderMap, keys: &TokenKeys) -> Result<DecodedToken, CallableError> {
    let token = headers
        .get(AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.strip_prefix("Bearer "))
        .map(str::trim)
        .filter(|token| !token.is_empty())
        .ok_or_else(|| CallableError::unauthenticated("The function must be called while authenticated."))?;

    keys.verify(token).map_err(|err| {
        debug!("rejected bearer token: {err}");
        CallableError::unauthenticated("The function must be called while authenticated.")
    })
}
