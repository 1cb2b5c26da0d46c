use std::sync::Arc;

use axum::body::Bytes;
use axum::extract::State;
use axum::http::HeaderMap;
use axum::response::IntoResponse;
use axum::response::Response;
use memorial_core::MakeAdminRequest;

use crate::FunctionsState;
use crate::callable::CallableError;
use crate::callable::authenticate;
use crate::callable::parse_data;
use crate::callable::result;

/// `makeAdmin`: promote the account owning `data.email` to administrator.
pub(crate) async fn handler(
    State(state): State<Arc<FunctionsState>>,
    headers: HeaderMap,
    body: Bytes,
) -> Response {
    let caller = match authenticate(&headers, &state.keys) {
        Ok(caller) => caller,
        Err(err) => return err.into_response(),
    };
    let request: MakeAdminRequest = parse_data(&body);

    match state.grant.make_admin(&caller, request).await {
        Ok(response) => result(response),
        Err(err) => CallableError::from(err).into_response(),
    }
}
