use axum::{
    body::Bytes,
    extract::State,
    http::{HeaderName, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use tracing::{error, info, warn};
use uuid::Uuid;

use crate::api::{state::AppState, types::ErrorResponse};
use crate::domain::WebhookPayload;
use crate::error::PyramidError;

const REQUEST_ID_HEADER: &str = "x-request-id";

/// HTTP status for a pipeline failure
pub fn status_for(err: &PyramidError) -> StatusCode {
    match err {
        PyramidError::Validation(_) => StatusCode::BAD_REQUEST,
        PyramidError::Http(_) => StatusCode::BAD_GATEWAY,
        _ => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

pub fn error_response(err: &PyramidError) -> Response {
    (
        status_for(err),
        Json(ErrorResponse {
            error: err.kind().to_string(),
            message: err.to_string(),
        }),
    )
        .into_response()
}

fn tag_request_id(mut response: Response, request_id: Uuid) -> Response {
    if let Ok(value) = HeaderValue::from_str(&request_id.to_string()) {
        response
            .headers_mut()
            .insert(HeaderName::from_static(REQUEST_ID_HEADER), value);
    }
    response
}

/// POST /webhook
///
/// The body is parsed here rather than by the `Json` extractor so that
/// alert senders that omit the JSON content type are still accepted. On
/// success the broker's status and body are returned as-is.
pub async fn webhook_handler(State(state): State<AppState>, body: Bytes) -> Response {
    let request_id = Uuid::new_v4();

    let payload: WebhookPayload = match serde_json::from_slice(&body) {
        Ok(p) => p,
        Err(e) => {
            let err = PyramidError::Validation(format!("webhook body is not valid JSON: {}", e));
            warn!(request_id = %request_id, error = %err, "webhook rejected");
            return tag_request_id(error_response(&err), request_id);
        }
    };

    let response = match state.processor.handle_payload(&payload).await {
        Ok(outcome) => {
            info!(
                request_id = %request_id,
                symbol = %outcome.order.symbol,
                side = %outcome.order.side,
                qty = outcome.order.qty,
                streak = outcome.state.streak_count,
                broker_status = outcome.response.status,
                "webhook processed"
            );
            let status =
                StatusCode::from_u16(outcome.response.status).unwrap_or(StatusCode::BAD_GATEWAY);
            (status, Json(outcome.response.body)).into_response()
        }
        Err(e) if e.is_client_error() => {
            warn!(request_id = %request_id, error = %e, "webhook rejected");
            error_response(&e)
        }
        Err(e) => {
            error!(request_id = %request_id, error = %e, "webhook failed");
            error_response(&e)
        }
    };

    tag_request_id(response, request_id)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_mapping() {
        assert_eq!(
            status_for(&PyramidError::Validation("x".into())),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            status_for(&PyramidError::Persistence("x".into())),
            StatusCode::INTERNAL_SERVER_ERROR
        );
        assert_eq!(
            status_for(&PyramidError::Auth("x".into())),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }
}
