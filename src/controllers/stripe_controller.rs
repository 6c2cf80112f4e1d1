use axum::{body::Bytes, extract::Extension, http::HeaderMap};
use chrono::Utc;
use serde_json::{json, Value};
use std::sync::Arc;

use crate::{
    error::ApiError,
    extractors::Json,
    services::payment_service,
    state::AppState,
    stripe::SIGNATURE_HEADER,
};

/// Takes the raw body; the signature covers the exact bytes Stripe sent.
pub async fn webhook(
    Extension(state): Extension<Arc<AppState>>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Json<Value>, ApiError> {
    let signature = headers
        .get(SIGNATURE_HEADER)
        .and_then(|value| value.to_str().ok())
        .ok_or(ApiError::InvalidSignature)?;
    payment_service::handle_webhook(&state, signature, &body, Utc::now().timestamp()).await?;
    Ok(Json(json!({ "received": true })))
}
