//! Point transfer handler.

use std::sync::Arc;

use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;
use serde::Deserialize;

use crate::auth::AuthEmployee;
use crate::error::ApiError;
use crate::state::AppState;

/// Transfer request.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SendCoinRequest {
    /// Recipient's username.
    pub to_user: String,
    /// Amount of points to send. Must be positive.
    pub amount: i64,
}

/// Transfer points from the authenticated employee to another employee.
pub async fn send_coin(
    State(state): State<Arc<AppState>>,
    auth: AuthEmployee,
    Json(body): Json<SendCoinRequest>,
) -> Result<StatusCode, ApiError> {
    state
        .transfers
        .transfer(auth.employee_id, &body.to_user, body.amount)
        .await?;

    Ok(StatusCode::OK)
}
