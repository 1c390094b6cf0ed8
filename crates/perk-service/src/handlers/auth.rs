//! Authentication handler.

use std::sync::Arc;

use axum::extract::State;
use axum::Json;
use serde::{Deserialize, Serialize};

use crate::error::ApiError;
use crate::state::AppState;

/// Authentication request.
#[derive(Debug, Deserialize)]
pub struct AuthRequest {
    /// Employee display name.
    pub username: String,
    /// Plaintext password.
    pub password: String,
}

/// Authentication response.
#[derive(Debug, Serialize)]
pub struct AuthResponse {
    /// Bearer token for the `/api` routes.
    pub token: String,
}

/// Authenticate an employee, provisioning the account on first use.
pub async fn authenticate(
    State(state): State<Arc<AppState>>,
    Json(body): Json<AuthRequest>,
) -> Result<Json<AuthResponse>, ApiError> {
    if body.username.is_empty() || body.password.is_empty() {
        return Err(ApiError::BadRequest(
            "username and password are required".into(),
        ));
    }

    let employee = state
        .provisioning
        .authenticate(&body.username, &body.password)
        .await?;

    let token = state.tokens.issue(&employee)?;

    tracing::debug!(employee_id = %employee.id, "Session token issued");

    Ok(Json(AuthResponse { token }))
}
