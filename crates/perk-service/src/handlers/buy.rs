//! Merch purchase handler.

use std::sync::Arc;

use axum::extract::{Path, State};
use axum::http::StatusCode;

use crate::auth::AuthEmployee;
use crate::error::ApiError;
use crate::state::AppState;

/// Purchase one unit of the named catalog item.
pub async fn buy_merch(
    State(state): State<Arc<AppState>>,
    auth: AuthEmployee,
    Path(item): Path<String>,
) -> Result<StatusCode, ApiError> {
    state.purchases.purchase(auth.employee_id, &item).await?;

    Ok(StatusCode::OK)
}
