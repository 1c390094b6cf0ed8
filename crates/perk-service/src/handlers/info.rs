//! Account info handler.

use std::sync::Arc;

use axum::extract::State;
use axum::Json;
use serde::Serialize;

use perk_core::Profile;

use crate::auth::AuthEmployee;
use crate::error::ApiError;
use crate::state::AppState;

/// Account info response.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct InfoResponse {
    /// Current point balance.
    pub coins: i64,
    /// Owned merch.
    pub inventory: Vec<InventoryItem>,
    /// Transfer history split by direction.
    pub coin_history: CoinHistory,
}

/// One owned merch position.
#[derive(Debug, Serialize)]
pub struct InventoryItem {
    /// The merch name.
    #[serde(rename = "type")]
    pub merch_type: String,
    /// Owned quantity.
    pub quantity: i64,
}

/// Transfer history partitioned by direction.
#[derive(Debug, Serialize)]
pub struct CoinHistory {
    /// Transfers where this account received points.
    pub received: Vec<ReceivedTransfer>,
    /// Transfers where this account sent points.
    pub sent: Vec<SentTransfer>,
}

/// One received transfer.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReceivedTransfer {
    /// The sender's username.
    pub from_user: String,
    /// Amount received.
    pub amount: i64,
}

/// One sent transfer.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SentTransfer {
    /// The recipient's username.
    pub to_user: String,
    /// Amount sent.
    pub amount: i64,
}

impl From<Profile> for InfoResponse {
    fn from(profile: Profile) -> Self {
        Self {
            coins: profile.balance,
            inventory: profile
                .holdings
                .into_iter()
                .map(|h| InventoryItem {
                    merch_type: h.merch_name,
                    quantity: h.quantity,
                })
                .collect(),
            coin_history: CoinHistory {
                received: profile
                    .received
                    .into_iter()
                    .map(|t| ReceivedTransfer {
                        from_user: t.counterparty_username,
                        amount: t.amount,
                    })
                    .collect(),
                sent: profile
                    .sent
                    .into_iter()
                    .map(|t| SentTransfer {
                        to_user: t.counterparty_username,
                        amount: t.amount,
                    })
                    .collect(),
            },
        }
    }
}

/// Return balance, inventory and transfer history for the authenticated
/// employee.
pub async fn get_info(
    State(state): State<Arc<AppState>>,
    auth: AuthEmployee,
) -> Result<Json<InfoResponse>, ApiError> {
    let profile = state.profiles.collect(auth.employee_id).await?;

    Ok(Json(InfoResponse::from(profile)))
}
