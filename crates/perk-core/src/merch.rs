//! Catalog item type.

use serde::{Deserialize, Serialize};

use crate::MerchId;

/// A purchasable catalog item.
///
/// Catalog rows are immutable reference data: prices never change while the
/// service is running, so a price read before a purchase transaction opens
/// does not need re-validation after the account row is locked.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Merch {
    /// The catalog item id.
    pub id: MerchId,

    /// Unique item name, e.g. `"t-shirt"`.
    pub name: String,

    /// Price in points. Always positive.
    pub price: i64,
}
