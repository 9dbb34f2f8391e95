use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::models::CartItem;

#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct MergeCartRequest {
    #[serde(default)]
    pub cart_items: Vec<CartItem>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct CartResponse {
    #[schema(example = "Cart merged")]
    pub message: String,
    pub cart: Vec<CartItem>,
}
