use mongodb::bson::DateTime;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// `Cod` products add their shipping charge per unit at checkout.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum ShippingType {
    #[default]
    Free,
    Cod,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Product {
    #[serde(rename = "_id")]
    pub id: String,
    pub name: String,
    pub description: String,
    pub price: f64,
    pub category: String,
    pub count_in_stock: i64,
    pub image: String,
    #[serde(default)]
    pub additional_images: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub youtube_link: Option<String>,
    #[serde(default)]
    pub shipping_type: ShippingType,
    #[serde(default)]
    pub shipping_charge: f64,
    pub created_at: DateTime,
    pub updated_at: DateTime,
}
