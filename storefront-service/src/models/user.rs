use mongodb::bson::DateTime;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use validator::Validate;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum AuthProvider {
    Local,
    Google,
    Facebook,
}

impl AuthProvider {
    pub fn as_str(&self) -> &'static str {
        match self {
            AuthProvider::Local => "local",
            AuthProvider::Google => "google",
            AuthProvider::Facebook => "facebook",
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Customer,
    Admin,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Address {
    #[validate(length(min = 1, message = "Full name is required"))]
    pub full_name: String,
    #[validate(length(min = 1, message = "Address is required"))]
    pub address: String,
    #[validate(length(min = 1, message = "City is required"))]
    pub city: String,
    #[validate(length(min = 1, message = "Postal code is required"))]
    pub postal_code: String,
    #[validate(length(min = 1, message = "Country is required"))]
    pub country: String,
    #[validate(length(min = 1, message = "Phone is required"))]
    pub phone: String,
}

/// One line of a saved cart. Display fields are a client-side snapshot and
/// never feed pricing.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CartItem {
    pub product: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub price: Option<f64>,
    #[serde(default = "default_qty")]
    pub qty: u32,
}

fn default_qty() -> u32 {
    1
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    #[serde(rename = "_id")]
    pub id: String,
    pub name: String,
    pub email: String,
    /// Absent for accounts created through a social login.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub password_hash: Option<String>,
    pub provider: AuthProvider,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub oauth_id: Option<String>,
    #[serde(default)]
    pub is_admin: bool,
    pub role: Role,
    #[serde(default)]
    pub addresses: Vec<Address>,
    #[serde(default)]
    pub cart: Vec<CartItem>,
    pub created_at: DateTime,
    pub updated_at: DateTime,
}

impl User {
    pub fn new_local(name: String, email: String, password_hash: String) -> Self {
        let now = DateTime::now();
        Self {
            id: super::new_id(),
            name,
            email: email.to_lowercase(),
            password_hash: Some(password_hash),
            provider: AuthProvider::Local,
            oauth_id: None,
            is_admin: false,
            role: Role::Customer,
            addresses: Vec::new(),
            cart: Vec::new(),
            created_at: now,
            updated_at: now,
        }
    }

    pub fn new_oauth(provider: AuthProvider, oauth_id: String, name: String, email: String) -> Self {
        let now = DateTime::now();
        Self {
            id: super::new_id(),
            name,
            email: email.to_lowercase(),
            password_hash: None,
            provider,
            oauth_id: Some(oauth_id),
            is_admin: false,
            role: Role::Customer,
            addresses: Vec::new(),
            cart: Vec::new(),
            created_at: now,
            updated_at: now,
        }
    }

    /// The role always follows the admin flag.
    pub fn set_admin(&mut self, is_admin: bool) {
        self.is_admin = is_admin;
        self.role = if is_admin { Role::Admin } else { Role::Customer };
        self.updated_at = DateTime::now();
    }
}
