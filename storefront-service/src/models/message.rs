use mongodb::bson::DateTime;
use serde::{Deserialize, Serialize};

/// A contact-form submission.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Message {
    #[serde(rename = "_id")]
    pub id: String,
    pub name: String,
    pub email: String,
    pub message: String,
    pub created_at: DateTime,
}

impl Message {
    pub fn new(name: String, email: String, message: String) -> Self {
        Self {
            id: super::new_id(),
            name,
            email,
            message,
            created_at: DateTime::now(),
        }
    }
}
