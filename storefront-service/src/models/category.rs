use mongodb::bson::DateTime;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Category {
    #[serde(rename = "_id")]
    pub id: String,
    pub name: String,
    pub slug: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub created_at: DateTime,
}

impl Category {
    pub fn new(name: String, image: Option<String>, description: Option<String>) -> Self {
        let slug = crate::utils::slugify(&name);
        Self {
            id: super::new_id(),
            name,
            slug,
            image,
            description,
            created_at: DateTime::now(),
        }
    }
}
