use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use validator::Validate;

use super::to_utc;
use crate::models::{BlogPost, Category, Product, ShippingType};

#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ProductRequest {
    #[validate(length(min = 1, message = "Name is required"))]
    pub name: String,
    #[validate(length(min = 1, message = "Description is required"))]
    pub description: String,
    #[validate(range(min = 0.0, max = 10_000_000.0, message = "Invalid price"))]
    pub price: f64,
    #[validate(length(min = 1, message = "Category is required"))]
    pub category: String,
    #[validate(range(min = 0, message = "Invalid stock quantity"))]
    pub count_in_stock: i64,
    #[serde(default)]
    #[schema(example = "https://cdn.example.com/p/1.jpg")]
    pub image: String,
    #[serde(default)]
    pub additional_images: Vec<String>,
    pub youtube_link: Option<String>,
    #[serde(default)]
    pub shipping_type: ShippingType,
    #[serde(default)]
    #[validate(range(min = 0.0, max = 10_000_000.0, message = "Invalid shipping charge"))]
    pub shipping_charge: f64,
}

/// Partial update; absent fields keep their stored value.
#[derive(Debug, Default, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ProductUpdateRequest {
    #[validate(length(min = 1, message = "Name is required"))]
    pub name: Option<String>,
    #[validate(length(min = 1, message = "Description is required"))]
    pub description: Option<String>,
    #[validate(range(min = 0.0, max = 10_000_000.0, message = "Invalid price"))]
    pub price: Option<f64>,
    #[validate(length(min = 1, message = "Category is required"))]
    pub category: Option<String>,
    #[validate(range(min = 0, message = "Invalid stock quantity"))]
    pub count_in_stock: Option<i64>,
    pub image: Option<String>,
    pub additional_images: Option<Vec<String>>,
    pub youtube_link: Option<String>,
    pub shipping_type: Option<ShippingType>,
    #[validate(range(min = 0.0, max = 10_000_000.0, message = "Invalid shipping charge"))]
    pub shipping_charge: Option<f64>,
}

impl ProductRequest {
    pub fn into_product(self) -> Product {
        let now = mongodb::bson::DateTime::now();
        Product {
            id: crate::models::new_id(),
            name: self.name.trim().to_string(),
            description: self.description,
            price: self.price,
            category: self.category,
            count_in_stock: self.count_in_stock,
            image: self.image,
            additional_images: self.additional_images,
            youtube_link: self.youtube_link.filter(|l| !l.trim().is_empty()),
            shipping_type: self.shipping_type,
            shipping_charge: self.shipping_charge,
            created_at: now,
            updated_at: now,
        }
    }
}

impl ProductUpdateRequest {
    pub fn apply(self, product: &mut Product) {
        if let Some(name) = self.name {
            product.name = name.trim().to_string();
        }
        if let Some(description) = self.description {
            product.description = description;
        }
        if let Some(price) = self.price {
            product.price = price;
        }
        if let Some(category) = self.category {
            product.category = category;
        }
        if let Some(count) = self.count_in_stock {
            product.count_in_stock = count;
        }
        if let Some(image) = self.image {
            product.image = image;
        }
        if let Some(images) = self.additional_images {
            product.additional_images = images;
        }
        if let Some(link) = self.youtube_link {
            product.youtube_link = Some(link).filter(|l| !l.trim().is_empty());
        }
        if let Some(shipping_type) = self.shipping_type {
            product.shipping_type = shipping_type;
        }
        if let Some(charge) = self.shipping_charge {
            product.shipping_charge = charge;
        }
        product.updated_at = mongodb::bson::DateTime::now();
    }
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ProductResponse {
    #[serde(rename = "_id")]
    pub id: String,
    pub name: String,
    pub description: String,
    pub price: f64,
    pub category: String,
    pub count_in_stock: i64,
    pub image: String,
    pub additional_images: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub youtube_link: Option<String>,
    pub shipping_type: ShippingType,
    pub shipping_charge: f64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<Product> for ProductResponse {
    fn from(p: Product) -> Self {
        Self {
            id: p.id,
            name: p.name,
            description: p.description,
            price: p.price,
            category: p.category,
            count_in_stock: p.count_in_stock,
            image: p.image,
            additional_images: p.additional_images,
            youtube_link: p.youtube_link,
            shipping_type: p.shipping_type,
            shipping_charge: p.shipping_charge,
            created_at: to_utc(p.created_at),
            updated_at: to_utc(p.updated_at),
        }
    }
}

/// Name presence is checked by the handler so that it answers 400.
#[derive(Debug, Deserialize, ToSchema)]
pub struct CategoryRequest {
    #[serde(default)]
    pub name: String,
    pub image: Option<String>,
    pub description: Option<String>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CategoryResponse {
    #[serde(rename = "_id")]
    pub id: String,
    pub name: String,
    pub slug: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl From<Category> for CategoryResponse {
    fn from(c: Category) -> Self {
        Self {
            id: c.id,
            name: c.name,
            slug: c.slug,
            image: c.image,
            description: c.description,
            created_at: to_utc(c.created_at),
        }
    }
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct BlogPostResponse {
    #[serde(rename = "_id")]
    pub id: String,
    pub title: String,
    pub slug: String,
    pub excerpt: String,
    pub content: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cover_image: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub author: Option<String>,
    pub published_at: DateTime<Utc>,
}

impl From<BlogPost> for BlogPostResponse {
    fn from(p: BlogPost) -> Self {
        Self {
            id: p.id,
            title: p.title,
            slug: p.slug,
            excerpt: p.excerpt,
            content: p.content,
            cover_image: p.cover_image,
            author: p.author,
            published_at: to_utc(p.published_at),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request() -> ProductRequest {
        serde_json::from_value(serde_json::json!({
            "name": "Brass Lamp",
            "description": "Hand cast",
            "price": 1299.0,
            "category": "decor",
            "countInStock": 4
        }))
        .unwrap()
    }

    #[test]
    fn negative_stock_is_rejected() {
        let mut req = request();
        req.count_in_stock = -1;
        let errors = req.validate().unwrap_err();
        assert!(errors.to_string().contains("Invalid stock quantity"));
    }

    #[test]
    fn prices_beyond_the_ceiling_are_rejected() {
        let mut req = request();
        req.price = 1e17;
        assert!(req.validate().unwrap_err().to_string().contains("Invalid price"));

        let update = ProductUpdateRequest {
            shipping_charge: Some(1e12),
            ..Default::default()
        };
        assert!(update
            .validate()
            .unwrap_err()
            .to_string()
            .contains("Invalid shipping charge"));
    }

    #[test]
    fn partial_update_keeps_unspecified_fields() {
        let mut product = request().into_product();
        ProductUpdateRequest {
            price: Some(999.0),
            ..Default::default()
        }
        .apply(&mut product);

        assert_eq!(product.price, 999.0);
        assert_eq!(product.name, "Brass Lamp");
        assert_eq!(product.count_in_stock, 4);
        assert_eq!(product.shipping_type, ShippingType::Free);
    }
}
