//! Loads the catalog fixture and provisions admin accounts.
//!
//! Usage: `seed [path/to/catalog.json]`. Without a path the bundled
//! `fixtures/catalog.json` is used. Existing categories (by slug) and
//! products (by name) are left alone, so the command can be rerun.

use anyhow::Context;
use secrecy::ExposeSecret;
use serde::Deserialize;
use service_core::observability::logging::init_tracing;
use std::collections::HashSet;
use storefront_service::{
    config::{StorageBackend, StorefrontConfig},
    dtos::catalog::{CategoryRequest, ProductRequest},
    models::{Category, User},
    services::{MongoDb, Store},
    utils::{hash_password, slugify, Password},
};
use validator::Validate;

const BUNDLED_CATALOG: &str = include_str!("../../fixtures/catalog.json");

#[derive(Debug, Deserialize)]
struct CatalogFixture {
    #[serde(default)]
    categories: Vec<CategoryRequest>,
    #[serde(default)]
    products: Vec<ProductRequest>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let config = StorefrontConfig::from_env()?;
    init_tracing("storefront-seed", &config.log_level, None);

    let raw = match std::env::args().nth(1) {
        Some(path) => std::fs::read_to_string(&path)
            .with_context(|| format!("failed to read catalog fixture {}", path))?,
        None => BUNDLED_CATALOG.to_string(),
    };
    let fixture: CatalogFixture =
        serde_json::from_str(&raw).context("catalog fixture is not valid JSON")?;

    let store = match config.storage.backend {
        StorageBackend::Mongo => {
            let db = MongoDb::connect(
                config.storage.mongodb.uri.expose_secret(),
                &config.storage.mongodb.database,
            )
            .await?;
            db.initialize_indexes().await?;
            Store::mongo(db)
        }
        StorageBackend::Memory => {
            tracing::warn!("STORAGE_BACKEND=memory: seeded data is discarded on exit");
            Store::in_memory()
        }
    };

    let categories = seed_categories(&store, fixture.categories).await?;
    let products = seed_products(&store, fixture.products).await?;
    let admins = seed_admins(&store).await?;

    tracing::info!(categories, products, admins, "Seeding complete");
    Ok(())
}

async fn seed_categories(store: &Store, requests: Vec<CategoryRequest>) -> anyhow::Result<usize> {
    let mut created = 0;
    for req in requests {
        let name = req.name.trim().to_string();
        if name.is_empty() {
            tracing::warn!("Skipping category without a name");
            continue;
        }
        if store.categories.find_by_slug(&slugify(&name)).await?.is_some() {
            tracing::debug!(category = %name, "Category exists, skipping");
            continue;
        }

        store
            .categories
            .insert(&Category::new(name.clone(), req.image, req.description))
            .await?;
        tracing::info!(category = %name, "Category created");
        created += 1;
    }
    Ok(created)
}

async fn seed_products(store: &Store, requests: Vec<ProductRequest>) -> anyhow::Result<usize> {
    let mut existing: HashSet<String> = store
        .products
        .list()
        .await?
        .into_iter()
        .map(|p| p.name)
        .collect();

    let mut created = 0;
    for req in requests {
        if let Err(e) = req.validate() {
            tracing::warn!(product = %req.name, error = %e, "Skipping invalid product");
            continue;
        }
        if existing.contains(req.name.trim()) {
            tracing::debug!(product = %req.name, "Product exists, skipping");
            continue;
        }

        let product = req.into_product();
        store.products.insert(&product).await?;
        tracing::info!(product_id = %product.id, product = %product.name, "Product created");
        existing.insert(product.name);
        created += 1;
    }
    Ok(created)
}

/// Promotes every address in `SEED_ADMIN_EMAILS`, creating the account
/// with `SEED_ADMIN_PASSWORD` when it does not exist yet.
async fn seed_admins(store: &Store) -> anyhow::Result<usize> {
    let emails: Vec<String> = std::env::var("SEED_ADMIN_EMAILS")
        .unwrap_or_default()
        .split(',')
        .map(|e| e.trim().to_lowercase())
        .filter(|e| !e.is_empty())
        .collect();

    if emails.is_empty() {
        tracing::info!("SEED_ADMIN_EMAILS not set, no admins provisioned");
        return Ok(0);
    }

    let password = std::env::var("SEED_ADMIN_PASSWORD").ok();

    let mut promoted = 0;
    for email in emails {
        if let Some(user) = store.users.find_by_email(&email).await? {
            store.users.set_admin(&user.id, true).await?;
            tracing::info!(user_id = %user.id, "Existing user promoted to admin");
            promoted += 1;
            continue;
        }

        let Some(password) = password.as_deref().filter(|p| p.len() >= 6) else {
            anyhow::bail!(
                "SEED_ADMIN_PASSWORD (at least 6 characters) is required to create {}",
                email
            );
        };

        let hash = hash_password(&Password::new(password))?;
        let name = email.split('@').next().unwrap_or("admin").to_string();
        let mut user = User::new_local(name, email, hash.into_string());
        user.set_admin(true);
        store.users.insert(&user).await?;
        tracing::info!(user_id = %user.id, "Admin account created");
        promoted += 1;
    }
    Ok(promoted)
}
