//! Persistence seams. Handlers and services only see these traits; MongoDB
//! backs them in production and [`MemoryStore`] in tests and local runs.

mod memory;
mod mongo;

pub use memory::MemoryStore;
pub use mongo::MongoDb;

use async_trait::async_trait;
use service_core::error::AppError;
use std::sync::Arc;

use crate::models::{
    AuthProvider, BlogPost, CartItem, Category, Message, Order, OrderStatus, PaymentResult,
    Product, User,
};

/// Result of the conditional `unpaid -> paid` update.
#[derive(Debug, Clone)]
pub enum PaidTransition {
    /// This call flipped the flag.
    Applied(Order),
    /// Someone else got there first; the order is returned as stored.
    AlreadyPaid(Order),
    NotFound,
}

#[async_trait]
pub trait UserStore: Send + Sync {
    /// Fails with `Conflict` when the email is taken.
    async fn insert(&self, user: &User) -> Result<(), AppError>;
    async fn find_by_id(&self, id: &str) -> Result<Option<User>, AppError>;
    async fn find_by_email(&self, email: &str) -> Result<Option<User>, AppError>;
    async fn find_by_oauth(
        &self,
        provider: AuthProvider,
        oauth_id: &str,
    ) -> Result<Option<User>, AppError>;
    async fn link_oauth(
        &self,
        id: &str,
        provider: AuthProvider,
        oauth_id: &str,
    ) -> Result<(), AppError>;
    /// Newest first.
    async fn list(&self) -> Result<Vec<User>, AppError>;
    async fn set_admin(&self, id: &str, is_admin: bool) -> Result<Option<User>, AppError>;
    async fn delete(&self, id: &str) -> Result<bool, AppError>;
    async fn save_cart(&self, id: &str, cart: &[CartItem]) -> Result<(), AppError>;
}

#[async_trait]
pub trait ProductStore: Send + Sync {
    /// Newest first.
    async fn list(&self) -> Result<Vec<Product>, AppError>;
    async fn find_by_id(&self, id: &str) -> Result<Option<Product>, AppError>;
    async fn find_by_ids(&self, ids: &[String]) -> Result<Vec<Product>, AppError>;
    async fn insert(&self, product: &Product) -> Result<(), AppError>;
    /// Replaces the stored record; false when it does not exist.
    async fn update(&self, product: &Product) -> Result<bool, AppError>;
    async fn delete(&self, id: &str) -> Result<bool, AppError>;
    /// Decrements stock, flooring at zero.
    async fn decrement_stock(&self, id: &str, qty: u32) -> Result<(), AppError>;
}

#[async_trait]
pub trait CategoryStore: Send + Sync {
    async fn list(&self) -> Result<Vec<Category>, AppError>;
    async fn find_by_id(&self, id: &str) -> Result<Option<Category>, AppError>;
    async fn find_by_slug(&self, slug: &str) -> Result<Option<Category>, AppError>;
    async fn insert(&self, category: &Category) -> Result<(), AppError>;
}

#[async_trait]
pub trait OrderStore: Send + Sync {
    async fn insert(&self, order: &Order) -> Result<(), AppError>;
    async fn find_by_id(&self, id: &str) -> Result<Option<Order>, AppError>;
    async fn find_by_provider_order_id(
        &self,
        provider_order_id: &str,
    ) -> Result<Option<Order>, AppError>;
    /// Newest first.
    async fn list_for_user(&self, user_id: &str) -> Result<Vec<Order>, AppError>;
    /// Newest first, with the total count.
    async fn list_page(&self, skip: u64, limit: i64) -> Result<(Vec<Order>, u64), AppError>;
    /// Records the provider intent created for an unpaid order.
    async fn attach_payment_intent(&self, id: &str, result: &PaymentResult)
        -> Result<(), AppError>;
    /// Atomically sets the paid fields only if the order is still unpaid.
    async fn mark_paid(&self, id: &str, result: &PaymentResult)
        -> Result<PaidTransition, AppError>;
    /// Sets `Payment_Failed` only if the order is still unpaid.
    async fn mark_payment_failed(&self, id: &str) -> Result<bool, AppError>;
    async fn update_status(&self, id: &str, status: OrderStatus)
        -> Result<Option<Order>, AppError>;
    /// True for exactly one caller per paid order.
    async fn claim_stock_update(&self, id: &str) -> Result<bool, AppError>;
    async fn delete(&self, id: &str) -> Result<bool, AppError>;
}

#[async_trait]
pub trait MessageStore: Send + Sync {
    async fn insert(&self, message: &Message) -> Result<(), AppError>;
    /// Newest first.
    async fn list(&self) -> Result<Vec<Message>, AppError>;
    async fn count(&self) -> Result<u64, AppError>;
    async fn delete(&self, id: &str) -> Result<bool, AppError>;
}

#[async_trait]
pub trait BlogStore: Send + Sync {
    /// Most recently published first.
    async fn list(&self) -> Result<Vec<BlogPost>, AppError>;
    async fn find_by_slug(&self, slug: &str) -> Result<Option<BlogPost>, AppError>;
    async fn insert(&self, post: &BlogPost) -> Result<(), AppError>;
}

/// Handles to every collection.
#[derive(Clone)]
pub struct Store {
    pub users: Arc<dyn UserStore>,
    pub products: Arc<dyn ProductStore>,
    pub categories: Arc<dyn CategoryStore>,
    pub orders: Arc<dyn OrderStore>,
    pub messages: Arc<dyn MessageStore>,
    pub posts: Arc<dyn BlogStore>,
}

impl Store {
    pub fn mongo(db: MongoDb) -> Self {
        let db = Arc::new(db);
        Self {
            users: db.clone(),
            products: db.clone(),
            categories: db.clone(),
            orders: db.clone(),
            messages: db.clone(),
            posts: db,
        }
    }

    pub fn in_memory() -> Self {
        let store = Arc::new(MemoryStore::default());
        Self {
            users: store.clone(),
            products: store.clone(),
            categories: store.clone(),
            orders: store.clone(),
            messages: store.clone(),
            posts: store,
        }
    }
}
