use async_trait::async_trait;
use dashmap::DashMap;
use mongodb::bson::DateTime;
use service_core::error::AppError;

use super::{
    BlogStore, CategoryStore, MessageStore, OrderStore, PaidTransition, ProductStore, UserStore,
};
use crate::models::{
    AuthProvider, BlogPost, CartItem, Category, Message, Order, OrderStatus, PaymentResult,
    Product, User,
};

/// Process-local store with the same conditional-update semantics as the
/// MongoDB implementation. Each `get_mut` holds the shard lock, which makes
/// the check-and-set operations atomic.
#[derive(Default)]
pub struct MemoryStore {
    users: DashMap<String, User>,
    products: DashMap<String, Product>,
    categories: DashMap<String, Category>,
    orders: DashMap<String, Order>,
    messages: DashMap<String, Message>,
    posts: DashMap<String, BlogPost>,
}

fn values<T: Clone>(map: &DashMap<String, T>) -> Vec<T> {
    map.iter().map(|entry| entry.value().clone()).collect()
}

fn sorted_desc<T, K: Ord>(mut items: Vec<T>, key: impl Fn(&T) -> K) -> Vec<T> {
    items.sort_by(|a, b| key(b).cmp(&key(a)));
    items
}

#[async_trait]
impl UserStore for MemoryStore {
    async fn insert(&self, user: &User) -> Result<(), AppError> {
        let email_taken = self
            .users
            .iter()
            .any(|u| u.email.eq_ignore_ascii_case(&user.email));
        if email_taken {
            return Err(AppError::Conflict(anyhow::anyhow!("User already exists")));
        }
        self.users.insert(user.id.clone(), user.clone());
        Ok(())
    }

    async fn find_by_id(&self, id: &str) -> Result<Option<User>, AppError> {
        Ok(self.users.get(id).map(|u| u.clone()))
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<User>, AppError> {
        Ok(self
            .users
            .iter()
            .find(|u| u.email.eq_ignore_ascii_case(email))
            .map(|u| u.value().clone()))
    }

    async fn find_by_oauth(
        &self,
        provider: AuthProvider,
        oauth_id: &str,
    ) -> Result<Option<User>, AppError> {
        Ok(self
            .users
            .iter()
            .find(|u| u.provider == provider && u.oauth_id.as_deref() == Some(oauth_id))
            .map(|u| u.value().clone()))
    }

    async fn link_oauth(
        &self,
        id: &str,
        provider: AuthProvider,
        oauth_id: &str,
    ) -> Result<(), AppError> {
        if let Some(mut user) = self.users.get_mut(id) {
            user.provider = provider;
            user.oauth_id = Some(oauth_id.to_string());
            user.updated_at = DateTime::now();
        }
        Ok(())
    }

    async fn list(&self) -> Result<Vec<User>, AppError> {
        Ok(sorted_desc(values(&self.users), |u| u.created_at))
    }

    async fn set_admin(&self, id: &str, is_admin: bool) -> Result<Option<User>, AppError> {
        Ok(self.users.get_mut(id).map(|mut user| {
            user.set_admin(is_admin);
            user.clone()
        }))
    }

    async fn delete(&self, id: &str) -> Result<bool, AppError> {
        Ok(self.users.remove(id).is_some())
    }

    async fn save_cart(&self, id: &str, cart: &[CartItem]) -> Result<(), AppError> {
        if let Some(mut user) = self.users.get_mut(id) {
            user.cart = cart.to_vec();
            user.updated_at = DateTime::now();
        }
        Ok(())
    }
}

#[async_trait]
impl ProductStore for MemoryStore {
    async fn list(&self) -> Result<Vec<Product>, AppError> {
        Ok(sorted_desc(values(&self.products), |p| p.created_at))
    }

    async fn find_by_id(&self, id: &str) -> Result<Option<Product>, AppError> {
        Ok(self.products.get(id).map(|p| p.clone()))
    }

    async fn find_by_ids(&self, ids: &[String]) -> Result<Vec<Product>, AppError> {
        Ok(ids
            .iter()
            .filter_map(|id| self.products.get(id).map(|p| p.clone()))
            .collect())
    }

    async fn insert(&self, product: &Product) -> Result<(), AppError> {
        self.products.insert(product.id.clone(), product.clone());
        Ok(())
    }

    async fn update(&self, product: &Product) -> Result<bool, AppError> {
        Ok(match self.products.get_mut(&product.id) {
            Some(mut stored) => {
                *stored = product.clone();
                true
            }
            None => false,
        })
    }

    async fn delete(&self, id: &str) -> Result<bool, AppError> {
        Ok(self.products.remove(id).is_some())
    }

    async fn decrement_stock(&self, id: &str, qty: u32) -> Result<(), AppError> {
        if let Some(mut product) = self.products.get_mut(id) {
            product.count_in_stock = (product.count_in_stock - i64::from(qty)).max(0);
            product.updated_at = DateTime::now();
        }
        Ok(())
    }
}

#[async_trait]
impl CategoryStore for MemoryStore {
    async fn list(&self) -> Result<Vec<Category>, AppError> {
        let mut categories = values(&self.categories);
        categories.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(categories)
    }

    async fn find_by_id(&self, id: &str) -> Result<Option<Category>, AppError> {
        Ok(self.categories.get(id).map(|c| c.clone()))
    }

    async fn find_by_slug(&self, slug: &str) -> Result<Option<Category>, AppError> {
        Ok(self
            .categories
            .iter()
            .find(|c| c.slug == slug)
            .map(|c| c.value().clone()))
    }

    async fn insert(&self, category: &Category) -> Result<(), AppError> {
        if self.categories.iter().any(|c| c.slug == category.slug) {
            return Err(AppError::Conflict(anyhow::anyhow!(
                "Category already exists"
            )));
        }
        self.categories
            .insert(category.id.clone(), category.clone());
        Ok(())
    }
}

#[async_trait]
impl OrderStore for MemoryStore {
    async fn insert(&self, order: &Order) -> Result<(), AppError> {
        self.orders.insert(order.id.clone(), order.clone());
        Ok(())
    }

    async fn find_by_id(&self, id: &str) -> Result<Option<Order>, AppError> {
        Ok(self.orders.get(id).map(|o| o.clone()))
    }

    async fn find_by_provider_order_id(
        &self,
        provider_order_id: &str,
    ) -> Result<Option<Order>, AppError> {
        Ok(self
            .orders
            .iter()
            .find(|o| o.provider_order_id() == Some(provider_order_id))
            .map(|o| o.value().clone()))
    }

    async fn list_for_user(&self, user_id: &str) -> Result<Vec<Order>, AppError> {
        let orders = self
            .orders
            .iter()
            .filter(|o| o.user == user_id)
            .map(|o| o.value().clone())
            .collect();
        Ok(sorted_desc(orders, |o: &Order| o.created_at))
    }

    async fn list_page(&self, skip: u64, limit: i64) -> Result<(Vec<Order>, u64), AppError> {
        let all = sorted_desc(values(&self.orders), |o| o.created_at);
        let total = all.len() as u64;
        let page = all
            .into_iter()
            .skip(usize::try_from(skip).unwrap_or(usize::MAX))
            .take(limit.max(0) as usize)
            .collect();
        Ok((page, total))
    }

    async fn attach_payment_intent(
        &self,
        id: &str,
        result: &PaymentResult,
    ) -> Result<(), AppError> {
        if let Some(mut order) = self.orders.get_mut(id) {
            if !order.is_paid {
                order.payment_result = Some(result.clone());
                order.updated_at = DateTime::now();
            }
        }
        Ok(())
    }

    async fn mark_paid(
        &self,
        id: &str,
        result: &PaymentResult,
    ) -> Result<PaidTransition, AppError> {
        let Some(mut order) = self.orders.get_mut(id) else {
            return Ok(PaidTransition::NotFound);
        };

        if order.is_paid {
            return Ok(PaidTransition::AlreadyPaid(order.clone()));
        }

        let now = DateTime::now();
        order.is_paid = true;
        order.paid_at = Some(now);
        order.status = OrderStatus::Paid;
        order.payment_result = Some(result.clone());
        order.updated_at = now;

        Ok(PaidTransition::Applied(order.clone()))
    }

    async fn mark_payment_failed(&self, id: &str) -> Result<bool, AppError> {
        Ok(match self.orders.get_mut(id) {
            Some(mut order) if !order.is_paid => {
                order.status = OrderStatus::PaymentFailed;
                order.updated_at = DateTime::now();
                true
            }
            _ => false,
        })
    }

    async fn update_status(
        &self,
        id: &str,
        status: OrderStatus,
    ) -> Result<Option<Order>, AppError> {
        Ok(self.orders.get_mut(id).map(|mut order| {
            let now = DateTime::now();
            order.status = status;
            order.updated_at = now;
            if status == OrderStatus::Delivered {
                order.is_delivered = true;
                order.delivered_at = Some(now);
            }
            order.clone()
        }))
    }

    async fn claim_stock_update(&self, id: &str) -> Result<bool, AppError> {
        Ok(match self.orders.get_mut(id) {
            Some(mut order) if order.is_paid && !order.stock_updated => {
                order.stock_updated = true;
                true
            }
            _ => false,
        })
    }

    async fn delete(&self, id: &str) -> Result<bool, AppError> {
        Ok(self.orders.remove(id).is_some())
    }
}

#[async_trait]
impl MessageStore for MemoryStore {
    async fn insert(&self, message: &Message) -> Result<(), AppError> {
        self.messages.insert(message.id.clone(), message.clone());
        Ok(())
    }

    async fn list(&self) -> Result<Vec<Message>, AppError> {
        Ok(sorted_desc(values(&self.messages), |m| m.created_at))
    }

    async fn count(&self) -> Result<u64, AppError> {
        Ok(self.messages.len() as u64)
    }

    async fn delete(&self, id: &str) -> Result<bool, AppError> {
        Ok(self.messages.remove(id).is_some())
    }
}

#[async_trait]
impl BlogStore for MemoryStore {
    async fn list(&self) -> Result<Vec<BlogPost>, AppError> {
        Ok(sorted_desc(values(&self.posts), |p| p.published_at))
    }

    async fn find_by_slug(&self, slug: &str) -> Result<Option<BlogPost>, AppError> {
        Ok(self
            .posts
            .iter()
            .find(|p| p.slug == slug)
            .map(|p| p.value().clone()))
    }

    async fn insert(&self, post: &BlogPost) -> Result<(), AppError> {
        self.posts.insert(post.id.clone(), post.clone());
        Ok(())
    }
}
