use async_trait::async_trait;
use futures::TryStreamExt;
use mongodb::{
    bson::{doc, to_bson, DateTime, Document},
    error::{ErrorKind, WriteFailure},
    options::{
        ClientOptions, FindOneAndUpdateOptions, FindOptions, IndexOptions, ReturnDocument,
    },
    Client, Collection, Database, IndexModel,
};
use service_core::error::AppError;

use super::{
    BlogStore, CategoryStore, MessageStore, OrderStore, PaidTransition, ProductStore, UserStore,
};
use crate::models::{
    AuthProvider, BlogPost, CartItem, Category, Message, Order, OrderStatus, PaymentResult,
    Product, Role, User,
};

const DUPLICATE_KEY: i32 = 11000;

#[derive(Clone)]
pub struct MongoDb {
    db: Database,
}

impl MongoDb {
    pub async fn connect(uri: &str, database: &str) -> Result<Self, AppError> {
        let mut client_options = ClientOptions::parse(uri).await.map_err(|e| {
            tracing::error!("Failed to parse MongoDB connection string: {}", e);
            AppError::DatabaseError(e.into())
        })?;
        client_options.app_name = Some("storefront-service".to_string());

        let client = Client::with_options(client_options).map_err(|e| {
            tracing::error!("Failed to create MongoDB client: {}", e);
            AppError::DatabaseError(e.into())
        })?;

        Ok(Self {
            db: client.database(database),
        })
    }

    pub fn database(&self) -> &Database {
        &self.db
    }

    pub async fn ping(&self) -> Result<(), AppError> {
        self.db.run_command(doc! { "ping": 1 }, None).await?;
        Ok(())
    }

    fn users(&self) -> Collection<User> {
        self.db.collection("users")
    }

    fn products(&self) -> Collection<Product> {
        self.db.collection("products")
    }

    fn categories(&self) -> Collection<Category> {
        self.db.collection("categories")
    }

    fn orders(&self) -> Collection<Order> {
        self.db.collection("orders")
    }

    fn messages(&self) -> Collection<Message> {
        self.db.collection("messages")
    }

    fn posts(&self) -> Collection<BlogPost> {
        self.db.collection("blogposts")
    }

    pub async fn initialize_indexes(&self) -> Result<(), AppError> {
        self.users()
            .create_indexes(
                [
                    unique_index(doc! { "email": 1 }, "user_email_unique"),
                    named_index(doc! { "provider": 1, "oauthId": 1 }, "user_oauth_idx"),
                ],
                None,
            )
            .await?;

        self.products()
            .create_index(named_index(doc! { "createdAt": -1 }, "product_created_idx"), None)
            .await?;

        self.categories()
            .create_index(unique_index(doc! { "slug": 1 }, "category_slug_unique"), None)
            .await?;

        self.orders()
            .create_indexes(
                [
                    named_index(doc! { "user": 1, "createdAt": -1 }, "order_user_idx"),
                    named_index(
                        doc! { "paymentResult.providerOrderId": 1 },
                        "order_provider_order_idx",
                    ),
                ],
                None,
            )
            .await?;

        self.posts()
            .create_index(unique_index(doc! { "slug": 1 }, "blog_slug_unique"), None)
            .await?;

        tracing::info!("Storefront indexes initialized");
        Ok(())
    }
}

fn named_index(keys: Document, name: &str) -> IndexModel {
    IndexModel::builder()
        .keys(keys)
        .options(IndexOptions::builder().name(name.to_string()).build())
        .build()
}

fn unique_index(keys: Document, name: &str) -> IndexModel {
    IndexModel::builder()
        .keys(keys)
        .options(
            IndexOptions::builder()
                .name(name.to_string())
                .unique(true)
                .build(),
        )
        .build()
}

fn newest_first(field: &str) -> FindOptions {
    let mut sort = Document::new();
    sort.insert(field, -1);
    FindOptions::builder().sort(sort).build()
}

fn is_duplicate_key(err: &mongodb::error::Error) -> bool {
    matches!(
        err.kind.as_ref(),
        ErrorKind::Write(WriteFailure::WriteError(e)) if e.code == DUPLICATE_KEY
    )
}

fn insert_error(err: mongodb::error::Error, what: &str) -> AppError {
    if is_duplicate_key(&err) {
        AppError::Conflict(anyhow::anyhow!("{} already exists", what))
    } else {
        AppError::from(err)
    }
}

#[async_trait]
impl UserStore for MongoDb {
    async fn insert(&self, user: &User) -> Result<(), AppError> {
        self.users()
            .insert_one(user, None)
            .await
            .map_err(|e| insert_error(e, "User"))?;
        Ok(())
    }

    async fn find_by_id(&self, id: &str) -> Result<Option<User>, AppError> {
        Ok(self.users().find_one(doc! { "_id": id }, None).await?)
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<User>, AppError> {
        Ok(self
            .users()
            .find_one(doc! { "email": email.to_lowercase() }, None)
            .await?)
    }

    async fn find_by_oauth(
        &self,
        provider: AuthProvider,
        oauth_id: &str,
    ) -> Result<Option<User>, AppError> {
        Ok(self
            .users()
            .find_one(
                doc! { "provider": provider.as_str(), "oauthId": oauth_id },
                None,
            )
            .await?)
    }

    async fn link_oauth(
        &self,
        id: &str,
        provider: AuthProvider,
        oauth_id: &str,
    ) -> Result<(), AppError> {
        self.users()
            .update_one(
                doc! { "_id": id },
                doc! { "$set": {
                    "provider": provider.as_str(),
                    "oauthId": oauth_id,
                    "updatedAt": DateTime::now(),
                } },
                None,
            )
            .await?;
        Ok(())
    }

    async fn list(&self) -> Result<Vec<User>, AppError> {
        let cursor = self.users().find(None, newest_first("createdAt")).await?;
        Ok(cursor.try_collect().await?)
    }

    async fn set_admin(&self, id: &str, is_admin: bool) -> Result<Option<User>, AppError> {
        let role = if is_admin { Role::Admin } else { Role::Customer };
        let options = FindOneAndUpdateOptions::builder()
            .return_document(ReturnDocument::After)
            .build();

        Ok(self
            .users()
            .find_one_and_update(
                doc! { "_id": id },
                doc! { "$set": {
                    "isAdmin": is_admin,
                    "role": to_bson(&role)?,
                    "updatedAt": DateTime::now(),
                } },
                options,
            )
            .await?)
    }

    async fn delete(&self, id: &str) -> Result<bool, AppError> {
        let result = self.users().delete_one(doc! { "_id": id }, None).await?;
        Ok(result.deleted_count > 0)
    }

    async fn save_cart(&self, id: &str, cart: &[CartItem]) -> Result<(), AppError> {
        self.users()
            .update_one(
                doc! { "_id": id },
                doc! { "$set": { "cart": to_bson(cart)?, "updatedAt": DateTime::now() } },
                None,
            )
            .await?;
        Ok(())
    }
}

#[async_trait]
impl ProductStore for MongoDb {
    async fn list(&self) -> Result<Vec<Product>, AppError> {
        let cursor = self.products().find(None, newest_first("createdAt")).await?;
        Ok(cursor.try_collect().await?)
    }

    async fn find_by_id(&self, id: &str) -> Result<Option<Product>, AppError> {
        Ok(self.products().find_one(doc! { "_id": id }, None).await?)
    }

    async fn find_by_ids(&self, ids: &[String]) -> Result<Vec<Product>, AppError> {
        let cursor = self
            .products()
            .find(doc! { "_id": { "$in": ids } }, None)
            .await?;
        Ok(cursor.try_collect().await?)
    }

    async fn insert(&self, product: &Product) -> Result<(), AppError> {
        self.products()
            .insert_one(product, None)
            .await
            .map_err(|e| insert_error(e, "Product"))?;
        Ok(())
    }

    async fn update(&self, product: &Product) -> Result<bool, AppError> {
        let result = self
            .products()
            .replace_one(doc! { "_id": &product.id }, product, None)
            .await?;
        Ok(result.matched_count > 0)
    }

    async fn delete(&self, id: &str) -> Result<bool, AppError> {
        let result = self.products().delete_one(doc! { "_id": id }, None).await?;
        Ok(result.deleted_count > 0)
    }

    async fn decrement_stock(&self, id: &str, qty: u32) -> Result<(), AppError> {
        let pipeline = vec![doc! { "$set": {
            "countInStock": { "$max": [0, { "$subtract": ["$countInStock", i64::from(qty)] }] },
            "updatedAt": DateTime::now(),
        } }];
        self.products()
            .update_one(doc! { "_id": id }, pipeline, None)
            .await?;
        Ok(())
    }
}

#[async_trait]
impl CategoryStore for MongoDb {
    async fn list(&self) -> Result<Vec<Category>, AppError> {
        let options = FindOptions::builder().sort(doc! { "name": 1 }).build();
        let cursor = self.categories().find(None, options).await?;
        Ok(cursor.try_collect().await?)
    }

    async fn find_by_id(&self, id: &str) -> Result<Option<Category>, AppError> {
        Ok(self.categories().find_one(doc! { "_id": id }, None).await?)
    }

    async fn find_by_slug(&self, slug: &str) -> Result<Option<Category>, AppError> {
        Ok(self
            .categories()
            .find_one(doc! { "slug": slug }, None)
            .await?)
    }

    async fn insert(&self, category: &Category) -> Result<(), AppError> {
        self.categories()
            .insert_one(category, None)
            .await
            .map_err(|e| insert_error(e, "Category"))?;
        Ok(())
    }
}

#[async_trait]
impl OrderStore for MongoDb {
    async fn insert(&self, order: &Order) -> Result<(), AppError> {
        self.orders().insert_one(order, None).await?;
        Ok(())
    }

    async fn find_by_id(&self, id: &str) -> Result<Option<Order>, AppError> {
        Ok(self.orders().find_one(doc! { "_id": id }, None).await?)
    }

    async fn find_by_provider_order_id(
        &self,
        provider_order_id: &str,
    ) -> Result<Option<Order>, AppError> {
        Ok(self
            .orders()
            .find_one(
                doc! { "paymentResult.providerOrderId": provider_order_id },
                None,
            )
            .await?)
    }

    async fn list_for_user(&self, user_id: &str) -> Result<Vec<Order>, AppError> {
        let cursor = self
            .orders()
            .find(doc! { "user": user_id }, newest_first("createdAt"))
            .await?;
        Ok(cursor.try_collect().await?)
    }

    async fn list_page(&self, skip: u64, limit: i64) -> Result<(Vec<Order>, u64), AppError> {
        let total = self.orders().count_documents(None, None).await?;

        let options = FindOptions::builder()
            .sort(doc! { "createdAt": -1 })
            .skip(skip)
            .limit(limit)
            .build();
        let cursor = self.orders().find(None, options).await?;

        Ok((cursor.try_collect().await?, total))
    }

    async fn attach_payment_intent(
        &self,
        id: &str,
        result: &PaymentResult,
    ) -> Result<(), AppError> {
        self.orders()
            .update_one(
                doc! { "_id": id, "isPaid": false },
                doc! { "$set": {
                    "paymentResult": to_bson(result)?,
                    "updatedAt": DateTime::now(),
                } },
                None,
            )
            .await?;
        Ok(())
    }

    async fn mark_paid(
        &self,
        id: &str,
        result: &PaymentResult,
    ) -> Result<PaidTransition, AppError> {
        let now = DateTime::now();
        let options = FindOneAndUpdateOptions::builder()
            .return_document(ReturnDocument::After)
            .build();

        let updated = self
            .orders()
            .find_one_and_update(
                doc! { "_id": id, "isPaid": false },
                doc! { "$set": {
                    "isPaid": true,
                    "paidAt": now,
                    "status": to_bson(&OrderStatus::Paid)?,
                    "paymentResult": to_bson(result)?,
                    "updatedAt": now,
                } },
                options,
            )
            .await?;

        if let Some(order) = updated {
            return Ok(PaidTransition::Applied(order));
        }

        Ok(match OrderStore::find_by_id(self, id).await? {
            Some(order) => PaidTransition::AlreadyPaid(order),
            None => PaidTransition::NotFound,
        })
    }

    async fn mark_payment_failed(&self, id: &str) -> Result<bool, AppError> {
        let result = self
            .orders()
            .update_one(
                doc! { "_id": id, "isPaid": false },
                doc! { "$set": {
                    "status": to_bson(&OrderStatus::PaymentFailed)?,
                    "updatedAt": DateTime::now(),
                } },
                None,
            )
            .await?;
        Ok(result.modified_count > 0)
    }

    async fn update_status(
        &self,
        id: &str,
        status: OrderStatus,
    ) -> Result<Option<Order>, AppError> {
        let now = DateTime::now();
        let mut set = doc! { "status": to_bson(&status)?, "updatedAt": now };
        if status == OrderStatus::Delivered {
            set.insert("isDelivered", true);
            set.insert("deliveredAt", now);
        }

        let options = FindOneAndUpdateOptions::builder()
            .return_document(ReturnDocument::After)
            .build();

        Ok(self
            .orders()
            .find_one_and_update(doc! { "_id": id }, doc! { "$set": set }, options)
            .await?)
    }

    async fn claim_stock_update(&self, id: &str) -> Result<bool, AppError> {
        let result = self
            .orders()
            .update_one(
                doc! { "_id": id, "isPaid": true, "stockUpdated": { "$ne": true } },
                doc! { "$set": { "stockUpdated": true } },
                None,
            )
            .await?;
        Ok(result.modified_count == 1)
    }

    async fn delete(&self, id: &str) -> Result<bool, AppError> {
        let result = self.orders().delete_one(doc! { "_id": id }, None).await?;
        Ok(result.deleted_count > 0)
    }
}

#[async_trait]
impl MessageStore for MongoDb {
    async fn insert(&self, message: &Message) -> Result<(), AppError> {
        self.messages().insert_one(message, None).await?;
        Ok(())
    }

    async fn list(&self) -> Result<Vec<Message>, AppError> {
        let cursor = self.messages().find(None, newest_first("createdAt")).await?;
        Ok(cursor.try_collect().await?)
    }

    async fn count(&self) -> Result<u64, AppError> {
        Ok(self.messages().count_documents(None, None).await?)
    }

    async fn delete(&self, id: &str) -> Result<bool, AppError> {
        let result = self.messages().delete_one(doc! { "_id": id }, None).await?;
        Ok(result.deleted_count > 0)
    }
}

#[async_trait]
impl BlogStore for MongoDb {
    async fn list(&self) -> Result<Vec<BlogPost>, AppError> {
        let cursor = self.posts().find(None, newest_first("publishedAt")).await?;
        Ok(cursor.try_collect().await?)
    }

    async fn find_by_slug(&self, slug: &str) -> Result<Option<BlogPost>, AppError> {
        Ok(self.posts().find_one(doc! { "slug": slug }, None).await?)
    }

    async fn insert(&self, post: &BlogPost) -> Result<(), AppError> {
        self.posts()
            .insert_one(post, None)
            .await
            .map_err(|e| insert_error(e, "Post"))?;
        Ok(())
    }
}
