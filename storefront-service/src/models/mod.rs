//! Persistent records. Field names are camelCase in MongoDB.

mod blog;
mod category;
mod message;
mod order;
mod product;
mod user;

pub use blog::BlogPost;
pub use category::Category;
pub use message::Message;
pub use order::{
    ConfirmationSource, Order, OrderItem, OrderStatus, PaymentProvider, PaymentResult,
};
pub use product::{Product, ShippingType};
pub use user::{Address, AuthProvider, CartItem, Role, User};

/// Compact UUID. Also used as the PhonePe merchant transaction id,
/// which is capped at 35 characters.
pub fn new_id() -> String {
    uuid::Uuid::new_v4().simple().to_string()
}
