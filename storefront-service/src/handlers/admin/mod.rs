//! Back-office endpoints. Every route here sits behind the auth and admin
//! middleware.

pub mod messages;
pub mod orders;
pub mod products;
pub mod users;
