mod password;
mod slug;
mod validation;

pub use password::{hash_password, verify_password, Password, PasswordHashString};
pub use slug::slugify;
pub use validation::ValidatedJson;
