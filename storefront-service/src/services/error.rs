use service_core::error::AppError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ServiceError {
    #[error(transparent)]
    App(#[from] AppError),

    #[error("Internal server error: {0}")]
    Internal(#[from] anyhow::Error),

    #[error("Invalid credentials")]
    InvalidCredentials,

    #[error("User already exists")]
    UserAlreadyExists,

    #[error("User not found")]
    UserNotFound,

    #[error("No order items")]
    EmptyOrder,

    #[error("Product not found: {0}")]
    ProductNotFound(String),

    #[error("Invalid quantity for product {0}")]
    InvalidQuantity(String),

    #[error("Insufficient stock for {0}")]
    InsufficientStock(String),

    #[error("Order total is too large")]
    TotalOutOfRange,

    #[error("Order not found")]
    OrderNotFound,

    #[error("Paid amount {received} does not match order total {expected}")]
    AmountMismatch { expected: i64, received: i64 },
}

impl From<ServiceError> for AppError {
    fn from(err: ServiceError) -> Self {
        match err {
            ServiceError::App(e) => e,
            ServiceError::Internal(e) => AppError::InternalError(e),
            ServiceError::InvalidCredentials
            | ServiceError::UserAlreadyExists
            | ServiceError::EmptyOrder
            | ServiceError::InvalidQuantity(_)
            | ServiceError::InsufficientStock(_)
            | ServiceError::TotalOutOfRange
            | ServiceError::AmountMismatch { .. } => AppError::bad_request(err.to_string()),
            ServiceError::UserNotFound
            | ServiceError::ProductNotFound(_)
            | ServiceError::OrderNotFound => AppError::not_found(err.to_string()),
        }
    }
}

impl From<mongodb::error::Error> for ServiceError {
    fn from(err: mongodb::error::Error) -> Self {
        ServiceError::App(AppError::from(err))
    }
}
