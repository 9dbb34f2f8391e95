//! Business logic for the storefront: pricing, checkout, payment providers
//! and reconciliation, accounts and persistence.

mod accounts;
pub mod cart;
mod checkout;
mod email;
pub mod error;
mod jwt;
pub mod metrics;
pub mod oauth;
pub mod phonepe;
pub mod pricing;
pub mod razorpay;
pub mod reconciliation;
pub mod store;

pub use accounts::AccountService;
pub use checkout::CheckoutService;
pub use email::{
    EmailProvider, LogOnlyEmailService, MockEmailService, OutgoingEmail, SmtpEmailService,
};
pub use error::ServiceError;
pub use jwt::{AccessTokenClaims, JwtService};
pub use oauth::OAuthService;
pub use phonepe::PhonePeClient;
pub use razorpay::RazorpayClient;
pub use reconciliation::{ConfirmationOutcome, PaymentConfirmation, PaymentReconciler};
pub use store::{MemoryStore, MongoDb, PaidTransition, Store};
