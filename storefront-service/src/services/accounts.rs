use service_core::error::AppError;

use crate::dtos::auth::{AuthResponse, LoginRequest, RegisterRequest, UserSummary};
use crate::models::{AuthProvider, User};
use crate::services::{oauth::OAuthProfile, JwtService, ServiceError, Store};
use crate::utils::{hash_password, verify_password, Password, PasswordHashString};

/// Local and social sign-in, issuing the same bearer token for both.
#[derive(Clone)]
pub struct AccountService {
    store: Store,
    jwt: JwtService,
}

impl AccountService {
    pub fn new(store: Store, jwt: JwtService) -> Self {
        Self { store, jwt }
    }

    pub async fn register(&self, req: RegisterRequest) -> Result<AuthResponse, ServiceError> {
        let email = req.email.trim().to_lowercase();

        if self.store.users.find_by_email(&email).await?.is_some() {
            return Err(ServiceError::UserAlreadyExists);
        }

        let password_hash = hash_password(&Password::new(req.password)).map_err(|e| {
            ServiceError::Internal(anyhow::anyhow!("Password hashing error: {}", e))
        })?;

        let user = User::new_local(req.name.trim().to_string(), email, password_hash.into_string());

        // A concurrent registration can still win the unique index.
        match self.store.users.insert(&user).await {
            Ok(()) => {}
            Err(AppError::Conflict(_)) => return Err(ServiceError::UserAlreadyExists),
            Err(e) => return Err(e.into()),
        }

        tracing::info!(user_id = %user.id, "User registered");

        self.issue(&user)
    }

    pub async fn login(&self, req: LoginRequest) -> Result<AuthResponse, ServiceError> {
        let email = req.email.trim().to_lowercase();

        let user = self
            .store
            .users
            .find_by_email(&email)
            .await?
            .ok_or(ServiceError::InvalidCredentials)?;

        let Some(hash) = user.password_hash.clone() else {
            tracing::warn!(user_id = %user.id, provider = user.provider.as_str(), "Password login attempted on social account");
            return Err(ServiceError::InvalidCredentials);
        };

        verify_password(&Password::new(req.password), &PasswordHashString::new(hash))
            .map_err(|_| ServiceError::InvalidCredentials)?;

        tracing::info!(user_id = %user.id, "User logged in");

        self.issue(&user)
    }

    /// Finds the account for a provider identity, linking by email or
    /// creating a customer when none exists.
    pub async fn oauth_sign_in(
        &self,
        provider: AuthProvider,
        profile: OAuthProfile,
    ) -> Result<AuthResponse, ServiceError> {
        if !profile.email_verified {
            return Err(ServiceError::App(AppError::bad_request(
                "Email address not verified with provider",
            )));
        }

        if let Some(user) = self.store.users.find_by_oauth(provider, &profile.id).await? {
            tracing::info!(user_id = %user.id, provider = provider.as_str(), "User logged in via OAuth");
            return self.issue(&user);
        }

        let email = profile.email.trim().to_lowercase();
        let user = match self.store.users.find_by_email(&email).await? {
            Some(mut existing) => {
                self.store
                    .users
                    .link_oauth(&existing.id, provider, &profile.id)
                    .await?;
                existing.oauth_id = Some(profile.id);
                tracing::info!(user_id = %existing.id, provider = provider.as_str(), "Linked OAuth identity to existing account");
                existing
            }
            None => {
                let user = User::new_oauth(provider, profile.id, profile.name, email);
                self.store.users.insert(&user).await?;
                tracing::info!(user_id = %user.id, provider = provider.as_str(), "User registered via OAuth");
                user
            }
        };

        self.issue(&user)
    }

    fn issue(&self, user: &User) -> Result<AuthResponse, ServiceError> {
        let token = self.jwt.generate_token(&user.id, &user.email)?;
        Ok(AuthResponse {
            token,
            user: UserSummary::from(user),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::JwtConfig;
    use crate::models::Role;
    use secrecy::Secret;

    fn service() -> AccountService {
        let jwt = JwtService::new(&JwtConfig {
            secret: Secret::new("unit-test-signing-secret".to_string()),
            expiry_days: 30,
        })
        .unwrap();
        AccountService::new(Store::in_memory(), jwt)
    }

    fn register_req(email: &str) -> RegisterRequest {
        RegisterRequest {
            name: "Asha".to_string(),
            email: email.to_string(),
            password: "secret123".to_string(),
        }
    }

    fn profile(id: &str, email: &str) -> OAuthProfile {
        OAuthProfile {
            id: id.to_string(),
            email: email.to_string(),
            name: "Asha".to_string(),
            email_verified: true,
        }
    }

    #[tokio::test]
    async fn register_creates_customer_and_rejects_duplicates() {
        let accounts = service();
        let res = accounts.register(register_req("Asha@Example.com")).await.unwrap();

        assert_eq!(res.user.email, "asha@example.com");
        assert!(!res.user.is_admin);
        assert_eq!(res.user.role, Role::Customer);

        let err = accounts
            .register(register_req("asha@example.com"))
            .await
            .unwrap_err();
        assert!(matches!(err, ServiceError::UserAlreadyExists));
    }

    #[tokio::test]
    async fn login_uses_one_message_for_unknown_email_and_bad_password() {
        let accounts = service();
        accounts.register(register_req("asha@example.com")).await.unwrap();

        let wrong_password = accounts
            .login(LoginRequest {
                email: "asha@example.com".to_string(),
                password: "nope".to_string(),
            })
            .await
            .unwrap_err();
        let unknown = accounts
            .login(LoginRequest {
                email: "ghost@example.com".to_string(),
                password: "secret123".to_string(),
            })
            .await
            .unwrap_err();

        assert_eq!(wrong_password.to_string(), "Invalid credentials");
        assert_eq!(unknown.to_string(), "Invalid credentials");

        let ok = accounts
            .login(LoginRequest {
                email: "ASHA@example.com".to_string(),
                password: "secret123".to_string(),
            })
            .await
            .unwrap();
        assert_eq!(ok.user.email, "asha@example.com");
    }

    #[tokio::test]
    async fn oauth_sign_in_links_by_email_then_reuses_identity() {
        let accounts = service();
        let local = accounts.register(register_req("asha@example.com")).await.unwrap();

        let linked = accounts
            .oauth_sign_in(AuthProvider::Google, profile("g-1", "asha@example.com"))
            .await
            .unwrap();
        assert_eq!(linked.user.id, local.user.id);

        let again = accounts
            .oauth_sign_in(AuthProvider::Google, profile("g-1", "changed@example.com"))
            .await
            .unwrap();
        assert_eq!(again.user.id, local.user.id);
    }

    #[tokio::test]
    async fn oauth_only_account_cannot_password_login() {
        let accounts = service();
        accounts
            .oauth_sign_in(AuthProvider::Facebook, profile("fb-9", "fb@example.com"))
            .await
            .unwrap();

        let err = accounts
            .login(LoginRequest {
                email: "fb@example.com".to_string(),
                password: "anything".to_string(),
            })
            .await
            .unwrap_err();
        assert!(matches!(err, ServiceError::InvalidCredentials));
    }

    #[tokio::test]
    async fn unverified_provider_email_is_refused() {
        let accounts = service();
        let mut unverified = profile("g-2", "new@example.com");
        unverified.email_verified = false;

        assert!(accounts
            .oauth_sign_in(AuthProvider::Google, unverified)
            .await
            .is_err());
    }
}
