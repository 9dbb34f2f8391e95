use anyhow::{anyhow, Result};
use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine as _};
use rand::Rng;
use reqwest::Client;
use secrecy::ExposeSecret;
use serde::Deserialize;
use sha2::{Digest, Sha256};
use std::time::Duration;

use crate::config::{OAuthConfig, OAuthProviderConfig};
use crate::models::AuthProvider;

/// Social login providers, each optional in configuration.
#[derive(Clone)]
pub struct OAuthService {
    client: Client,
    frontend_url: String,
    google: Option<OAuthProviderConfig>,
    facebook: Option<OAuthProviderConfig>,
}

/// What a login redirect needs: the provider URL and the values the
/// callback must see again.
#[derive(Debug, Clone)]
pub struct AuthorizationRequest {
    pub url: String,
    pub state: String,
    pub code_verifier: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct OAuthProfile {
    pub id: String,
    pub email: String,
    pub name: String,
    pub email_verified: bool,
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
}

#[derive(Debug, Deserialize)]
struct GoogleUserInfo {
    id: String,
    email: String,
    #[serde(default)]
    verified_email: bool,
    name: Option<String>,
}

#[derive(Debug, Deserialize)]
struct FacebookUserInfo {
    id: String,
    email: Option<String>,
    name: Option<String>,
}

impl OAuthService {
    pub fn new(config: &OAuthConfig) -> Self {
        let client = Client::builder()
            .timeout(Duration::from_secs(10))
            .build()
            .unwrap_or_default();

        Self {
            client,
            frontend_url: config.frontend_url.clone(),
            google: config.google.clone(),
            facebook: config.facebook.clone(),
        }
    }

    pub fn frontend_url(&self) -> &str {
        &self.frontend_url
    }

    pub fn provider(&self, provider: AuthProvider) -> Option<&OAuthProviderConfig> {
        match provider {
            AuthProvider::Google => self.google.as_ref(),
            AuthProvider::Facebook => self.facebook.as_ref(),
            AuthProvider::Local => None,
        }
    }

    pub fn is_enabled(&self, provider: AuthProvider) -> bool {
        self.provider(provider).is_some()
    }

    pub fn authorization_url(&self, provider: AuthProvider) -> Result<AuthorizationRequest> {
        let config = self
            .provider(provider)
            .ok_or_else(|| anyhow!("{} login is not configured", provider.as_str()))?;

        let state = uuid::Uuid::new_v4().to_string();
        let code_verifier = {
            let mut bytes = [0u8; 32];
            rand::thread_rng().fill(&mut bytes);
            URL_SAFE_NO_PAD.encode(bytes)
        };
        let code_challenge = URL_SAFE_NO_PAD.encode(Sha256::digest(code_verifier.as_bytes()));

        let scope = match provider {
            AuthProvider::Facebook => "email public_profile",
            _ => "openid email profile",
        };

        let url = format!(
            "{}?client_id={}&redirect_uri={}&response_type=code&scope={}&state={}&code_challenge={}&code_challenge_method=S256",
            config.authorize_url,
            urlencoding::encode(&config.client_id),
            urlencoding::encode(&config.redirect_uri),
            urlencoding::encode(scope),
            state,
            code_challenge
        );

        Ok(AuthorizationRequest {
            url,
            state,
            code_verifier,
        })
    }

    /// Exchanges the authorization code and fetches the provider profile.
    pub async fn fetch_profile(
        &self,
        provider: AuthProvider,
        code: &str,
        code_verifier: &str,
    ) -> Result<OAuthProfile> {
        let config = self
            .provider(provider)
            .ok_or_else(|| anyhow!("{} login is not configured", provider.as_str()))?;

        let access_token = self.exchange_code(config, code, code_verifier).await?;

        let response = self
            .client
            .get(&config.userinfo_url)
            .bearer_auth(access_token)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            tracing::error!(provider = provider.as_str(), status = %status, body = %body, "User info request failed");
            return Err(anyhow!("{} user info request failed", provider.as_str()));
        }

        let profile = match provider {
            AuthProvider::Google => {
                let info: GoogleUserInfo = response.json().await?;
                OAuthProfile {
                    name: info.name.unwrap_or_else(|| info.email.clone()),
                    id: info.id,
                    email: info.email,
                    email_verified: info.verified_email,
                }
            }
            AuthProvider::Facebook => {
                let info: FacebookUserInfo = response.json().await?;
                let email = info
                    .email
                    .ok_or_else(|| anyhow!("Facebook account has no email address"))?;
                OAuthProfile {
                    name: info.name.unwrap_or_else(|| email.clone()),
                    id: info.id,
                    email,
                    // Facebook only shares confirmed addresses.
                    email_verified: true,
                }
            }
            AuthProvider::Local => return Err(anyhow!("local accounts have no OAuth profile")),
        };

        Ok(profile)
    }

    async fn exchange_code(
        &self,
        config: &OAuthProviderConfig,
        code: &str,
        code_verifier: &str,
    ) -> Result<String> {
        let response = self
            .client
            .post(&config.token_url)
            .form(&[
                ("client_id", config.client_id.as_str()),
                ("client_secret", config.client_secret.expose_secret().as_str()),
                ("code", code),
                ("code_verifier", code_verifier),
                ("grant_type", "authorization_code"),
                ("redirect_uri", config.redirect_uri.as_str()),
            ])
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            tracing::error!(status = %status, body = %body, "OAuth token exchange error");
            return Err(anyhow!("OAuth token exchange failed"));
        }

        let token: TokenResponse = response.json().await?;
        Ok(token.access_token)
    }
}
