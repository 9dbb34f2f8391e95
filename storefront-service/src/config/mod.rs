use secrecy::{ExposeSecret, Secret};
use service_core::config as core_config;
use service_core::error::AppError;
use std::env;

#[derive(Debug, Clone)]
pub struct StorefrontConfig {
    pub common: core_config::Config,
    pub environment: Environment,
    pub service_name: String,
    pub service_version: String,
    pub log_level: String,
    pub otlp_endpoint: Option<String>,
    pub storage: StorageConfig,
    pub jwt: JwtConfig,
    pub oauth: OAuthConfig,
    pub razorpay: RazorpayConfig,
    pub phonepe: PhonePeConfig,
    pub email: EmailConfig,
    pub security: SecurityConfig,
    pub swagger: SwaggerConfig,
    pub rate_limit: RateLimitConfig,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Environment {
    Dev,
    Prod,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StorageBackend {
    Mongo,
    Memory,
}

#[derive(Debug, Clone)]
pub struct StorageConfig {
    pub backend: StorageBackend,
    pub mongodb: MongoConfig,
}

#[derive(Debug, Clone)]
pub struct MongoConfig {
    pub uri: Secret<String>,
    pub database: String,
}

#[derive(Debug, Clone)]
pub struct JwtConfig {
    pub secret: Secret<String>,
    pub expiry_days: i64,
}

#[derive(Debug, Clone)]
pub struct OAuthConfig {
    /// Where the browser lands after a social login, token in the query.
    pub frontend_url: String,
    pub google: Option<OAuthProviderConfig>,
    pub facebook: Option<OAuthProviderConfig>,
}

#[derive(Debug, Clone)]
pub struct OAuthProviderConfig {
    pub client_id: String,
    pub client_secret: Secret<String>,
    pub redirect_uri: String,
    pub authorize_url: String,
    pub token_url: String,
    pub userinfo_url: String,
}

#[derive(Debug, Clone)]
pub struct RazorpayConfig {
    pub key_id: String,
    pub key_secret: Secret<String>,
    pub webhook_secret: Secret<String>,
    pub api_base_url: String,
    pub currency: String,
}

#[derive(Debug, Clone)]
pub struct PhonePeConfig {
    pub merchant_id: String,
    pub salt_key: Secret<String>,
    pub salt_index: String,
    pub api_base_url: String,
    /// Browser redirect after the pay page.
    pub redirect_url: String,
    /// Server-to-server callback target.
    pub callback_url: String,
}

#[derive(Debug, Clone)]
pub struct EmailConfig {
    pub smtp: Option<SmtpConfig>,
    /// Recipient of contact-form notifications.
    pub admin_address: Option<String>,
}

#[derive(Debug, Clone)]
pub struct SmtpConfig {
    pub host: String,
    pub port: u16,
    pub username: String,
    pub password: Secret<String>,
    pub from: String,
}

#[derive(Debug, Clone)]
pub struct SecurityConfig {
    pub allowed_origins: Vec<String>,
}

#[derive(Debug, Clone)]
pub struct SwaggerConfig {
    pub enabled: bool,
}

#[derive(Debug, Clone)]
pub struct RateLimitConfig {
    pub login_attempts: u32,
    pub login_window_seconds: u64,
    pub register_attempts: u32,
    pub register_window_seconds: u64,
    pub global_ip_limit: u32,
    pub global_ip_window_seconds: u64,
}

impl StorefrontConfig {
    pub fn from_env() -> Result<Self, AppError> {
        let common_config = core_config::Config::load()?;

        let environment: Environment = env::var("ENVIRONMENT")
            .unwrap_or_else(|_| "dev".to_string())
            .parse()
            .map_err(|e: String| AppError::ConfigError(anyhow::anyhow!(e)))?;
        let is_prod = environment == Environment::Prod;
        let dev_default = |value: &'static str| (!is_prod).then_some(value);

        let backend: StorageBackend = get_env("STORAGE_BACKEND", Some("mongo"), is_prod)?
            .parse()
            .map_err(|e: String| AppError::ConfigError(anyhow::anyhow!(e)))?;

        let config = StorefrontConfig {
            common: common_config,
            environment,
            service_name: get_env("SERVICE_NAME", Some("storefront-service"), is_prod)?,
            service_version: get_env(
                "SERVICE_VERSION",
                Some(env!("CARGO_PKG_VERSION")),
                is_prod,
            )?,
            log_level: get_env("LOG_LEVEL", Some("info"), is_prod)?,
            otlp_endpoint: optional_env("OTEL_EXPORTER_OTLP_ENDPOINT"),
            storage: StorageConfig {
                backend,
                mongodb: MongoConfig {
                    uri: Secret::new(get_env(
                        "MONGODB_URI",
                        dev_default("mongodb://localhost:27017"),
                        is_prod,
                    )?),
                    database: get_env("MONGODB_DATABASE", Some("storefront"), is_prod)?,
                },
            },
            jwt: JwtConfig {
                secret: Secret::new(get_env(
                    "JWT_SECRET",
                    dev_default("dev-only-storefront-jwt-secret"),
                    is_prod,
                )?),
                expiry_days: parse_env("JWT_EXPIRY_DAYS", "30", is_prod)?,
            },
            oauth: OAuthConfig {
                frontend_url: get_env(
                    "FRONTEND_URL",
                    dev_default("http://localhost:5173"),
                    is_prod,
                )?,
                google: oauth_provider_from_env(
                    "GOOGLE",
                    "https://accounts.google.com/o/oauth2/v2/auth",
                    "https://oauth2.googleapis.com/token",
                    "https://www.googleapis.com/oauth2/v2/userinfo",
                ),
                facebook: oauth_provider_from_env(
                    "FACEBOOK",
                    "https://www.facebook.com/v19.0/dialog/oauth",
                    "https://graph.facebook.com/v19.0/oauth/access_token",
                    "https://graph.facebook.com/me?fields=id,name,email",
                ),
            },
            razorpay: RazorpayConfig {
                key_id: optional_env("RAZORPAY_KEY_ID").unwrap_or_default(),
                key_secret: Secret::new(optional_env("RAZORPAY_KEY_SECRET").unwrap_or_default()),
                webhook_secret: Secret::new(
                    optional_env("RAZORPAY_WEBHOOK_SECRET").unwrap_or_default(),
                ),
                api_base_url: get_env(
                    "RAZORPAY_API_BASE_URL",
                    Some("https://api.razorpay.com/v1"),
                    is_prod,
                )?,
                currency: get_env("RAZORPAY_CURRENCY", Some("INR"), is_prod)?,
            },
            phonepe: PhonePeConfig {
                merchant_id: optional_env("PHONEPE_MERCHANT_ID").unwrap_or_default(),
                salt_key: Secret::new(optional_env("PHONEPE_SALT_KEY").unwrap_or_default()),
                salt_index: get_env("PHONEPE_SALT_INDEX", Some("1"), is_prod)?,
                api_base_url: get_env(
                    "PHONEPE_API_BASE_URL",
                    Some("https://api-preprod.phonepe.com/apis/pg-sandbox"),
                    is_prod,
                )?,
                redirect_url: get_env(
                    "PHONEPE_REDIRECT_URL",
                    dev_default("http://localhost:5173/payment/status"),
                    is_prod,
                )?,
                callback_url: get_env(
                    "PHONEPE_CALLBACK_URL",
                    dev_default("http://localhost:5000/api/orders/phonepe/callback"),
                    is_prod,
                )?,
            },
            email: EmailConfig {
                smtp: smtp_from_env()?,
                admin_address: optional_env("ADMIN_EMAIL"),
            },
            security: SecurityConfig {
                allowed_origins: get_env(
                    "ALLOWED_ORIGINS",
                    dev_default("http://localhost:5173"),
                    is_prod,
                )?
                .split(',')
                .map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty())
                .collect(),
            },
            swagger: SwaggerConfig {
                enabled: parse_env("SWAGGER_ENABLED", if is_prod { "false" } else { "true" }, is_prod)?,
            },
            rate_limit: RateLimitConfig {
                login_attempts: parse_env("RATE_LIMIT_LOGIN_ATTEMPTS", "10", is_prod)?,
                login_window_seconds: parse_env("RATE_LIMIT_LOGIN_WINDOW_SECONDS", "60", is_prod)?,
                register_attempts: parse_env("RATE_LIMIT_REGISTER_ATTEMPTS", "5", is_prod)?,
                register_window_seconds: parse_env(
                    "RATE_LIMIT_REGISTER_WINDOW_SECONDS",
                    "3600",
                    is_prod,
                )?,
                global_ip_limit: parse_env("RATE_LIMIT_GLOBAL_IP_LIMIT", "300", is_prod)?,
                global_ip_window_seconds: parse_env(
                    "RATE_LIMIT_GLOBAL_IP_WINDOW_SECONDS",
                    "60",
                    is_prod,
                )?,
            },
        };

        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<(), AppError> {
        if self.jwt.expiry_days <= 0 {
            return Err(AppError::ConfigError(anyhow::anyhow!(
                "JWT_EXPIRY_DAYS must be positive"
            )));
        }

        if self.jwt.secret.expose_secret().len() < 16 {
            return Err(AppError::ConfigError(anyhow::anyhow!(
                "JWT_SECRET must be at least 16 characters"
            )));
        }

        if self.environment == Environment::Prod {
            if self.security.allowed_origins.iter().any(|o| o == "*") {
                return Err(AppError::ConfigError(anyhow::anyhow!(
                    "Wildcard CORS origin not allowed in production"
                )));
            }

            if self.storage.backend == StorageBackend::Memory {
                return Err(AppError::ConfigError(anyhow::anyhow!(
                    "STORAGE_BACKEND=memory is not allowed in production"
                )));
            }
        }

        Ok(())
    }
}

fn get_env(key: &str, default: Option<&str>, is_prod: bool) -> Result<String, AppError> {
    match env::var(key) {
        Ok(val) => Ok(val),
        Err(_) => match default {
            Some(def) => Ok(def.to_string()),
            None if is_prod => Err(AppError::ConfigError(anyhow::anyhow!(
                "{} is required in production but not set",
                key
            ))),
            None => Err(AppError::ConfigError(anyhow::anyhow!(
                "{} is required but not set",
                key
            ))),
        },
    }
}

fn parse_env<T>(key: &str, default: &str, is_prod: bool) -> Result<T, AppError>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    get_env(key, Some(default), is_prod)?
        .parse()
        .map_err(|e: T::Err| AppError::ConfigError(anyhow::anyhow!("{}: {}", key, e)))
}

fn optional_env(key: &str) -> Option<String> {
    env::var(key).ok().filter(|v| !v.trim().is_empty())
}

/// A provider is enabled only when both its client id and secret are set.
fn oauth_provider_from_env(
    prefix: &str,
    authorize_url: &str,
    token_url: &str,
    userinfo_url: &str,
) -> Option<OAuthProviderConfig> {
    let client_id = optional_env(&format!("{}_CLIENT_ID", prefix))?;
    let client_secret = optional_env(&format!("{}_CLIENT_SECRET", prefix))?;

    Some(OAuthProviderConfig {
        client_id,
        client_secret: Secret::new(client_secret),
        redirect_uri: optional_env(&format!("{}_REDIRECT_URI", prefix)).unwrap_or_else(|| {
            format!(
                "http://localhost:5000/api/auth/{}/callback",
                prefix.to_lowercase()
            )
        }),
        authorize_url: optional_env(&format!("{}_AUTHORIZE_URL", prefix))
            .unwrap_or_else(|| authorize_url.to_string()),
        token_url: optional_env(&format!("{}_TOKEN_URL", prefix))
            .unwrap_or_else(|| token_url.to_string()),
        userinfo_url: optional_env(&format!("{}_USERINFO_URL", prefix))
            .unwrap_or_else(|| userinfo_url.to_string()),
    })
}

fn smtp_from_env() -> Result<Option<SmtpConfig>, AppError> {
    let Some(host) = optional_env("SMTP_HOST") else {
        return Ok(None);
    };

    let port = optional_env("SMTP_PORT")
        .map(|p| p.parse::<u16>())
        .transpose()
        .map_err(|e| AppError::ConfigError(anyhow::anyhow!("SMTP_PORT: {}", e)))?
        .unwrap_or(587);
    let username = optional_env("SMTP_USER").unwrap_or_default();

    Ok(Some(SmtpConfig {
        host,
        port,
        from: optional_env("SMTP_FROM").unwrap_or_else(|| username.clone()),
        username,
        password: Secret::new(optional_env("SMTP_PASSWORD").unwrap_or_default()),
    }))
}

impl std::str::FromStr for Environment {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "dev" | "development" => Ok(Environment::Dev),
            "prod" | "production" => Ok(Environment::Prod),
            _ => Err(format!("Invalid environment: {}", s)),
        }
    }
}

impl std::str::FromStr for StorageBackend {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "mongo" | "mongodb" => Ok(StorageBackend::Mongo),
            "memory" => Ok(StorageBackend::Memory),
            _ => Err(format!("Invalid storage backend: {}", s)),
        }
    }
}
