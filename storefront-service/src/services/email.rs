use async_trait::async_trait;
use lettre::{
    message::header::ContentType, transport::smtp::authentication::Credentials, Message,
    SmtpTransport, Transport,
};
use secrecy::ExposeSecret;
use service_core::error::AppError;
use std::sync::Mutex;
use std::time::Duration;

use crate::config::SmtpConfig;

#[derive(Debug, Clone, PartialEq)]
pub struct OutgoingEmail {
    pub to: String,
    pub reply_to: Option<String>,
    pub subject: String,
    pub body: String,
}

#[async_trait]
pub trait EmailProvider: Send + Sync {
    async fn send(&self, email: OutgoingEmail) -> Result<(), AppError>;
}

#[derive(Clone)]
pub struct SmtpEmailService {
    mailer: SmtpTransport,
    from_email: String,
}

impl SmtpEmailService {
    pub fn new(config: &SmtpConfig) -> Result<Self, AppError> {
        let creds = Credentials::new(
            config.username.clone(),
            config.password.expose_secret().clone(),
        );

        let mailer = SmtpTransport::starttls_relay(&config.host)
            .map_err(|e| AppError::EmailError(e.to_string()))?
            .credentials(creds)
            .port(config.port)
            .timeout(Some(Duration::from_secs(10)))
            .build();

        tracing::info!(host = %config.host, port = config.port, "SMTP email service initialized");

        Ok(Self {
            mailer,
            from_email: config.from.clone(),
        })
    }
}

#[async_trait]
impl EmailProvider for SmtpEmailService {
    async fn send(&self, email: OutgoingEmail) -> Result<(), AppError> {
        let parse = |addr: &str| {
            addr.parse()
                .map_err(|e: lettre::address::AddressError| AppError::EmailError(e.to_string()))
        };

        let mut builder = Message::builder()
            .from(parse(&self.from_email)?)
            .to(parse(&email.to)?)
            .subject(email.subject.clone())
            .header(ContentType::TEXT_PLAIN);
        if let Some(reply_to) = &email.reply_to {
            builder = builder.reply_to(parse(reply_to)?);
        }
        let message = builder.body(email.body.clone())?;

        // SmtpTransport is blocking
        let mailer = self.mailer.clone();
        let result = tokio::task::spawn_blocking(move || mailer.send(&message))
            .await
            .map_err(|e| AppError::InternalError(e.into()))?;

        match result {
            Ok(_) => {
                tracing::info!(to = %email.to, subject = %email.subject, "Email sent");
                Ok(())
            }
            Err(e) => {
                tracing::error!(error = %e, to = %email.to, "Failed to send email");
                Err(AppError::EmailError(e.to_string()))
            }
        }
    }
}

/// Used when SMTP is not configured: logs and drops.
pub struct LogOnlyEmailService;

#[async_trait]
impl EmailProvider for LogOnlyEmailService {
    async fn send(&self, email: OutgoingEmail) -> Result<(), AppError> {
        tracing::info!(
            to = %email.to,
            subject = %email.subject,
            "SMTP not configured, email not sent"
        );
        Ok(())
    }
}

/// Records emails instead of sending them.
#[derive(Default)]
pub struct MockEmailService {
    sent: Mutex<Vec<OutgoingEmail>>,
    fail: bool,
}

impl MockEmailService {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn failing() -> Self {
        Self {
            sent: Mutex::new(Vec::new()),
            fail: true,
        }
    }

    pub fn sent(&self) -> Vec<OutgoingEmail> {
        self.sent.lock().map(|s| s.clone()).unwrap_or_default()
    }
}

#[async_trait]
impl EmailProvider for MockEmailService {
    async fn send(&self, email: OutgoingEmail) -> Result<(), AppError> {
        if self.fail {
            return Err(AppError::EmailError("mock transport failure".to_string()));
        }
        if let Ok(mut sent) = self.sent.lock() {
            sent.push(email);
        }
        Ok(())
    }
}
