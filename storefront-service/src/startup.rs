use secrecy::ExposeSecret;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;
use tokio::signal;

use crate::config::{StorageBackend, StorefrontConfig};
use crate::services::{EmailProvider, LogOnlyEmailService, MongoDb, SmtpEmailService, Store};
use crate::{build_router, AppState};

pub struct Application {
    port: u16,
    listener: TcpListener,
    router: axum::Router,
}

impl Application {
    /// Wires storage, email and the router, then binds the listener.
    /// Port 0 picks a free port; see [`Application::port`].
    pub async fn build(config: StorefrontConfig) -> anyhow::Result<Self> {
        let store = match config.storage.backend {
            StorageBackend::Mongo => {
                tracing::info!("Initializing MongoDB storage");
                let db = MongoDb::connect(
                    config.storage.mongodb.uri.expose_secret(),
                    &config.storage.mongodb.database,
                )
                .await?;
                db.initialize_indexes().await?;
                Store::mongo(db)
            }
            StorageBackend::Memory => {
                tracing::warn!("Using in-memory storage - data is lost on restart");
                Store::in_memory()
            }
        };

        let email: Arc<dyn EmailProvider> = match &config.email.smtp {
            Some(smtp) => Arc::new(SmtpEmailService::new(smtp)?),
            None => {
                tracing::warn!("SMTP not configured - outgoing email is logged only");
                Arc::new(LogOnlyEmailService)
            }
        };

        let listener = TcpListener::bind(config.common.bind_address()).await?;
        let port = listener.local_addr()?.port();

        let state = AppState::new(config, store, email)?;
        let router = build_router(state);

        Ok(Self {
            port,
            listener,
            router,
        })
    }

    pub fn port(&self) -> u16 {
        self.port
    }

    pub async fn run_until_stopped(self) -> anyhow::Result<()> {
        tracing::info!(port = self.port, "Storefront service listening");

        axum::serve(
            self.listener,
            self.router
                .into_make_service_with_connect_info::<SocketAddr>(),
        )
        .with_graceful_shutdown(shutdown_signal())
        .await?;

        tracing::info!("Storefront service stopped");
        Ok(())
    }
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            tracing::info!("Received SIGINT, starting graceful shutdown");
        },
        _ = terminate => {
            tracing::info!("Received SIGTERM, starting graceful shutdown");
        },
    }
}
