//! Application state shared by every handler

use std::sync::Arc;

use crate::auth::JwtService;
use crate::config::{Config, DatabaseBackend};
use crate::db::{AnalyticsStore, CatalogStore, MemoryStore, PgStore, Store};
use crate::error::BoxError;
use crate::mail::{LogTransport, MailQueue, MailTransport};
use crate::orders::OrderService;
use crate::users::UserService;

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub catalog: Arc<dyn CatalogStore>,
    pub analytics: Arc<dyn AnalyticsStore>,
    pub orders: OrderService,
    pub users: UserService,
    pub jwt: Arc<JwtService>,
}

impl AppState {
    /// Open the configured backend and wire up the services
    pub async fn new(config: &Config) -> Result<Self, BoxError> {
        let state = match &config.database {
            DatabaseBackend::Postgres(url) => {
                let store = PgStore::connect(url, config.db_max_connections).await?;
                Self::with_store(config, Arc::new(store))
            }
            DatabaseBackend::Memory => {
                if !config.is_development() {
                    tracing::warn!("Using the in-memory store outside development");
                }
                tracing::info!("Using in-memory store; data is lost on restart");
                Self::with_store(config, Arc::new(MemoryStore::new()))
            }
        };

        if let Some(admin) = &config.admin {
            state
                .users
                .ensure_admin(&admin.email, &admin.password)
                .await
                .map_err(|e| format!("bootstrap admin failed: {:?}", e))?;
        }

        Ok(state)
    }

    /// Build state over an existing store, delivering mail to the log
    ///
    /// Must be called inside a tokio runtime (it starts the mail worker).
    pub fn with_store<S: Store + 'static>(config: &Config, store: Arc<S>) -> Self {
        Self::with_store_and_mail(config, store, Arc::new(LogTransport))
    }

    pub fn with_store_and_mail<S: Store + 'static>(
        config: &Config,
        store: Arc<S>,
        transport: Arc<dyn MailTransport>,
    ) -> Self {
        let jwt = Arc::new(JwtService::new(&config.jwt_secret, config.jwt_expiry_hours));
        let (mail, _worker) = MailQueue::start(config.mail_from.clone(), transport);

        Self {
            catalog: store.clone(),
            analytics: store.clone(),
            orders: OrderService::new(store.clone(), store.clone(), config.orders.clone()),
            users: UserService::new(store, jwt.clone(), mail),
            jwt,
        }
    }
}
