//! Application state - shared across all handlers.

use std::sync::Arc;

use serde::Serialize;

use polls_core::PollService;
use polls_core::ports::{Clock, SystemClock};
use polls_infra::{DatabaseConfig, InMemoryPollStore};

/// Where questions and choices are stored.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum StorageBackend {
    Postgres,
    Memory,
}

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    pub polls: Arc<PollService>,
    pub storage: StorageBackend,
}

impl AppState {
    /// Build the application state, preferring PostgreSQL when configured.
    pub async fn new(db_config: Option<&DatabaseConfig>) -> Self {
        let clock: Arc<dyn Clock> = Arc::new(SystemClock);

        let state = match db_config {
            Some(config) => Self::postgres(config, clock.clone()).await,
            None => {
                tracing::warn!("DATABASE_URL not set. Running without database (in-memory mode).");
                None
            }
        };

        let state = state.unwrap_or_else(|| Self::in_memory(clock));
        tracing::info!(storage = ?state.storage, "Application state initialized");
        state
    }

    /// State backed by a fresh in-memory store.
    pub fn in_memory(clock: Arc<dyn Clock>) -> Self {
        let store = Arc::new(InMemoryPollStore::new());
        Self {
            polls: Arc::new(PollService::new(store.clone(), store, clock)),
            storage: StorageBackend::Memory,
        }
    }

    #[cfg(feature = "postgres")]
    async fn postgres(config: &DatabaseConfig, clock: Arc<dyn Clock>) -> Option<Self> {
        use polls_infra::{PostgresChoiceRepository, PostgresQuestionRepository};

        match polls_infra::database::connect(config).await {
            Ok(conn) => {
                let questions = Arc::new(PostgresQuestionRepository::new(conn.clone()));
                let choices = Arc::new(PostgresChoiceRepository::new(conn));
                Some(Self {
                    polls: Arc::new(PollService::new(questions, choices, clock)),
                    storage: StorageBackend::Postgres,
                })
            }
            Err(e) => {
                tracing::error!(
                    "Failed to connect to database: {}. Using in-memory fallback.",
                    e
                );
                None
            }
        }
    }

    #[cfg(not(feature = "postgres"))]
    async fn postgres(_config: &DatabaseConfig, _clock: Arc<dyn Clock>) -> Option<Self> {
        tracing::info!("Running without postgres feature - using in-memory repository");
        None
    }
}
