//! Opens the configured store and wires scheduler components to it.

use std::sync::Arc;

use groomdesk_config::AppConfig;
use groomdesk_core::appointment::AppointmentInterval;
use groomdesk_core::error::StoreError;
use groomdesk_core::service::DurationSample;
use groomdesk_core::store::{AppointmentSource, AuxiliaryHourStore, ServiceHistorySource};
use groomdesk_scheduler::{AuxiliaryPolicy, Reconciler};
use groomdesk_store::{InMemoryStore, SqliteStore, TravelTimeTable};
use tracing::info;

pub type CliResult<T = ()> = Result<T, Box<dyn std::error::Error>>;

pub fn load_config() -> CliResult<AppConfig> {
    Ok(AppConfig::load().map_err(|e| format!("Failed to load config: {e}"))?)
}

/// The store selected by `[store] backend`.
#[derive(Clone)]
pub enum Backend {
    Sqlite(SqliteStore),
    InMemory(InMemoryStore),
}

impl Backend {
    pub async fn open(config: &AppConfig) -> CliResult<Self> {
        match config.store.backend.as_str() {
            "in_memory" => {
                info!("Using in-memory store; nothing will be persisted");
                Ok(Self::InMemory(InMemoryStore::new()))
            }
            _ => {
                let path = config.database_path();
                if let Some(parent) = path.parent() {
                    std::fs::create_dir_all(parent)?;
                }
                let store = SqliteStore::new(&path.to_string_lossy()).await?;
                Ok(Self::Sqlite(store))
            }
        }
    }

    pub fn appointments(&self) -> Arc<dyn AppointmentSource> {
        match self {
            Self::Sqlite(s) => Arc::new(s.clone()),
            Self::InMemory(s) => Arc::new(s.clone()),
        }
    }

    pub fn auxiliary(&self) -> Arc<dyn AuxiliaryHourStore> {
        match self {
            Self::Sqlite(s) => Arc::new(s.clone()),
            Self::InMemory(s) => Arc::new(s.clone()),
        }
    }

    pub fn history(&self) -> Arc<dyn ServiceHistorySource> {
        match self {
            Self::Sqlite(s) => Arc::new(s.clone()),
            Self::InMemory(s) => Arc::new(s.clone()),
        }
    }

    pub async fn insert_appointment(
        &self,
        appointment: AppointmentInterval,
    ) -> Result<String, StoreError> {
        match self {
            Self::Sqlite(s) => s.upsert_appointment(appointment).await,
            Self::InMemory(s) => Ok(s.add_appointment(appointment).await),
        }
    }

    pub async fn record_sample(
        &self,
        subject: &str,
        service_kind: &str,
        sample: DurationSample,
    ) -> Result<(), StoreError> {
        match self {
            Self::Sqlite(s) => s.record_service_duration(subject, service_kind, &sample).await,
            Self::InMemory(s) => {
                s.record_service_duration(subject, service_kind, sample).await;
                Ok(())
            }
        }
    }

    pub async fn set_standard(&self, service_kind: &str, minutes: i64) -> Result<(), StoreError> {
        match self {
            Self::Sqlite(s) => s.set_standard_duration(service_kind, minutes).await,
            Self::InMemory(s) => {
                s.set_standard_duration(service_kind, minutes).await;
                Ok(())
            }
        }
    }

    /// A reconciler over this store with the configured travel table and policy.
    pub fn reconciler(&self, config: &AppConfig) -> CliResult<Reconciler> {
        let travel = TravelTimeTable::from_config(&config.travel_times)?;
        Ok(Reconciler::new(self.appointments(), self.auxiliary(), Arc::new(travel))
            .with_policy(AuxiliaryPolicy::from_config(&config.auxiliary)))
    }
}
