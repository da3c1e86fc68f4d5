use crate::errors::StorageError;
use crate::models::{AppData, DailyGoals, DailyLedger};
use axum::async_trait;
use std::path::{Path, PathBuf};
use tokio::fs;
use tracing::{debug, error};

#[async_trait]
pub trait LedgerRepository: Send + Sync {
    /// The stored ledger for `date_key`, or a fresh empty one.
    async fn load_ledger(&self, date_key: &str) -> DailyLedger;
    /// Replaces whatever was stored under the ledger's date.
    async fn save_ledger(&mut self, ledger: &DailyLedger) -> Result<(), StorageError>;
}

#[async_trait]
pub trait GoalRepository: Send + Sync {
    /// `None` until goals have been saved once.
    async fn load_goals(&self) -> Option<DailyGoals>;
    async fn save_goals(&mut self, goals: &DailyGoals) -> Result<(), StorageError>;
}

/// Keeps the whole state document in memory and rewrites the file on every save.
pub struct JsonFileStore {
    path: PathBuf,
    data: AppData,
}

impl JsonFileStore {
    pub async fn open(path: PathBuf) -> Self {
        let data = load_data(&path).await;
        Self { path, data }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Writes `next` and adopts it only once it is on disk, so a failed
    /// write leaves the previous document in place.
    async fn commit(&mut self, next: AppData) -> Result<(), StorageError> {
        persist_data(&self.path, &next).await.inspect_err(|err| {
            error!(path = %self.path.display(), "failed to persist state: {err}");
        })?;
        self.data = next;
        Ok(())
    }
}

#[async_trait]
impl LedgerRepository for JsonFileStore {
    async fn load_ledger(&self, date_key: &str) -> DailyLedger {
        self.data
            .days
            .get(date_key)
            .cloned()
            .unwrap_or_else(|| DailyLedger::empty(date_key))
    }

    async fn save_ledger(&mut self, ledger: &DailyLedger) -> Result<(), StorageError> {
        let mut next = self.data.clone();
        next.days.insert(ledger.date.clone(), ledger.clone());
        self.commit(next).await
    }
}

#[async_trait]
impl GoalRepository for JsonFileStore {
    async fn load_goals(&self) -> Option<DailyGoals> {
        self.data.goals
    }

    async fn save_goals(&mut self, goals: &DailyGoals) -> Result<(), StorageError> {
        let next = AppData {
            goals: Some(*goals),
            ..self.data.clone()
        };
        self.commit(next).await
    }
}

/// Volatile store, used where nothing should touch the disk.
#[derive(Debug, Default)]
pub struct MemoryStore {
    data: AppData,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    #[cfg(test)]
    pub(crate) fn data(&self) -> &AppData {
        &self.data
    }
}

#[async_trait]
impl LedgerRepository for MemoryStore {
    async fn load_ledger(&self, date_key: &str) -> DailyLedger {
        self.data
            .days
            .get(date_key)
            .cloned()
            .unwrap_or_else(|| DailyLedger::empty(date_key))
    }

    async fn save_ledger(&mut self, ledger: &DailyLedger) -> Result<(), StorageError> {
        self.data.days.insert(ledger.date.clone(), ledger.clone());
        Ok(())
    }
}

#[async_trait]
impl GoalRepository for MemoryStore {
    async fn load_goals(&self) -> Option<DailyGoals> {
        self.data.goals
    }

    async fn save_goals(&mut self, goals: &DailyGoals) -> Result<(), StorageError> {
        self.data.goals = Some(*goals);
        Ok(())
    }
}

pub async fn load_data(path: &Path) -> AppData {
    match fs::read(path).await {
        Ok(bytes) => match serde_json::from_slice(&bytes) {
            Ok(data) => data,
            Err(err) => {
                error!("failed to parse data file: {err}");
                AppData::default()
            }
        },
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
            debug!(path = %path.display(), "no data file yet");
            AppData::default()
        }
        Err(err) => {
            error!("failed to read data file: {err}");
            AppData::default()
        }
    }
}

pub async fn persist_data(path: &Path, data: &AppData) -> Result<(), StorageError> {
    let payload = serde_json::to_vec_pretty(data)?;
    fs::write(path, payload).await?;
    Ok(())
}
