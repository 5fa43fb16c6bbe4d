use std::collections::{BTreeSet, HashMap};
use std::fs;
use std::path::Path;
use std::sync::Arc;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use parking_lot::RwLock;
use redb::{
    CommitError, Database, DatabaseError, ReadableTable, StorageError, TableDefinition,
    TableError, TransactionError,
};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::cache::TrackCache;
use crate::filter::FilterSpec;
use crate::order::SortKey;
use crate::paging::{validate_page_size, DEFAULT_PAGE_SIZE};
use crate::CollectionError;

pub const SETTINGS_KEY: &str = "multigenre-settings";
pub const SETTINGS_RETENTION: Duration = Duration::from_secs(60 * 60 * 24 * 365);

const SETTINGS_TABLE: TableDefinition<&str, &[u8]> = TableDefinition::new("settings");

/// Durable browsing state: what is selected, filtered, sorted and paged.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ViewSettings {
    pub selected_genres: BTreeSet<String>,
    pub genres_visible: bool,
    pub filter: FilterSpec,
    pub page_size: usize,
    pub page: usize,
    pub order: Vec<SortKey>,
}

impl Default for ViewSettings {
    fn default() -> Self {
        Self {
            selected_genres: BTreeSet::new(),
            genres_visible: false,
            filter: FilterSpec::default(),
            page_size: DEFAULT_PAGE_SIZE,
            page: 0,
            order: Vec::new(),
        }
    }
}

impl ViewSettings {
    pub fn validate(&self) -> Result<(), CollectionError> {
        validate_page_size(self.page_size)
    }

    /// Applies a change to the filter or sort stack and rewinds to page 0.
    ///
    /// Leaving a page other than the first asks `confirm` first; a refusal
    /// leaves the settings untouched and returns `false`.
    pub fn restructure<C, F>(&mut self, confirm: C, prompt: &str, change: F) -> bool
    where
        C: FnOnce(&str) -> bool,
        F: FnOnce(&mut ViewSettings),
    {
        if self.page > 0 && !confirm(prompt) {
            debug!("Settings change declined on page {}", self.page);
            return false;
        }
        change(self);
        self.page = 0;
        true
    }

    pub fn to_json(&self) -> Result<String, SettingsError> {
        Ok(serde_json::to_string(self)?)
    }
}

/// Key-value port the settings are persisted through.
pub trait SettingsBackend: Send + Sync {
    fn read(&self, key: &str) -> Result<Option<Vec<u8>>, SettingsError>;
    fn write(&self, key: &str, value: &[u8]) -> Result<(), SettingsError>;
    fn remove(&self, key: &str) -> Result<(), SettingsError>;
}

#[derive(Default)]
pub struct MemoryBackend {
    entries: RwLock<HashMap<String, Vec<u8>>>,
}

impl MemoryBackend {
    pub fn new() -> Self {
        Self::default()
    }
}

impl SettingsBackend for MemoryBackend {
    fn read(&self, key: &str) -> Result<Option<Vec<u8>>, SettingsError> {
        Ok(self.entries.read().get(key).cloned())
    }

    fn write(&self, key: &str, value: &[u8]) -> Result<(), SettingsError> {
        self.entries.write().insert(key.to_string(), value.to_vec());
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<(), SettingsError> {
        self.entries.write().remove(key);
        Ok(())
    }
}

#[derive(Clone)]
pub struct RedbBackend {
    db: Arc<Database>,
}

impl RedbBackend {
    pub fn new(db: Arc<Database>) -> Self {
        Self { db }
    }

    pub fn open(path: &Path) -> Result<Self, SettingsError> {
        let backend = Self::new(Arc::new(open_or_create_db(path)?));
        backend.init_tables()?;
        Ok(backend)
    }

    pub fn init_tables(&self) -> Result<(), SettingsError> {
        let write_txn = self.db.begin_write()?;
        {
            let _ = write_txn.open_table(SETTINGS_TABLE)?;
        }
        write_txn.commit()?;
        Ok(())
    }
}

impl SettingsBackend for RedbBackend {
    fn read(&self, key: &str) -> Result<Option<Vec<u8>>, SettingsError> {
        let read_txn = self.db.begin_read()?;
        let table = match read_txn.open_table(SETTINGS_TABLE) {
            Ok(table) => table,
            Err(TableError::TableDoesNotExist(_)) => return Ok(None),
            Err(err) => return Err(err.into()),
        };
        let value = table.get(key)?.map(|value| value.value().to_vec());
        Ok(value)
    }

    fn write(&self, key: &str, value: &[u8]) -> Result<(), SettingsError> {
        let write_txn = self.db.begin_write()?;
        {
            let mut table = write_txn.open_table(SETTINGS_TABLE)?;
            table.insert(key, value)?;
        }
        write_txn.commit()?;
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<(), SettingsError> {
        let write_txn = self.db.begin_write()?;
        {
            let mut table = write_txn.open_table(SETTINGS_TABLE)?;
            table.remove(key)?;
        }
        write_txn.commit()?;
        Ok(())
    }
}

#[derive(Clone, Debug, Serialize, Deserialize)]
struct StoredSettings {
    json: String,
    expires_at: u64,
}

/// Loads and saves [`ViewSettings`] under one fixed key.
#[derive(Clone)]
pub struct SettingsStore {
    backend: Arc<dyn SettingsBackend>,
    retention: Duration,
}

impl SettingsStore {
    pub fn new(backend: Arc<dyn SettingsBackend>) -> Self {
        Self {
            backend,
            retention: SETTINGS_RETENTION,
        }
    }

    pub fn in_memory() -> Self {
        Self::new(Arc::new(MemoryBackend::new()))
    }

    /// Scan cache kept in the same backend as the settings.
    pub fn track_cache(&self) -> TrackCache {
        TrackCache::new(Arc::clone(&self.backend))
    }

    /// Stored settings, or the defaults when nothing live is stored.
    pub fn load(&self) -> Result<ViewSettings, CollectionError> {
        let Some(json) = self.stored_json()? else {
            debug!("No stored settings; using defaults");
            return Ok(ViewSettings::default());
        };
        let settings: ViewSettings = serde_json::from_str(&json).map_err(|err| {
            CollectionError::configuration(format!("stored settings are invalid: {}", err))
        })?;
        settings.validate()?;
        Ok(settings)
    }

    /// Overwrites the stored settings and restarts the retention window.
    pub fn save(&self, settings: &ViewSettings) -> Result<(), CollectionError> {
        settings.validate()?;
        let stored = StoredSettings {
            json: settings.to_json()?,
            expires_at: now_secs().saturating_add(self.retention.as_secs()),
        };
        let bytes = encode_value(&stored)?;
        self.backend.write(SETTINGS_KEY, &bytes)?;
        debug!("Saved settings ({} bytes)", stored.json.len());
        Ok(())
    }

    /// The live JSON exactly as stored.
    pub fn stored_json(&self) -> Result<Option<String>, SettingsError> {
        let Some(bytes) = self.backend.read(SETTINGS_KEY)? else {
            return Ok(None);
        };
        let stored: StoredSettings = decode_value(&bytes)?;
        if stored.expires_at <= now_secs() {
            info!("Stored settings expired; ignoring them");
            return Ok(None);
        }
        Ok(Some(stored.json))
    }
}

pub fn open_or_create_db(path: &Path) -> Result<Database, SettingsError> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)?;
        }
    }
    if path.exists() {
        Ok(Database::open(path)?)
    } else {
        Ok(Database::create(path)?)
    }
}

#[derive(Debug)]
pub enum SettingsError {
    Io(std::io::Error),
    Database(DatabaseError),
    Table(TableError),
    Transaction(TransactionError),
    Storage(StorageError),
    Commit(CommitError),
    Bincode(Box<bincode::ErrorKind>),
    Json(serde_json::Error),
}

impl From<std::io::Error> for SettingsError {
    fn from(err: std::io::Error) -> Self {
        SettingsError::Io(err)
    }
}

impl From<DatabaseError> for SettingsError {
    fn from(err: DatabaseError) -> Self {
        SettingsError::Database(err)
    }
}

impl From<TableError> for SettingsError {
    fn from(err: TableError) -> Self {
        SettingsError::Table(err)
    }
}

impl From<TransactionError> for SettingsError {
    fn from(err: TransactionError) -> Self {
        SettingsError::Transaction(err)
    }
}

impl From<StorageError> for SettingsError {
    fn from(err: StorageError) -> Self {
        SettingsError::Storage(err)
    }
}

impl From<CommitError> for SettingsError {
    fn from(err: CommitError) -> Self {
        SettingsError::Commit(err)
    }
}

impl From<Box<bincode::ErrorKind>> for SettingsError {
    fn from(err: Box<bincode::ErrorKind>) -> Self {
        SettingsError::Bincode(err)
    }
}

impl From<serde_json::Error> for SettingsError {
    fn from(err: serde_json::Error) -> Self {
        SettingsError::Json(err)
    }
}

impl std::fmt::Display for SettingsError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SettingsError::Io(err) => write!(f, "io error: {}", err),
            SettingsError::Database(err) => write!(f, "redb database error: {}", err),
            SettingsError::Table(err) => write!(f, "redb table error: {}", err),
            SettingsError::Transaction(err) => write!(f, "redb transaction error: {}", err),
            SettingsError::Storage(err) => write!(f, "redb storage error: {}", err),
            SettingsError::Commit(err) => write!(f, "redb commit error: {}", err),
            SettingsError::Bincode(err) => write!(f, "bincode error: {}", err),
            SettingsError::Json(err) => write!(f, "json error: {}", err),
        }
    }
}

impl std::error::Error for SettingsError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            SettingsError::Io(err) => Some(err),
            SettingsError::Database(err) => Some(err),
            SettingsError::Table(err) => Some(err),
            SettingsError::Transaction(err) => Some(err),
            SettingsError::Storage(err) => Some(err),
            SettingsError::Commit(err) => Some(err),
            SettingsError::Bincode(err) => Some(err),
            SettingsError::Json(err) => Some(err),
        }
    }
}

fn encode_value<T: Serialize>(value: &T) -> Result<Vec<u8>, SettingsError> {
    Ok(bincode::serialize(value)?)
}

fn decode_value<T: for<'de> Deserialize<'de>>(bytes: &[u8]) -> Result<T, SettingsError> {
    Ok(bincode::deserialize(bytes)?)
}

fn now_secs() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|value| value.as_secs())
        .unwrap_or(0)
}
