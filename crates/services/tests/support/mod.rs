#![allow(dead_code)]

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use course_core::model::Module;
use services::{PlaybackControl, PlaybackControlError};
use storage::builtin::BuiltinCatalog;
use storage::repository::{CatalogSource, InMemoryRepository, KeyValueStore, Storage, StorageError};
use tokio::time::Instant;

/// Key-value store that records every write with its (paused) timestamp.
pub struct RecordingStore {
    inner: InMemoryRepository,
    started: Instant,
    read_delay: Duration,
    pub writes: Mutex<Vec<(Duration, String, Vec<u8>)>>,
}

impl RecordingStore {
    pub fn new() -> Arc<Self> {
        Self::with_read_delay(Duration::ZERO)
    }

    pub fn with_read_delay(read_delay: Duration) -> Arc<Self> {
        Arc::new(Self {
            inner: InMemoryRepository::new(),
            started: Instant::now(),
            read_delay,
            writes: Mutex::new(Vec::new()),
        })
    }

    pub fn writes_to(&self, key: &str) -> Vec<(Duration, Vec<u8>)> {
        self.writes
            .lock()
            .unwrap()
            .iter()
            .filter(|(_, k, _)| k == key)
            .map(|(at, _, bytes)| (*at, bytes.clone()))
            .collect()
    }

    pub async fn preload(&self, key: &str, bytes: &[u8]) {
        self.inner.set(key, bytes).await.unwrap();
    }
}

#[async_trait]
impl KeyValueStore for RecordingStore {
    async fn get(&self, key: &str) -> Result<Option<Vec<u8>>, StorageError> {
        if !self.read_delay.is_zero() {
            tokio::time::sleep(self.read_delay).await;
        }
        self.inner.get(key).await
    }

    async fn set(&self, key: &str, value: &[u8]) -> Result<(), StorageError> {
        self.writes
            .lock()
            .unwrap()
            .push((self.started.elapsed(), key.to_owned(), value.to_vec()));
        self.inner.set(key, value).await
    }

    async fn remove(&self, key: &str) -> Result<(), StorageError> {
        self.inner.remove(key).await
    }
}

pub struct OfflineCatalog;

#[async_trait]
impl CatalogSource for OfflineCatalog {
    async fn fetch_modules(&self) -> Result<Vec<Module>, StorageError> {
        Err(StorageError::Connection("offline".into()))
    }
}

pub fn storage_over(kv: &Arc<RecordingStore>) -> Storage {
    let kv: Arc<dyn KeyValueStore> = kv.clone();
    let catalog: Arc<dyn CatalogSource> = Arc::new(BuiltinCatalog);
    Storage { kv, catalog }
}

/// Player double whose position is set by the test.
#[derive(Default)]
pub struct ScriptedPlayer {
    position: Mutex<f64>,
    failing: AtomicBool,
    pub calls: Mutex<Vec<String>>,
}

impl ScriptedPlayer {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn set_position(&self, seconds: f64) {
        *self.position.lock().unwrap() = seconds;
    }

    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    fn call(&self, name: String) -> Result<(), PlaybackControlError> {
        if self.failing.load(Ordering::SeqCst) {
            return Err(PlaybackControlError::Failed {
                operation: "respond",
                reason: "player crashed".into(),
            });
        }
        self.calls.lock().unwrap().push(name);
        Ok(())
    }
}

#[async_trait]
impl PlaybackControl for ScriptedPlayer {
    async fn play(&self) -> Result<(), PlaybackControlError> {
        self.call("play".into())
    }

    async fn pause(&self) -> Result<(), PlaybackControlError> {
        self.call("pause".into())
    }

    async fn seek_to(&self, seconds: f64) -> Result<(), PlaybackControlError> {
        self.call(format!("seek {seconds}"))?;
        self.set_position(seconds);
        Ok(())
    }

    async fn current_time(&self) -> Result<f64, PlaybackControlError> {
        if self.failing.load(Ordering::SeqCst) {
            return Err(PlaybackControlError::Unavailable);
        }
        Ok(*self.position.lock().unwrap())
    }

    async fn set_volume(&self, level: f32) -> Result<(), PlaybackControlError> {
        self.call(format!("volume {level}"))
    }
}
