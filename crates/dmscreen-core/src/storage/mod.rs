//! Storage abstraction for persisting screens.

mod autosave;
mod file;

pub use autosave::{
    AutoSaveManager, DEFAULT_AUTOSAVE_INTERVAL_MS, DEFAULT_SCREEN_KEY, create_autosave_manager,
    create_default_storage,
};
pub use file::FileStorage;

use crate::screen::Screen;
use std::future::Future;
use std::pin::Pin;
use thiserror::Error;

/// Storage errors.
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Screen not found: {0}")]
    NotFound(String),
    #[error("Serialization error: {0}")]
    Serialization(String),
    #[error("Invalid screen key: {0:?}")]
    InvalidKey(String),
    #[error("IO error: {0}")]
    Io(String),
}

/// Result type for storage operations.
pub type StorageResult<T> = Result<T, StorageError>;

/// Boxed future for async storage operations.
pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + 'a>>;

/// A backend that stores screens under string keys.
pub trait Storage: Send + Sync {
    /// Save a screen, replacing any existing one under `key`.
    fn save(&self, key: &str, screen: &Screen) -> BoxFuture<'_, StorageResult<()>>;

    /// Load a screen. Loaded screens are normalized.
    fn load(&self, key: &str) -> BoxFuture<'_, StorageResult<Screen>>;

    /// Delete a screen. Deleting a missing key is not an error.
    fn delete(&self, key: &str) -> BoxFuture<'_, StorageResult<()>>;

    /// List all stored keys.
    fn list(&self) -> BoxFuture<'_, StorageResult<Vec<String>>>;

    /// Check whether a key exists.
    fn exists(&self, key: &str) -> BoxFuture<'_, StorageResult<bool>>;
}
