//! Debounced automatic persistence of the screen.
//!
//! The manager never sits on the input path. The host calls
//! [`AutoSaveManager::observe`] with the store's revision after handling
//! events, and [`AutoSaveManager::maybe_save`] whenever it has time. A save
//! happens only when the store's revision differs from the one last written
//! or loaded, and the debounce interval has passed since the last save.

use crate::screen::Screen;
use crate::storage::{FileStorage, Storage, StorageError, StorageResult};
use crate::store::ScreenStore;
use std::sync::Arc;
use std::time::{Duration, Instant};

/// Default debounce interval between saves, in milliseconds.
pub const DEFAULT_AUTOSAVE_INTERVAL_MS: u64 = 250;

/// Storage key for the screen when none is configured.
pub const DEFAULT_SCREEN_KEY: &str = "dm-screen-storage";

/// Tracks unsaved changes and writes the screen to storage.
pub struct AutoSaveManager<S: Storage> {
    storage: Arc<S>,
    interval: Duration,
    last_save: Option<Instant>,
    dirty: bool,
    /// Store revision matching what storage holds.
    saved_revision: u64,
    screen_key: String,
}

impl<S: Storage> AutoSaveManager<S> {
    /// A manager whose baseline is revision 0, the revision of a freshly
    /// created or loaded [`ScreenStore`].
    pub fn new(storage: Arc<S>) -> Self {
        Self {
            storage,
            interval: Duration::from_millis(DEFAULT_AUTOSAVE_INTERVAL_MS),
            last_save: None,
            dirty: false,
            saved_revision: 0,
            screen_key: DEFAULT_SCREEN_KEY.to_string(),
        }
    }

    pub fn set_interval(&mut self, interval: Duration) {
        self.interval = interval;
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    pub fn set_screen_key(&mut self, key: impl Into<String>) {
        self.screen_key = key.into();
    }

    pub fn screen_key(&self) -> &str {
        &self.screen_key
    }

    /// Declare that storage already matches the store at `revision`.
    ///
    /// Needed when attaching to a store that was mutated before the manager
    /// existed, e.g. after [`ScreenStore::replace_screen`].
    pub fn set_baseline(&mut self, revision: u64) {
        self.saved_revision = revision;
        self.dirty = false;
    }

    pub fn saved_revision(&self) -> u64 {
        self.saved_revision
    }

    pub fn mark_dirty(&mut self) {
        self.dirty = true;
    }

    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    /// Record the store's revision. Any revision other than the saved one
    /// marks the screen dirty.
    pub fn observe(&mut self, revision: u64) {
        if revision != self.saved_revision {
            self.dirty = true;
        }
    }

    /// Whether a save is due: dirty, and the interval has elapsed since the last save.
    pub fn should_save(&self) -> bool {
        if !self.dirty {
            return false;
        }
        match self.last_save {
            Some(last) => last.elapsed() >= self.interval,
            None => true,
        }
    }

    /// Observe the store and save if a save is due. Returns true if it saved.
    pub async fn maybe_save(&mut self, store: &ScreenStore) -> StorageResult<bool> {
        self.observe(store.revision());
        if !self.should_save() {
            return Ok(false);
        }
        self.save(store).await?;
        Ok(true)
    }

    /// Save immediately, regardless of the interval.
    pub async fn save(&mut self, store: &ScreenStore) -> StorageResult<()> {
        self.storage.save(&self.screen_key, store.screen()).await?;
        log::debug!(
            "Auto-saved screen '{}' at revision {}",
            self.screen_key,
            store.revision()
        );
        self.last_save = Some(Instant::now());
        self.saved_revision = store.revision();
        self.dirty = false;
        Ok(())
    }

    /// Load the configured screen. The baseline resets to revision 0, so wrap
    /// the result in a new store with [`ScreenStore::from_screen`].
    pub async fn load(&mut self) -> StorageResult<Screen> {
        let screen = self.storage.load(&self.screen_key).await?;
        self.set_baseline(0);
        self.last_save = Some(Instant::now());
        Ok(screen)
    }

    /// Load the configured screen, or an empty default screen if none is stored.
    pub async fn load_or_default(&mut self) -> StorageResult<Screen> {
        match self.load().await {
            Ok(screen) => Ok(screen),
            Err(StorageError::NotFound(key)) => {
                log::info!("No saved screen '{}'; starting fresh", key);
                self.set_baseline(0);
                Ok(Screen::default())
            }
            Err(err) => Err(err),
        }
    }

    pub fn storage(&self) -> &Arc<S> {
        &self.storage
    }
}

/// File storage in the platform data directory.
pub fn create_default_storage() -> StorageResult<Arc<FileStorage>> {
    Ok(Arc::new(FileStorage::default_location()?))
}

/// Auto-save manager over [`create_default_storage`].
pub fn create_autosave_manager() -> StorageResult<AutoSaveManager<FileStorage>> {
    Ok(AutoSaveManager::new(create_default_storage()?))
}
