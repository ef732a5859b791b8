//! Screens on disk, one pretty-printed JSON file per screen key.
//!
//! Keys map to file names reversibly: ASCII letters, digits, `-` and `_` are
//! kept and every other byte is written as `%XX`. A save writes a `.partial`
//! sibling and renames it over the screen file, so an interrupted save leaves
//! the previous screen readable.

use super::{BoxFuture, Storage, StorageError, StorageResult};
use crate::screen::Screen;
use std::fmt::Write as _;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

const SCREEN_SUFFIX: &str = ".json";
const PARTIAL_EXTENSION: &str = "json.partial";

/// Stores screens as JSON files in one directory.
pub struct FileStorage {
    dir: PathBuf,
}

impl FileStorage {
    /// Open storage in `dir`, creating the directory if needed.
    pub fn new(dir: impl Into<PathBuf>) -> StorageResult<Self> {
        let dir = dir.into();
        fs::create_dir_all(&dir).map_err(|e| io_error("create", &dir, e))?;
        Ok(Self { dir })
    }

    /// Storage under the platform data directory
    /// (e.g. `~/.local/share/dmscreen/screens/` on Linux).
    pub fn default_location() -> StorageResult<Self> {
        let base = dirs::data_local_dir()
            .or_else(dirs::home_dir)
            .ok_or_else(|| StorageError::Io("Could not determine data directory".to_string()))?;
        Self::new(base.join("dmscreen").join("screens"))
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// File a screen key is stored in.
    pub fn path_for(&self, key: &str) -> StorageResult<PathBuf> {
        if key.is_empty() {
            return Err(StorageError::InvalidKey(key.to_string()));
        }
        Ok(self.dir.join(format!("{}{}", encode_key(key), SCREEN_SUFFIX)))
    }

    fn write_screen(&self, key: &str, json: &str) -> StorageResult<()> {
        let path = self.path_for(key)?;
        let partial = path.with_extension(PARTIAL_EXTENSION);
        fs::write(&partial, json).map_err(|e| io_error("write", &partial, e))?;
        if let Err(e) = fs::rename(&partial, &path) {
            let _ = fs::remove_file(&partial);
            return Err(io_error("replace", &path, e));
        }
        log::debug!("Wrote screen '{}' to {}", key, path.display());
        Ok(())
    }

    fn read_screen(&self, key: &str) -> StorageResult<Screen> {
        let path = self.path_for(key)?;
        let json = match fs::read_to_string(&path) {
            Ok(json) => json,
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                return Err(StorageError::NotFound(key.to_string()));
            }
            Err(e) => return Err(io_error("read", &path, e)),
        };
        Screen::from_json(&json).map_err(|e| {
            StorageError::Serialization(format!("Failed to parse {}: {}", path.display(), e))
        })
    }

    fn remove_screen(&self, key: &str) -> StorageResult<()> {
        let path = self.path_for(key)?;
        match fs::remove_file(&path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(io_error("delete", &path, e)),
        }
    }

    fn screen_keys(&self) -> StorageResult<Vec<String>> {
        let entries = fs::read_dir(&self.dir).map_err(|e| io_error("list", &self.dir, e))?;
        let mut keys: Vec<String> = entries
            .flatten()
            .filter(|entry| entry.path().is_file())
            .filter_map(|entry| {
                let name = entry.file_name().into_string().ok()?;
                let key = decode_key(name.strip_suffix(SCREEN_SUFFIX)?);
                if key.is_none() {
                    log::debug!("Ignoring unrecognized file {}", name);
                }
                key
            })
            .collect();
        keys.sort();
        Ok(keys)
    }
}

impl Storage for FileStorage {
    fn save(&self, key: &str, screen: &Screen) -> BoxFuture<'_, StorageResult<()>> {
        let key = key.to_string();
        let json = screen.to_json();
        Box::pin(async move {
            let json = json.map_err(|e| StorageError::Serialization(e.to_string()))?;
            self.write_screen(&key, &json)
        })
    }

    fn load(&self, key: &str) -> BoxFuture<'_, StorageResult<Screen>> {
        let key = key.to_string();
        Box::pin(async move { self.read_screen(&key) })
    }

    fn delete(&self, key: &str) -> BoxFuture<'_, StorageResult<()>> {
        let key = key.to_string();
        Box::pin(async move { self.remove_screen(&key) })
    }

    fn list(&self) -> BoxFuture<'_, StorageResult<Vec<String>>> {
        Box::pin(async move { self.screen_keys() })
    }

    fn exists(&self, key: &str) -> BoxFuture<'_, StorageResult<bool>> {
        let path = self.path_for(key);
        Box::pin(async move { Ok(path?.is_file()) })
    }
}

fn io_error(action: &str, path: &Path, err: io::Error) -> StorageError {
    StorageError::Io(format!("Failed to {} {}: {}", action, path.display(), err))
}

fn is_plain(byte: u8) -> bool {
    byte.is_ascii_alphanumeric() || byte == b'-' || byte == b'_'
}

/// File stem for a screen key.
fn encode_key(key: &str) -> String {
    let mut stem = String::with_capacity(key.len());
    for byte in key.bytes() {
        if is_plain(byte) {
            stem.push(byte as char);
        } else {
            let _ = write!(stem, "%{:02X}", byte);
        }
    }
    stem
}

/// Screen key for a file stem, or `None` if the stem was not produced by
/// [`encode_key`].
fn decode_key(stem: &str) -> Option<String> {
    let mut bytes = Vec::with_capacity(stem.len());
    let mut rest = stem.as_bytes();
    while let Some((&byte, tail)) = rest.split_first() {
        if byte == b'%' {
            let hex = std::str::from_utf8(tail.get(..2)?).ok()?;
            bytes.push(u8::from_str_radix(hex, 16).ok()?);
            rest = &tail[2..];
        } else if is_plain(byte) {
            bytes.push(byte);
            rest = tail;
        } else {
            return None;
        }
    }
    if bytes.is_empty() {
        return None;
    }
    String::from_utf8(bytes).ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::widget::{WidgetKind, create_default_widget};
    use pollster::block_on;
    use tempfile::tempdir;

    fn storage() -> (tempfile::TempDir, FileStorage) {
        let dir = tempdir().unwrap();
        let storage = FileStorage::new(dir.path()).unwrap();
        (dir, storage)
    }

    #[test]
    fn test_save_load() {
        let (_dir, storage) = storage();
        let mut screen = Screen::new();
        screen.grid_size = 42;
        screen.widgets.push(create_default_widget(WidgetKind::Character));

        block_on(storage.save("session-1", &screen)).unwrap();
        let loaded = block_on(storage.load("session-1")).unwrap();
        assert_eq!(loaded, screen);
    }

    #[test]
    fn test_save_overwrites_and_leaves_no_partial_file() {
        let (dir, storage) = storage();
        let mut screen = Screen::new();
        block_on(storage.save("party", &screen)).unwrap();
        screen.grid_size = 12;
        block_on(storage.save("party", &screen)).unwrap();

        assert_eq!(block_on(storage.load("party")).unwrap().grid_size, 12);
        let names: Vec<_> = fs::read_dir(dir.path())
            .unwrap()
            .map(|e| e.unwrap().file_name())
            .collect();
        assert_eq!(names, vec!["party.json"]);
    }

    #[test]
    fn test_stale_partial_file_is_ignored() {
        let (dir, storage) = storage();
        let mut screen = Screen::new();
        screen.grid_size = 20;
        block_on(storage.save("party", &screen)).unwrap();
        fs::write(dir.path().join("party.json.partial"), "{ half writ").unwrap();

        assert_eq!(block_on(storage.load("party")).unwrap().grid_size, 20);
        assert_eq!(block_on(storage.list()).unwrap(), vec!["party".to_string()]);
    }

    #[test]
    fn test_not_found() {
        let (_dir, storage) = storage();
        let result = block_on(storage.load("nonexistent"));
        assert!(matches!(result, Err(StorageError::NotFound(key)) if key == "nonexistent"));
    }

    #[test]
    fn test_corrupt_file_is_serialization_error() {
        let (dir, storage) = storage();
        fs::write(dir.path().join("broken.json"), "{ not json").unwrap();

        let result = block_on(storage.load("broken"));
        assert!(matches!(result, Err(StorageError::Serialization(_))));
    }

    #[test]
    fn test_list_returns_original_keys() {
        let (dir, storage) = storage();
        let screen = Screen::new();
        block_on(storage.save("Session 2: Goblins", &screen)).unwrap();
        block_on(storage.save("../villains", &screen)).unwrap();
        block_on(storage.save("dm-screen-storage", &screen)).unwrap();
        fs::write(dir.path().join("notes.txt"), "ignored").unwrap();
        fs::write(dir.path().join("not a key.json"), "{}").unwrap();

        let list = block_on(storage.list()).unwrap();
        assert_eq!(list, vec!["../villains", "Session 2: Goblins", "dm-screen-storage"]);
        assert!(dir.path().join("%2E%2E%2Fvillains.json").exists());
    }

    #[test]
    fn test_delete() {
        let (_dir, storage) = storage();
        block_on(storage.save("test", &Screen::new())).unwrap();
        assert!(block_on(storage.exists("test")).unwrap());

        block_on(storage.delete("test")).unwrap();
        assert!(!block_on(storage.exists("test")).unwrap());
        block_on(storage.delete("test")).unwrap();
    }

    #[test]
    fn test_empty_key_rejected() {
        let (_dir, storage) = storage();
        let result = block_on(storage.save("", &Screen::new()));
        assert!(matches!(result, Err(StorageError::InvalidKey(_))));
        assert!(block_on(storage.exists("")).is_err());
    }

    #[test]
    fn test_key_encoding() {
        assert_eq!(encode_key("dm-screen_1"), "dm-screen_1");
        assert_eq!(encode_key("a b/é"), "a%20b%2F%C3%A9");
        assert_eq!(decode_key("a%20b%2F%C3%A9").as_deref(), Some("a b/é"));
        assert_eq!(decode_key("bad%2"), None);
        assert_eq!(decode_key("has space"), None);
        assert_eq!(decode_key(""), None);
    }
}
