use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::model::{HistoryEntry, Id};

const STORE_DIR: &str = "crease_terminal";
const STORE_FILE: &str = "store.json";
const STORE_VERSION: u32 = 1;

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
struct StoreFile {
    version: u32,
    #[serde(default)]
    progress: HashMap<String, Value>,
    #[serde(default)]
    meta: HashMap<String, Value>,
    #[serde(default)]
    history: Vec<HistoryEntry>,
}

/// Teams and elevens chosen at match setup, kept so the live view can come
/// back without a round trip.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MatchMeta {
    pub team_a: Id,
    pub team_b: Id,
    pub team_a_name: String,
    pub team_b_name: String,
    pub batting_first: Id,
    #[serde(default)]
    pub team_a_eleven: Vec<Id>,
    #[serde(default)]
    pub team_b_eleven: Vec<Id>,
}

/// Best-effort key-value store for per-match client state. Every failure
/// reads as "nothing stored"; nothing here returns an error.
#[derive(Debug, Clone)]
pub struct LocalStore {
    path: Option<PathBuf>,
}

impl LocalStore {
    pub fn at(path: impl Into<PathBuf>) -> Self {
        Self {
            path: Some(path.into()),
        }
    }

    pub fn default_location() -> Self {
        Self { path: store_path() }
    }

    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    /// Merges the top-level fields of `partial` into the stored progress
    /// record for `match_id`. Fields absent from `partial` are kept.
    pub fn save<T: Serialize>(&self, match_id: Id, partial: &T) {
        let Ok(patch) = serde_json::to_value(partial) else {
            return;
        };
        self.update(|file| {
            let slot = file
                .progress
                .entry(match_id.to_string())
                .or_insert(Value::Null);
            merge_value(slot, patch);
        });
    }

    pub fn load<T: DeserializeOwned>(&self, match_id: Id) -> Option<T> {
        let file = self.read()?;
        let raw = file.progress.get(&match_id.to_string())?.clone();
        serde_json::from_value(raw).ok()
    }

    pub fn clear(&self, match_id: Id) {
        self.update(|file| {
            file.progress.remove(&match_id.to_string());
        });
    }

    pub fn save_meta(&self, match_id: Id, meta: &MatchMeta) {
        let Ok(value) = serde_json::to_value(meta) else {
            return;
        };
        self.update(|file| {
            file.meta.insert(match_id.to_string(), value);
        });
    }

    pub fn load_meta(&self, match_id: Id) -> Option<MatchMeta> {
        let file = self.read()?;
        let raw = file.meta.get(&match_id.to_string())?.clone();
        serde_json::from_value(raw).ok()
    }

    /// Match history, newest first.
    pub fn history(&self) -> Vec<HistoryEntry> {
        let mut entries = self.read().map(|file| file.history).unwrap_or_default();
        entries.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        entries
    }

    pub fn upsert_history(&self, entry: HistoryEntry) {
        self.update(|file| {
            if let Some(existing) = file.history.iter_mut().find(|e| e.id == entry.id) {
                *existing = entry;
            } else {
                file.history.push(entry);
            }
        });
    }

    pub fn mark_finished(&self, match_id: Id) {
        self.update(|file| {
            if let Some(entry) = file.history.iter_mut().find(|e| e.id == match_id) {
                entry.finished = true;
            }
        });
    }

    /// Drops every stored record, used after a backend data reset.
    pub fn wipe(&self) {
        self.update(|file| *file = StoreFile::default());
    }

    fn read(&self) -> Option<StoreFile> {
        let path = self.path.as_ref()?;
        let raw = fs::read_to_string(path).ok()?;
        let file = serde_json::from_str::<StoreFile>(&raw).ok()?;
        if file.version != STORE_VERSION {
            return None;
        }
        Some(file)
    }

    fn update(&self, edit: impl FnOnce(&mut StoreFile)) {
        let Some(path) = self.path.as_ref() else {
            return;
        };
        let mut file = self.read().unwrap_or_default();
        edit(&mut file);
        file.version = STORE_VERSION;
        let _ = write_store_file(path, &file);
    }
}

fn write_store_file(path: &Path, file: &StoreFile) -> std::io::Result<()> {
    if let Some(dir) = path.parent() {
        fs::create_dir_all(dir)?;
    }
    let json = serde_json::to_string(file)?;
    let tmp = path.with_extension("json.tmp");
    fs::write(&tmp, json)?;
    fs::rename(&tmp, path)
}

fn merge_value(slot: &mut Value, patch: Value) {
    if let (Some(existing), Value::Object(incoming)) = (slot.as_object_mut(), &patch) {
        for (key, value) in incoming {
            existing.insert(key.clone(), value.clone());
        }
        return;
    }
    *slot = patch;
}

pub fn app_data_dir() -> Option<PathBuf> {
    // Prefer XDG cache.
    if let Ok(base) = std::env::var("XDG_CACHE_HOME")
        && !base.trim().is_empty()
    {
        return Some(PathBuf::from(base).join(STORE_DIR));
    }
    let home = std::env::var("HOME").ok()?;
    if home.trim().is_empty() {
        return None;
    }
    Some(PathBuf::from(home).join(".cache").join(STORE_DIR))
}

fn store_path() -> Option<PathBuf> {
    app_data_dir().map(|dir| dir.join(STORE_FILE))
}
