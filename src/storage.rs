use serde::Serialize;
use serde::de::DeserializeOwned;
use std::collections::{BTreeMap, BTreeSet};
use std::fs::{self, File};
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use thiserror::Error;

use crate::celebration::{Celebration, CelebrationSink};
use crate::types::{Recipe, UserProgress, truncate_note};

pub const FAVORITES_KEY: &str = "secret-sauce-favorites";
pub const COMPLETED_KEY: &str = "secret-sauce-completed";

pub fn ingredients_key(recipe_id: &str) -> String {
    format!("ingredients-{recipe_id}")
}

pub fn steps_key(recipe_id: &str) -> String {
    format!("steps-{recipe_id}")
}

pub fn notes_key(recipe_id: &str) -> String {
    format!("notes-{recipe_id}")
}

pub fn servings_key(recipe_id: &str) -> String {
    format!("servings-{recipe_id}")
}

#[derive(Error, Debug)]
pub enum StorageError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Durable string values addressed by key.
///
/// A successful `write` must be visible to a fresh store opened on the same
/// backing location. Writes to one key apply in call order.
pub trait KeyValueStore: Send + Sync {
    fn read(&self, key: &str) -> Result<Option<String>, StorageError>;
    fn write(&self, key: &str, value: &str) -> Result<(), StorageError>;
    fn remove(&self, key: &str) -> Result<(), StorageError>;
}

/// One JSON file per key inside a data directory.
pub struct FileStore {
    root: PathBuf,
    write_lock: Mutex<()>,
}

impl FileStore {
    pub fn open(root: impl Into<PathBuf>) -> Result<Self, StorageError> {
        let root = root.into();
        fs::create_dir_all(&root)?;
        Ok(Self {
            root,
            write_lock: Mutex::new(()),
        })
    }

    /// `~/.local/share/secret-sauce` on Linux, the platform equivalent elsewhere.
    pub fn default_root() -> PathBuf {
        dirs::data_local_dir()
            .or_else(dirs::home_dir)
            .unwrap_or_else(|| PathBuf::from("."))
            .join("secret-sauce")
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn path_for(&self, key: &str) -> PathBuf {
        self.root.join(format!("{}.json", file_stem(key)))
    }
}

/// Escapes a key into a file name: ASCII alphanumerics, `-` and `_` pass
/// through, every other byte becomes `%XX`.
fn file_stem(key: &str) -> String {
    let mut stem = String::with_capacity(key.len());
    for byte in key.bytes() {
        if byte.is_ascii_alphanumeric() || byte == b'-' || byte == b'_' {
            stem.push(byte as char);
        } else {
            stem.push_str(&format!("%{byte:02X}"));
        }
    }
    stem
}

impl KeyValueStore for FileStore {
    fn read(&self, key: &str) -> Result<Option<String>, StorageError> {
        match fs::read_to_string(self.path_for(key)) {
            Ok(contents) => Ok(Some(contents)),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    /// Writes through a temporary file and an atomic rename so a crash never
    /// leaves a half-written value behind.
    fn write(&self, key: &str, value: &str) -> Result<(), StorageError> {
        let _guard = self
            .write_lock
            .lock()
            .unwrap_or_else(PoisonError::into_inner);

        let path = self.path_for(key);
        let temp = path.with_extension("tmp");
        let mut f = File::create(&temp)?;
        f.write_all(value.as_bytes())?;
        f.sync_all()?;
        fs::rename(temp, &path)?;
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<(), StorageError> {
        let _guard = self
            .write_lock
            .lock()
            .unwrap_or_else(PoisonError::into_inner);

        match fs::remove_file(self.path_for(key)) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}

/// In-process store. Clones share the same map, so a clone behaves like a
/// second handle on the same device.
#[derive(Clone, Default)]
pub struct MemoryStore {
    entries: Arc<Mutex<BTreeMap<String, String>>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl KeyValueStore for MemoryStore {
    fn read(&self, key: &str) -> Result<Option<String>, StorageError> {
        let entries = self.entries.lock().unwrap_or_else(PoisonError::into_inner);
        Ok(entries.get(key).cloned())
    }

    fn write(&self, key: &str, value: &str) -> Result<(), StorageError> {
        let mut entries = self.entries.lock().unwrap_or_else(PoisonError::into_inner);
        entries.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<(), StorageError> {
        let mut entries = self.entries.lock().unwrap_or_else(PoisonError::into_inner);
        entries.remove(key);
        Ok(())
    }
}

/// Favorites and completions, the inputs of the achievement evaluator.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct UserSnapshot {
    pub favorites: BTreeSet<String>,
    pub completed: BTreeSet<String>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CompletionOutcome {
    Completed,
    AlreadyCompleted,
    /// Completion is only accepted once every step is checked.
    StepsRemaining(usize),
}

/// Typed access to the user's saved state.
///
/// Reads never fail: a missing or unreadable value comes back as its default.
/// Every mutation is written through to the backing store before returning.
/// Read-modify-write updates hold `update_lock` throughout, so concurrent
/// toggles on a shared store never lose an update.
pub struct StateStore<S = FileStore> {
    store: S,
    update_lock: Mutex<()>,
    celebration: Option<Arc<dyn CelebrationSink>>,
}

impl StateStore<FileStore> {
    pub fn open(root: impl Into<PathBuf>) -> Result<Self, StorageError> {
        Ok(Self::new(FileStore::open(root)?))
    }
}

impl<S: KeyValueStore> StateStore<S> {
    pub fn new(store: S) -> Self {
        Self {
            store,
            update_lock: Mutex::new(()),
            celebration: None,
        }
    }

    pub fn with_celebration(mut self, sink: Arc<dyn CelebrationSink>) -> Self {
        self.celebration = Some(sink);
        self
    }

    pub fn backend(&self) -> &S {
        &self.store
    }

    fn lock_updates(&self) -> MutexGuard<'_, ()> {
        self.update_lock.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn read_json<T: DeserializeOwned + Default>(&self, key: &str) -> T {
        let raw = match self.store.read(key) {
            Ok(Some(raw)) => raw,
            Ok(None) => return T::default(),
            Err(e) => {
                tracing::warn!(key, error = %e, "could not read saved value, using default");
                return T::default();
            }
        };
        serde_json::from_str(&raw).unwrap_or_else(|e| {
            tracing::warn!(key, error = %e, "saved value is malformed, using default");
            T::default()
        })
    }

    fn write_json<T: Serialize + ?Sized>(&self, key: &str, value: &T) -> Result<(), StorageError> {
        let raw = serde_json::to_string(value)?;
        self.store.write(key, &raw)
    }

    pub fn favorites(&self) -> BTreeSet<String> {
        self.read_json(FAVORITES_KEY)
    }

    pub fn is_favorite(&self, recipe_id: &str) -> bool {
        self.favorites().contains(recipe_id)
    }

    /// Flips the favorite flag and returns the new state.
    pub fn toggle_favorite(&self, recipe_id: &str) -> Result<bool, StorageError> {
        let _update = self.lock_updates();
        let mut favorites = self.favorites();
        let now_favorite = if favorites.remove(recipe_id) {
            false
        } else {
            favorites.insert(recipe_id.to_string());
            true
        };
        self.write_json(FAVORITES_KEY, &favorites)?;
        tracing::debug!(recipe_id, now_favorite, "toggled favorite");
        Ok(now_favorite)
    }

    pub fn completed(&self) -> BTreeSet<String> {
        self.read_json(COMPLETED_KEY)
    }

    pub fn is_completed(&self, recipe_id: &str) -> bool {
        self.completed().contains(recipe_id)
    }

    /// Records the recipe as cooked. Requires every step to be checked; the
    /// flag is never cleared by later unchecking.
    pub fn mark_completed(&self, recipe: &Recipe) -> Result<CompletionOutcome, StorageError> {
        let _update = self.lock_updates();
        let mut completed = self.completed();
        if completed.contains(&recipe.id) {
            return Ok(CompletionOutcome::AlreadyCompleted);
        }

        let progress = self.progress(recipe);
        if !progress.all_steps_checked(recipe) {
            let remaining = recipe.steps.len() - progress.checked_steps.len();
            return Ok(CompletionOutcome::StepsRemaining(remaining));
        }

        completed.insert(recipe.id.clone());
        self.write_json(COMPLETED_KEY, &completed)?;
        tracing::info!(recipe_id = %recipe.id, "recipe completed");

        if let Some(sink) = &self.celebration {
            sink.celebrate(&Celebration::RecipeCompleted {
                recipe_id: recipe.id.clone(),
            });
        }
        Ok(CompletionOutcome::Completed)
    }

    /// Clears favorites and completions. Per-recipe progress is kept.
    pub fn reset(&self) -> Result<(), StorageError> {
        self.store.remove(FAVORITES_KEY)?;
        self.store.remove(COMPLETED_KEY)?;
        tracing::info!("cleared favorites and completed recipes");
        Ok(())
    }

    pub fn snapshot(&self) -> UserSnapshot {
        UserSnapshot {
            favorites: self.favorites(),
            completed: self.completed(),
        }
    }

    /// Saved progress for the recipe, with indices the recipe no longer has dropped.
    pub fn progress(&self, recipe: &Recipe) -> UserProgress {
        UserProgress {
            checked_ingredients: self.read_json(&ingredients_key(&recipe.id)),
            checked_steps: self.read_json(&steps_key(&recipe.id)),
            note: self.note(&recipe.id),
            servings: self.servings(&recipe.id),
        }
        .clamp_to(recipe)
    }

    /// Flips an ingredient checkbox. Returns `None` and changes nothing when
    /// the index is past the end of the ingredient list.
    pub fn toggle_ingredient(
        &self,
        recipe: &Recipe,
        index: usize,
    ) -> Result<Option<bool>, StorageError> {
        self.toggle_index(
            &ingredients_key(&recipe.id),
            index,
            recipe.ingredients.len(),
        )
    }

    /// Flips a step checkbox. Returns `None` and changes nothing when the
    /// index is past the end of the step list.
    pub fn toggle_step(&self, recipe: &Recipe, index: usize) -> Result<Option<bool>, StorageError> {
        self.toggle_index(&steps_key(&recipe.id), index, recipe.steps.len())
    }

    fn toggle_index(
        &self,
        key: &str,
        index: usize,
        len: usize,
    ) -> Result<Option<bool>, StorageError> {
        if index >= len {
            tracing::debug!(key, index, len, "ignoring out-of-range checklist index");
            return Ok(None);
        }

        let _update = self.lock_updates();
        let mut checked: BTreeSet<usize> = self.read_json(key);
        checked.retain(|&i| i < len);
        let now_checked = if checked.remove(&index) {
            false
        } else {
            checked.insert(index);
            true
        };
        self.write_json(key, &checked)?;
        Ok(Some(now_checked))
    }

    pub fn note(&self, recipe_id: &str) -> String {
        let key = notes_key(recipe_id);
        match self.store.read(&key) {
            Ok(Some(raw)) => match serde_json::from_str::<String>(&raw) {
                Ok(note) => truncate_note(&note),
                // Notes saved as bare text are taken verbatim.
                Err(_) => truncate_note(&raw),
            },
            Ok(None) => String::new(),
            Err(e) => {
                tracing::warn!(key, error = %e, "could not read note, using empty note");
                String::new()
            }
        }
    }

    /// Saves the note, cut to the note length limit, and returns what was stored.
    pub fn set_note(&self, recipe_id: &str, text: &str) -> Result<String, StorageError> {
        let note = truncate_note(text);
        self.write_json(&notes_key(recipe_id), &note)?;
        Ok(note)
    }

    pub fn servings(&self, recipe_id: &str) -> u32 {
        let servings: Option<u32> = self.read_json(&servings_key(recipe_id));
        servings.unwrap_or(1).max(1)
    }

    /// Stores the servings multiplier, raised to at least 1.
    pub fn set_servings(&self, recipe_id: &str, servings: u32) -> Result<u32, StorageError> {
        let servings = servings.max(1);
        self.write_json(&servings_key(recipe_id), &servings)?;
        Ok(servings)
    }

    /// Moves the servings multiplier by `delta`, never below 1.
    pub fn adjust_servings(&self, recipe_id: &str, delta: i32) -> Result<u32, StorageError> {
        let _update = self.lock_updates();
        let current = self.servings(recipe_id) as i64;
        let next = (current + delta as i64).clamp(1, u32::MAX as i64) as u32;
        self.set_servings(recipe_id, next)
    }
}
