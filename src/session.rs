// Persistence: a key-value snapshot store and the session tying an
// editor to one stored document.

use crate::document::Document;
use crate::editor::Editor;
use chrono::{DateTime, Local};
use std::collections::HashMap;
use std::fs;
use std::path::PathBuf;

/// String key-value storage for document snapshots
pub trait SnapshotStore {
    fn get(&self, key: &str) -> Result<Option<String>, String>;
    fn put(&mut self, key: &str, value: &str) -> Result<(), String>;
}

/// One JSON file per key under a storage directory
pub struct FileStore {
    dir: PathBuf,
}

impl FileStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        FileStore { dir: dir.into() }
    }

    pub fn dir(&self) -> &PathBuf {
        &self.dir
    }

    fn path_for(&self, key: &str) -> PathBuf {
        self.dir.join(format!("{key}.json"))
    }
}

impl SnapshotStore for FileStore {
    fn get(&self, key: &str) -> Result<Option<String>, String> {
        let path = self.path_for(key);
        if !path.exists() {
            return Ok(None);
        }
        fs::read_to_string(&path)
            .map(Some)
            .map_err(|err| format!("Failed to read {}: {}", path.display(), err))
    }

    fn put(&mut self, key: &str, value: &str) -> Result<(), String> {
        fs::create_dir_all(&self.dir)
            .map_err(|err| format!("Failed to create {}: {}", self.dir.display(), err))?;
        let path = self.path_for(key);
        fs::write(&path, value)
            .map_err(|err| format!("Failed to write {}: {}", path.display(), err))
    }
}

/// In-memory store for tests
#[derive(Default)]
pub struct MemoryStore {
    entries: HashMap<String, String>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl SnapshotStore for MemoryStore {
    fn get(&self, key: &str) -> Result<Option<String>, String> {
        Ok(self.entries.get(key).cloned())
    }

    fn put(&mut self, key: &str, value: &str) -> Result<(), String> {
        self.entries.insert(key.to_string(), value.to_string());
        Ok(())
    }
}

/// An editor bound to one stored document: tracks unsaved changes and
/// guards saving against oversized documents.
pub struct Session<S: SnapshotStore> {
    editor: Editor,
    store: S,
    key: String,
    dirty: bool,
    max_blocks: Option<usize>,
    last_saved: Option<DateTime<Local>>,
}

impl<S: SnapshotStore> Session<S> {
    pub fn new(store: S, key: impl Into<String>) -> Self {
        Session {
            editor: Editor::new(),
            store,
            key: key.into(),
            dirty: false,
            max_blocks: None,
            last_saved: None,
        }
    }

    pub fn with_max_blocks(mut self, max: Option<usize>) -> Self {
        self.max_blocks = max;
        self
    }

    pub fn editor(&self) -> &Editor {
        &self.editor
    }

    /// Run an editing closure, marking the session dirty when the
    /// document tree (kinds, nesting, text or marks) actually changed.
    /// Selection-only changes never dirty.
    pub fn apply<R>(&mut self, edit: impl FnOnce(&mut Editor) -> R) -> R {
        let before = self.editor.document().clone();
        let result = edit(&mut self.editor);
        if *self.editor.document() != before {
            self.dirty = true;
        }
        result
    }

    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    pub fn last_saved(&self) -> Option<DateTime<Local>> {
        self.last_saved
    }

    /// False when the document grew past the configured top-level block cap
    pub fn can_save(&self) -> bool {
        match self.max_blocks {
            Some(max) => self.editor.document().block_count() <= max,
            None => true,
        }
    }

    pub fn save(&mut self) -> Result<(), String> {
        if !self.can_save() {
            return Err("Document has too many blocks to save".to_string());
        }
        let json = serde_json::to_string_pretty(self.editor.document())
            .map_err(|err| format!("Failed to serialize document: {err}"))?;
        self.store.put(&self.key, &json)?;
        self.dirty = false;
        self.last_saved = Some(Local::now());
        Ok(())
    }

    /// Load the stored snapshot, falling back to the empty document when
    /// nothing usable is stored. Never surfaces an error to the caller.
    pub fn restore(&mut self) {
        let document = match self.store.get(&self.key) {
            Ok(Some(raw)) => match serde_json::from_str::<Document>(&raw) {
                Ok(document) => document,
                Err(err) => {
                    eprintln!("Ignoring unreadable snapshot for key {}: {}", self.key, err);
                    Document::empty()
                }
            },
            Ok(None) => Document::empty(),
            Err(err) => {
                eprintln!("Failed to load snapshot for key {}: {}", self.key, err);
                Document::empty()
            }
        };
        self.editor.set_document(document);
        self.dirty = false;
    }

    pub fn status_text(&self) -> String {
        if self.dirty {
            "Unsaved changes".to_string()
        } else if let Some(at) = self.last_saved {
            format!("Saved at {}", at.format("%H:%M:%S"))
        } else {
            "No changes".to_string()
        }
    }
}
