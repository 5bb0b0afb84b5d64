//! Flat, JSON-persisted list of to-do records.
//!
//! Records are free-form JSON objects. Only two fields are interpreted:
//!
//! - `id`: non-negative integer, unique across the list
//! - `text`: required when a record is created
//!
//! `done` is carried along and read when a record is deleted.
//! Every mutation rewrites the whole file.

use super::error::{Result, WikiError};
use serde_json::{Map, Value};
use std::{
    collections::HashSet,
    fs, io,
    path::{Path, PathBuf},
};

/// A single to-do as stored on disk.
pub type Record = Map<String, Value>;

/// `id` of a record, when it is a valid one.
pub fn record_id(record: &Record) -> Option<u64> {
    record.get("id").and_then(Value::as_u64)
}

/// `text` of a record, if it is a string.
pub fn record_text(record: &Record) -> Option<&str> {
    record.get("text").and_then(Value::as_str)
}

/// Whether the record carries `"done": true`.
pub fn is_done(record: &Record) -> bool {
    record.get("done").and_then(Value::as_bool).unwrap_or(false)
}

#[derive(Debug)]
pub struct TodoList {
    path: PathBuf,
    /// Auto-assigned ids come from `[0, id_ceiling)`.
    id_ceiling: u64,
    items: Vec<Record>,
}

impl TodoList {
    /// Open the store at `path`; a missing file is an empty list.
    pub fn open(path: impl Into<PathBuf>, id_ceiling: u64) -> Result<Self> {
        let mut list = Self {
            path: path.into(),
            id_ceiling,
            items: Vec::new(),
        };
        list.load()?;
        Ok(list)
    }

    /// Replace the in-memory list with the file's content.
    pub fn load(&mut self) -> Result<()> {
        let text = match fs::read_to_string(&self.path) {
            Ok(text) => text,
            Err(err) if err.kind() == io::ErrorKind::NotFound => return Ok(()),
            Err(err) => return Err(WikiError::io(&self.path)(err)),
        };
        let items: Vec<Record> =
            serde_json::from_str(&text).map_err(|err| WikiError::Json(self.path.clone(), err))?;

        // Every record needs its own non-negative integer id
        let mut seen = HashSet::with_capacity(items.len());
        for (index, item) in items.iter().enumerate() {
            let Some(id) = record_id(item) else {
                let reason = format!("record {index} has no non-negative integer `id`");
                return Err(WikiError::CorruptTodos(self.path.clone(), reason));
            };
            if !seen.insert(id) {
                let reason = format!("id {id} is used more than once");
                return Err(WikiError::CorruptTodos(self.path.clone(), reason));
            }
        }

        self.items = items;
        Ok(())
    }

    /// Overwrite the file with the current list.
    pub fn save(&self) -> Result<()> {
        let json = serde_json::to_string_pretty(&self.items)
            .map_err(|err| WikiError::Json(self.path.clone(), err))?;
        fs::write(&self.path, json).map_err(WikiError::io(&self.path))
    }

    /// Merge into the record with the same id, or insert a new one.
    ///
    /// New records need a string `text`; a missing id is replaced by the
    /// smallest free one. Returns the id of the affected record.
    pub fn upsert(&mut self, mut record: Record) -> Result<u64> {
        let requested = match record.get("id") {
            None => None,
            Some(value) => Some(value.as_u64().ok_or_else(|| {
                WikiError::BadInput(format!("`id` must be a non-negative integer, got {value}"))
            })?),
        };

        if let Some(id) = requested
            && let Some(index) = self.items.iter().position(|r| record_id(r) == Some(id))
        {
            self.items[index].extend(record);
            self.save()?;
            return Ok(id);
        }

        if record_text(&record).is_none() {
            return Err(WikiError::BadInput("`text` must be a string".into()));
        }

        let id = match requested {
            Some(id) => id,
            None => self.next_free_id()?,
        };
        record.insert("id".into(), Value::from(id));
        self.items.push(record);
        self.save()?;
        Ok(id)
    }

    /// Remove the record with `id` and return it.
    pub fn delete(&mut self, id: u64) -> Result<Record> {
        let index = self
            .items
            .iter()
            .position(|r| record_id(r) == Some(id))
            .ok_or(WikiError::TodoNotFound(id))?;
        let record = self.items.remove(index);
        self.save()?;
        Ok(record)
    }

    pub fn get(&self, id: u64) -> Option<&Record> {
        self.items.iter().find(|r| record_id(r) == Some(id))
    }

    pub fn items(&self) -> &[Record] {
        &self.items
    }

    /// Direct access to the list; call [`Self::save`] afterwards.
    #[allow(dead_code)] // Reserved API
    pub fn items_mut(&mut self) -> &mut Vec<Record> {
        &mut self.items
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    #[allow(dead_code)] // Reserved API
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn next_free_id(&self) -> Result<u64> {
        let used: HashSet<u64> = self.items.iter().filter_map(record_id).collect();
        (0..self.id_ceiling)
            .find(|id| !used.contains(id))
            .ok_or(WikiError::IdSpaceExhausted(self.id_ceiling))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use tempfile::TempDir;

    fn record(value: Value) -> Record {
        value.as_object().unwrap().clone()
    }

    fn list(dir: &TempDir) -> TodoList {
        TodoList::open(dir.path().join("todos.json"), 1024).unwrap()
    }

    #[test]
    fn test_missing_file_is_empty() {
        let dir = TempDir::new().unwrap();
        let todos = list(&dir);
        assert!(todos.is_empty());
        assert!(!todos.path().exists());
    }

    #[test]
    fn test_auto_ids_fill_from_zero() {
        let dir = TempDir::new().unwrap();
        let mut todos = list(&dir);

        assert_eq!(todos.upsert(record(json!({"text": "a"}))).unwrap(), 0);
        assert_eq!(todos.upsert(record(json!({"text": "b"}))).unwrap(), 1);
        todos.delete(0).unwrap();
        assert_eq!(todos.upsert(record(json!({"text": "c"}))).unwrap(), 0);
        assert_eq!(todos.len(), 2);
    }

    #[test]
    fn test_upsert_merges_and_persists() {
        let dir = TempDir::new().unwrap();
        let mut todos = list(&dir);
        todos.upsert(record(json!({"id": 0, "text": "write docs"}))).unwrap();

        todos.upsert(record(json!({"id": 0, "done": true}))).unwrap();
        assert_eq!(todos.len(), 1);
        let item = todos.get(0).unwrap();
        assert_eq!(record_text(item), Some("write docs"));
        assert!(is_done(item));

        let reloaded = list(&dir);
        assert!(is_done(reloaded.get(0).unwrap()));
    }

    #[test]
    fn test_save_load_round_trip_keeps_extra_fields() {
        let dir = TempDir::new().unwrap();
        let mut todos = list(&dir);
        todos
            .upsert(record(json!({"text": "x", "tags": ["a", "b"], "priority": 2})))
            .unwrap();

        let reloaded = list(&dir);
        assert_eq!(reloaded.items(), todos.items());
        assert_eq!(reloaded.items()[0]["tags"], json!(["a", "b"]));
    }

    #[test]
    fn test_bad_input_changes_nothing() {
        let dir = TempDir::new().unwrap();
        let mut todos = list(&dir);

        for bad in [
            json!({"id": -1, "text": "x"}),
            json!({"id": "7", "text": "x"}),
            json!({"done": true}),
            json!({"text": 3}),
        ] {
            assert!(matches!(todos.upsert(record(bad)), Err(WikiError::BadInput(_))));
        }
        assert!(todos.is_empty());
        assert!(!todos.path().exists());
    }

    #[test]
    fn test_id_space_exhausted() {
        let dir = TempDir::new().unwrap();
        let mut todos = TodoList::open(dir.path().join("t.json"), 2).unwrap();
        todos.upsert(record(json!({"text": "a"}))).unwrap();
        todos.upsert(record(json!({"text": "b"}))).unwrap();

        assert!(matches!(
            todos.upsert(record(json!({"text": "c"}))),
            Err(WikiError::IdSpaceExhausted(2))
        ));
        // An explicit id outside the ceiling still works
        assert_eq!(todos.upsert(record(json!({"id": 9, "text": "c"}))).unwrap(), 9);
    }

    #[test]
    fn test_delete_missing() {
        let dir = TempDir::new().unwrap();
        let mut todos = list(&dir);
        assert!(matches!(todos.delete(4), Err(WikiError::TodoNotFound(4))));
    }

    #[test]
    fn test_items_mut_then_save() {
        let dir = TempDir::new().unwrap();
        let mut todos = list(&dir);
        todos.upsert(record(json!({"text": "a"}))).unwrap();
        todos.items_mut().clear();
        todos.save().unwrap();
        assert!(list(&dir).is_empty());
    }

    #[test]
    fn test_load_rejects_missing_or_duplicate_ids() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("todos.json");

        for text in [
            r#"[{"id": 0, "text": "a"}, {"text": "no id"}]"#,
            r#"[{"id": -1, "text": "negative"}]"#,
            r#"[{"id": 3, "text": "a"}, {"id": 3, "text": "b"}]"#,
        ] {
            fs::write(&path, text).unwrap();
            assert!(matches!(
                TodoList::open(&path, 8),
                Err(WikiError::CorruptTodos(..))
            ));
        }

        fs::write(&path, r#"[{"id": 3, "text": "a"}, {"id": 0, "text": "b"}]"#).unwrap();
        assert_eq!(TodoList::open(&path, 8).unwrap().len(), 2);
    }

    #[test]
    fn test_malformed_file_is_an_error() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("todos.json"), "{not json").unwrap();
        assert!(matches!(
            TodoList::open(dir.path().join("todos.json"), 8),
            Err(WikiError::Json(..))
        ));
    }
}
