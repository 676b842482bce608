use crate::store::{
    DataStore, INSERT_ROUTINE_WITH_STEPS, Query, ROUTINE_STEPS, ROUTINES, StoreError,
    UPDATE_ROUTINE_WITH_STEPS, record_id,
};
use crate::utils::fs as fs_utils;
use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::{Map, Value, json};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

static COLLECTION_NAME_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[a-z][a-z0-9_]*$").expect("valid collection name regex"));

/// Each collection is a JSON array of objects in `<root>/<collection>.json`.
/// A collection without a file is empty.
#[derive(Debug, Clone)]
pub struct FileStore {
    root: PathBuf,
}

impl FileStore {
    pub fn open(root: &Path) -> Result<Self, StoreError> {
        if !root.is_dir() {
            return Err(StoreError::Transient(format!(
                "data directory {} does not exist",
                root.display()
            )));
        }

        let store = Self {
            root: root.to_path_buf(),
        };
        debug!(
            root = %root.display(),
            collections = ?fs_utils::list_json_stems(root),
            "opened file store"
        );
        Ok(store)
    }

    fn collection_path(&self, collection: &str) -> Result<PathBuf, StoreError> {
        if !COLLECTION_NAME_RE.is_match(collection) {
            return Err(StoreError::Validation(format!(
                "invalid collection name `{collection}`"
            )));
        }
        Ok(self.root.join(format!("{collection}.json")))
    }

    fn load(&self, collection: &str) -> Result<Vec<Value>, StoreError> {
        let path = self.collection_path(collection)?;
        let content = match fs::read_to_string(&path) {
            Ok(content) => content,
            Err(err) if err.kind() == io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(err) => {
                return Err(StoreError::from_io(
                    &format!("reading {}", path.display()),
                    err,
                ));
            }
        };

        if content.trim().is_empty() {
            return Ok(Vec::new());
        }

        match serde_json::from_str::<Value>(&content)? {
            Value::Array(records) => Ok(records),
            _ => Err(StoreError::Validation(format!(
                "{} must contain a JSON array",
                path.display()
            ))),
        }
    }

    fn save(&self, batches: &[(&str, &[Value])]) -> Result<(), StoreError> {
        let mut files = Vec::with_capacity(batches.len());
        for (collection, records) in batches {
            let path = self.collection_path(collection)?;
            let content = serde_json::to_string_pretty(records)?;
            files.push((path, content));
        }

        fs_utils::write_all_atomic(&files)
            .map_err(|err| StoreError::from_io("writing collections", err))?;
        Ok(())
    }

    fn insert_routine_with_steps(&self, args: &Value) -> Result<Value, StoreError> {
        let mut routine = args
            .get("routine")
            .and_then(Value::as_object)
            .cloned()
            .ok_or_else(|| StoreError::Validation("missing routine object".to_string()))?;
        let steps = step_args(args)?;

        let mut routines = self.load(ROUTINES)?;
        let mut routine_steps = self.load(ROUTINE_STEPS)?;

        let id = next_id(&routines, "routine");
        routine.insert("id".to_string(), Value::String(id.clone()));
        let routine = Value::Object(routine);
        routines.push(routine.clone());
        routine_steps.extend(build_steps(&id, steps));

        self.save(&[(ROUTINES, &routines), (ROUTINE_STEPS, &routine_steps)])?;
        info!(routine = %id, "inserted routine with steps");
        Ok(routine)
    }

    fn update_routine_with_steps(&self, args: &Value) -> Result<Value, StoreError> {
        let routine_id = args
            .get("routine_id")
            .and_then(Value::as_str)
            .ok_or_else(|| StoreError::Validation("missing routine_id".to_string()))?
            .to_string();
        let steps = step_args(args)?;

        let mut routines = self.load(ROUTINES)?;
        let mut routine_steps = self.load(ROUTINE_STEPS)?;

        let routine = routines
            .iter_mut()
            .find(|record| record_id(record) == Some(routine_id.as_str()))
            .ok_or_else(|| StoreError::not_found(ROUTINES, routine_id.clone()))?;
        if let Some(name) = args.get("name").filter(|name| name.is_string())
            && let Some(fields) = routine.as_object_mut()
        {
            fields.insert("name".to_string(), name.clone());
        }
        let updated = routine.clone();

        routine_steps.retain(|step| {
            step.get("routine_id").and_then(Value::as_str) != Some(routine_id.as_str())
        });
        routine_steps.extend(build_steps(&routine_id, steps));

        self.save(&[(ROUTINES, &routines), (ROUTINE_STEPS, &routine_steps)])?;
        info!(routine = %routine_id, "updated routine with steps");
        Ok(updated)
    }
}

impl DataStore for FileStore {
    fn name(&self) -> &'static str {
        "file"
    }

    fn select(&self, collection: &str, query: &Query) -> Result<Vec<Value>, StoreError> {
        let records = self.load(collection)?;
        let total = records.len();
        let selected = query.apply(records);
        debug!(collection, total, selected = selected.len(), "select");
        Ok(selected)
    }

    fn insert(&self, collection: &str, record: Value) -> Result<Value, StoreError> {
        let id = record_id(&record)
            .ok_or_else(|| StoreError::Validation(format!("{collection} record needs an id")))?
            .to_string();

        let mut records = self.load(collection)?;
        if records.iter().any(|existing| record_id(existing) == Some(id.as_str())) {
            return Err(StoreError::Validation(format!(
                "{collection} record {id} already exists"
            )));
        }

        records.push(record.clone());
        self.save(&[(collection, &records)])?;
        info!(collection, id = %id, "inserted record");
        Ok(record)
    }

    fn update(&self, collection: &str, id: &str, patch: Value) -> Result<Value, StoreError> {
        let Value::Object(patch) = patch else {
            return Err(StoreError::Validation("update patch must be an object".to_string()));
        };

        let mut records = self.load(collection)?;
        let record = records
            .iter_mut()
            .find(|record| record_id(record) == Some(id))
            .ok_or_else(|| StoreError::not_found(collection, id))?;

        if let Some(fields) = record.as_object_mut() {
            for (key, value) in patch {
                if key != "id" {
                    fields.insert(key, value);
                }
            }
        }
        let updated = record.clone();

        self.save(&[(collection, &records)])?;
        info!(collection, id, "updated record");
        Ok(updated)
    }

    fn delete(&self, collection: &str, id: &str) -> Result<(), StoreError> {
        let mut records = self.load(collection)?;
        let before = records.len();
        records.retain(|record| record_id(record) != Some(id));
        if records.len() == before {
            return Err(StoreError::not_found(collection, id));
        }

        self.save(&[(collection, &records)])?;
        info!(collection, id, "deleted record");
        Ok(())
    }

    fn call(&self, procedure: &str, args: Value) -> Result<Value, StoreError> {
        debug!(procedure, "call");
        match procedure {
            INSERT_ROUTINE_WITH_STEPS => self.insert_routine_with_steps(&args),
            UPDATE_ROUTINE_WITH_STEPS => self.update_routine_with_steps(&args),
            other => Err(StoreError::not_found("procedures", other)),
        }
    }
}

fn step_args(args: &Value) -> Result<&Vec<Value>, StoreError> {
    args.get("steps")
        .and_then(Value::as_array)
        .ok_or_else(|| StoreError::Validation("missing steps array".to_string()))
}

fn build_steps<'a>(routine_id: &'a str, steps: &'a [Value]) -> impl Iterator<Item = Value> + 'a {
    steps.iter().enumerate().map(move |(idx, step)| {
        let mut fields = step.as_object().cloned().unwrap_or_else(Map::new);
        fields.insert("routine_id".to_string(), json!(routine_id));
        fields.insert("step_order".to_string(), json!(idx + 1));
        Value::Object(fields)
    })
}

fn next_id(records: &[Value], prefix: &str) -> String {
    let highest = records
        .iter()
        .filter_map(record_id)
        .filter_map(|id| id.strip_prefix(prefix)?.strip_prefix('-')?.parse::<u64>().ok())
        .max()
        .unwrap_or(0);
    format!("{prefix}-{}", highest + 1)
}
