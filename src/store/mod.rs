mod error;
pub mod file;
pub mod models;

pub use error::StoreError;
pub use file::FileStore;

use chrono::DateTime;
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::cmp::Ordering;

pub const USERS: &str = "users";
pub const PRODUCTS: &str = "products";
pub const SKIN_ANALYSES: &str = "skin_analyses";
pub const SAVED_PRODUCTS: &str = "saved_products";
pub const ROUTINES: &str = "routines";
pub const ROUTINE_STEPS: &str = "routine_steps";

pub const INSERT_ROUTINE_WITH_STEPS: &str = "insert_routine_with_steps";
pub const UPDATE_ROUTINE_WITH_STEPS: &str = "update_routine_with_steps";

/// Collection-addressed data access. Records are JSON objects keyed by `id`.
pub trait DataStore {
    fn name(&self) -> &'static str;
    fn select(&self, collection: &str, query: &Query) -> Result<Vec<Value>, StoreError>;
    fn insert(&self, collection: &str, record: Value) -> Result<Value, StoreError>;
    fn update(&self, collection: &str, id: &str, patch: Value) -> Result<Value, StoreError>;
    fn delete(&self, collection: &str, id: &str) -> Result<(), StoreError>;
    /// Composite writes that must land together.
    fn call(&self, procedure: &str, args: Value) -> Result<Value, StoreError>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Asc,
    Desc,
}

#[derive(Debug, Clone, Default)]
pub struct Query {
    filters: Vec<(String, Value)>,
    order: Option<(String, Direction)>,
    limit: Option<usize>,
}

impl Query {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn eq(mut self, field: impl Into<String>, value: impl Into<Value>) -> Self {
        self.filters.push((field.into(), value.into()));
        self
    }

    pub fn order_by(mut self, field: impl Into<String>, direction: Direction) -> Self {
        self.order = Some((field.into(), direction));
        self
    }

    pub fn limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }

    pub fn matches(&self, record: &Value) -> bool {
        self.filters
            .iter()
            .all(|(field, expected)| record.get(field) == Some(expected))
    }

    /// Filter, order, then limit, in that order.
    pub fn apply(&self, records: Vec<Value>) -> Vec<Value> {
        let mut selected: Vec<Value> = records
            .into_iter()
            .filter(|record| self.matches(record))
            .collect();

        if let Some((field, direction)) = &self.order {
            selected.sort_by(|a, b| {
                let ordering = compare_values(a.get(field), b.get(field));
                match direction {
                    Direction::Asc => ordering,
                    Direction::Desc => ordering.reverse(),
                }
            });
        }

        if let Some(limit) = self.limit {
            selected.truncate(limit);
        }

        selected
    }
}

fn compare_values(a: Option<&Value>, b: Option<&Value>) -> Ordering {
    match (a, b) {
        (Some(Value::Number(x)), Some(Value::Number(y))) => {
            let x = x.as_f64().unwrap_or(f64::NAN);
            let y = y.as_f64().unwrap_or(f64::NAN);
            x.total_cmp(&y)
        }
        (Some(Value::String(x)), Some(Value::String(y))) => {
            // Timestamps may differ in offset or fractional seconds.
            match (DateTime::parse_from_rfc3339(x), DateTime::parse_from_rfc3339(y)) {
                (Ok(x), Ok(y)) => x.cmp(&y),
                _ => x.cmp(y),
            }
        }
        (Some(Value::Bool(x)), Some(Value::Bool(y))) => x.cmp(y),
        (None | Some(Value::Null), None | Some(Value::Null)) => Ordering::Equal,
        (None | Some(Value::Null), _) => Ordering::Less,
        (_, None | Some(Value::Null)) => Ordering::Greater,
        (Some(x), Some(y)) => x.to_string().cmp(&y.to_string()),
    }
}

pub fn record_id(record: &Value) -> Option<&str> {
    record.get("id").and_then(Value::as_str)
}

pub fn select_as<T: DeserializeOwned>(
    store: &dyn DataStore,
    collection: &str,
    query: &Query,
) -> Result<Vec<T>, StoreError> {
    store
        .select(collection, query)?
        .into_iter()
        .map(|record| decode(collection, record))
        .collect()
}

pub fn get_as<T: DeserializeOwned>(
    store: &dyn DataStore,
    collection: &str,
    id: &str,
) -> Result<T, StoreError> {
    let record = store
        .select(collection, &Query::new().eq("id", id).limit(1))?
        .into_iter()
        .next()
        .ok_or_else(|| StoreError::not_found(collection, id))?;
    decode(collection, record)
}

pub fn insert_as<T: Serialize>(
    store: &dyn DataStore,
    collection: &str,
    record: &T,
) -> Result<Value, StoreError> {
    store.insert(collection, serde_json::to_value(record)?)
}

fn decode<T: DeserializeOwned>(collection: &str, record: Value) -> Result<T, StoreError> {
    let id = record_id(&record).unwrap_or("<no id>").to_string();
    serde_json::from_value(record)
        .map_err(|err| StoreError::Validation(format!("{collection} record {id}: {err}")))
}
