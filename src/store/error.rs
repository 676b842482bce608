use std::io;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("{collection} record not found: {key}")]
    NotFound { collection: String, key: String },

    #[error("unauthorized: {0}")]
    Unauthorized(String),

    #[error("data store unavailable: {0}")]
    Transient(String),

    #[error("invalid data: {0}")]
    Validation(String),
}

impl StoreError {
    pub fn not_found(collection: &str, key: impl Into<String>) -> Self {
        Self::NotFound {
            collection: collection.to_string(),
            key: key.into(),
        }
    }

    pub fn from_io(context: &str, err: io::Error) -> Self {
        match err.kind() {
            io::ErrorKind::PermissionDenied => Self::Unauthorized(format!("{context}: {err}")),
            _ => Self::Transient(format!("{context}: {err}")),
        }
    }

    /// Same hint for every occurrence of a variant, wherever it surfaced.
    pub fn hint(&self) -> &'static str {
        match self {
            Self::NotFound { .. } => "check the id, or list the collection to see what exists",
            Self::Unauthorized(_) => "sign in with a known user id that has the required role",
            Self::Transient(_) => "check that the data directory exists and is readable, then retry",
            Self::Validation(_) => "fix the offending record or argument and run the command again",
        }
    }
}

impl From<serde_json::Error> for StoreError {
    fn from(err: serde_json::Error) -> Self {
        Self::Validation(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn io_errors_map_to_taxonomy() {
        let denied = io::Error::new(io::ErrorKind::PermissionDenied, "nope");
        assert!(matches!(
            StoreError::from_io("reading users", denied),
            StoreError::Unauthorized(_)
        ));

        let broken = io::Error::new(io::ErrorKind::BrokenPipe, "gone");
        assert!(matches!(
            StoreError::from_io("reading users", broken),
            StoreError::Transient(_)
        ));
    }

    #[test]
    fn not_found_message_names_collection() {
        let err = StoreError::not_found("products", "p-9");
        assert_eq!(err.to_string(), "products record not found: p-9");
    }
}
