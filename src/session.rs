use crate::store::models::{Role, User};
use crate::store::{self, DataStore, StoreError, USERS};
use tracing::debug;

/// The signed-in user. Per-user queries are scoped by `user_id()`.
#[derive(Debug, Clone)]
pub struct Session {
    user: User,
}

impl Session {
    pub fn sign_in(store: &dyn DataStore, user_id: &str) -> Result<Self, StoreError> {
        let user: User = match store::get_as(store, USERS, user_id) {
            Ok(user) => user,
            Err(StoreError::NotFound { .. }) => {
                return Err(StoreError::Unauthorized(format!("unknown user {user_id}")));
            }
            Err(err) => return Err(err),
        };

        debug!(user = %user.id, store = store.name(), "signed in");
        Ok(Self { user })
    }

    pub fn user(&self) -> &User {
        &self.user
    }

    pub fn user_id(&self) -> &str {
        &self.user.id
    }

    pub fn require_admin(&self) -> Result<(), StoreError> {
        match self.user.role {
            Role::Admin => Ok(()),
            Role::User => Err(StoreError::Unauthorized(format!(
                "user {} is not an admin",
                self.user.id
            ))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::FileStore;
    use serde_json::json;
    use tempfile::TempDir;

    #[test]
    fn unknown_user_is_unauthorized() {
        let tmp = TempDir::new().unwrap();
        let store = FileStore::open(tmp.path()).unwrap();
        let err = Session::sign_in(&store, "ghost").unwrap_err();
        assert!(matches!(err, StoreError::Unauthorized(_)));
    }

    #[test]
    fn admin_role_is_checked() {
        let tmp = TempDir::new().unwrap();
        let store = FileStore::open(tmp.path()).unwrap();
        store
            .insert(USERS, json!({"id": "u1", "email": "u1@example.com"}))
            .unwrap();
        store
            .insert(USERS, json!({"id": "a1", "email": "a1@example.com", "role": "admin"}))
            .unwrap();

        let user = Session::sign_in(&store, "u1").unwrap();
        assert_eq!(user.user_id(), "u1");
        assert!(matches!(user.require_admin(), Err(StoreError::Unauthorized(_))));

        let admin = Session::sign_in(&store, "a1").unwrap();
        assert!(admin.require_admin().is_ok());
    }
}
