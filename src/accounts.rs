use crate::session::Session;
use crate::store::models::{Role, User};
use crate::store::{self, DataStore, Direction, Query, StoreError, USERS};
use serde_json::json;
use tracing::info;

#[derive(Debug, Clone, Default)]
pub struct NewUser {
    pub id: String,
    pub email: String,
    pub name: String,
    pub skin_type: Option<String>,
}

/// Registers a regular user and signs them in. Ids and emails are unique,
/// emails compared without case.
pub fn sign_up(store: &dyn DataStore, new_user: NewUser) -> Result<Session, StoreError> {
    let id = new_user.id.trim();
    if id.is_empty() {
        return Err(StoreError::Validation("user id must not be empty".to_string()));
    }
    let email = new_user.email.trim();
    if !is_plausible_email(email) {
        return Err(StoreError::Validation(format!("`{email}` is not an email address")));
    }

    let users: Vec<User> = store::select_as(store, USERS, &Query::new())?;
    if let Some(taken) = users
        .iter()
        .find(|user| user.id == id || user.email.eq_ignore_ascii_case(email))
    {
        return Err(StoreError::Validation(format!(
            "user {} already registered with that id or email",
            taken.id
        )));
    }

    let user = User {
        id: id.to_string(),
        email: email.to_string(),
        name: new_user.name.trim().to_string(),
        skin_type: new_user
            .skin_type
            .map(|skin| skin.trim().to_string())
            .filter(|skin| !skin.is_empty()),
        role: Role::User,
    };
    store::insert_as(store, USERS, &user)?;
    info!(user = %user.id, "user signed up");

    Session::sign_in(store, id)
}

fn is_plausible_email(email: &str) -> bool {
    match email.split_once('@') {
        Some((local, domain)) => {
            !local.is_empty()
                && domain.contains('.')
                && !domain.starts_with('.')
                && !email.contains(char::is_whitespace)
        }
        None => false,
    }
}

pub fn list_users(store: &dyn DataStore, session: &Session) -> Result<Vec<User>, StoreError> {
    session.require_admin()?;
    store::select_as(store, USERS, &Query::new().order_by("id", Direction::Asc))
}

pub fn set_role(
    store: &dyn DataStore,
    session: &Session,
    target: &str,
    role: Role,
) -> Result<User, StoreError> {
    session.require_admin()?;
    if target == session.user_id() && role != Role::Admin {
        return Err(StoreError::Validation(format!(
            "admin {target} cannot remove their own admin role"
        )));
    }

    let updated = store.update(USERS, target, json!({ "role": role.as_str() }))?;
    let user: User = serde_json::from_value(updated)?;
    info!(user = %user.id, role = %user.role, by = session.user_id(), "role changed");
    Ok(user)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::FileStore;
    use tempfile::TempDir;

    fn store() -> (TempDir, FileStore) {
        let tmp = TempDir::new().unwrap();
        let store = FileStore::open(tmp.path()).unwrap();
        store
            .insert(USERS, json!({"id": "staff", "email": "staff@example.com", "role": "admin"}))
            .unwrap();
        store
            .insert(USERS, json!({"id": "u1", "email": "mia@example.com"}))
            .unwrap();
        (tmp, store)
    }

    fn new_user(id: &str, email: &str) -> NewUser {
        NewUser {
            id: id.to_string(),
            email: email.to_string(),
            name: "Lee".to_string(),
            skin_type: Some(" dry ".to_string()),
        }
    }

    #[test]
    fn sign_up_creates_regular_user() {
        let (_tmp, store) = store();
        let session = sign_up(&store, new_user("u2", "lee@example.com")).unwrap();

        assert_eq!(session.user_id(), "u2");
        assert_eq!(session.user().role, Role::User);
        assert_eq!(session.user().skin_type.as_deref(), Some("dry"));
        assert!(session.require_admin().is_err());
    }

    #[test]
    fn sign_up_rejects_taken_id_or_email() {
        let (_tmp, store) = store();
        assert!(matches!(
            sign_up(&store, new_user("u1", "other@example.com")),
            Err(StoreError::Validation(_))
        ));
        assert!(matches!(
            sign_up(&store, new_user("u9", "MIA@example.com")),
            Err(StoreError::Validation(_))
        ));
    }

    #[test]
    fn sign_up_rejects_bad_input() {
        let (_tmp, store) = store();
        for email in ["", "mia", "@example.com", "mia@localhost", "mia @example.com"] {
            assert!(sign_up(&store, new_user("u9", email)).is_err(), "email {email:?}");
        }
        assert!(sign_up(&store, new_user(" ", "ok@example.com")).is_err());
    }

    #[test]
    fn listing_users_is_admin_only() {
        let (_tmp, store) = store();
        let admin = Session::sign_in(&store, "staff").unwrap();
        let ids: Vec<String> = list_users(&store, &admin)
            .unwrap()
            .into_iter()
            .map(|user| user.id)
            .collect();
        assert_eq!(ids, ["staff", "u1"]);

        let user = Session::sign_in(&store, "u1").unwrap();
        assert!(matches!(list_users(&store, &user), Err(StoreError::Unauthorized(_))));
    }

    #[test]
    fn set_role_promotes_and_guards_self_demotion() {
        let (_tmp, store) = store();
        let admin = Session::sign_in(&store, "staff").unwrap();

        let promoted = set_role(&store, &admin, "u1", Role::Admin).unwrap();
        assert_eq!(promoted.role, Role::Admin);
        assert!(Session::sign_in(&store, "u1").unwrap().require_admin().is_ok());

        assert!(matches!(
            set_role(&store, &admin, "staff", Role::User),
            Err(StoreError::Validation(_))
        ));
        assert!(matches!(
            set_role(&store, &admin, "ghost", Role::Admin),
            Err(StoreError::NotFound { .. })
        ));

        let promoted = Session::sign_in(&store, "u1").unwrap();
        set_role(&store, &promoted, "staff", Role::User).unwrap();
        assert_eq!(
            Session::sign_in(&store, "staff").unwrap().user().role,
            Role::User
        );
    }
}
