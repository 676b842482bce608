pub mod filter;

use crate::core::problems::KeyProblem;
use crate::core::severity::Severity;
use crate::session::Session;
use crate::store::models::{Area, SavedProduct};
use crate::store::{self, DataStore, Direction, PRODUCTS, Query, SAVED_PRODUCTS, StoreError};
use chrono::{DateTime, Utc};
use filter::{FilterSet, Page, SortKey, filter_and_sort, has_skin_type, paginate};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashSet;
use tracing::{debug, info};

/// Attributes that only exist for one area.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "area", rename_all = "lowercase")]
pub enum AreaDetails {
    Face { severity: Severity },
    Body { body_part: String },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Product {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(rename = "type")]
    pub product_type: String,
    #[serde(default)]
    pub brand: String,
    /// Single value or comma-separated list.
    #[serde(default)]
    pub skin_type: String,
    #[serde(default)]
    pub impurity: String,
    #[serde(default)]
    pub image: String,
    #[serde(default)]
    pub ingredients: Vec<String>,
    #[serde(default)]
    pub cautions: Vec<String>,
    #[serde(default)]
    pub usage: String,
    pub created_at: DateTime<Utc>,
    #[serde(flatten)]
    pub area: AreaDetails,
}

impl Product {
    pub fn area(&self) -> Area {
        match self.area {
            AreaDetails::Face { .. } => Area::Face,
            AreaDetails::Body { .. } => Area::Body,
        }
    }

    pub fn severity(&self) -> Option<Severity> {
        match self.area {
            AreaDetails::Face { severity } => Some(severity),
            AreaDetails::Body { .. } => None,
        }
    }

    pub fn body_part(&self) -> Option<&str> {
        match &self.area {
            AreaDetails::Face { .. } => None,
            AreaDetails::Body { body_part } => Some(body_part),
        }
    }

    fn validate(&self) -> Result<(), StoreError> {
        if self.id.trim().is_empty() {
            return Err(StoreError::Validation("product id must not be empty".to_string()));
        }
        if self.name.trim().is_empty() {
            return Err(StoreError::Validation(format!(
                "product {} needs a name",
                self.id
            )));
        }
        if let AreaDetails::Body { body_part } = &self.area
            && body_part.trim().is_empty()
        {
            return Err(StoreError::Validation(format!(
                "body product {} needs a body_part",
                self.id
            )));
        }
        Ok(())
    }
}

pub fn fetch_products(store: &dyn DataStore) -> Result<Vec<Product>, StoreError> {
    store::select_as(
        store,
        PRODUCTS,
        &Query::new().order_by("created_at", Direction::Desc),
    )
}

pub fn browse(
    store: &dyn DataStore,
    filters: &FilterSet,
    sort: SortKey,
    page: usize,
    page_size: usize,
) -> Result<Page<Product>, StoreError> {
    let products = fetch_products(store)?;
    let selected = filter_and_sort(&products, filters, sort);
    debug!(total = products.len(), matched = selected.len(), %sort, "browse products");
    paginate(selected, page, page_size)
}

/// Products aimed at one of the given problems and, when the user has a
/// skin type on file, suited to it.
pub fn recommend(
    products: &[Product],
    problems: &[KeyProblem],
    skin_type: Option<&str>,
    sort: SortKey,
) -> Vec<Product> {
    let wanted: HashSet<String> = problems
        .iter()
        .map(|problem| problem.label.to_ascii_lowercase())
        .collect();

    let candidates: Vec<Product> = products
        .iter()
        .filter(|product| wanted.contains(&product.impurity.to_ascii_lowercase()))
        .filter(|product| skin_type.is_none_or(|skin| has_skin_type(&product.skin_type, skin)))
        .cloned()
        .collect();

    filter_and_sort(&candidates, &FilterSet::default(), sort)
}

pub fn add_product(
    store: &dyn DataStore,
    session: &Session,
    product: &Product,
) -> Result<(), StoreError> {
    session.require_admin()?;
    product.validate()?;
    store::insert_as(store, PRODUCTS, product)?;
    info!(product = %product.id, by = session.user_id(), "product added");
    Ok(())
}

/// Applies `patch` to a stored product. The merged record must still decode
/// as a valid `Product` before anything is written.
pub fn update_product(
    store: &dyn DataStore,
    session: &Session,
    product_id: &str,
    patch: Value,
) -> Result<Product, StoreError> {
    session.require_admin()?;
    let Value::Object(fields) = patch else {
        return Err(StoreError::Validation("product patch must be a JSON object".to_string()));
    };
    if let Some(id) = fields.get("id")
        && id.as_str() != Some(product_id)
    {
        return Err(StoreError::Validation(format!(
            "product {product_id} cannot change its id"
        )));
    }

    let mut merged = store
        .select(PRODUCTS, &Query::new().eq("id", product_id).limit(1))?
        .into_iter()
        .next()
        .ok_or_else(|| StoreError::not_found(PRODUCTS, product_id))?;
    if let Some(record) = merged.as_object_mut() {
        for (key, value) in &fields {
            record.insert(key.clone(), value.clone());
        }
    }
    let candidate: Product = serde_json::from_value(merged)
        .map_err(|err| StoreError::Validation(format!("product {product_id}: {err}")))?;
    candidate.validate()?;

    let updated = store.update(PRODUCTS, product_id, Value::Object(fields))?;
    let updated: Product = serde_json::from_value(updated)?;
    info!(product = product_id, by = session.user_id(), "product updated");
    Ok(updated)
}

/// Removes the product and every saved-product entry pointing at it. Saved
/// entries go first so a failed delete never leaves them dangling.
pub fn remove_product(
    store: &dyn DataStore,
    session: &Session,
    product_id: &str,
) -> Result<(), StoreError> {
    session.require_admin()?;
    let _: Product = store::get_as(store, PRODUCTS, product_id)?;

    let saved: Vec<SavedProduct> = store::select_as(
        store,
        SAVED_PRODUCTS,
        &Query::new().eq("product_id", product_id),
    )?;
    for entry in &saved {
        store.delete(SAVED_PRODUCTS, &entry.id)?;
    }
    store.delete(PRODUCTS, product_id)?;

    info!(
        product = product_id,
        by = session.user_id(),
        saved_entries = saved.len(),
        "product removed"
    );
    Ok(())
}

pub fn list_saved(store: &dyn DataStore, session: &Session) -> Result<Vec<Product>, StoreError> {
    let saved: Vec<SavedProduct> = store::select_as(
        store,
        SAVED_PRODUCTS,
        &Query::new()
            .eq("user_id", session.user_id())
            .order_by("saved_at", Direction::Desc),
    )?;

    saved
        .iter()
        .map(|entry| store::get_as(store, PRODUCTS, &entry.product_id))
        .collect()
}

pub fn save_product(
    store: &dyn DataStore,
    session: &Session,
    product_id: &str,
) -> Result<SavedProduct, StoreError> {
    let _: Product = store::get_as(store, PRODUCTS, product_id)?;

    let entry = SavedProduct {
        id: SavedProduct::key(session.user_id(), product_id),
        user_id: session.user_id().to_string(),
        product_id: product_id.to_string(),
        saved_at: Utc::now(),
    };
    store::insert_as(store, SAVED_PRODUCTS, &entry)?;
    Ok(entry)
}

pub fn unsave_product(
    store: &dyn DataStore,
    session: &Session,
    product_id: &str,
) -> Result<(), StoreError> {
    store.delete(
        SAVED_PRODUCTS,
        &SavedProduct::key(session.user_id(), product_id),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::{FileStore, USERS};
    use serde_json::json;
    use tempfile::TempDir;

    fn store_with_catalog() -> (TempDir, FileStore) {
        let tmp = TempDir::new().unwrap();
        let store = FileStore::open(tmp.path()).unwrap();
        store
            .insert(USERS, json!({"id": "staff", "email": "staff@example.com", "role": "admin"}))
            .unwrap();
        store
            .insert(USERS, json!({"id": "u1", "email": "mia@example.com"}))
            .unwrap();
        store
            .insert(
                PRODUCTS,
                json!({
                    "id": "p1", "name": "Serum", "type": "serum", "area": "face",
                    "severity": "moderate", "impurity": "Acne", "created_at": "2026-02-01T10:00:00Z"
                }),
            )
            .unwrap();
        (tmp, store)
    }

    /// Delegates to a `FileStore` but fails every product delete.
    struct StickyProducts(FileStore);

    impl DataStore for StickyProducts {
        fn name(&self) -> &'static str {
            "sticky-products"
        }

        fn select(&self, collection: &str, query: &Query) -> Result<Vec<Value>, StoreError> {
            self.0.select(collection, query)
        }

        fn insert(&self, collection: &str, record: Value) -> Result<Value, StoreError> {
            self.0.insert(collection, record)
        }

        fn update(&self, collection: &str, id: &str, patch: Value) -> Result<Value, StoreError> {
            self.0.update(collection, id, patch)
        }

        fn delete(&self, collection: &str, id: &str) -> Result<(), StoreError> {
            if collection == PRODUCTS {
                return Err(StoreError::Transient("disk is read-only".to_string()));
            }
            self.0.delete(collection, id)
        }

        fn call(&self, procedure: &str, args: Value) -> Result<Value, StoreError> {
            self.0.call(procedure, args)
        }
    }

    #[test]
    fn decodes_area_variants() {
        let face: Product = serde_json::from_value(json!({
            "id": "p1", "name": "Serum", "type": "serum", "area": "face",
            "severity": "moderate", "skin_type": "oily", "impurity": "Acne",
            "created_at": "2026-02-01T10:00:00Z"
        }))
        .unwrap();
        assert_eq!(face.area(), Area::Face);
        assert_eq!(face.severity(), Some(Severity::Moderate));
        assert_eq!(face.body_part(), None);

        let body: Product = serde_json::from_value(json!({
            "id": "p2", "name": "Lotion", "type": "lotion", "area": "body",
            "body_part": "legs", "created_at": "2026-02-01T10:00:00Z"
        }))
        .unwrap();
        assert_eq!(body.severity(), None);
        assert_eq!(body.body_part(), Some("legs"));
    }

    #[test]
    fn face_product_requires_severity() {
        let result = serde_json::from_value::<Product>(json!({
            "id": "p1", "name": "Serum", "type": "serum", "area": "face",
            "created_at": "2026-02-01T10:00:00Z"
        }));
        assert!(result.is_err());
    }

    #[test]
    fn serializes_area_tag_inline() {
        let product: Product = serde_json::from_value(json!({
            "id": "p2", "name": "Lotion", "type": "lotion", "area": "body",
            "body_part": "legs", "created_at": "2026-02-01T10:00:00Z"
        }))
        .unwrap();
        let value = serde_json::to_value(&product).unwrap();
        assert_eq!(value["area"], "body");
        assert_eq!(value["body_part"], "legs");
        assert_eq!(value["type"], "lotion");
    }

    #[test]
    fn recommendations_follow_problems_and_skin_type() {
        let products: Vec<Product> = serde_json::from_value(json!([
            {"id": "a", "name": "A", "type": "serum", "area": "face", "severity": "severe",
             "impurity": "Acne", "skin_type": "oily", "created_at": "2026-01-01T00:00:00Z"},
            {"id": "b", "name": "B", "type": "serum", "area": "face", "severity": "mild",
             "impurity": "acne", "skin_type": "dry, normal", "created_at": "2026-01-02T00:00:00Z"},
            {"id": "c", "name": "C", "type": "mask", "area": "face", "severity": "mild",
             "impurity": "Wrinkles", "skin_type": "oily", "created_at": "2026-01-03T00:00:00Z"}
        ]))
        .unwrap();
        let problems = vec![KeyProblem {
            label: "Acne".to_string(),
            value: 70.0,
            severity: Severity::Moderate,
        }];

        let any_skin = recommend(&products, &problems, None, SortKey::NameAsc);
        assert_eq!(any_skin.iter().map(|p| p.id.as_str()).collect::<Vec<_>>(), ["a", "b"]);

        let dry = recommend(&products, &problems, Some("dry"), SortKey::NameAsc);
        assert_eq!(dry.iter().map(|p| p.id.as_str()).collect::<Vec<_>>(), ["b"]);

        let oily = recommend(&products, &problems, Some("Oily"), SortKey::NameAsc);
        assert_eq!(oily.iter().map(|p| p.id.as_str()).collect::<Vec<_>>(), ["a"]);
    }

    #[test]
    fn update_product_merges_and_revalidates() {
        let (_tmp, store) = store_with_catalog();
        let admin = Session::sign_in(&store, "staff").unwrap();

        let updated = update_product(
            &store,
            &admin,
            "p1",
            json!({"name": "Night Serum", "severity": "severe"}),
        )
        .unwrap();
        assert_eq!(updated.name, "Night Serum");
        assert_eq!(updated.severity(), Some(Severity::Severe));
        assert_eq!(updated.impurity, "Acne");

        let moved = update_product(
            &store,
            &admin,
            "p1",
            json!({"area": "body", "body_part": "back"}),
        )
        .unwrap();
        assert_eq!(moved.body_part(), Some("back"));
    }

    #[test]
    fn update_product_rejects_invalid_merge_without_writing() {
        let (_tmp, store) = store_with_catalog();
        let admin = Session::sign_in(&store, "staff").unwrap();

        let err = update_product(&store, &admin, "p1", json!({"severity": null})).unwrap_err();
        assert!(matches!(err, StoreError::Validation(_)));
        let err = update_product(&store, &admin, "p1", json!({"area": "body"})).unwrap_err();
        assert!(matches!(err, StoreError::Validation(_)));
        let err = update_product(&store, &admin, "p1", json!({"id": "p2"})).unwrap_err();
        assert!(matches!(err, StoreError::Validation(_)));
        assert!(update_product(&store, &admin, "p1", json!(["name"])).is_err());

        let stored: Product = store::get_as(&store, PRODUCTS, "p1").unwrap();
        assert_eq!(stored.severity(), Some(Severity::Moderate));
        assert_eq!(stored.area(), Area::Face);
    }

    #[test]
    fn update_product_requires_admin_and_existing_product() {
        let (_tmp, store) = store_with_catalog();
        let user = Session::sign_in(&store, "u1").unwrap();
        assert!(matches!(
            update_product(&store, &user, "p1", json!({"name": "X"})),
            Err(StoreError::Unauthorized(_))
        ));

        let admin = Session::sign_in(&store, "staff").unwrap();
        assert!(matches!(
            update_product(&store, &admin, "p404", json!({"name": "X"})),
            Err(StoreError::NotFound { .. })
        ));
    }

    #[test]
    fn remove_product_clears_saved_entries_first() {
        let (_tmp, store) = store_with_catalog();
        let user = Session::sign_in(&store, "u1").unwrap();
        save_product(&store, &user, "p1").unwrap();

        let sticky = StickyProducts(store.clone());
        let admin = Session::sign_in(&sticky, "staff").unwrap();
        let err = remove_product(&sticky, &admin, "p1").unwrap_err();
        assert!(matches!(err, StoreError::Transient(_)));

        let saved = store.select(SAVED_PRODUCTS, &Query::new()).unwrap();
        assert!(saved.is_empty());
        assert!(store::get_as::<Product>(&store, PRODUCTS, "p1").is_ok());

        remove_product(&store, &admin, "p1").unwrap();
        assert!(matches!(
            remove_product(&store, &admin, "p1"),
            Err(StoreError::NotFound { .. })
        ));
    }
}
