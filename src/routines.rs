use crate::products::Product;
use crate::session::Session;
use crate::store::models::{Routine, RoutineStep};
use crate::store::{
    self, DataStore, Direction, INSERT_ROUTINE_WITH_STEPS, PRODUCTS, Query, ROUTINE_STEPS,
    ROUTINES, StoreError, UPDATE_ROUTINE_WITH_STEPS,
};
use chrono::Utc;
use serde::Serialize;
use serde_json::json;
use std::collections::HashSet;

#[derive(Debug, Clone, Serialize)]
pub struct RoutineDetail {
    #[serde(flatten)]
    pub routine: Routine,
    pub steps: Vec<StepDetail>,
}

#[derive(Debug, Clone, Serialize)]
pub struct StepDetail {
    pub step_order: u32,
    pub product_id: String,
    pub product_name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
}

pub fn list_routines(
    store: &dyn DataStore,
    session: &Session,
) -> Result<Vec<RoutineDetail>, StoreError> {
    let routines: Vec<Routine> = store::select_as(
        store,
        ROUTINES,
        &Query::new()
            .eq("user_id", session.user_id())
            .order_by("created_at", Direction::Asc),
    )?;

    routines
        .into_iter()
        .map(|routine| load_detail(store, routine))
        .collect()
}

pub fn create_routine(
    store: &dyn DataStore,
    session: &Session,
    name: &str,
    product_ids: &[String],
) -> Result<RoutineDetail, StoreError> {
    let name = require_name(name)?;
    check_steps(store, product_ids)?;

    let created = store.call(
        INSERT_ROUTINE_WITH_STEPS,
        json!({
            "routine": {
                "user_id": session.user_id(),
                "name": name,
                "created_at": Utc::now(),
            },
            "steps": step_payload(product_ids),
        }),
    )?;
    let routine: Routine = serde_json::from_value(created)?;
    load_detail(store, routine)
}

pub fn update_routine(
    store: &dyn DataStore,
    session: &Session,
    routine_id: &str,
    name: Option<&str>,
    product_ids: &[String],
) -> Result<RoutineDetail, StoreError> {
    let existing: Routine = store::get_as(store, ROUTINES, routine_id)?;
    if existing.user_id != session.user_id() {
        return Err(StoreError::Unauthorized(format!(
            "routine {routine_id} belongs to another user"
        )));
    }
    let name = name.map(require_name).transpose()?;
    check_steps(store, product_ids)?;

    let mut args = json!({
        "routine_id": routine_id,
        "steps": step_payload(product_ids),
    });
    if let Some(name) = name {
        args["name"] = json!(name);
    }

    let updated = store.call(UPDATE_ROUTINE_WITH_STEPS, args)?;
    let routine: Routine = serde_json::from_value(updated)?;
    load_detail(store, routine)
}

fn require_name(name: &str) -> Result<&str, StoreError> {
    let name = name.trim();
    if name.is_empty() {
        return Err(StoreError::Validation("routine name must not be empty".to_string()));
    }
    Ok(name)
}

fn check_steps(store: &dyn DataStore, product_ids: &[String]) -> Result<(), StoreError> {
    if product_ids.is_empty() {
        return Err(StoreError::Validation("a routine needs at least one step".to_string()));
    }

    let mut seen = HashSet::new();
    for product_id in product_ids {
        if !seen.insert(product_id.as_str()) {
            return Err(StoreError::Validation(format!(
                "product {product_id} appears twice in the routine"
            )));
        }
        let _: Product = store::get_as(store, PRODUCTS, product_id)?;
    }
    Ok(())
}

fn step_payload(product_ids: &[String]) -> Vec<serde_json::Value> {
    product_ids
        .iter()
        .map(|product_id| json!({ "product_id": product_id }))
        .collect()
}

fn load_detail(store: &dyn DataStore, routine: Routine) -> Result<RoutineDetail, StoreError> {
    let steps: Vec<RoutineStep> = store::select_as(
        store,
        ROUTINE_STEPS,
        &Query::new()
            .eq("routine_id", routine.id.as_str())
            .order_by("step_order", Direction::Asc),
    )?;

    let steps = steps
        .into_iter()
        .map(|step| {
            let product_name = match store::get_as::<Product>(store, PRODUCTS, &step.product_id) {
                Ok(product) => product.name,
                Err(StoreError::NotFound { .. }) => "(removed product)".to_string(),
                Err(err) => return Err(err),
            };
            Ok(StepDetail {
                step_order: step.step_order,
                product_id: step.product_id,
                product_name,
                note: step.note,
            })
        })
        .collect::<Result<Vec<_>, StoreError>>()?;

    Ok(RoutineDetail { routine, steps })
}
