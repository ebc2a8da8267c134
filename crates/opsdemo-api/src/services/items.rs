use std::sync::Mutex;

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Extension, Json,
};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use opsdemo_core::error::{OpsError, Result};
use opsdemo_core::CorrelationId;

use crate::app_state::AppState;
use crate::error::ApiResult;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Item {
    pub id: u64,
    pub name: String,
}

#[derive(Debug, Deserialize)]
pub struct NewItem {
    pub name: String,
}

/// In-memory item list. Ids are sequential from 1.
#[derive(Debug)]
pub struct ItemStore {
    inner: Mutex<StoreInner>,
}

#[derive(Debug)]
struct StoreInner {
    items: Vec<Item>,
    next_id: u64,
}

impl Default for ItemStore {
    fn default() -> Self {
        Self::new()
    }
}

impl ItemStore {
    pub fn new() -> Self {
        Self {
            inner: Mutex::new(StoreInner {
                items: Vec::new(),
                next_id: 1,
            }),
        }
    }

    fn lock(&self) -> Result<std::sync::MutexGuard<'_, StoreInner>> {
        self.inner
            .lock()
            .map_err(|_| OpsError::Internal("item store lock poisoned".into()))
    }

    pub fn list(&self) -> Result<Vec<Item>> {
        Ok(self.lock()?.items.clone())
    }

    pub fn get(&self, id: u64) -> Result<Item> {
        self.lock()?
            .items
            .iter()
            .find(|i| i.id == id)
            .cloned()
            .ok_or_else(|| OpsError::NotFound(format!("item {id}")))
    }

    pub fn add(&self, name: &str) -> Result<Item> {
        let name = name.trim();
        if name.is_empty() {
            return Err(OpsError::BadRequest("item name must not be blank".into()));
        }

        let mut g = self.lock()?;
        let item = Item {
            id: g.next_id,
            name: name.to_owned(),
        };
        g.next_id += 1;
        g.items.push(item.clone());
        Ok(item)
    }
}

pub async fn list_items(
    State(app): State<AppState>,
    Extension(request_id): Extension<CorrelationId>,
) -> ApiResult<Json<Value>> {
    let items = app.items().list()?;
    Ok(Json(json!({
        "count": items.len(),
        "items": items,
        "request_id": request_id.as_str(),
    })))
}

pub async fn create_item(
    State(app): State<AppState>,
    Extension(request_id): Extension<CorrelationId>,
    Json(req): Json<NewItem>,
) -> ApiResult<(StatusCode, Json<Value>)> {
    let item = app.items().add(&req.name)?;
    tracing::debug!(request_id = %request_id, id = item.id, "item created");
    Ok((
        StatusCode::CREATED,
        Json(json!({ "item": item, "request_id": request_id.as_str() })),
    ))
}

pub async fn get_item(
    State(app): State<AppState>,
    Extension(request_id): Extension<CorrelationId>,
    Path(id): Path<u64>,
) -> ApiResult<Json<Value>> {
    let item = app.items().get(id)?;
    Ok(Json(json!({ "item": item, "request_id": request_id.as_str() })))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ids_are_sequential_from_one() {
        let store = ItemStore::new();
        assert_eq!(store.add("widget").unwrap().id, 1);
        assert_eq!(store.add("gadget").unwrap().id, 2);
        assert_eq!(store.list().unwrap().len(), 2);
        assert_eq!(store.get(2).unwrap().name, "gadget");
    }

    #[test]
    fn blank_name_is_rejected() {
        let store = ItemStore::new();
        let err = store.add("   ").unwrap_err();
        assert_eq!(err.client_code().as_str(), "BAD_REQUEST");
        assert!(store.list().unwrap().is_empty());
    }

    #[test]
    fn missing_item_is_not_found() {
        let err = ItemStore::new().get(42).unwrap_err();
        assert_eq!(err.client_code().http_status(), 404);
    }
}
