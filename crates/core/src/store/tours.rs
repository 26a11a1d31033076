//! Tour store: browsing plus creation and update for entrepreneurs.

use std::sync::Arc;

use serde_json::Value;

use crate::api::RequestExecutor;
use crate::models::Tour;

use super::{Entity, EndpointSet, ListQuery, ResourceSlice, ResourceStore};

const ENDPOINTS: EndpointSet = EndpointSet {
    base: "/tours",
    search_param: "search",
    list_fallback: "Error al obtener tours",
    popular_fallback: "Error al obtener tours populares",
    detail_fallback: "Error al obtener tour",
    forbidden_hint: "Necesitas una cuenta de emprendedor para gestionar tours",
};

const CREATE_FALLBACK: &str = "Error al crear tour";
const UPDATE_FALLBACK: &str = "Error al actualizar tour";

impl Entity for Tour {
    fn id(&self) -> i64 {
        self.id
    }
}

/// Store for the tours resource family.
pub struct ToursStore {
    inner: ResourceStore<Tour>,
}

impl ToursStore {
    /// New store over the given executor.
    pub fn new(api: Arc<dyn RequestExecutor>) -> Self {
        Self {
            inner: ResourceStore::new(api, ENDPOINTS),
        }
    }

    /// Snapshot of the slice.
    pub fn slice(&self) -> ResourceSlice<Tour> {
        self.inner.snapshot()
    }

    /// Fetch the tour collection.
    pub async fn list(&self, query: ListQuery) -> Vec<Tour> {
        self.inner.list(query).await
    }

    /// Fetch one tour into `current`.
    pub async fn get(&self, id: i64) -> Option<Tour> {
        self.inner.get(id).await
    }

    /// Create a tour from the given payload.
    pub async fn create(&self, body: Value) -> Option<Tour> {
        self.inner.create(body, CREATE_FALLBACK).await
    }

    /// Update a tour, refreshing `current` when it matches.
    pub async fn update(&self, id: i64, body: Value) -> Option<Tour> {
        self.inner.update(id, body, UPDATE_FALLBACK).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::testing::ScriptedExecutor;
    use crate::api::Method;
    use serde_json::json;

    #[tokio::test]
    async fn create_returns_backend_entity() {
        let api = Arc::new(ScriptedExecutor::new().respond(
            Method::Post,
            "/tours",
            json!({"success": true, "data": {"id": 11, "name": "Ruta del café"}}),
        ));
        let store = ToursStore::new(api);

        let created = store.create(json!({"name": "Ruta del café"})).await;
        assert_eq!(created.map(|t| t.id), Some(11));
        assert!(store.slice().error.is_none());
    }

    #[tokio::test]
    async fn failed_create_records_backend_message() {
        let api = Arc::new(ScriptedExecutor::new().respond(
            Method::Post,
            "/tours",
            json!({"success": false, "message": "nombre duplicado"}),
        ));
        let store = ToursStore::new(api);

        assert!(store.create(json!({"name": "x"})).await.is_none());
        assert_eq!(store.slice().error.as_deref(), Some("nombre duplicado"));
        assert!(!store.slice().is_loading);
    }
}
