//! Category store.

use std::sync::Arc;

use crate::api::RequestExecutor;
use crate::models::{Category, Destination};

use super::{Entity, EndpointSet, ListQuery, ResourceSlice, ResourceStore};

const ENDPOINTS: EndpointSet = EndpointSet {
    base: "/categories",
    search_param: "search",
    list_fallback: "Error al obtener categorías",
    popular_fallback: "Error al obtener categorías populares",
    detail_fallback: "Error al obtener categoría",
    forbidden_hint: "Necesitas iniciar sesión con un rol autorizado para esta acción",
};

const DESTINATIONS_FALLBACK: &str = "Error al obtener destinos de la categoría";

impl Entity for Category {
    fn id(&self) -> i64 {
        self.id
    }
}

/// Store for the categories resource family.
pub struct CategoriesStore {
    inner: ResourceStore<Category>,
}

impl CategoriesStore {
    /// New store over the given executor.
    pub fn new(api: Arc<dyn RequestExecutor>) -> Self {
        Self {
            inner: ResourceStore::new(api, ENDPOINTS),
        }
    }

    /// Snapshot of the slice.
    pub fn slice(&self) -> ResourceSlice<Category> {
        self.inner.snapshot()
    }

    /// Fetch the category collection.
    pub async fn list(&self, query: ListQuery) -> Vec<Category> {
        self.inner.list(query).await
    }

    /// Fetch one category into `current`.
    pub async fn get(&self, id: i64) -> Option<Category> {
        self.inner.get(id).await
    }

    /// Destinations belonging to one category.
    pub async fn destinations(&self, id: i64) -> Vec<Destination> {
        self.inner
            .related(format!("/categories/{id}/destinations"), DESTINATIONS_FALLBACK)
            .await
    }
}
