//! Destination store: catalogue browsing, reviews, favorites.

use std::sync::Arc;

use serde::Deserialize;
use serde_json::Value;

use crate::api::{ApiRequest, RequestExecutor};
use crate::models::{Destination, Review};

use super::{Entity, EndpointSet, ListQuery, ResourceSlice, ResourceStore};

const ENDPOINTS: EndpointSet = EndpointSet {
    base: "/destinations",
    search_param: "search",
    list_fallback: "Error al obtener destinos",
    popular_fallback: "Error al obtener destinos populares",
    detail_fallback: "Error al obtener destino",
    forbidden_hint: "Necesitas iniciar sesión con un rol autorizado para esta acción",
};

const REVIEWS_FALLBACK: &str = "Error al obtener reseñas";
const NEARBY_FALLBACK: &str = "Error al obtener destinos cercanos";
const FAVORITE_FALLBACK: &str = "Error al añadir a favoritos";

impl Entity for Destination {
    fn id(&self) -> i64 {
        self.id
    }
}

#[derive(Debug, Deserialize)]
struct NearbyPayload {
    #[serde(default)]
    results: Vec<Destination>,
}

/// Store for the destinations resource family.
pub struct DestinationsStore {
    inner: ResourceStore<Destination>,
}

impl DestinationsStore {
    /// New store over the given executor.
    pub fn new(api: Arc<dyn RequestExecutor>) -> Self {
        Self {
            inner: ResourceStore::new(api, ENDPOINTS),
        }
    }

    /// Snapshot of the slice.
    pub fn slice(&self) -> ResourceSlice<Destination> {
        self.inner.snapshot()
    }

    /// Fetch one page of destinations.
    pub async fn list(&self, query: ListQuery) -> Vec<Destination> {
        self.inner.list(query).await
    }

    /// Fetch the popular view.
    pub async fn popular(&self, limit: u32) -> Vec<Destination> {
        self.inner.popular(limit).await
    }

    /// Fetch one destination into `current`.
    pub async fn get(&self, id: i64) -> Option<Destination> {
        self.inner.get(id).await
    }

    /// Reviews left on a destination.
    pub async fn reviews(&self, id: i64) -> Vec<Review> {
        self.inner
            .related(format!("/destinations/{id}/reviews"), REVIEWS_FALLBACK)
            .await
    }

    /// Destinations within `radius` kilometres of the given one.
    pub async fn nearby(&self, destination_id: i64, radius: u32) -> Vec<Destination> {
        let request = ApiRequest::get("/destinations/nearby")
            .query("destination_id", destination_id)
            .query("radius", radius);
        self.inner
            .call::<NearbyPayload>(request, NEARBY_FALLBACK)
            .await
            .map(|payload| payload.results)
            .unwrap_or_default()
    }

    /// Toggle the favorite flag, flipping every slice copy on success.
    pub async fn toggle_favorite(&self, id: i64) -> Option<Value> {
        let request = ApiRequest::post(format!("/users/destinations/{id}/toggle-favorite"));
        let outcome = self.inner.call(request, FAVORITE_FALLBACK).await;
        if outcome.is_some() {
            self.inner.project(id, |destination| {
                destination.is_favorite = Some(!destination.is_favorite.unwrap_or(false));
            });
        }
        outcome
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::testing::ScriptedExecutor;
    use crate::api::{ApiError, Method};
    use serde_json::json;

    fn destination(id: i64, name: &str) -> Value {
        json!({"id": id, "name": name})
    }

    fn store_with(api: ScriptedExecutor) -> (DestinationsStore, Arc<ScriptedExecutor>) {
        let api = Arc::new(api);
        (DestinationsStore::new(api.clone()), api)
    }

    #[tokio::test]
    async fn list_replaces_collection_and_pagination() {
        let api = ScriptedExecutor::new().respond(
            Method::Get,
            "/destinations",
            json!({"success": true, "data": {
                "data": [destination(1, "Playa"), destination(2, "Sierra")],
                "current_page": 1,
                "last_page": 4,
                "total": 20,
                "per_page": 6,
                "links": []
            }}),
        );
        let (store, api) = store_with(api);

        let items = store.list(ListQuery::page(1, 6)).await;
        assert_eq!(items.len(), 2);
        let slice = store.slice();
        assert_eq!(slice.items.len(), 2);
        assert_eq!(slice.pagination.as_ref().map(|p| p.last_page), Some(4));
        assert!(!slice.is_loading);
        assert!(slice.error.is_none());

        let seen = api.requests();
        assert!(seen[0].query.contains(&("page".to_string(), "1".to_string())));
        assert!(seen[0]
            .query
            .contains(&("per_page".to_string(), "6".to_string())));
    }

    #[tokio::test]
    async fn list_failure_empties_collection_and_records_error() {
        let api = ScriptedExecutor::new().fail_with(
            Method::Get,
            "/destinations",
            ApiError::Network("timeout".into()),
        );
        let (store, _api) = store_with(api);

        let items = store.list(ListQuery::default()).await;
        assert!(items.is_empty());
        let slice = store.slice();
        assert!(slice.items.is_empty());
        assert_eq!(slice.error.as_deref(), Some("Error al obtener destinos"));
        assert!(!slice.is_loading);
    }

    #[tokio::test]
    async fn nearby_unwraps_results_field() {
        let api = ScriptedExecutor::new().respond(
            Method::Get,
            "/destinations/nearby",
            json!({"success": true, "data": {"results": [destination(9, "Cueva")]}}),
        );
        let (store, _api) = store_with(api);

        let nearby = store.nearby(1, 50).await;
        assert_eq!(nearby.len(), 1);
        assert_eq!(nearby[0].name, "Cueva");
    }

    #[tokio::test]
    async fn toggle_favorite_flips_slice_copies() {
        let api = ScriptedExecutor::new()
            .respond(
                Method::Get,
                "/destinations/3",
                json!({"success": true, "data": destination(3, "Lago")}),
            )
            .respond(
                Method::Post,
                "/users/destinations/3/toggle-favorite",
                json!({"success": true, "data": {"favorited": true}}),
            );
        let (store, _api) = store_with(api);
        store.get(3).await;

        assert!(store.toggle_favorite(3).await.is_some());
        let slice = store.slice();
        assert_eq!(slice.current.and_then(|d| d.is_favorite), Some(true));
    }
}
