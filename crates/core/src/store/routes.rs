//! Travel-route store: browsing, creation, favorites, progress status.

use std::sync::Arc;

use serde_json::{json, Value};

use crate::api::{ApiRequest, RequestExecutor};
use crate::models::{RouteStatus, TravelRoute};

use super::{Entity, EndpointSet, ListQuery, ResourceSlice, ResourceStore};

const ENDPOINTS: EndpointSet = EndpointSet {
    base: "/routes",
    // the backend filters routes by name rather than a generic term
    search_param: "name",
    list_fallback: "Error al obtener rutas",
    popular_fallback: "Error al obtener rutas populares",
    detail_fallback: "Error al obtener ruta",
    forbidden_hint: "Necesitas iniciar sesión con un rol autorizado para esta acción",
};

const CREATE_FALLBACK: &str = "Error al crear ruta";
const UPDATE_FALLBACK: &str = "Error al actualizar ruta";
const FAVORITE_FALLBACK: &str = "Error al añadir a favoritos";
const STATUS_FALLBACK: &str = "Error al actualizar estado de la ruta";

impl Entity for TravelRoute {
    fn id(&self) -> i64 {
        self.id
    }
}

/// Store for the travel-routes resource family.
pub struct RoutesStore {
    inner: ResourceStore<TravelRoute>,
}

impl RoutesStore {
    /// New store over the given executor.
    pub fn new(api: Arc<dyn RequestExecutor>) -> Self {
        Self {
            inner: ResourceStore::new(api, ENDPOINTS),
        }
    }

    /// Snapshot of the slice.
    pub fn slice(&self) -> ResourceSlice<TravelRoute> {
        self.inner.snapshot()
    }

    /// Fetch one page of routes.
    pub async fn list(&self, query: ListQuery) -> Vec<TravelRoute> {
        self.inner.list(query).await
    }

    /// Fetch the popular view.
    pub async fn popular(&self, limit: u32) -> Vec<TravelRoute> {
        self.inner.popular(limit).await
    }

    /// Fetch one route into `current`.
    pub async fn get(&self, id: i64) -> Option<TravelRoute> {
        self.inner.get(id).await
    }

    /// Create a route from the given payload.
    pub async fn create(&self, body: Value) -> Option<TravelRoute> {
        self.inner.create(body, CREATE_FALLBACK).await
    }

    /// Update a route, refreshing `current` when it matches.
    pub async fn update(&self, id: i64, body: Value) -> Option<TravelRoute> {
        self.inner.update(id, body, UPDATE_FALLBACK).await
    }

    /// Toggle the favorite flag, flipping every slice copy on success.
    pub async fn toggle_favorite(&self, id: i64) -> Option<Value> {
        let request = ApiRequest::post(format!("/users/routes/{id}/toggle-favorite"));
        let outcome = self.inner.call(request, FAVORITE_FALLBACK).await;
        if outcome.is_some() {
            self.inner.project(id, |route| {
                route.is_favorite = Some(!route.is_favorite.unwrap_or(false));
            });
        }
        outcome
    }

    /// Update the per-user progress status, projecting it onto every
    /// slice copy on success.
    pub async fn update_status(&self, id: i64, status: RouteStatus) -> Option<Value> {
        let request = ApiRequest::post(format!("/users/routes/{id}/update-status"))
            .json(json!({ "status": status }));
        let outcome = self.inner.call(request, STATUS_FALLBACK).await;
        if outcome.is_some() {
            self.inner.project(id, |route| route.status = Some(status));
        }
        outcome
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::testing::ScriptedExecutor;
    use crate::api::Method;
    use serde_json::json;

    fn route(id: i64, name: &str) -> Value {
        json!({"id": id, "name": name})
    }

    fn store_with(api: ScriptedExecutor) -> (RoutesStore, Arc<ScriptedExecutor>) {
        let api = Arc::new(api);
        (RoutesStore::new(api.clone()), api)
    }

    #[tokio::test]
    async fn paginated_list_mirrors_backend_page_info() {
        let api = ScriptedExecutor::new().respond(
            Method::Get,
            "/routes",
            json!({"success": true, "data": {
                "data": [route(1, "Costera"), route(2, "Andina"), route(3, "Selva"),
                         route(4, "Urbana"), route(5, "Histórica")],
                "current_page": 2,
                "last_page": 2,
                "total": 11,
                "per_page": 6,
                "links": [{"url": null, "label": "&laquo;", "active": false}]
            }}),
        );
        let (store, api) = store_with(api);

        let items = store.list(ListQuery::page(2, 6)).await;
        assert_eq!(items.len(), 5);
        let slice = store.slice();
        let pagination = slice.pagination.expect("pagination");
        assert_eq!(pagination.current_page, 2);
        assert_eq!(pagination.last_page, 2);
        assert_eq!(pagination.total, 11);
        assert_eq!(pagination.per_page, 6);

        let seen = api.requests();
        assert!(seen[0].query.contains(&("page".to_string(), "2".to_string())));
    }

    #[tokio::test]
    async fn search_uses_the_name_parameter() {
        let api = ScriptedExecutor::new().respond(
            Method::Get,
            "/routes",
            json!({"success": true, "data": []}),
        );
        let (store, api) = store_with(api);

        store.list(ListQuery::default().search("costa")).await;
        let seen = api.requests();
        assert!(seen[0]
            .query
            .contains(&("name".to_string(), "costa".to_string())));
    }

    #[tokio::test]
    async fn update_status_projects_onto_copies() {
        let api = ScriptedExecutor::new()
            .respond(
                Method::Get,
                "/routes",
                json!({"success": true, "data": [route(4, "Urbana")]}),
            )
            .respond(
                Method::Post,
                "/users/routes/4/update-status",
                json!({"success": true, "data": {"status": "completed"}}),
            );
        let (store, _api) = store_with(api);
        store.list(ListQuery::default()).await;

        assert!(store
            .update_status(4, RouteStatus::Completed)
            .await
            .is_some());
        let slice = store.slice();
        assert_eq!(slice.items[0].status, Some(RouteStatus::Completed));
    }

    #[tokio::test]
    async fn update_refreshes_matching_current() {
        let api = ScriptedExecutor::new()
            .respond(
                Method::Get,
                "/routes/7",
                json!({"success": true, "data": route(7, "Vieja")}),
            )
            .respond(
                Method::Put,
                "/routes/7",
                json!({"success": true, "data": route(7, "Renovada")}),
            );
        let (store, _api) = store_with(api);
        store.get(7).await;

        let updated = store.update(7, json!({"name": "Renovada"})).await;
        assert_eq!(updated.map(|r| r.name), Some("Renovada".to_string()));
        assert_eq!(
            store.slice().current.map(|r| r.name),
            Some("Renovada".to_string())
        );
    }
}
