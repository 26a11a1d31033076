//! Community store: membership actions and related collections.

use std::sync::Arc;

use serde_json::Value;

use crate::api::{ApiRequest, RequestExecutor};
use crate::models::{Community, Event, TravelRoute, UserSummary};

use super::{Entity, EndpointSet, ListQuery, ResourceSlice, ResourceStore};

const ENDPOINTS: EndpointSet = EndpointSet {
    base: "/communities",
    search_param: "search",
    list_fallback: "Error al obtener comunidades",
    popular_fallback: "Error al obtener comunidades populares",
    detail_fallback: "Error al obtener comunidad",
    forbidden_hint: "Necesitas iniciar sesión para participar en comunidades",
};

const JOIN_FALLBACK: &str = "Error al unirse a la comunidad";
const LEAVE_FALLBACK: &str = "Error al abandonar la comunidad";
const EVENTS_FALLBACK: &str = "Error al obtener eventos de la comunidad";
const ROUTES_FALLBACK: &str = "Error al obtener rutas de la comunidad";
const MEMBERS_FALLBACK: &str = "Error al obtener miembros de la comunidad";

impl Entity for Community {
    fn id(&self) -> i64 {
        self.id
    }
}

/// Store for the communities resource family.
pub struct CommunitiesStore {
    inner: ResourceStore<Community>,
}

impl CommunitiesStore {
    /// New store over the given executor.
    pub fn new(api: Arc<dyn RequestExecutor>) -> Self {
        Self {
            inner: ResourceStore::new(api, ENDPOINTS),
        }
    }

    /// Snapshot of the slice.
    pub fn slice(&self) -> ResourceSlice<Community> {
        self.inner.snapshot()
    }

    /// Fetch one page of communities.
    pub async fn list(&self, query: ListQuery) -> Vec<Community> {
        self.inner.list(query).await
    }

    /// Fetch the popular view.
    pub async fn popular(&self, limit: u32) -> Vec<Community> {
        self.inner.popular(limit).await
    }

    /// Fetch one community into `current`.
    pub async fn get(&self, id: i64) -> Option<Community> {
        self.inner.get(id).await
    }

    /// Join a community; on success every slice copy gains membership
    /// and one member.
    pub async fn join(&self, id: i64) -> Option<Value> {
        let request = ApiRequest::post(format!("/communities/{id}/join"));
        let outcome = self.inner.call(request, JOIN_FALLBACK).await;
        if outcome.is_some() {
            self.inner.project(id, |community| {
                community.is_member = Some(true);
                community.member_count = Some(community.member_count.unwrap_or(0) + 1);
            });
        }
        outcome
    }

    /// Leave a community; on success every slice copy loses membership
    /// and one member, never dropping below zero.
    pub async fn leave(&self, id: i64) -> bool {
        let request = ApiRequest::post(format!("/communities/{id}/leave"));
        let left = self.inner.call_ok(request, LEAVE_FALLBACK).await;
        if left {
            self.inner.project(id, |community| {
                community.is_member = Some(false);
                // counts are signed on the wire; floor at zero explicitly
                community.member_count = Some((community.member_count.unwrap_or(0) - 1).max(0));
            });
        }
        left
    }

    /// Events organised inside one community.
    pub async fn events(&self, id: i64) -> Vec<Event> {
        self.inner
            .related(format!("/communities/{id}/events"), EVENTS_FALLBACK)
            .await
    }

    /// Routes shared inside one community.
    pub async fn routes(&self, id: i64) -> Vec<TravelRoute> {
        self.inner
            .related(format!("/communities/{id}/routes"), ROUTES_FALLBACK)
            .await
    }

    /// Members of one community.
    pub async fn members(&self, id: i64) -> Vec<UserSummary> {
        self.inner
            .related(format!("/communities/{id}/members"), MEMBERS_FALLBACK)
            .await
    }
}
