//! Event store: browsing, upcoming view, attendance.

use std::sync::Arc;

use parking_lot::RwLock;
use serde_json::Value;

use crate::api::{ApiRequest, RequestExecutor};
use crate::models::{Attendee, Event};

use super::{Entity, EndpointSet, ListQuery, ResourceSlice, ResourceStore};

const ENDPOINTS: EndpointSet = EndpointSet {
    base: "/events",
    search_param: "search",
    list_fallback: "Error al obtener eventos",
    popular_fallback: "Error al obtener eventos populares",
    detail_fallback: "Error al obtener evento",
    forbidden_hint: "Tu rol no permite gestionar eventos",
};

const UPCOMING_FALLBACK: &str = "Error al obtener próximos eventos";
const ATTEND_FALLBACK: &str = "Error al asistir al evento";
const CANCEL_FALLBACK: &str = "Error al cancelar asistencia";
const ATTENDEES_FALLBACK: &str = "Error al obtener asistentes";

impl Entity for Event {
    fn id(&self) -> i64 {
        self.id
    }
}

/// Store for the events resource family. Carries an extra "upcoming"
/// singleton view next to the shared slice.
pub struct EventsStore {
    inner: ResourceStore<Event>,
    upcoming: RwLock<Vec<Event>>,
}

impl EventsStore {
    /// New store over the given executor.
    pub fn new(api: Arc<dyn RequestExecutor>) -> Self {
        Self {
            inner: ResourceStore::new(api, ENDPOINTS),
            upcoming: RwLock::new(Vec::new()),
        }
    }

    /// Snapshot of the slice.
    pub fn slice(&self) -> ResourceSlice<Event> {
        self.inner.snapshot()
    }

    /// Last fetched upcoming view.
    pub fn upcoming_events(&self) -> Vec<Event> {
        self.upcoming.read().clone()
    }

    /// Fetch one page of events.
    pub async fn list(&self, query: ListQuery) -> Vec<Event> {
        self.inner.list(query).await
    }

    /// Fetch the popular view.
    pub async fn popular(&self, limit: u32) -> Vec<Event> {
        self.inner.popular(limit).await
    }

    /// Fetch the upcoming view; the backend nests it one level deeper
    /// than the other collection payloads.
    pub async fn upcoming(&self) -> Vec<Event> {
        let items = self
            .inner
            .list_view("/events/upcoming/", UPCOMING_FALLBACK)
            .await;
        *self.upcoming.write() = items.clone();
        items
    }

    /// Fetch one event into `current`.
    pub async fn get(&self, id: i64) -> Option<Event> {
        self.inner.get(id).await
    }

    /// Register attendance, projecting the flag and count on success.
    pub async fn attend(&self, id: i64) -> Option<Value> {
        let request = ApiRequest::post(format!("/events/{id}/attend"));
        let outcome = self.inner.call(request, ATTEND_FALLBACK).await;
        if outcome.is_some() {
            self.inner.project(id, |event| {
                event.is_attending = Some(true);
                event.attendee_count = Some(event.attendee_count.unwrap_or(0) + 1);
            });
        }
        outcome
    }

    /// Cancel attendance, projecting the flag and count on success.
    pub async fn cancel_attendance(&self, id: i64) -> bool {
        let request = ApiRequest::post(format!("/events/{id}/cancel-attendance"));
        let cancelled = self.inner.call_ok(request, CANCEL_FALLBACK).await;
        if cancelled {
            self.inner.project(id, |event| {
                event.is_attending = Some(false);
                // counts are signed on the wire; floor at zero explicitly
                event.attendee_count = Some((event.attendee_count.unwrap_or(0) - 1).max(0));
            });
        }
        cancelled
    }

    /// Attendees of one event.
    pub async fn attendees(&self, id: i64) -> Vec<Attendee> {
        self.inner
            .related(format!("/events/{id}/attendees"), ATTENDEES_FALLBACK)
            .await
    }
}
