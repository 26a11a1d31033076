//! Asynchronous resource stores, one per backend resource family.
//!
//! Every domain store wraps the same generic [`ResourceStore`] state
//! machine: `is_loading` spans exactly one in-flight operation, the
//! error message is cleared at the start of every operation and set
//! only by a failing one, and failures resolve to sentinel values
//! instead of propagating.

mod categories;
mod communities;
mod destinations;
mod events;
mod routes;
mod tours;

pub use categories::CategoriesStore;
pub use communities::CommunitiesStore;
pub use destinations::DestinationsStore;
pub use events::EventsStore;
pub use routes::RoutesStore;
pub use tours::ToursStore;

use std::sync::Arc;

use parking_lot::RwLock;
use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::api::{ApiError, ApiRequest, ListPayload, RequestExecutor};
use crate::models::PageInfo;

/// Resource record managed by a store slice.
pub trait Entity: DeserializeOwned + Clone + Send + Sync + 'static {
    /// Stable backend identifier.
    fn id(&self) -> i64;
}

/// Static endpoint configuration for one resource family.
#[derive(Debug, Clone, Copy)]
pub struct EndpointSet {
    /// Collection path, e.g. `/destinations`.
    pub base: &'static str,
    /// Query parameter name carrying the search term.
    pub search_param: &'static str,
    /// Fallback message for failed list fetches.
    pub list_fallback: &'static str,
    /// Fallback message for failed popular fetches.
    pub popular_fallback: &'static str,
    /// Fallback message for failed detail fetches.
    pub detail_fallback: &'static str,
    /// Role-requirement hint shown for 401/403 without a backend message.
    pub forbidden_hint: &'static str,
}

/// Pagination and search parameters for list operations.
#[derive(Debug, Clone, Default)]
pub struct ListQuery {
    /// Page number, 1-based.
    pub page: Option<u32>,
    /// Page size.
    pub per_page: Option<u32>,
    /// Free-text search term.
    pub search: Option<String>,
}

impl ListQuery {
    /// Query for one page with the given size.
    pub fn page(page: u32, per_page: u32) -> Self {
        Self {
            page: Some(page),
            per_page: Some(per_page),
            search: None,
        }
    }

    /// Attach a search term.
    pub fn search(mut self, term: impl Into<String>) -> Self {
        self.search = Some(term.into());
        self
    }
}

/// State slice owned by one store instance.
#[derive(Debug, Clone)]
pub struct ResourceSlice<T> {
    /// Last fetched collection page.
    pub items: Vec<T>,
    /// "Popular" singleton view.
    pub popular: Vec<T>,
    /// Currently displayed entity.
    pub current: Option<T>,
    /// True for the exact duration of one in-flight operation.
    pub is_loading: bool,
    /// Message of the last failed operation, if it was the most recent.
    pub error: Option<String>,
    /// Pagination as the backend last reported it.
    pub pagination: Option<PageInfo>,
}

impl<T> Default for ResourceSlice<T> {
    fn default() -> Self {
        Self {
            items: Vec::new(),
            popular: Vec::new(),
            current: None,
            is_loading: false,
            error: None,
            pagination: None,
        }
    }
}

/// Generic async store parametrized by entity type and endpoint set.
pub struct ResourceStore<T> {
    api: Arc<dyn RequestExecutor>,
    endpoints: EndpointSet,
    state: RwLock<ResourceSlice<T>>,
}

impl<T: Entity> ResourceStore<T> {
    pub(crate) fn new(api: Arc<dyn RequestExecutor>, endpoints: EndpointSet) -> Self {
        Self {
            api,
            endpoints,
            state: RwLock::new(ResourceSlice::default()),
        }
    }

    /// Snapshot of the current slice.
    pub fn snapshot(&self) -> ResourceSlice<T> {
        self.state.read().clone()
    }

    /// Last recorded failure message.
    pub fn error(&self) -> Option<String> {
        self.state.read().error.clone()
    }

    /// Whether an operation is in flight.
    pub fn is_loading(&self) -> bool {
        self.state.read().is_loading
    }

    /// Fetch one collection page, replacing `items` and `pagination`
    /// wholesale. Failure empties the collection.
    pub async fn list(&self, query: ListQuery) -> Vec<T> {
        self.begin();
        let mut request = ApiRequest::get(self.endpoints.base);
        if let Some(page) = query.page {
            request = request.query("page", page);
        }
        if let Some(per_page) = query.per_page {
            request = request.query("per_page", per_page);
        }
        if let Some(search) = query.search.filter(|term| !term.is_empty()) {
            request = request.query(self.endpoints.search_param, search);
        }
        match self
            .api
            .execute(request)
            .await
            .and_then(|envelope| envelope.take::<ListPayload<T>>("data"))
        {
            Ok(payload) => {
                let (items, pagination) = payload.into_parts();
                let mut slice = self.state.write();
                slice.items = items.clone();
                slice.pagination = pagination;
                slice.is_loading = false;
                items
            }
            Err(err) => {
                self.state.write().items = Vec::new();
                self.fail(&err, self.endpoints.list_fallback);
                Vec::new()
            }
        }
    }

    /// Fetch the "popular" singleton view.
    pub async fn popular(&self, limit: u32) -> Vec<T> {
        self.begin();
        let request =
            ApiRequest::get(format!("{}/popular", self.endpoints.base)).query("limit", limit);
        match self
            .api
            .execute(request)
            .await
            .and_then(|envelope| envelope.take::<Vec<T>>("data"))
        {
            Ok(items) => {
                let mut slice = self.state.write();
                slice.popular = items.clone();
                slice.is_loading = false;
                items
            }
            Err(err) => {
                self.state.write().popular = Vec::new();
                self.fail(&err, self.endpoints.popular_fallback);
                Vec::new()
            }
        }
    }

    /// Fetch one entity into `current`.
    pub async fn get(&self, id: i64) -> Option<T> {
        {
            let mut slice = self.state.write();
            slice.is_loading = true;
            slice.error = None;
            slice.current = None;
        }
        let request = ApiRequest::get(format!("{}/{id}", self.endpoints.base));
        match self
            .api
            .execute(request)
            .await
            .and_then(|envelope| envelope.take::<T>("data"))
        {
            Ok(entity) => {
                let mut slice = self.state.write();
                slice.current = Some(entity.clone());
                slice.is_loading = false;
                Some(entity)
            }
            Err(err) => {
                self.fail(&err, self.endpoints.detail_fallback);
                None
            }
        }
    }

    /// Create a new entity.
    pub async fn create(&self, body: Value, fallback: &str) -> Option<T> {
        let request = ApiRequest::post(self.endpoints.base).json(body);
        self.call(request, fallback).await
    }

    /// Update an entity, refreshing `current` when the ids match.
    pub async fn update(&self, id: i64, body: Value, fallback: &str) -> Option<T> {
        let request = ApiRequest::put(format!("{}/{id}", self.endpoints.base)).json(body);
        let updated: Option<T> = self.call(request, fallback).await;
        if let Some(entity) = &updated {
            let mut slice = self.state.write();
            if slice
                .current
                .as_ref()
                .is_some_and(|current| current.id() == id)
            {
                slice.current = Some(entity.clone());
            }
        }
        updated
    }

    /// Execute one request through the slice lifecycle, extracting the
    /// `data` field. Failure resolves to `None`.
    pub async fn call<U: DeserializeOwned>(
        &self,
        request: ApiRequest,
        fallback: &str,
    ) -> Option<U> {
        self.begin();
        match self
            .api
            .execute(request)
            .await
            .and_then(|envelope| envelope.take::<U>("data"))
        {
            Ok(value) => {
                self.finish();
                Some(value)
            }
            Err(err) => {
                self.fail(&err, fallback);
                None
            }
        }
    }

    /// Like [`Self::call`] but only the success flag matters.
    pub async fn call_ok(&self, request: ApiRequest, fallback: &str) -> bool {
        self.begin();
        match self.api.execute(request).await {
            Ok(_) => {
                self.finish();
                true
            }
            Err(err) => {
                self.fail(&err, fallback);
                false
            }
        }
    }

    /// Fetch a related collection; failure resolves to an empty list.
    pub async fn related<U: DeserializeOwned>(&self, path: String, fallback: &str) -> Vec<U> {
        self.call::<Vec<U>>(ApiRequest::get(path), fallback)
            .await
            .unwrap_or_default()
    }

    /// Fetch an auxiliary list view (e.g. upcoming events) without
    /// touching `items`.
    pub async fn list_view(&self, path: &str, fallback: &str) -> Vec<T> {
        self.call::<ListPayload<T>>(ApiRequest::get(path), fallback)
            .await
            .map(|payload| payload.into_parts().0)
            .unwrap_or_default()
    }

    /// Apply a best-effort local projection of a server-confirmed
    /// mutation to every slice copy of the entity. Superseded by the
    /// next full fetch.
    pub fn project(&self, id: i64, mut apply: impl FnMut(&mut T)) {
        let mut slice = self.state.write();
        if let Some(current) = slice.current.as_mut() {
            if current.id() == id {
                apply(current);
            }
        }
        for item in slice.items.iter_mut() {
            if item.id() == id {
                apply(item);
            }
        }
        for item in slice.popular.iter_mut() {
            if item.id() == id {
                apply(item);
            }
        }
    }

    fn begin(&self) {
        let mut slice = self.state.write();
        slice.is_loading = true;
        slice.error = None;
    }

    fn finish(&self) {
        self.state.write().is_loading = false;
    }

    fn fail(&self, err: &ApiError, fallback: &str) {
        let mut slice = self.state.write();
        slice.is_loading = false;
        slice.error = Some(err.user_message(fallback, Some(self.endpoints.forbidden_hint)));
    }
}
