#![warn(clippy::all, missing_docs)]

//! Core state-synchronisation layer for the AventuraLocal client.
//!
//! This crate hosts the wire envelope and request-executor boundary,
//! the durable credential storage, the session manager, role-derived
//! permission flags, the per-resource async stores, and the navigation
//! guard consumed by the interactive frontend.

pub mod api;
pub mod config;
pub mod credentials;
pub mod models;
pub mod permissions;
pub mod router;
pub mod session;
pub mod store;

pub use api::{ApiError, HttpExecutor, RequestExecutor};
pub use config::AppConfig;
pub use credentials::{CredentialStore, TokenCell};
pub use permissions::PermissionFlags;
pub use router::{GuardDecision, NavigationGuard, Route};
pub use session::{Role, SessionManager, SessionPhase, User};
pub use store::{
    CategoriesStore, CommunitiesStore, DestinationsStore, EventsStore, ListQuery, ResourceSlice,
    RoutesStore, ToursStore,
};
