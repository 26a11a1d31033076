//! Client-side route table and the navigation guard.

use std::collections::HashMap;
use std::sync::Arc;

use once_cell::sync::Lazy;
use parking_lot::RwLock;

use crate::session::SessionManager;

/// Default window title used before any navigation happened.
pub const DEFAULT_TITLE: &str = "AventuraLocal - Descubre destinos turísticos locales";
/// Route unauthenticated visitors are redirected to.
pub const LOGIN_ROUTE: &str = "login";
/// Route authenticated visitors are bounced back to from guest pages.
pub const HOME_ROUTE: &str = "home";

/// Metadata flags attached to a route.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RouteMeta {
    /// Window title shown for the page.
    pub title: &'static str,
    /// Only reachable with an authenticated session.
    pub requires_auth: bool,
    /// Only reachable without an authenticated session.
    pub guest: bool,
}

/// One entry of the client route table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Route {
    /// Stable route name.
    pub name: &'static str,
    /// Path pattern.
    pub path: &'static str,
    /// Guard metadata.
    pub meta: RouteMeta,
}

const fn page(name: &'static str, path: &'static str, title: &'static str) -> Route {
    Route {
        name,
        path,
        meta: RouteMeta {
            title,
            requires_auth: false,
            guest: false,
        },
    }
}

const fn guest_page(name: &'static str, path: &'static str, title: &'static str) -> Route {
    Route {
        name,
        path,
        meta: RouteMeta {
            title,
            requires_auth: false,
            guest: true,
        },
    }
}

const fn auth_page(name: &'static str, path: &'static str, title: &'static str) -> Route {
    Route {
        name,
        path,
        meta: RouteMeta {
            title,
            requires_auth: true,
            guest: false,
        },
    }
}

/// The full client route table.
pub const ROUTES: &[Route] = &[
    page("home", "/", DEFAULT_TITLE),
    guest_page("login", "/login", "Iniciar sesión"),
    guest_page("register", "/register", "Registrarse"),
    page("destinations", "/destinations", "Descubre destinos"),
    page("destinationDetail", "/destinations/:id", "Detalles del destino"),
    page("routes", "/routes", "Rutas turísticas"),
    page("routeDetail", "/routes/:id", "Detalle de ruta"),
    auth_page("createRoute", "/routes/create", "Crear ruta"),
    page("communities", "/communities", "Comunidades"),
    page("communityDetail", "/communities/:id", "Detalle de comunidad"),
    page("events", "/events", "Eventos"),
    page("eventDetail", "/events/:id", "Detalle de evento"),
    auth_page("profile", "/profile", "Mi perfil"),
    page("notFound", "/404", "Página no encontrada"),
];

static ROUTE_INDEX: Lazy<HashMap<&'static str, &'static Route>> =
    Lazy::new(|| ROUTES.iter().map(|route| (route.name, route)).collect());

/// Look up a route by name.
pub fn route(name: &str) -> Option<&'static Route> {
    ROUTE_INDEX.get(name).copied()
}

/// Outcome of one guard evaluation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GuardDecision {
    /// Let the navigation proceed.
    Allow,
    /// Send the visitor to the login page, remembering where they were
    /// headed so they can be returned after authenticating.
    RedirectToLogin {
        /// Full path of the originally requested page.
        redirect: String,
    },
    /// Send the authenticated visitor back to the home page.
    RedirectToHome,
}

/// Gates route transitions on the current session state.
pub struct NavigationGuard {
    session: Arc<SessionManager>,
    title: RwLock<String>,
}

impl NavigationGuard {
    /// Guard consulting the given session manager.
    pub fn new(session: Arc<SessionManager>) -> Self {
        Self {
            session,
            title: RwLock::new(DEFAULT_TITLE.to_string()),
        }
    }

    /// Decide whether a transition to `target` may proceed.
    ///
    /// Also updates the displayed page title from the route metadata;
    /// that side effect is cosmetic and happens for every evaluation,
    /// allowed or not.
    pub fn evaluate(&self, target: &Route, full_path: &str) -> GuardDecision {
        *self.title.write() = target.meta.title.to_string();
        let authenticated = self.session.is_authenticated();
        if target.meta.requires_auth && !authenticated {
            GuardDecision::RedirectToLogin {
                redirect: full_path.to_string(),
            }
        } else if target.meta.guest && authenticated {
            GuardDecision::RedirectToHome
        } else {
            GuardDecision::Allow
        }
    }

    /// Currently displayed page title.
    pub fn page_title(&self) -> String {
        self.title.read().clone()
    }
}
