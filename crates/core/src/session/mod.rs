//! Session management: credential plus current user identity.

mod models;

pub use models::{ProfilePatch, RegisterForm, Role, User};

use std::sync::Arc;

use parking_lot::RwLock;
use serde_json::{json, Value};
use tracing::{info, warn};

use crate::api::{ApiRequest, FileUpload, MultipartField, RequestExecutor};
use crate::credentials::{CredentialStore, TokenCell};
use crate::permissions::PermissionFlags;

const LOGIN_FALLBACK: &str = "Error al iniciar sesión";
const REGISTER_FALLBACK: &str = "Error al registrarse";
const PROFILE_FALLBACK: &str = "Error al obtener perfil";
const UPDATE_PROFILE_FALLBACK: &str = "Error al actualizar perfil";
const UPDATE_PHOTO_FALLBACK: &str = "Error al actualizar foto de perfil";

/// Observable session lifecycle phases.
///
/// `TokenOnly` exists only during the hydration window at startup and
/// mid-login; no completed operation leaves the session in it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionPhase {
    /// No credential held.
    Anonymous,
    /// Credential present, identity not yet fetched.
    TokenOnly,
    /// Credential and identity both present.
    Authenticated,
}

#[derive(Debug, Default)]
struct SessionSlice {
    user: Option<User>,
    is_loading: bool,
    error: Option<String>,
}

/// Owns the bearer credential and the current user identity, and
/// orchestrates login, registration, profile refresh and logout.
pub struct SessionManager {
    api: Arc<dyn RequestExecutor>,
    token: TokenCell,
    credentials: CredentialStore,
    state: RwLock<SessionSlice>,
}

impl SessionManager {
    /// Build a manager over the given executor, token cell and store.
    ///
    /// The token cell must be the same instance handed to the HTTP
    /// executor so credential changes are observed on the next request.
    pub fn new(
        api: Arc<dyn RequestExecutor>,
        token: TokenCell,
        credentials: CredentialStore,
    ) -> Self {
        Self {
            api,
            token,
            credentials,
            state: RwLock::new(SessionSlice::default()),
        }
    }

    /// Install the persisted credential, if any, entering `TokenOnly`.
    /// Callers follow up with [`Self::fetch_profile`] to complete the
    /// session.
    pub fn hydrate(&self) -> anyhow::Result<bool> {
        match self.credentials.load()? {
            Some(token) => {
                self.token.set(token);
                Ok(true)
            }
            None => Ok(false),
        }
    }

    /// Current lifecycle phase.
    pub fn phase(&self) -> SessionPhase {
        let has_token = self.token.is_present();
        let has_user = self.state.read().user.is_some();
        match (has_token, has_user) {
            (true, true) => SessionPhase::Authenticated,
            (true, false) => SessionPhase::TokenOnly,
            _ => SessionPhase::Anonymous,
        }
    }

    /// Whether both credential and identity are present.
    pub fn is_authenticated(&self) -> bool {
        self.phase() == SessionPhase::Authenticated
    }

    /// Current identity, if any.
    pub fn user(&self) -> Option<User> {
        self.state.read().user.clone()
    }

    /// Current credential, if any.
    pub fn token(&self) -> Option<String> {
        self.token.get()
    }

    /// Last recorded failure message.
    pub fn error(&self) -> Option<String> {
        self.state.read().error.clone()
    }

    /// Whether an operation is in flight.
    pub fn is_loading(&self) -> bool {
        self.state.read().is_loading
    }

    /// Capability flags for the current identity.
    pub fn permissions(&self) -> PermissionFlags {
        PermissionFlags::for_user(self.state.read().user.as_ref())
    }

    /// Request a token and chain a profile fetch.
    ///
    /// Returns `true` only when both steps succeed. A failed profile
    /// fetch tears the whole session down, including the credential
    /// that was just persisted.
    pub async fn login(&self, email: &str, password: &str) -> bool {
        self.begin();
        let request = ApiRequest::post("/auth/login")
            .json(json!({ "email": email, "password": password }));
        let token = match self
            .api
            .execute(request)
            .await
            .and_then(|envelope| envelope.take::<String>("token"))
        {
            Ok(token) => token,
            Err(err) => {
                self.fail(err.user_message(LOGIN_FALLBACK, None));
                return false;
            }
        };

        self.token.set(token.clone());
        if let Err(err) = self.credentials.persist(&token) {
            warn!("failed to persist credential: {err:#}");
        }

        match self.fetch_profile_inner().await {
            Ok(user) => {
                info!(user = %user.email, "login completed");
                self.finish();
                true
            }
            Err(err) => {
                let message = err.user_message(LOGIN_FALLBACK, None);
                self.logout().await;
                self.state.write().error = Some(message);
                false
            }
        }
    }

    /// Submit a registration as a multipart payload. Does not establish
    /// a session; callers log in separately afterwards.
    pub async fn register(&self, form: RegisterForm) -> bool {
        self.begin();
        let mut fields = vec![
            MultipartField::text("name", form.name),
            MultipartField::text("email", form.email),
            MultipartField::text("password", form.password),
            MultipartField::text("password_confirmation", form.password_confirmation),
            MultipartField::text("role", form.role.as_str()),
        ];
        if let Some(photo) = form.profile_photo {
            fields.push(MultipartField::file("profile_photo", photo));
        }
        let request = ApiRequest::post("/auth/register").multipart(fields);
        match self.api.execute(request).await {
            Ok(_) => {
                self.finish();
                true
            }
            Err(err) => {
                self.fail(err.user_message(REGISTER_FALLBACK, None));
                false
            }
        }
    }

    /// Fetch the current identity and install it into the session.
    ///
    /// No-op returning `None` without a credential. Any failure forces
    /// a full logout so a token never outlives its identity.
    pub async fn fetch_profile(&self) -> Option<User> {
        if self.token.get().is_none() {
            return None;
        }
        self.begin();
        match self.fetch_profile_inner().await {
            Ok(user) => {
                self.finish();
                Some(user)
            }
            Err(err) => {
                let message = err.user_message(PROFILE_FALLBACK, None);
                self.logout().await;
                self.state.write().error = Some(message);
                None
            }
        }
    }

    /// Best-effort backend notification followed by unconditional local
    /// teardown. Always succeeds locally; calling it repeatedly leaves
    /// the same terminal state.
    pub async fn logout(&self) {
        self.state.write().is_loading = true;
        if self.token.get().is_some() {
            if let Err(err) = self.api.execute(ApiRequest::post("/auth/logout")).await {
                warn!("logout notification failed: {err}");
            }
        }
        self.token.clear();
        if let Err(err) = self.credentials.clear() {
            warn!("failed to clear stored credential: {err:#}");
        }
        let mut slice = self.state.write();
        slice.user = None;
        slice.is_loading = false;
    }

    /// Update identity fields in place. Requires an existing identity.
    pub async fn update_profile(&self, patch: ProfilePatch) -> bool {
        let Some(user_id) = self.state.read().user.as_ref().map(|user| user.id) else {
            self.state.write().error = Some(UPDATE_PROFILE_FALLBACK.to_string());
            return false;
        };
        self.begin();
        let body = serde_json::to_value(&patch).unwrap_or(Value::Null);
        let request = ApiRequest::put(format!("/users/{user_id}")).json(body);
        match self
            .api
            .execute(request)
            .await
            .and_then(|envelope| envelope.take::<User>("data"))
        {
            Ok(updated) => {
                let mut slice = self.state.write();
                slice.user = Some(updated);
                slice.is_loading = false;
                true
            }
            Err(err) => {
                self.fail(err.user_message(UPDATE_PROFILE_FALLBACK, None));
                false
            }
        }
    }

    /// Upload a new profile photo. Requires an existing identity.
    pub async fn update_photo(&self, photo: FileUpload) -> bool {
        if self.state.read().user.is_none() {
            self.state.write().error = Some(UPDATE_PHOTO_FALLBACK.to_string());
            return false;
        }
        self.begin();
        let request = ApiRequest::post("/users/profile-photo")
            .multipart(vec![MultipartField::file("profile_photo", photo)]);
        match self
            .api
            .execute(request)
            .await
            .and_then(|envelope| envelope.take::<String>("profile_photo"))
        {
            Ok(url) => {
                let mut slice = self.state.write();
                if let Some(user) = slice.user.as_mut() {
                    user.profile_photo = Some(url);
                }
                slice.is_loading = false;
                true
            }
            Err(err) => {
                self.fail(err.user_message(UPDATE_PHOTO_FALLBACK, None));
                false
            }
        }
    }

    async fn fetch_profile_inner(&self) -> Result<User, crate::api::ApiError> {
        let envelope = self.api.execute(ApiRequest::get("/auth/me")).await?;
        let user: User = envelope.take("user")?;
        self.state.write().user = Some(user.clone());
        Ok(user)
    }

    fn begin(&self) {
        let mut slice = self.state.write();
        slice.is_loading = true;
        slice.error = None;
    }

    fn finish(&self) {
        self.state.write().is_loading = false;
    }

    fn fail(&self, message: String) {
        let mut slice = self.state.write();
        slice.is_loading = false;
        slice.error = Some(message);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::testing::ScriptedExecutor;
    use crate::api::{ApiError, Method, Payload};
    use serde_json::json;
    use tempfile::TempDir;

    fn user_body() -> Value {
        json!({
            "success": true,
            "user": {
                "id": 7,
                "name": "Ana",
                "email": "a@b.com",
                "role": "traveler"
            }
        })
    }

    fn manager_with(api: ScriptedExecutor) -> (SessionManager, Arc<ScriptedExecutor>, TempDir) {
        let api = Arc::new(api);
        let dir = TempDir::new().expect("tempdir");
        let manager = SessionManager::new(
            api.clone(),
            TokenCell::new(),
            CredentialStore::new(dir.path().join("credential.json")),
        );
        (manager, api, dir)
    }

    #[tokio::test]
    async fn login_chains_profile_fetch() {
        let api = ScriptedExecutor::new()
            .respond(
                Method::Post,
                "/auth/login",
                json!({"success": true, "token": "tok-1"}),
            )
            .respond(Method::Get, "/auth/me", user_body());
        let (manager, api, _dir) = manager_with(api);

        assert!(manager.login("a@b.com", "secret").await);
        assert_eq!(manager.phase(), SessionPhase::Authenticated);
        assert!(!manager.is_loading());
        assert_eq!(manager.error(), None);
        assert_eq!(manager.user().map(|u| u.name), Some("Ana".to_string()));
        assert_eq!(manager.token(), Some("tok-1".to_string()));
        let seen = api.requests();
        assert_eq!(seen.len(), 2);
        assert!(matches!(seen[0].payload, Payload::Json(_)));
    }

    #[tokio::test]
    async fn failed_profile_fetch_discards_fresh_token() {
        let api = ScriptedExecutor::new()
            .respond(
                Method::Post,
                "/auth/login",
                json!({"success": true, "token": "tok-1"}),
            )
            .respond(
                Method::Get,
                "/auth/me",
                json!({"success": false, "message": "cuenta suspendida"}),
            )
            .respond(Method::Post, "/auth/logout", json!({"success": true}));
        let (manager, _api, _dir) = manager_with(api);

        assert!(!manager.login("a@b.com", "secret").await);
        assert_eq!(manager.phase(), SessionPhase::Anonymous);
        assert_eq!(manager.token(), None);
        assert_eq!(manager.error(), Some("cuenta suspendida".to_string()));
        // durable token cleared as well
        assert!(!manager.credentials.path().exists());
    }

    #[tokio::test]
    async fn login_rejection_surfaces_fallback_message() {
        let api = ScriptedExecutor::new().respond(
            Method::Post,
            "/auth/login",
            json!({"success": false}),
        );
        let (manager, _api, _dir) = manager_with(api);

        assert!(!manager.login("a@b.com", "wrong").await);
        assert_eq!(manager.error(), Some(LOGIN_FALLBACK.to_string()));
        assert_eq!(manager.phase(), SessionPhase::Anonymous);
    }

    #[tokio::test]
    async fn forbidden_profile_fetch_forces_logout() {
        let api = ScriptedExecutor::new()
            .fail_with(
                Method::Get,
                "/auth/me",
                ApiError::Unauthorized {
                    status: 403,
                    message: None,
                },
            )
            .respond(Method::Post, "/auth/logout", json!({"success": true}));
        let (manager, _api, _dir) = manager_with(api);
        manager.credentials.persist("stale").unwrap();
        assert!(manager.hydrate().unwrap());
        assert_eq!(manager.phase(), SessionPhase::TokenOnly);

        assert!(manager.fetch_profile().await.is_none());
        assert_eq!(manager.phase(), SessionPhase::Anonymous);
        assert_eq!(manager.token(), None);
        assert!(!manager.credentials.path().exists());
    }

    #[tokio::test]
    async fn fetch_profile_without_token_is_noop() {
        let (manager, api, _dir) = manager_with(ScriptedExecutor::new());
        assert!(manager.fetch_profile().await.is_none());
        assert!(api.requests().is_empty());
        assert!(!manager.is_loading());
    }

    #[tokio::test]
    async fn logout_is_idempotent_even_offline() {
        let api = ScriptedExecutor::new()
            .respond(
                Method::Post,
                "/auth/login",
                json!({"success": true, "token": "tok-1"}),
            )
            .respond(Method::Get, "/auth/me", user_body())
            .fail_with(
                Method::Post,
                "/auth/logout",
                ApiError::Network("connection refused".into()),
            );
        let (manager, _api, _dir) = manager_with(api);
        assert!(manager.login("a@b.com", "secret").await);

        manager.logout().await;
        assert_eq!(manager.phase(), SessionPhase::Anonymous);
        assert_eq!(manager.token(), None);

        // second logout has neither token nor scripted response; still fine
        manager.logout().await;
        assert_eq!(manager.phase(), SessionPhase::Anonymous);
        assert!(!manager.is_loading());
    }

    #[tokio::test]
    async fn register_does_not_establish_session() {
        let api = ScriptedExecutor::new().respond(
            Method::Post,
            "/auth/register",
            json!({"success": true}),
        );
        let (manager, api, _dir) = manager_with(api);
        let form = RegisterForm {
            name: "Ana".into(),
            email: "a@b.com".into(),
            password: "secret".into(),
            password_confirmation: "secret".into(),
            role: Role::Traveler,
            profile_photo: Some(FileUpload {
                filename: "me.png".into(),
                bytes: vec![1, 2, 3],
                mime: Some("image/png".into()),
            }),
        };

        assert!(manager.register(form).await);
        assert_eq!(manager.phase(), SessionPhase::Anonymous);
        let seen = api.requests();
        match &seen[0].payload {
            Payload::Multipart(fields) => assert_eq!(fields.len(), 6),
            other => panic!("expected multipart payload, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn update_profile_requires_identity() {
        let (manager, api, _dir) = manager_with(ScriptedExecutor::new());
        assert!(!manager.update_profile(ProfilePatch::default()).await);
        assert!(api.requests().is_empty());
        assert!(manager.error().is_some());
    }

    #[tokio::test]
    async fn update_photo_patches_identity_in_place() {
        let api = ScriptedExecutor::new()
            .respond(
                Method::Post,
                "/auth/login",
                json!({"success": true, "token": "tok-1"}),
            )
            .respond(Method::Get, "/auth/me", user_body())
            .respond(
                Method::Post,
                "/users/profile-photo",
                json!({"success": true, "profile_photo": "https://cdn/x.png"}),
            );
        let (manager, _api, _dir) = manager_with(api);
        assert!(manager.login("a@b.com", "secret").await);

        let uploaded = manager
            .update_photo(FileUpload {
                filename: "x.png".into(),
                bytes: vec![9],
                mime: None,
            })
            .await;
        assert!(uploaded);
        assert_eq!(
            manager.user().and_then(|u| u.profile_photo),
            Some("https://cdn/x.png".to_string())
        );
    }
}
