//! Interactive shell over the AventuraLocal client core.

use std::sync::Arc;

use anyhow::Result;
use tokio::io::{self, AsyncBufReadExt, AsyncWriteExt, BufReader};

use aventura_core::{
    models::RouteStatus,
    router::{self, GuardDecision, NavigationGuard},
    session::{ProfilePatch, RegisterForm, Role},
    store::{
        CategoriesStore, CommunitiesStore, DestinationsStore, EventsStore, ListQuery, RoutesStore,
        ToursStore,
    },
    AppConfig, RequestExecutor, SessionManager,
};

/// Line-oriented front end: one command per line, results printed as text.
pub struct AventuraApp {
    config: AppConfig,
    session: Arc<SessionManager>,
    guard: NavigationGuard,
    destinations: DestinationsStore,
    routes: RoutesStore,
    events: EventsStore,
    communities: CommunitiesStore,
    categories: CategoriesStore,
    tours: ToursStore,
}

impl AventuraApp {
    pub fn new(
        config: AppConfig,
        api: Arc<dyn RequestExecutor>,
        session: Arc<SessionManager>,
    ) -> Self {
        Self {
            config,
            guard: NavigationGuard::new(session.clone()),
            session,
            destinations: DestinationsStore::new(api.clone()),
            routes: RoutesStore::new(api.clone()),
            events: EventsStore::new(api.clone()),
            communities: CommunitiesStore::new(api.clone()),
            categories: CategoriesStore::new(api.clone()),
            tours: ToursStore::new(api),
        }
    }

    pub async fn run(&mut self) -> Result<()> {
        let mut stdout = io::stdout();
        let mut lines = BufReader::new(io::stdin()).lines();
        stdout
            .write_all(b"AventuraLocal shell. Type 'help' for commands.\n")
            .await?;
        loop {
            stdout.write_all(b"aventura> ").await?;
            stdout.flush().await?;
            let Some(line) = lines.next_line().await? else {
                break;
            };
            let parts: Vec<&str> = line.split_whitespace().collect();
            let Some((&command, args)) = parts.split_first() else {
                continue;
            };
            if matches!(command, "quit" | "exit") {
                break;
            }
            let output = self.dispatch(command, args).await;
            stdout.write_all(output.as_bytes()).await?;
            stdout.write_all(b"\n").await?;
        }
        Ok(())
    }

    async fn dispatch(&self, command: &str, args: &[&str]) -> String {
        match command {
            "help" => HELP.to_string(),
            "go" => self.go(args),
            "title" => self.guard.page_title(),
            "login" => self.login(args).await,
            "register" => self.register(args).await,
            "set-name" => self.set_name(args).await,
            "logout" => {
                self.session.logout().await;
                "session closed".to_string()
            }
            "whoami" => self.whoami(),
            "perms" => self.perms(),
            "destinations" => {
                let items = self.destinations.list(self.query(args)).await;
                self.listing(
                    items.iter().map(|d| (d.id, d.name.clone())),
                    self.destinations.slice().error,
                )
            }
            "dest" => match self.id_arg(args) {
                Ok(id) => match self.destinations.get(id).await {
                    Some(d) => format!("#{} {} ({})", d.id, d.name, d.city.unwrap_or_default()),
                    None => self.store_error(self.destinations.slice().error),
                },
                Err(usage) => usage,
            },
            "popular-dest" => {
                let items = self.destinations.popular(self.config.default_per_page).await;
                self.listing(
                    items.iter().map(|d| (d.id, d.name.clone())),
                    self.destinations.slice().error,
                )
            }
            "nearby" => match self.id_arg(args) {
                Ok(id) => {
                    let radius = args.get(1).and_then(|r| r.parse().ok()).unwrap_or(10);
                    let items = self.destinations.nearby(id, radius).await;
                    self.listing(
                        items.iter().map(|d| (d.id, d.name.clone())),
                        self.destinations.slice().error,
                    )
                }
                Err(usage) => usage,
            },
            "reviews" => match self.id_arg(args) {
                Ok(id) => {
                    let reviews = self.destinations.reviews(id).await;
                    if reviews.is_empty() {
                        self.store_error(self.destinations.slice().error)
                    } else {
                        reviews
                            .iter()
                            .map(|r| {
                                format!(
                                    "  #{} {:.1} {}",
                                    r.id,
                                    r.rating.unwrap_or(0.0),
                                    r.comment.clone().unwrap_or_default()
                                )
                            })
                            .collect::<Vec<_>>()
                            .join("\n")
                    }
                }
                Err(usage) => usage,
            },
            "fav-dest" => match self.id_arg(args) {
                Ok(id) => self.outcome(
                    self.destinations.toggle_favorite(id).await.is_some(),
                    "favorite toggled",
                    self.destinations.slice().error,
                ),
                Err(usage) => usage,
            },
            "routes" => {
                let items = self.routes.list(self.query(args)).await;
                self.listing(
                    items.iter().map(|r| (r.id, r.name.clone())),
                    self.routes.slice().error,
                )
            }
            "route" => match self.id_arg(args) {
                Ok(id) => match self.routes.get(id).await {
                    Some(r) => format!("#{} {} [{:?}]", r.id, r.name, r.difficulty),
                    None => self.store_error(self.routes.slice().error),
                },
                Err(usage) => usage,
            },
            "fav-route" => match self.id_arg(args) {
                Ok(id) => self.outcome(
                    self.routes.toggle_favorite(id).await.is_some(),
                    "favorite toggled",
                    self.routes.slice().error,
                ),
                Err(usage) => usage,
            },
            "route-status" => match (self.id_arg(args), args.get(1)) {
                (Ok(id), Some(raw)) => match raw.parse::<RouteStatus>() {
                    Ok(status) => self.outcome(
                        self.routes.update_status(id, status).await.is_some(),
                        "status updated",
                        self.routes.slice().error,
                    ),
                    Err(err) => err,
                },
                _ => "usage: route-status <id> <status>".to_string(),
            },
            "events" => {
                let items = self.events.list(self.query(args)).await;
                self.listing(
                    items.iter().map(|e| (e.id, e.title.clone())),
                    self.events.slice().error,
                )
            }
            "upcoming" => {
                let items = self.events.upcoming().await;
                self.listing(
                    items.iter().map(|e| (e.id, e.title.clone())),
                    self.events.slice().error,
                )
            }
            "event" => match self.id_arg(args) {
                Ok(id) => match self.events.get(id).await {
                    Some(e) => format!(
                        "#{} {} ({} asistentes)",
                        e.id,
                        e.title,
                        e.attendee_count.unwrap_or(0)
                    ),
                    None => self.store_error(self.events.slice().error),
                },
                Err(usage) => usage,
            },
            "attendees" => match self.id_arg(args) {
                Ok(id) => {
                    let people = self.events.attendees(id).await;
                    self.listing(
                        people.iter().map(|a| (a.id, a.name.clone())),
                        self.events.slice().error,
                    )
                }
                Err(usage) => usage,
            },
            "attend" => match self.id_arg(args) {
                Ok(id) => self.outcome(
                    self.events.attend(id).await.is_some(),
                    "attendance registered",
                    self.events.slice().error,
                ),
                Err(usage) => usage,
            },
            "unattend" => match self.id_arg(args) {
                Ok(id) => self.outcome(
                    self.events.cancel_attendance(id).await,
                    "attendance cancelled",
                    self.events.slice().error,
                ),
                Err(usage) => usage,
            },
            "communities" => {
                let items = self.communities.list(self.query(args)).await;
                self.listing(
                    items.iter().map(|c| (c.id, c.name.clone())),
                    self.communities.slice().error,
                )
            }
            "community" => match self.id_arg(args) {
                Ok(id) => match self.communities.get(id).await {
                    Some(c) => format!(
                        "#{} {} ({} miembros)",
                        c.id,
                        c.name,
                        c.member_count.unwrap_or(0)
                    ),
                    None => self.store_error(self.communities.slice().error),
                },
                Err(usage) => usage,
            },
            "join" => match self.id_arg(args) {
                Ok(id) => self.outcome(
                    self.communities.join(id).await.is_some(),
                    "joined",
                    self.communities.slice().error,
                ),
                Err(usage) => usage,
            },
            "members" => match self.id_arg(args) {
                Ok(id) => {
                    let people = self.communities.members(id).await;
                    self.listing(
                        people.iter().map(|m| (m.id, m.name.clone())),
                        self.communities.slice().error,
                    )
                }
                Err(usage) => usage,
            },
            "leave" => match self.id_arg(args) {
                Ok(id) => self.outcome(
                    self.communities.leave(id).await,
                    "left",
                    self.communities.slice().error,
                ),
                Err(usage) => usage,
            },
            "categories" => {
                let items = self.categories.list(self.query(args)).await;
                self.listing(
                    items.iter().map(|c| (c.id, c.name.clone())),
                    self.categories.slice().error,
                )
            }
            "cat-dest" => match self.id_arg(args) {
                Ok(id) => {
                    let items = self.categories.destinations(id).await;
                    self.listing(
                        items.iter().map(|d| (d.id, d.name.clone())),
                        self.categories.slice().error,
                    )
                }
                Err(usage) => usage,
            },
            "tours" => {
                let items = self.tours.list(self.query(args)).await;
                self.listing(
                    items.iter().map(|t| (t.id, t.name.clone())),
                    self.tours.slice().error,
                )
            }
            "new-route" => match self.json_arg(args) {
                Ok(body) => match self.routes.create(body).await {
                    Some(created) => format!("created #{} {}", created.id, created.name),
                    None => self.store_error(self.routes.slice().error),
                },
                Err(usage) => usage,
            },
            "new-tour" => match self.json_arg(args) {
                Ok(body) => match self.tours.create(body).await {
                    Some(created) => format!("created #{} {}", created.id, created.name),
                    None => self.store_error(self.tours.slice().error),
                },
                Err(usage) => usage,
            },
            "tour" => match self.id_arg(args) {
                Ok(id) => match self.tours.get(id).await {
                    Some(t) => format!("#{} {}", t.id, t.name),
                    None => self.store_error(self.tours.slice().error),
                },
                Err(usage) => usage,
            },
            other => format!("unknown command '{other}'; try 'help'"),
        }
    }

    fn go(&self, args: &[&str]) -> String {
        let Some(&name) = args.first() else {
            return "usage: go <route-name>".to_string();
        };
        let Some(target) = router::route(name) else {
            return format!("no such route '{name}'");
        };
        match self.guard.evaluate(target, target.path) {
            GuardDecision::Allow => format!("{}: {}", target.path, self.guard.page_title()),
            GuardDecision::RedirectToLogin { redirect } => {
                format!("redirected to /login (after login you return to {redirect})")
            }
            GuardDecision::RedirectToHome => "already signed in; redirected to /".to_string(),
        }
    }

    async fn login(&self, args: &[&str]) -> String {
        let (Some(&email), Some(&password)) = (args.first(), args.get(1)) else {
            return "usage: login <email> <password>".to_string();
        };
        if self.session.login(email, password).await {
            self.whoami()
        } else {
            self.session
                .error()
                .unwrap_or_else(|| "login failed".to_string())
        }
    }

    async fn register(&self, args: &[&str]) -> String {
        let (Some(&name), Some(&email), Some(&password), Some(&role)) =
            (args.first(), args.get(1), args.get(2), args.get(3))
        else {
            return "usage: register <name> <email> <password> <role>".to_string();
        };
        let Some(role) = parse_role(role) else {
            return format!("unknown role '{role}'");
        };
        let form = RegisterForm {
            name: name.to_string(),
            email: email.to_string(),
            password: password.to_string(),
            password_confirmation: password.to_string(),
            role,
            profile_photo: None,
        };
        if self.session.register(form).await {
            "registered; log in to continue".to_string()
        } else {
            self.session
                .error()
                .unwrap_or_else(|| "registration failed".to_string())
        }
    }

    async fn set_name(&self, args: &[&str]) -> String {
        if args.is_empty() {
            return "usage: set-name <new name>".to_string();
        }
        let patch = ProfilePatch {
            name: Some(args.join(" ")),
            email: None,
        };
        if self.session.update_profile(patch).await {
            self.whoami()
        } else {
            self.session
                .error()
                .unwrap_or_else(|| "update failed".to_string())
        }
    }

    fn whoami(&self) -> String {
        match self.session.user() {
            Some(user) => format!("{} <{}> ({:?})", user.name, user.email, user.role),
            None => "anonymous".to_string(),
        }
    }

    fn perms(&self) -> String {
        let p = self.session.permissions();
        format!(
            "manage events: {}  register for events: {}  admin: {}  entrepreneur: {}",
            p.can_manage_events, p.can_register_for_events, p.is_admin, p.is_entrepreneur
        )
    }

    fn query(&self, args: &[&str]) -> ListQuery {
        let query = ListQuery::page(1, self.config.default_per_page);
        match args.first() {
            Some(term) => query.search(*term),
            None => query,
        }
    }

    fn json_arg(&self, args: &[&str]) -> Result<serde_json::Value, String> {
        if args.is_empty() {
            return Err("expected a JSON payload".to_string());
        }
        serde_json::from_str(&args.join(" ")).map_err(|err| format!("invalid JSON: {err}"))
    }

    fn id_arg(&self, args: &[&str]) -> Result<i64, String> {
        args.first()
            .and_then(|raw| raw.parse().ok())
            .ok_or_else(|| "expected a numeric id".to_string())
    }

    fn listing(&self, rows: impl Iterator<Item = (i64, String)>, error: Option<String>) -> String {
        let body: Vec<String> = rows.map(|(id, name)| format!("  #{id} {name}")).collect();
        if body.is_empty() {
            self.store_error(error)
        } else {
            body.join("\n")
        }
    }

    fn outcome(&self, ok: bool, done: &str, error: Option<String>) -> String {
        if ok {
            done.to_string()
        } else {
            self.store_error(error)
        }
    }

    fn store_error(&self, error: Option<String>) -> String {
        error.unwrap_or_else(|| "(nothing found)".to_string())
    }
}

fn parse_role(raw: &str) -> Option<Role> {
    match raw {
        "admin" => Some(Role::Admin),
        "traveler" => Some(Role::Traveler),
        "entrepreneur" => Some(Role::Entrepreneur),
        "event_organizer" => Some(Role::EventOrganizer),
        "event_participant" => Some(Role::EventParticipant),
        _ => None,
    }
}

const HELP: &str = "\
navigation   go <route>  title
session      login <email> <password>  register <name> <email> <password> <role>
             set-name <name>  logout  whoami  perms
destinations destinations [search]  dest <id>  popular-dest  nearby <id> [km]
             reviews <id>  fav-dest <id>
routes       routes [name]  route <id>  new-route <json>  fav-route <id>  route-status <id> <status>
events       events [search]  event <id>  upcoming  attendees <id>  attend <id>  unattend <id>
communities  communities [search]  community <id>  members <id>  join <id>  leave <id>
categories   categories  cat-dest <id>
tours        tours [search]  tour <id>  new-tour <json>
             quit";
