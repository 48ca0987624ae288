use stepin_protocol::MeetingId;

use crate::Store;

/// Named views of the application
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RouteName {
    Home,
    Login,
    Register,
    FindMeetings,
    MeetingsList,
    CreateMeeting,
    MeetingDetails,
    UserProfile,
    ChatRoom,
    NotFound,
}

/// Navigation requirements attached to a route
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct RouteMeta {
    pub requires_auth: bool,
    pub requires_joined_meeting: bool,
    /// Only reachable without a session (login, registration)
    pub guest: bool,
}

const AUTH: RouteMeta = RouteMeta {
    requires_auth: true,
    requires_joined_meeting: false,
    guest: false,
};

const GUEST: RouteMeta = RouteMeta {
    requires_auth: false,
    requires_joined_meeting: false,
    guest: true,
};

const PUBLIC: RouteMeta = RouteMeta {
    requires_auth: false,
    requires_joined_meeting: false,
    guest: false,
};

/// Path patterns in match order; static segments win over `:id`
const ROUTES: &[(&str, RouteName)] = &[
    ("/", RouteName::Home),
    ("/login", RouteName::Login),
    ("/register", RouteName::Register),
    ("/meetings/find", RouteName::FindMeetings),
    ("/meetings", RouteName::MeetingsList),
    ("/meetings/create", RouteName::CreateMeeting),
    ("/meetings/:id", RouteName::MeetingDetails),
    ("/profile", RouteName::UserProfile),
    ("/chat", RouteName::ChatRoom),
];

/// Old paths kept working by rewriting them before matching
const ALIASES: &[(&str, &str)] = &[("/create-meeting", "/meetings/create")];

impl RouteName {
    pub fn meta(&self) -> RouteMeta {
        match self {
            Self::Login | Self::Register => GUEST,
            Self::ChatRoom => RouteMeta {
                requires_joined_meeting: true,
                ..AUTH
            },
            Self::NotFound => PUBLIC,
            _ => AUTH,
        }
    }

    /// Canonical path, `None` for routes that need parameters or have no path of their own
    pub fn path(&self) -> Option<&'static str> {
        ROUTES
            .iter()
            .find(|(pattern, name)| name == self && !pattern.contains(':'))
            .map(|(pattern, _)| *pattern)
    }
}

/// A path matched against the route table
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedRoute {
    pub name: RouteName,
    /// Path and query as requested, used to come back after login
    pub full_path: String,
    pub meeting_id: Option<MeetingId>,
}

impl ResolvedRoute {
    pub fn meta(&self) -> RouteMeta {
        self.name.meta()
    }
}

/// Outcome of the guard for one transition
#[derive(Debug, Clone, PartialEq)]
pub enum Navigation {
    Allow(ResolvedRoute),
    /// Go to `to` instead; `redirect` carries the originally requested path
    Redirect {
        to: RouteName,
        redirect: Option<String>,
    },
}

/// What the guard knows about the session when it runs
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct GuardContext {
    pub authenticated: bool,
    pub has_joined_meeting: bool,
}

/// Match a requested path (optionally with a query string) against the route table.
///
/// An alias is rewritten before matching, so `full_path` carries the
/// canonical path followed by the original query string.
pub fn resolve(full_path: &str) -> ResolvedRoute {
    let requested = full_path.split(['?', '#']).next().unwrap_or_default();
    let suffix = &full_path[requested.len()..];
    let normalized = normalize(requested);

    let (path, full_path) = match ALIASES.iter().find(|(alias, _)| *alias == normalized) {
        Some((_, target)) => (*target, format!("{target}{suffix}")),
        None => (normalized.as_str(), full_path.to_string()),
    };

    for (pattern, name) in ROUTES {
        if let Some(meeting_id) = match_pattern(pattern, path) {
            return ResolvedRoute {
                name: *name,
                full_path,
                meeting_id,
            };
        }
    }

    ResolvedRoute {
        name: RouteName::NotFound,
        full_path,
        meeting_id: None,
    }
}

fn normalize(path: &str) -> String {
    let trimmed = path.trim_end_matches('/');
    if trimmed.is_empty() {
        "/".to_string()
    } else if trimmed.starts_with('/') {
        trimmed.to_string()
    } else {
        format!("/{}", trimmed)
    }
}

/// `Some(param)` when `path` fits `pattern`; the inner value is the `:id` segment if any
fn match_pattern(pattern: &str, path: &str) -> Option<Option<MeetingId>> {
    let pattern_segments: Vec<&str> = pattern.split('/').collect();
    let path_segments: Vec<&str> = path.split('/').collect();
    if pattern_segments.len() != path_segments.len() {
        return None;
    }

    let mut param = None;
    for (expected, actual) in pattern_segments.iter().zip(&path_segments) {
        if expected.starts_with(':') {
            if actual.is_empty() {
                return None;
            }
            param = Some(MeetingId::new(*actual));
        } else if expected != actual {
            return None;
        }
    }
    Some(param)
}

/// Decide a transition from the route requirements and the session.
pub fn guard(route: ResolvedRoute, context: GuardContext) -> Navigation {
    let meta = route.meta();

    if meta.requires_auth {
        if !context.authenticated {
            return Navigation::Redirect {
                to: RouteName::Login,
                redirect: Some(route.full_path),
            };
        }
        if meta.requires_joined_meeting && !context.has_joined_meeting {
            return Navigation::Redirect {
                to: RouteName::Home,
                redirect: None,
            };
        }
    } else if meta.guest && context.authenticated {
        return Navigation::Redirect {
            to: RouteName::Home,
            redirect: None,
        };
    }

    Navigation::Allow(route)
}

impl Store {
    pub fn guard_context(&self) -> GuardContext {
        self.read(|s| GuardContext {
            authenticated: s.is_authenticated(),
            has_joined_meeting: s.joined_meeting().is_some(),
        })
    }

    /// Evaluate the guard for a transition to `path`.
    ///
    /// With no session in memory, stored state is read back first on a best
    /// effort basis; the decision uses whatever is in memory afterwards.
    pub fn navigate(&self, path: &str) -> Navigation {
        if !self.is_authenticated() {
            self.restore_session();
        }

        let route = resolve(path);
        let decision = guard(route, self.guard_context());
        tracing::debug!(path = %path, decision = ?decision, "Navigation");
        decision
    }
}
