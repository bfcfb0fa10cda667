//! Role-gated access to page prefixes.
//!
//! A request under a rule's prefix needs a session; rules that name a role
//! also need the session's role to match. Every failure is answered with a
//! redirect to the login page.

use crate::core::{Role, Session, SessionResolver};
use async_trait::async_trait;
use axum::{
    extract::{Request, State},
    http::header::{AUTHORIZATION, COOKIE},
    middleware::Next,
    response::{IntoResponse, Redirect, Response},
};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;

pub const SESSION_COOKIE: &str = "session";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccessRule {
    pub prefix: String,
    #[serde(default)]
    pub role: Option<Role>,
}

impl AccessRule {
    pub fn authenticated(prefix: &str) -> Self {
        Self {
            prefix: prefix.to_string(),
            role: None,
        }
    }

    pub fn role(prefix: &str, role: Role) -> Self {
        Self {
            prefix: prefix.to_string(),
            role: Some(role),
        }
    }

    /// Segment-wise prefix match: `/admin` covers `/admin/x` but not `/administrator`.
    fn matches(&self, path: &str) -> bool {
        let prefix = self.prefix.trim_end_matches('/');
        if prefix.is_empty() {
            return true;
        }
        match path.strip_prefix(prefix) {
            Some(rest) => rest.is_empty() || rest.starts_with('/'),
            None => false,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AccessDecision {
    Allow,
    Redirect(String),
}

#[derive(Debug, Clone)]
pub struct AccessPolicy {
    rules: Vec<AccessRule>,
    login_path: String,
}

impl Default for AccessPolicy {
    fn default() -> Self {
        Self::new(
            vec![
                AccessRule::role("/admin", Role::Admin),
                AccessRule::role("/supplier", Role::Supplier),
                AccessRule::authenticated("/dashboard"),
                AccessRule::authenticated("/wallet"),
                AccessRule::authenticated("/profile"),
                AccessRule::authenticated("/api/wallet"),
            ],
            "/login",
        )
    }
}

impl AccessPolicy {
    pub fn new(rules: Vec<AccessRule>, login_path: &str) -> Self {
        Self {
            rules,
            login_path: login_path.to_string(),
        }
    }

    pub fn rules(&self) -> &[AccessRule] {
        &self.rules
    }

    pub fn login_path(&self) -> &str {
        &self.login_path
    }

    fn rule_for(&self, path: &str) -> Option<&AccessRule> {
        self.rules
            .iter()
            .filter(|rule| rule.matches(path))
            .max_by_key(|rule| rule.prefix.trim_end_matches('/').len())
    }

    pub fn decide(&self, path: &str, session: Option<&Session>) -> AccessDecision {
        let Some(rule) = self.rule_for(path) else {
            return AccessDecision::Allow;
        };

        let allowed = match (session, rule.role) {
            (None, _) => false,
            (Some(_), None) => true,
            (Some(session), Some(required)) => session.role == required,
        };

        if allowed {
            AccessDecision::Allow
        } else {
            AccessDecision::Redirect(self.login_redirect(path))
        }
    }

    fn login_redirect(&self, path: &str) -> String {
        let mut location = url::form_urlencoded::Serializer::new(String::new());
        location.append_pair("callbackUrl", path);
        format!("{}?{}", self.login_path, location.finish())
    }
}

/// Pulls the session token from `Authorization: Bearer` or the session cookie.
pub fn session_token(headers: &axum::http::HeaderMap) -> Option<String> {
    if let Some(token) = headers
        .get(AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.strip_prefix("Bearer "))
    {
        return Some(token.trim().to_string());
    }

    headers
        .get_all(COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .flat_map(|value| value.split(';'))
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(name, _)| *name == SESSION_COOKIE)
        .map(|(_, value)| value.to_string())
}

#[derive(Clone)]
pub struct AccessState {
    pub policy: Arc<AccessPolicy>,
    pub sessions: Arc<dyn SessionResolver>,
}

/// Middleware for `axum::middleware::from_fn_with_state`.
pub async fn require_session(
    State(access): State<AccessState>,
    mut request: Request,
    next: Next,
) -> Response {
    let path = request.uri().path().to_string();

    let session = match session_token(request.headers()) {
        Some(token) => access.sessions.resolve(&token).await,
        None => None,
    };

    match access.policy.decide(&path, session.as_ref()) {
        AccessDecision::Allow => {
            if let Some(session) = session {
                request.extensions_mut().insert(session);
            }
            next.run(request).await
        }
        AccessDecision::Redirect(location) => {
            tracing::info!("Redirecting {} to {}", path, location);
            Redirect::to(&location).into_response()
        }
    }
}

/// In-process session table.
#[derive(Debug, Default, Clone)]
pub struct MemorySessions {
    sessions: Arc<RwLock<HashMap<String, Session>>>,
}

impl MemorySessions {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn insert(&self, token: &str, session: Session) {
        self.sessions.write().await.insert(token.to_string(), session);
    }

    pub async fn revoke(&self, token: &str) -> Option<Session> {
        self.sessions.write().await.remove(token)
    }
}

#[async_trait]
impl SessionResolver for MemorySessions {
    async fn resolve(&self, token: &str) -> Option<Session> {
        self.sessions.read().await.get(token).cloned()
    }
}
