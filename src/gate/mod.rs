//! Edge request gate.
//!
//! Decides, from the request path and the raw `Cookie` header alone, whether
//! a page request proceeds or is redirected to a login page. No network or
//! storage access happens here.

mod cookie;
mod jwt;

pub use cookie::cookie_value;
pub use jwt::{decode_payload, expiry_millis, is_token_expired};

use serde::{Deserialize, Serialize};
use web_time::{SystemTime, UNIX_EPOCH};

use crate::constants::{ADMIN_TOKEN_COOKIE, USER_TOKEN_COOKIE};

/// Routing rules of the gate.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct GateConfig {
    /// Paths reachable without a user token
    pub public_routes: Vec<String>,
    /// Paths from which an authenticated user is sent to `user_home`
    pub login_routes: Vec<String>,
    /// User login page
    pub user_login: String,
    /// Landing page of an authenticated user
    pub user_home: String,
    /// Prefix of the admin area
    pub admin_prefix: String,
    /// Admin login page
    pub admin_login: String,
    /// Landing page of an authenticated admin
    pub admin_home: String,
    pub user_cookie: String,
    pub admin_cookie: String,
    /// Path prefixes the gate never inspects (API routes, build assets)
    pub excluded_prefixes: Vec<String>,
}

impl Default for GateConfig {
    fn default() -> Self {
        Self {
            public_routes: [
                "/login",
                "/signeup",
                "/forgot-password",
                "/about",
                "/contact",
                "/auth/redirect",
            ]
            .map(String::from)
            .to_vec(),
            login_routes: vec!["/login".to_string(), "/signeup".to_string()],
            user_login: "/login".to_string(),
            user_home: "/".to_string(),
            admin_prefix: "/admin".to_string(),
            admin_login: "/admin/login".to_string(),
            admin_home: "/admin/dashboard".to_string(),
            user_cookie: USER_TOKEN_COOKIE.to_string(),
            admin_cookie: ADMIN_TOKEN_COOKIE.to_string(),
            excluded_prefixes: ["/api", "/_next/static", "/_next/image", "/favicon.ico"]
                .map(String::from)
                .to_vec(),
        }
    }
}

/// Outcome of [`RequestGate::evaluate`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "action", content = "location", rename_all = "lowercase")]
pub enum GateDecision {
    /// Let the request through
    Next,
    /// Redirect to the given location
    Redirect(String),
}

impl std::fmt::Display for GateDecision {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            GateDecision::Next => f.write_str("next"),
            GateDecision::Redirect(location) => write!(f, "redirect {}", location),
        }
    }
}

/// Path and cookie based access gate.
#[derive(Debug, Clone, Default)]
pub struct RequestGate {
    config: GateConfig,
}

impl RequestGate {
    /// Gate applying the given routing rules.
    pub fn new(config: GateConfig) -> Self {
        Self { config }
    }

    /// Routing rules in use.
    pub fn config(&self) -> &GateConfig {
        &self.config
    }

    /// Evaluate a request against the wall clock.
    pub fn evaluate_now(&self, target: &str, cookie_header: Option<&str>) -> GateDecision {
        let now_ms = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| u64::try_from(d.as_millis()).unwrap_or(u64::MAX))
            .unwrap_or(0);
        self.evaluate(target, cookie_header, now_ms)
    }

    /// Evaluate a request.
    ///
    /// `target` is the request path, optionally with a query string or
    /// fragment, which are ignored for matching. `now_ms` is the current
    /// time in milliseconds since the Unix epoch.
    pub fn evaluate(&self, target: &str, cookie_header: Option<&str>, now_ms: u64) -> GateDecision {
        let path = target.split(['?', '#']).next().unwrap_or(target);
        let cookies = cookie_header.unwrap_or("");

        if self.is_excluded(path) {
            log::trace!("Gate skips {}", path);
            return GateDecision::Next;
        }

        if self.is_admin_path(path) {
            let authenticated = self.has_valid_token(cookies, &self.config.admin_cookie, now_ms);
            let decision = if path == self.config.admin_login {
                if authenticated {
                    GateDecision::Redirect(self.config.admin_home.clone())
                } else {
                    GateDecision::Next
                }
            } else if authenticated {
                GateDecision::Next
            } else {
                GateDecision::Redirect(self.config.admin_login.clone())
            };
            log::debug!("Gate admin {} -> {}", path, decision);
            return decision;
        }

        let authenticated = self.has_valid_token(cookies, &self.config.user_cookie, now_ms);

        let decision = if self.config.public_routes.iter().any(|r| r == path) {
            if authenticated && self.config.login_routes.iter().any(|r| r == path) {
                GateDecision::Redirect(self.config.user_home.clone())
            } else {
                GateDecision::Next
            }
        } else if authenticated {
            GateDecision::Next
        } else {
            GateDecision::Redirect(format!(
                "{}?redirect={}",
                self.config.user_login,
                form_urlencode(path)
            ))
        };
        log::debug!("Gate {} -> {}", path, decision);
        decision
    }

    fn is_excluded(&self, path: &str) -> bool {
        let rest = path.strip_prefix('/').unwrap_or(path);
        rest.contains('.')
            || self
                .config
                .excluded_prefixes
                .iter()
                .any(|prefix| path.starts_with(prefix.as_str()))
    }

    fn is_admin_path(&self, path: &str) -> bool {
        path.strip_prefix(self.config.admin_prefix.as_str())
            .is_some_and(|rest| rest.is_empty() || rest.starts_with('/'))
    }

    fn has_valid_token(&self, cookies: &str, name: &str, now_ms: u64) -> bool {
        cookie_value(cookies, name).is_some_and(|token| !is_token_expired(token, now_ms))
    }
}

/// Encode a query parameter value as `application/x-www-form-urlencoded`.
fn form_urlencode(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    for byte in value.bytes() {
        match byte {
            b'A'..=b'Z' | b'a'..=b'z' | b'0'..=b'9' | b'*' | b'-' | b'.' | b'_' => {
                out.push(byte as char)
            }
            b' ' => out.push('+'),
            _ => out.push_str(&format!("%{:02X}", byte)),
        }
    }
    out
}
