use chrono::{DateTime, Duration, Utc};
use uuid::Uuid;

use crate::config::AdminConfig;

pub const SESSION_COOKIE: &str = "admin_session";
pub const DEFAULT_LANDING: &str = "/admin";

/// Allowance for clock drift on tokens that claim to be from the future.
const MAX_CLOCK_SKEW_SECS: i64 = 60;

/// An authenticated admin session. Carried in a private cookie, so Rocket's
/// secret key encrypts and authenticates the token; the guard only has to
/// check who it names and how old it is.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AdminSession {
    pub session_id: Uuid,
    pub issued_at: i64,
    pub username: String,
}

impl AdminSession {
    pub fn issue(username: &str, now: DateTime<Utc>) -> Self {
        Self {
            session_id: Uuid::new_v4(),
            issued_at: now.timestamp(),
            username: username.to_string(),
        }
    }

    pub fn to_token(&self) -> String {
        format!("{}|{}|{}", self.session_id, self.issued_at, self.username)
    }

    pub fn from_token(token: &str) -> Option<Self> {
        let mut parts = token.splitn(3, '|');
        let session_id = parts.next()?.parse().ok()?;
        let issued_at = parts.next()?.parse().ok()?;
        let username = parts.next()?.to_string();

        Some(Self {
            session_id,
            issued_at,
            username,
        })
    }

    pub fn expires_at(&self, ttl: Duration) -> Option<DateTime<Utc>> {
        DateTime::from_timestamp(self.issued_at, 0).map(|issued| issued + ttl)
    }

    pub fn is_valid_for(&self, admin: &AdminConfig, now: DateTime<Utc>) -> bool {
        if self.username != admin.username {
            return false;
        }
        if self.issued_at > now.timestamp() + MAX_CLOCK_SKEW_SECS {
            return false;
        }
        match self.expires_at(admin.session_ttl) {
            Some(expires_at) => now < expires_at,
            None => false,
        }
    }
}

pub fn credentials_match(admin: &AdminConfig, username: &str, password: &str) -> bool {
    username == admin.username && password == admin.password
}

/// Whether `next` is a same-origin relative path that is safe to redirect to.
pub fn is_safe_redirect(next: &str) -> bool {
    next.starts_with('/')
        && !next.starts_with("//")
        && !next.contains('\\')
        && !next.chars().any(char::is_control)
}

pub fn redirect_target(next: Option<&str>) -> String {
    match next.map(str::trim) {
        Some(next) if is_safe_redirect(next) => next.to_string(),
        _ => DEFAULT_LANDING.to_string(),
    }
}
