//! Short-lived liveness pass flags
//!
//! A passing session grants a flag for its scope (e.g. `register`,
//! `login`) that expires after a TTL. Guards check the flag before
//! letting a user through and redirect to the liveness page otherwise.

use std::collections::HashMap;
use chrono::{DateTime, Duration, Utc};
use percent_encoding::{utf8_percent_encode, AsciiSet, NON_ALPHANUMERIC};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::PASS_TTL_SECS;

/// Base storage key; scoped keys append `:<scope>`
pub const PASS_KEY: &str = "livecheck_pass";

/// Fallback redirect target for unsafe `next` parameters
pub const DEFAULT_NEXT_PATH: &str = "/login";

/// Everything but RFC 3986 unreserved characters
const COMPONENT: &AsciiSet = &NON_ALPHANUMERIC.remove(b'-').remove(b'_').remove(b'.').remove(b'~');

/// A granted pass
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PassFlag {
    pub ok: bool,
    pub expires_at: DateTime<Utc>,
}

impl PassFlag {
    pub fn is_valid_at(&self, now: DateTime<Utc>) -> bool {
        self.ok && now < self.expires_at
    }
}

/// In-memory pass flags keyed by scope
#[derive(Debug, Clone)]
pub struct PassStore {
    ttl: Duration,
    flags: HashMap<String, PassFlag>,
}

impl Default for PassStore {
    fn default() -> Self {
        Self::new(Duration::seconds(PASS_TTL_SECS))
    }
}

impl PassStore {
    pub fn new(ttl: Duration) -> Self {
        Self { ttl, flags: HashMap::new() }
    }

    /// Record a pass for `scope` valid until `now + ttl`
    pub fn grant(&mut self, scope: &str, now: DateTime<Utc>) -> PassFlag {
        let flag = PassFlag { ok: true, expires_at: now + self.ttl };
        self.flags.insert(key_for_scope(scope), flag);
        info!(scope, expires_at = %flag.expires_at, "liveness pass granted");
        flag
    }

    /// Whether `scope` holds an unexpired pass. Expired flags are dropped.
    pub fn is_valid(&mut self, scope: &str, now: DateTime<Utc>) -> bool {
        let key = key_for_scope(scope);
        match self.flags.get(&key) {
            Some(flag) if flag.is_valid_at(now) => true,
            Some(_) => {
                debug!(scope, "liveness pass expired");
                self.flags.remove(&key);
                false
            }
            None => false,
        }
    }

    pub fn get(&self, scope: &str) -> Option<&PassFlag> {
        self.flags.get(&key_for_scope(scope))
    }

    pub fn clear(&mut self, scope: &str) {
        self.flags.remove(&key_for_scope(scope));
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }
}

/// Storage key for a scope; the empty scope uses the base key
pub fn key_for_scope(scope: &str) -> String {
    if scope.is_empty() {
        PASS_KEY.to_string()
    } else {
        format!("{}:{}", PASS_KEY, scope)
    }
}

/// Only internal absolute paths are allowed as redirect targets
pub fn safe_next_path(next: Option<&str>) -> &str {
    match next {
        Some(p) if p.starts_with('/') && !p.starts_with("//") => p,
        _ => DEFAULT_NEXT_PATH,
    }
}

/// URL of the liveness page that returns to `next` after passing
pub fn liveness_url(next: Option<&str>, scope: &str) -> String {
    let next = encode_component(safe_next_path(next));
    if scope.is_empty() {
        format!("/liveness?next={}", next)
    } else {
        format!("/liveness?next={}&scope={}", next, encode_component(scope))
    }
}

fn encode_component(s: &str) -> String {
    utf8_percent_encode(s, COMPONENT).to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_grant_then_expire() {
        let mut store = PassStore::default();
        let t0 = Utc::now();
        store.grant("register", t0);
        assert!(store.is_valid("register", t0 + Duration::seconds(89)));
        assert!(!store.is_valid("register", t0 + Duration::seconds(90)));
        // Expired flag was dropped
        assert!(store.get("register").is_none());
    }

    #[test]
    fn test_scopes_are_independent() {
        let mut store = PassStore::default();
        let now = Utc::now();
        store.grant("login", now);
        assert!(store.is_valid("login", now));
        assert!(!store.is_valid("register", now));
        assert!(!store.is_valid("", now));
    }

    #[test]
    fn test_clear() {
        let mut store = PassStore::default();
        let now = Utc::now();
        store.grant("", now);
        store.clear("");
        assert!(!store.is_valid("", now));
    }

    #[test]
    fn test_key_for_scope() {
        assert_eq!(key_for_scope(""), "livecheck_pass");
        assert_eq!(key_for_scope("vote"), "livecheck_pass:vote");
    }

    #[test]
    fn test_safe_next_path() {
        assert_eq!(safe_next_path(Some("/ballot")), "/ballot");
        assert_eq!(safe_next_path(Some("//evil.example")), "/login");
        assert_eq!(safe_next_path(Some("https://evil.example")), "/login");
        assert_eq!(safe_next_path(None), "/login");
    }

    #[test]
    fn test_liveness_url() {
        assert_eq!(liveness_url(Some("/vote"), ""), "/liveness?next=%2Fvote");
        assert_eq!(
            liveness_url(Some("//x"), "a b"),
            "/liveness?next=%2Flogin&scope=a%20b"
        );
    }

    #[test]
    fn test_liveness_url_encoding() {
        assert_eq!(
            liveness_url(Some("/v-1_a.b~c?x=1&y=é"), "sc+ope"),
            "/liveness?next=%2Fv-1_a.b~c%3Fx%3D1%26y%3D%C3%A9&scope=sc%2Bope"
        );
    }
}
