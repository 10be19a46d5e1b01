//! # Access Gate
//!
//! Origin allow-list decision.
//!
//! - Missing origin is allowed
//! - Present origin is allowed only on a byte-exact match
//! - Entries that look like network ranges are plain strings, never ranges
//!
//! A deny is not an error. The HTTP layer uses it to withhold the
//! cross-origin response headers; the request itself still runs.

mod allow_list;

pub use allow_list::AllowList;

use std::fmt;
use std::sync::Arc;

use contracts::AccessConfig;
use tracing::{info, warn};

/// Gate outcome
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AccessDecision {
    Allow,
    Deny,
}

impl AccessDecision {
    /// Stable label for logs and metrics
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Allow => "allow",
            Self::Deny => "deny",
        }
    }

    pub fn is_allowed(&self) -> bool {
        matches!(self, Self::Allow)
    }
}

impl fmt::Display for AccessDecision {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Pure decision function
pub fn decide(origin: Option<&str>, allow_list: &AllowList) -> AccessDecision {
    match origin {
        None => AccessDecision::Allow,
        Some(origin) if allow_list.contains(origin) => AccessDecision::Allow,
        Some(_) => AccessDecision::Deny,
    }
}

/// Origin as read from a request
///
/// `Unreadable` covers a header that is present but not valid UTF-8.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RequestOrigin<'a> {
    Absent,
    Present(&'a str),
    Unreadable,
}

/// Shared gate handed to the HTTP layer
///
/// Wraps the process-wide allow-list and records every evaluation.
#[derive(Debug, Clone)]
pub struct AccessGate {
    allow_list: Arc<AllowList>,
}

impl AccessGate {
    pub fn new(allow_list: AllowList) -> Self {
        let range_like = allow_list.range_like_entries();
        if !range_like.is_empty() {
            warn!(
                entries = ?range_like,
                "Allow-list entries look like network ranges; they match only the literal Origin string"
            );
        }
        Self {
            allow_list: Arc::new(allow_list),
        }
    }

    pub fn from_config(config: &AccessConfig) -> Self {
        Self::new(AllowList::from(config))
    }

    pub fn allow_list(&self) -> &AllowList {
        &self.allow_list
    }

    /// Decide and record the decision
    pub fn evaluate(&self, origin: RequestOrigin<'_>) -> AccessDecision {
        let decision = match origin {
            RequestOrigin::Absent => decide(None, &self.allow_list),
            RequestOrigin::Present(value) => decide(Some(value), &self.allow_list),
            RequestOrigin::Unreadable => AccessDecision::Deny,
        };

        match origin {
            RequestOrigin::Absent => {
                info!(decision = %decision, "Request without Origin header")
            }
            RequestOrigin::Present(value) => {
                info!(origin = %value, decision = %decision, "Origin evaluated")
            }
            RequestOrigin::Unreadable => {
                info!(decision = %decision, "Origin header is not valid UTF-8")
            }
        }
        observability::record_gate_decision(decision.as_str());

        decision
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn list() -> AllowList {
        AllowList::new([
            "http://localhost:8080",
            "https://tse.example.com",
            "151.101.0.0/16",
        ])
    }

    #[test]
    fn test_absent_origin_allowed() {
        assert_eq!(decide(None, &list()), AccessDecision::Allow);
        assert_eq!(decide(None, &AllowList::default()), AccessDecision::Allow);
    }

    #[test]
    fn test_exact_match_allowed() {
        for origin in list().iter() {
            assert_eq!(decide(Some(origin), &list()), AccessDecision::Allow);
        }
    }

    #[test]
    fn test_unknown_origin_denied() {
        let list = list();
        for origin in [
            "https://evil.example.com",
            "https://TSE.example.com",
            "https://tse.example.com/",
            "tse.example.com",
            "http://tse.example.com",
            "",
        ] {
            assert_eq!(decide(Some(origin), &list), AccessDecision::Deny, "{origin}");
        }
    }

    #[test]
    fn test_range_entry_is_literal() {
        let list = list();
        assert_eq!(decide(Some("151.101.1.1"), &list), AccessDecision::Deny);
        assert_eq!(decide(Some("http://151.101.0.7"), &list), AccessDecision::Deny);
        assert_eq!(decide(Some("151.101.0.0/16"), &list), AccessDecision::Allow);
    }

    #[test]
    fn test_empty_list_denies_every_origin() {
        let empty = AllowList::default();
        assert_eq!(decide(Some("http://localhost:8080"), &empty), AccessDecision::Deny);
    }

    #[test]
    fn test_gate_evaluate() {
        let gate = AccessGate::new(list());
        assert!(gate.evaluate(RequestOrigin::Absent).is_allowed());
        assert!(gate
            .evaluate(RequestOrigin::Present("https://tse.example.com"))
            .is_allowed());
        assert_eq!(
            gate.evaluate(RequestOrigin::Present("https://other.example.com")),
            AccessDecision::Deny
        );
        assert_eq!(gate.evaluate(RequestOrigin::Unreadable), AccessDecision::Deny);
    }

    #[test]
    fn test_decision_labels() {
        assert_eq!(AccessDecision::Allow.to_string(), "allow");
        assert_eq!(AccessDecision::Deny.as_str(), "deny");
    }
}
