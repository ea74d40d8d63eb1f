//! # Wallet Events
//!
//! Everything the mediator pushes outward without being asked.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use shared_types::Eid;

/// All events that can be published to the bus.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum WalletEvent {
    // =========================================================================
    // ENTITY STORE
    // =========================================================================
    /// A transaction committed. Carries every eid it created, changed or deleted.
    EntitiesChanged { eids: Vec<Eid> },

    // =========================================================================
    // SITE CHANNELS
    // =========================================================================
    /// Event addressed to one dapp origin (`connect`, `accountsChanged`,
    /// `chainChanged`).
    SiteEvent {
        origin: String,
        event: String,
        params: Value,
    },

    // =========================================================================
    // SESSION
    // =========================================================================
    /// Wallet was locked or unlocked.
    LockChanged { locked: bool },

    // =========================================================================
    // CONSENT
    // =========================================================================
    /// A consent-gated call was parked awaiting a decision.
    AuthRequested {
        auth_req: Eid,
        origin: String,
        method: String,
    },

    /// A pending consent request was approved or rejected.
    AuthResolved { auth_req: Eid, approved: bool },
}

impl WalletEvent {
    /// Get the topic for this event (for filtering).
    #[must_use]
    pub fn topic(&self) -> EventTopic {
        match self {
            Self::EntitiesChanged { .. } => EventTopic::Store,
            Self::SiteEvent { .. } => EventTopic::Site,
            Self::LockChanged { .. } => EventTopic::Session,
            Self::AuthRequested { .. } | Self::AuthResolved { .. } => EventTopic::Consent,
        }
    }

    /// Origin the event is addressed to, if any.
    #[must_use]
    pub fn origin(&self) -> Option<&str> {
        match self {
            Self::SiteEvent { origin, .. } | Self::AuthRequested { origin, .. } => Some(origin),
            _ => None,
        }
    }

    /// Convenience constructor for site pushes.
    pub fn site(origin: impl Into<String>, event: impl Into<String>, params: Value) -> Self {
        Self::SiteEvent {
            origin: origin.into(),
            event: event.into(),
            params,
        }
    }
}

/// Event topics for subscription filtering.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EventTopic {
    Store,
    Site,
    Session,
    Consent,
    /// All events (no filtering).
    All,
}

/// Filter for subscribing to specific events.
#[derive(Debug, Clone, Default)]
pub struct EventFilter {
    /// Topics to include. Empty means all topics.
    pub topics: Vec<EventTopic>,
    /// Origins to include. Empty means any origin; otherwise events without
    /// an origin are excluded.
    pub origins: Vec<String>,
}

impl EventFilter {
    /// Create a filter that accepts all events.
    #[must_use]
    pub fn all() -> Self {
        Self::default()
    }

    /// Create a filter for specific topics.
    #[must_use]
    pub fn topics(topics: Vec<EventTopic>) -> Self {
        Self {
            topics,
            origins: Vec::new(),
        }
    }

    /// Site events addressed to a single origin.
    #[must_use]
    pub fn for_origin(origin: impl Into<String>) -> Self {
        Self {
            topics: vec![EventTopic::Site],
            origins: vec![origin.into()],
        }
    }

    /// Check if an event matches this filter.
    #[must_use]
    pub fn matches(&self, event: &WalletEvent) -> bool {
        let topic_match = self.topics.is_empty()
            || self.topics.contains(&EventTopic::All)
            || self.topics.contains(&event.topic());

        let origin_match = self.origins.is_empty()
            || event
                .origin()
                .is_some_and(|o| self.origins.iter().any(|allowed| allowed == o));

        topic_match && origin_match
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_event_topic_mapping() {
        let event = WalletEvent::EntitiesChanged { eids: vec![Eid(1)] };
        assert_eq!(event.topic(), EventTopic::Store);
        assert_eq!(event.origin(), None);

        let event = WalletEvent::AuthResolved {
            auth_req: Eid(3),
            approved: false,
        };
        assert_eq!(event.topic(), EventTopic::Consent);
    }

    #[test]
    fn test_filter_all() {
        let filter = EventFilter::all();
        assert!(filter.matches(&WalletEvent::LockChanged { locked: true }));
    }

    #[test]
    fn test_filter_by_topic() {
        let filter = EventFilter::topics(vec![EventTopic::Session]);
        assert!(filter.matches(&WalletEvent::LockChanged { locked: false }));
        assert!(!filter.matches(&WalletEvent::EntitiesChanged { eids: vec![] }));
    }

    #[test]
    fn test_filter_by_origin() {
        let filter = EventFilter::for_origin("https://a.example");

        let mine = WalletEvent::site("https://a.example", "connect", json!({}));
        let theirs = WalletEvent::site("https://b.example", "connect", json!({}));

        assert!(filter.matches(&mine));
        assert!(!filter.matches(&theirs));
        assert!(!filter.matches(&WalletEvent::LockChanged { locked: true }));
    }
}
