//! Navigator lifecycle audit utilities.
//!
//! Lightweight instrumentation hooks so callers can observe the major
//! transitions of a [`Navigator`](super::Navigator). Records capture a stage
//! plus structured details so downstream code can log, buffer, or replay the
//! navigation history without touching the engine.

use std::sync::Mutex;
use std::time::SystemTime;

use serde_json::Value;

/// Distinct checkpoints emitted by the navigator.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NavigationAuditStage {
    /// A navigator was constructed with its starting state.
    NavigatorConstructed,
    /// A candidate state was computed but not yet committed.
    NavigationPrepared,
    /// A candidate state replaced the live state.
    NavigationCommitted,
    /// A candidate was identical to the live state and dropped.
    NavigationDiscarded,
    /// A missing route was redirected to a not-found handler.
    NotFoundRecovered,
    /// Back navigation changed the state.
    BackNavigated,
    /// The host reported a history pop.
    ExternalPopHandled,
    /// A request failed without touching the state.
    NavigationFailed,
}

/// Structured audit entry.
#[derive(Debug, Clone)]
pub struct NavigationAuditEvent {
    pub timestamp: SystemTime,
    pub stage: NavigationAuditStage,
    pub details: Vec<(String, Value)>,
}

impl NavigationAuditEvent {
    fn new(stage: NavigationAuditStage) -> Self {
        Self {
            timestamp: SystemTime::now(),
            stage,
            details: Vec::new(),
        }
    }

    pub fn detail(&self, key: &str) -> Option<&Value> {
        self.details
            .iter()
            .find(|(name, _)| name == key)
            .map(|(_, value)| value)
    }
}

/// Builder helper to append fields ergonomically.
pub struct NavigationAuditEventBuilder {
    event: NavigationAuditEvent,
}

impl NavigationAuditEventBuilder {
    pub fn new(stage: NavigationAuditStage) -> Self {
        Self {
            event: NavigationAuditEvent::new(stage),
        }
    }

    pub fn detail(&mut self, key: impl Into<String>, value: Value) -> &mut Self {
        self.event.details.push((key.into(), value));
        self
    }

    pub fn finish(self) -> NavigationAuditEvent {
        self.event
    }
}

/// Trait implemented by any audit sink.
pub trait NavigationAudit: Send + Sync {
    fn record(&self, event: NavigationAuditEvent);
}

/// Default no-op implementation used when auditing is disabled.
#[derive(Debug, Default)]
pub struct NullNavigationAudit;

impl NavigationAudit for NullNavigationAudit {
    fn record(&self, _event: NavigationAuditEvent) {}
}

/// Buffers every event in memory.
#[derive(Debug, Default)]
pub struct BufferedAudit {
    events: Mutex<Vec<NavigationAuditEvent>>,
}

impl BufferedAudit {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn events(&self) -> Vec<NavigationAuditEvent> {
        self.events
            .lock()
            .map(|events| events.clone())
            .unwrap_or_default()
    }

    pub fn stages(&self) -> Vec<NavigationAuditStage> {
        self.events().into_iter().map(|event| event.stage).collect()
    }
}

impl NavigationAudit for BufferedAudit {
    fn record(&self, event: NavigationAuditEvent) {
        if let Ok(mut events) = self.events.lock() {
            events.push(event);
        }
    }
}
