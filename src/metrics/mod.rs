use crate::logging::{LogEvent, LogFields, LogLevel};
use serde_json::json;
use std::time::Duration;

/// Counters for navigator activity.
#[derive(Debug, Default, Clone)]
pub struct NavigationMetrics {
    requests: u64,
    commits: u64,
    discarded: u64,
    not_found_recoveries: u64,
    back_navigations: u64,
    failures: u64,
}

impl NavigationMetrics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_request(&mut self) {
        self.requests = self.requests.saturating_add(1);
    }

    pub fn record_commit(&mut self) {
        self.commits = self.commits.saturating_add(1);
    }

    pub fn record_discarded(&mut self) {
        self.discarded = self.discarded.saturating_add(1);
    }

    pub fn record_not_found_recovery(&mut self) {
        self.not_found_recoveries = self.not_found_recoveries.saturating_add(1);
    }

    pub fn record_back(&mut self) {
        self.back_navigations = self.back_navigations.saturating_add(1);
    }

    pub fn record_failure(&mut self) {
        self.failures = self.failures.saturating_add(1);
    }

    pub fn snapshot(&self, uptime: Duration) -> MetricSnapshot {
        MetricSnapshot {
            uptime_ms: uptime.as_millis() as u64,
            requests: self.requests,
            commits: self.commits,
            discarded: self.discarded,
            not_found_recoveries: self.not_found_recoveries,
            back_navigations: self.back_navigations,
            failures: self.failures,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MetricSnapshot {
    pub uptime_ms: u64,
    pub requests: u64,
    pub commits: u64,
    pub discarded: u64,
    pub not_found_recoveries: u64,
    pub back_navigations: u64,
    pub failures: u64,
}

impl MetricSnapshot {
    pub fn to_log_event(&self, target: &str) -> LogEvent {
        LogEvent::with_fields(LogLevel::Info, target, "navigation_metrics", self.as_fields())
    }

    pub fn as_fields(&self) -> LogFields {
        let mut map = LogFields::new();
        map.insert("uptime_ms".to_string(), json!(self.uptime_ms));
        map.insert("requests".to_string(), json!(self.requests));
        map.insert("commits".to_string(), json!(self.commits));
        map.insert("discarded".to_string(), json!(self.discarded));
        map.insert(
            "not_found_recoveries".to_string(),
            json!(self.not_found_recoveries),
        );
        map.insert("back_navigations".to_string(), json!(self.back_navigations));
        map.insert("failures".to_string(), json!(self.failures));
        map
    }
}
