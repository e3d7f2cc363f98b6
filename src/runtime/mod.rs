use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use serde_json::{Value, json};

use crate::codec::{generate_url, not_found_url, parse_url};
use crate::logging::{LogLevel, Logger, event_with_fields, json_kv, json_str};
use crate::metrics::{MetricSnapshot, NavigationMetrics};
use crate::navigate::{apply_back, can_go_back, plan_navigation};
use crate::params::{Params, accumulate};
use crate::routes::{RouteIndex, RouteTree};
use crate::state::{
    LogicalPath, NavigationState, NotFoundInfo, StateAddress, resolve_focus, to_logical_path,
};
use crate::store::{ModifyOptions, NavigationStore, Subscription};
use crate::{NavigationError, Result};

pub mod audit;
pub mod deferred;
pub mod keys;

use audit::{NavigationAudit, NavigationAuditEventBuilder, NavigationAuditStage};
use deferred::{CommitCanceller, DeferredCommit};

/// Configuration knobs for the navigator.
#[derive(Clone)]
pub struct NavigatorConfig {
    /// Optional structured logger used by the navigator.
    pub logger: Option<Logger>,
    /// Metrics accumulator; `None` disables counting.
    pub metrics: Option<Arc<Mutex<NavigationMetrics>>>,
    /// Optional audit sink for lifecycle checkpoints.
    pub audit: Option<Arc<dyn NavigationAudit>>,
    /// Longest time a prepared navigation may be held before finalizing.
    pub commit_window: Duration,
    /// Target field used for navigation log events.
    pub log_target: String,
    /// Target field used when emitting metrics snapshots.
    pub metrics_target: String,
}

impl Default for NavigatorConfig {
    fn default() -> Self {
        Self {
            logger: None,
            metrics: None,
            audit: None,
            commit_window: Duration::from_millis(150),
            log_target: "nav::navigator".to_string(),
            metrics_target: "nav::metrics".to_string(),
        }
    }
}

impl NavigatorConfig {
    /// Enable metrics collection if it has not already been configured.
    pub fn enable_metrics(&mut self) {
        if self.metrics.is_none() {
            self.metrics = Some(Arc::new(Mutex::new(NavigationMetrics::new())));
        }
    }

    pub fn disable_metrics(&mut self) {
        self.metrics = None;
    }

    /// Access the shared metrics handle if metrics are enabled.
    pub fn metrics_handle(&self) -> Option<Arc<Mutex<NavigationMetrics>>> {
        self.metrics.as_ref().map(Arc::clone)
    }
}

/// How a committed navigation should be reflected in host history.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum HistoryMode {
    #[default]
    Push,
    Replace,
    /// The host already moved its history (e.g. a browser pop).
    Skip,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct NavigateOptions {
    pub history: HistoryMode,
}

impl NavigateOptions {
    pub fn replace() -> Self {
        Self {
            history: HistoryMode::Replace,
        }
    }

    pub fn skip_history() -> Self {
        Self {
            history: HistoryMode::Skip,
        }
    }
}

/// Signals produced for history and back-button integrations.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NavigationSignal {
    PushUrl(String),
    ReplaceUrl(String),
    StateChanged { url: String },
}

/// Signals the host feeds into the navigator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExternalSignal {
    /// History moved outside the engine; `url` is the new location.
    PopState { url: String },
    BackRequested,
}

/// The focused screen as seen from outside.
#[derive(Debug, Clone, PartialEq)]
pub struct FocusedRoute {
    pub path: LogicalPath,
    pub params: Params,
    pub address: StateAddress,
    pub not_found: Option<NotFoundInfo>,
    pub url: String,
}

/// A computed but uncommitted navigation. Pass it to [`Navigator::finalize`].
#[derive(Debug, Clone)]
pub struct PendingNavigation {
    path: LogicalPath,
    candidate: NavigationState,
    changed: bool,
    options: NavigateOptions,
    focused: FocusedRoute,
    fingerprint: blake3::Hash,
}

impl PendingNavigation {
    pub fn path(&self) -> &[String] {
        &self.path
    }

    pub fn candidate(&self) -> &NavigationState {
        &self.candidate
    }

    /// Whether the candidate differed from the live state when prepared.
    pub fn changes_state(&self) -> bool {
        self.changed
    }

    pub fn focused(&self) -> &FocusedRoute {
        &self.focused
    }

    pub fn url(&self) -> &str {
        &self.focused.url
    }

    pub fn fingerprint(&self) -> blake3::Hash {
        self.fingerprint
    }

    /// Same destination state as `other`.
    pub fn same_destination(&self, other: &PendingNavigation) -> bool {
        self.fingerprint == other.fingerprint
    }
}

/// Owns the route index and state store and runs every navigation operation.
pub struct Navigator {
    routes: RouteIndex,
    store: NavigationStore,
    config: NavigatorConfig,
    signals: Vec<NavigationSignal>,
    started: Instant,
}

impl Navigator {
    /// Start from the default route at every level.
    pub fn new(tree: RouteTree, config: NavigatorConfig) -> Result<Self> {
        let routes = RouteIndex::new(tree);
        let state = NavigationState::initial(&routes)?;
        Ok(Self::assemble(routes, state, config, "generated"))
    }

    /// Start from a previously persisted state. The state is trusted as-is.
    pub fn with_initial_state(
        tree: RouteTree,
        state: NavigationState,
        config: NavigatorConfig,
    ) -> Result<Self> {
        if state.root().container_kind().is_none() {
            return Err(NavigationError::internal("initial state root must be a container"));
        }
        Ok(Self::assemble(RouteIndex::new(tree), state, config, "restored"))
    }

    fn assemble(
        routes: RouteIndex,
        state: NavigationState,
        config: NavigatorConfig,
        origin: &str,
    ) -> Self {
        let navigator = Self {
            routes,
            store: NavigationStore::new(state),
            config,
            signals: Vec::new(),
            started: Instant::now(),
        };
        navigator.audit(
            NavigationAuditStage::NavigatorConstructed,
            [
                json_str("origin", origin),
                json_str("fingerprint", navigator.state().fingerprint().to_hex().to_string()),
            ],
        );
        navigator
    }

    pub fn routes(&self) -> &RouteIndex {
        &self.routes
    }

    pub fn state(&self) -> &NavigationState {
        self.store.get()
    }

    pub fn config(&self) -> &NavigatorConfig {
        &self.config
    }

    pub fn config_mut(&mut self) -> &mut NavigatorConfig {
        &mut self.config
    }

    pub fn subscribe<F>(&self, listener: F) -> Subscription
    where
        F: FnMut(&NavigationState) + Send + 'static,
    {
        self.store.subscribe(listener)
    }

    /// Drain the signals emitted since the last call.
    pub fn take_signals(&mut self) -> Vec<NavigationSignal> {
        std::mem::take(&mut self.signals)
    }

    pub fn focused(&self) -> Result<FocusedRoute> {
        self.describe(self.state())
    }

    pub fn current_url(&self) -> Result<String> {
        self.focused().map(|focused| focused.url)
    }

    pub fn can_go_back(&self) -> Result<bool> {
        can_go_back(self.state())
    }

    /// Navigate and commit in one step.
    pub fn navigate(
        &mut self,
        path: &[String],
        params: &Params,
        options: NavigateOptions,
    ) -> Result<bool> {
        let pending = self.prepare_navigation(path, params, options)?;
        self.finalize(pending)
    }

    /// Parse `url` and navigate to it.
    pub fn navigate_url(&mut self, url: &str, options: NavigateOptions) -> Result<bool> {
        let parsed = match parse_url(&self.routes, url) {
            Ok(parsed) => parsed,
            Err(err) => {
                self.record_failure(&parse_path_hint(url), &err);
                return Err(err);
            }
        };
        self.navigate(&parsed.path, &parsed.params, options)
    }

    /// First phase: compute and validate the next state without committing it.
    pub fn prepare_navigation(
        &mut self,
        path: &[String],
        params: &Params,
        options: NavigateOptions,
    ) -> Result<PendingNavigation> {
        self.with_metrics(NavigationMetrics::record_request);
        match self.plan(path, params, options) {
            Ok(pending) => {
                self.audit(
                    NavigationAuditStage::NavigationPrepared,
                    [
                        json_str("path", path.join("/")),
                        json_kv("changed", pending.changed),
                        json_str("fingerprint", pending.fingerprint.to_hex().to_string()),
                    ],
                );
                Ok(pending)
            }
            Err(err) => {
                self.record_failure(path, &err);
                Err(err)
            }
        }
    }

    fn plan(
        &mut self,
        path: &[String],
        params: &Params,
        options: NavigateOptions,
    ) -> Result<PendingNavigation> {
        let plan = plan_navigation(&mut self.store, &self.routes, path, params)?;
        let focused = self.describe(&plan.state)?;
        if let Some(info) = &plan.not_found {
            self.with_metrics(NavigationMetrics::record_not_found_recovery);
            self.log(
                LogLevel::Info,
                "not_found_recovered",
                [
                    json_str("requested", info.orig_path.join("/")),
                    json_str("handler_path", to_logical_path(&plan.terminal).join("/")),
                ],
            );
            self.audit(
                NavigationAuditStage::NotFoundRecovered,
                [
                    json_str("requested", info.orig_path.join("/")),
                    json_str("url", focused.url.clone()),
                ],
            );
        }
        Ok(PendingNavigation {
            path: path.to_vec(),
            fingerprint: plan.state.fingerprint(),
            candidate: plan.state,
            changed: plan.changed,
            options,
            focused,
        })
    }

    /// Second phase: commit a prepared navigation. Finalizing a candidate equal
    /// to the live state is a no-op, so finalizing two preparations of the same
    /// destination commits once; different destinations are last-write-wins.
    pub fn finalize(&mut self, pending: PendingNavigation) -> Result<bool> {
        let PendingNavigation {
            path,
            candidate,
            options,
            focused,
            ..
        } = pending;

        if !self.store.commit(candidate) {
            self.with_metrics(NavigationMetrics::record_discarded);
            self.log(
                LogLevel::Debug,
                "navigation_discarded",
                [json_str("path", path.join("/"))],
            );
            self.audit(
                NavigationAuditStage::NavigationDiscarded,
                [json_str("path", path.join("/"))],
            );
            return Ok(false);
        }

        self.with_metrics(NavigationMetrics::record_commit);
        let url = focused.url;
        match options.history {
            HistoryMode::Push => self.signals.push(NavigationSignal::PushUrl(url.clone())),
            HistoryMode::Replace => self.signals.push(NavigationSignal::ReplaceUrl(url.clone())),
            HistoryMode::Skip => {}
        }
        self.signals
            .push(NavigationSignal::StateChanged { url: url.clone() });
        self.log(
            LogLevel::Info,
            "navigation_committed",
            [
                json_str("path", path.join("/")),
                json_str("url", url.clone()),
                json_str("history", format!("{:?}", options.history)),
            ],
        );
        self.audit(
            NavigationAuditStage::NavigationCommitted,
            [json_str("path", path.join("/")), json_str("url", url)],
        );
        Ok(true)
    }

    /// Timer for holding a prepared navigation at most `commit_window`.
    pub fn deferred_commit(&self) -> (DeferredCommit, CommitCanceller) {
        DeferredCommit::new(self.config.commit_window)
    }

    /// Go back one step; `false` when already at the initial screen.
    pub fn go_back(&mut self) -> Result<bool> {
        let (candidate, focused) = match self.plan_back() {
            Ok(Some(found)) => found,
            Ok(None) => {
                self.log(LogLevel::Debug, "back_ignored", std::iter::empty());
                return Ok(false);
            }
            Err(err) => {
                self.record_failure(&[], &err);
                return Err(err);
            }
        };

        self.store.commit(candidate);
        self.with_metrics(NavigationMetrics::record_back);
        self.signals.push(NavigationSignal::StateChanged {
            url: focused.url.clone(),
        });
        self.log(
            LogLevel::Info,
            "back_navigated",
            [json_str("url", focused.url.clone())],
        );
        self.audit(
            NavigationAuditStage::BackNavigated,
            [json_str("url", focused.url)],
        );
        Ok(true)
    }

    fn plan_back(&mut self) -> Result<Option<(NavigationState, FocusedRoute)>> {
        let modification = self
            .store
            .modify(|draft| apply_back(draft).map(|_| ()), ModifyOptions::dry_run())?;
        if !modification.changed {
            return Ok(None);
        }
        let focused = self.describe(&modification.state)?;
        Ok(Some((modification.state, focused)))
    }

    /// React to a host signal.
    pub fn handle_signal(&mut self, signal: ExternalSignal) -> Result<bool> {
        match signal {
            ExternalSignal::PopState { url } => {
                self.audit(
                    NavigationAuditStage::ExternalPopHandled,
                    [json_str("url", url.clone())],
                );
                self.navigate_url(&url, NavigateOptions::skip_history())
            }
            ExternalSignal::BackRequested => self.go_back(),
        }
    }

    /// Return to the generated initial state.
    pub fn reset(&mut self) -> Result<bool> {
        let initial = NavigationState::initial(&self.routes)?;
        let focused = self.describe(&initial)?;
        if !self.store.commit(initial) {
            return Ok(false);
        }
        self.with_metrics(NavigationMetrics::record_commit);
        self.signals
            .push(NavigationSignal::ReplaceUrl(focused.url.clone()));
        self.signals
            .push(NavigationSignal::StateChanged { url: focused.url.clone() });
        self.log(LogLevel::Info, "navigator_reset", [json_str("url", focused.url)]);
        Ok(true)
    }

    pub fn metrics_snapshot(&self) -> Option<MetricSnapshot> {
        let metrics = self.config.metrics.as_ref()?;
        let guard = metrics.lock().ok()?;
        Some(guard.snapshot(self.started.elapsed()))
    }

    /// Write the current metrics snapshot to the logger, if both are configured.
    pub fn emit_metrics(&self) {
        let (Some(logger), Some(snapshot)) = (self.config.logger.as_ref(), self.metrics_snapshot())
        else {
            return;
        };
        let _ = logger.log_event(snapshot.to_log_event(&self.config.metrics_target));
    }

    fn describe(&self, state: &NavigationState) -> Result<FocusedRoute> {
        let address = resolve_focus(state)?;
        let path = to_logical_path(&address);
        let params = accumulate(state, &address, &self.routes)?;
        let not_found = state.not_found_along(&address)?.cloned();
        let url = match &not_found {
            Some(info) => not_found_url(&self.routes, info)?,
            None => generate_url(&self.routes, &path, &params)?,
        };
        Ok(FocusedRoute {
            path,
            params,
            address,
            not_found,
            url,
        })
    }

    fn record_failure(&self, path: &[String], err: &NavigationError) {
        self.with_metrics(NavigationMetrics::record_failure);
        self.log(
            LogLevel::Warn,
            "navigation_failed",
            [
                json_str("path", path.join("/")),
                json_str("kind", err.kind()),
                json_str("error", err.to_string()),
            ],
        );
        self.audit(
            NavigationAuditStage::NavigationFailed,
            [json_str("path", path.join("/")), json_str("kind", err.kind())],
        );
    }

    fn with_metrics(&self, record: impl FnOnce(&mut NavigationMetrics)) {
        if let Some(metrics) = &self.config.metrics {
            if let Ok(mut guard) = metrics.lock() {
                record(&mut *guard);
            }
        }
    }

    fn log(
        &self,
        level: LogLevel,
        message: &str,
        fields: impl IntoIterator<Item = (String, Value)>,
    ) {
        if let Some(logger) = &self.config.logger {
            let event = event_with_fields(level, &self.config.log_target, message, fields);
            let _ = logger.log_event(event);
        }
    }

    fn audit(
        &self,
        stage: NavigationAuditStage,
        details: impl IntoIterator<Item = (String, Value)>,
    ) {
        let Some(audit) = &self.config.audit else {
            return;
        };
        let mut builder = NavigationAuditEventBuilder::new(stage);
        for (key, value) in details {
            builder.detail(key, value);
        }
        builder.detail("elapsed_ms", json!(self.started.elapsed().as_millis() as u64));
        audit.record(builder.finish());
    }
}

fn parse_path_hint(url: &str) -> Vec<String> {
    let path = url.split(['?', '#']).next().unwrap_or_default();
    crate::state::parse_logical_path(path)
}

#[cfg(test)]
mod tests;
