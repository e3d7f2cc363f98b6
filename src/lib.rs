//! Hierarchical navigation engine.
//!
//! A static tree of routes (leaf screens inside nested stack and switch
//! containers) drives a single serializable [`NavigationState`]. The engine
//! resolves path + params requests into state transitions, derives the focused
//! screen with its accumulated params, handles back navigation and not-found
//! fallbacks, and converts between state and URLs for history integration.
//! Rendering screens and wiring platform history are left to the host.

pub mod codec;
pub mod error;
pub mod logging;
pub mod metrics;
pub mod navigate;
pub mod params;
pub mod routes;
pub mod runtime;
pub mod state;
pub mod store;

pub use codec::{ParsedUrl, generate_url, not_found_url, parse_url};
pub use error::{NavigationError, Result, ValidationError};
pub use logging::{
    JsonLinesSink, LogEvent, LogFields, LogLevel, LogSink, Logger, LoggingError, LoggingResult,
    MemorySink,
};
pub use metrics::{MetricSnapshot, NavigationMetrics};
pub use navigate::{NavigationPlan, apply_back, apply_path, can_go_back, plan_navigation};
pub use params::{ParamKind, ParamSchema, ParamSpec, Params, accumulate};
pub use routes::{ContainerRoute, LeafRoute, RouteDefinition, RouteIndex, RouteTree};
pub use runtime::audit::{
    BufferedAudit, NavigationAudit, NavigationAuditEvent, NavigationAuditEventBuilder,
    NavigationAuditStage, NullNavigationAudit,
};
pub use runtime::deferred::{CommitCanceller, CommitTrigger, DeferredCommit};
pub use runtime::keys::{KeyAction, KeyBindings};
pub use runtime::{
    ExternalSignal, FocusedRoute, HistoryMode, NavigateOptions, NavigationSignal, Navigator,
    NavigatorConfig, PendingNavigation,
};
pub use state::{
    AddressStep, ContainerKind, LogicalPath, NavigationState, NodeKind, NotFoundInfo,
    StateAddress, StateNode, parse_logical_path, resolve_focus, to_logical_path,
};
pub use store::{Listener, Modification, ModifyOptions, NavigationStore, Subscription};
