use std::sync::atomic::{AtomicUsize, Ordering};

use serde_json::json;

use super::audit::{BufferedAudit, NavigationAuditStage};
use super::deferred::CommitTrigger;
use super::*;
use crate::logging::{JsonLinesSink, MemorySink};
use crate::params::{ParamKind, ParamSchema};
use crate::routes::{ContainerRoute, LeafRoute};
use crate::state::{NodeKind, StateNode, parse_logical_path};

fn params(value: Value) -> Params {
    value.as_object().cloned().unwrap_or_default()
}

fn path(text: &str) -> LogicalPath {
    parse_logical_path(text)
}

fn tree() -> RouteTree {
    RouteTree::new(
        ContainerRoute::stack()
            .not_found("NotFound404")
            .child("home", LeafRoute::new().component("Home"))
            .child(
                "article",
                LeafRoute::new().params(ParamSchema::new().required("id", ParamKind::Integer)),
            )
            .child(
                "tabs",
                ContainerRoute::switch()
                    .keep_alive(true)
                    .child("feed", LeafRoute::new())
                    .child(
                        "search",
                        LeafRoute::new().params(ParamSchema::new().required("q", ParamKind::String)),
                    ),
            ),
    )
    .unwrap()
}

fn navigator() -> Navigator {
    Navigator::new(tree(), NavigatorConfig::default()).unwrap()
}

#[derive(Clone, Default)]
struct SharedBuffer(Arc<Mutex<Vec<u8>>>);

impl std::io::Write for SharedBuffer {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        self.0.lock().unwrap().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> std::io::Result<()> {
        Ok(())
    }
}

#[test]
fn starts_on_default_route() {
    let navigator = navigator();
    let focused = navigator.focused().unwrap();
    assert_eq!(focused.path, path("home"));
    assert_eq!(focused.url, "/home");
    assert!(!navigator.can_go_back().unwrap());
}

#[test]
fn navigate_emits_history_signals() {
    let mut navigator = navigator();
    assert!(
        navigator
            .navigate(&path("article"), &params(json!({"id": 7})), NavigateOptions::default())
            .unwrap()
    );
    assert_eq!(
        navigator.take_signals(),
        vec![
            NavigationSignal::PushUrl("/article?id=7".into()),
            NavigationSignal::StateChanged {
                url: "/article?id=7".into()
            },
        ]
    );

    navigator
        .navigate(&path("tabs/feed"), &Params::new(), NavigateOptions::replace())
        .unwrap();
    assert_eq!(
        navigator.take_signals()[0],
        NavigationSignal::ReplaceUrl("/tabs/feed".into())
    );
}

#[test]
fn identical_navigation_is_silent() {
    let mut navigator = navigator();
    let notified = Arc::new(AtomicUsize::new(0));
    let seen = Arc::clone(&notified);
    let _subscription = navigator.subscribe(move |_| {
        seen.fetch_add(1, Ordering::SeqCst);
    });

    let target = params(json!({"q": "rust"}));
    assert!(navigator.navigate(&path("tabs/search"), &target, NavigateOptions::default()).unwrap());
    navigator.take_signals();
    assert!(!navigator.navigate(&path("tabs/search"), &target, NavigateOptions::default()).unwrap());
    assert!(navigator.take_signals().is_empty());
    assert_eq!(notified.load(Ordering::SeqCst), 1);
}

#[test]
fn same_destination_prepared_twice_commits_once() {
    let mut navigator = navigator();
    let target = params(json!({"id": 3}));
    let first = navigator
        .prepare_navigation(&path("article"), &target, NavigateOptions::default())
        .unwrap();
    let second = navigator
        .prepare_navigation(&path("article"), &target, NavigateOptions::default())
        .unwrap();
    assert!(first.same_destination(&second));
    assert_eq!(navigator.current_url().unwrap(), "/home");

    assert!(navigator.finalize(first).unwrap());
    assert!(!navigator.finalize(second).unwrap());
    assert_eq!(navigator.state().root().entries().len(), 2);
}

#[test]
fn different_destinations_last_write_wins() {
    let mut navigator = navigator();
    let article = navigator
        .prepare_navigation(&path("article"), &params(json!({"id": 1})), NavigateOptions::default())
        .unwrap();
    let feed = navigator
        .prepare_navigation(&path("tabs/feed"), &Params::new(), NavigateOptions::default())
        .unwrap();
    assert!(!article.same_destination(&feed));
    navigator.finalize(article).unwrap();
    navigator.finalize(feed).unwrap();
    assert_eq!(navigator.current_url().unwrap(), "/tabs/feed");
}

#[test]
fn validation_error_leaves_state_untouched() {
    let mut navigator = navigator();
    let before = navigator.state().clone();
    let err = navigator
        .navigate(&path("article"), &params(json!({"id": "abc"})), NavigateOptions::default())
        .unwrap_err();
    assert!(matches!(err, NavigationError::Validation(_)), "{err:?}");
    assert_eq!(navigator.state(), &before);
    assert!(navigator.take_signals().is_empty());
}

#[test]
fn missing_required_param_is_rejected() {
    let mut navigator = navigator();
    let err = navigator
        .navigate(&path("tabs/search"), &Params::new(), NavigateOptions::default())
        .unwrap_err();
    assert!(matches!(err, NavigationError::Validation(_)), "{err:?}");
}

#[test]
fn out_of_range_integer_is_rejected_before_commit() {
    let mut navigator = navigator();
    let before = navigator.state().clone();
    let err = navigator
        .navigate(&path("article"), &params(json!({"id": u64::MAX})), NavigateOptions::default())
        .unwrap_err();
    assert!(matches!(err, NavigationError::Validation(_)), "{err:?}");
    assert_eq!(navigator.state(), &before);
    assert!(navigator.take_signals().is_empty());

    navigator
        .navigate(&path("article"), &params(json!({"id": i64::MAX})), NavigateOptions::default())
        .unwrap();
    let url = navigator.current_url().unwrap();
    assert_eq!(url, format!("/article?id={}", i64::MAX));
    navigator.reset().unwrap();
    assert!(navigator.handle_signal(ExternalSignal::PopState { url }).unwrap());
    assert_eq!(navigator.focused().unwrap().params, params(json!({"id": i64::MAX})));
}

#[test]
fn live_leaf_where_container_expected_is_internal() {
    let desynced = NavigationState::new(StateNode::new(
        "",
        NodeKind::Stack {
            stack: vec![
                StateNode::new("home", NodeKind::Leaf),
                StateNode::new("tabs", NodeKind::Leaf),
            ],
        },
    ));
    let mut navigator =
        Navigator::with_initial_state(tree(), desynced.clone(), NavigatorConfig::default()).unwrap();
    let err = navigator
        .navigate(&path("tabs/feed"), &Params::new(), NavigateOptions::default())
        .unwrap_err();
    assert!(matches!(err, NavigationError::Internal(_)), "{err:?}");
    assert_eq!(navigator.state(), &desynced);
    assert!(navigator.take_signals().is_empty());
}

#[test]
fn not_found_renders_requested_url_and_clears_on_success() {
    let mut navigator = navigator();
    navigator
        .navigate(&path("tabs/missing"), &params(json!({"ref": "x"})), NavigateOptions::default())
        .unwrap();
    let focused = navigator.focused().unwrap();
    let info = focused.not_found.expect("not-found marker");
    assert_eq!(info.orig_path, path("tabs/missing"));
    assert_eq!(focused.url, "/tabs/missing?ref=x");
    assert_eq!(focused.path, path("home"));

    navigator
        .navigate(&path("home"), &Params::new(), NavigateOptions::default())
        .unwrap();
    assert!(navigator.focused().unwrap().not_found.is_none());
}

#[test]
fn pop_state_navigates_without_pushing_history() {
    let mut navigator = navigator();
    assert!(
        navigator
            .handle_signal(ExternalSignal::PopState {
                url: "/tabs/search?q=nav".into()
            })
            .unwrap()
    );
    assert_eq!(
        navigator.take_signals(),
        vec![NavigationSignal::StateChanged {
            url: "/tabs/search?q=nav".into()
        }]
    );
}

#[test]
fn bad_url_is_a_validation_error() {
    let mut navigator = navigator();
    let err = navigator
        .navigate_url("/article?id=seven", NavigateOptions::default())
        .unwrap_err();
    assert!(matches!(err, NavigationError::Validation(_)));
}

#[test]
fn back_signal_pops_and_reports_url() {
    let mut navigator = navigator();
    navigator
        .navigate(&path("article"), &params(json!({"id": 1})), NavigateOptions::default())
        .unwrap();
    navigator.take_signals();
    assert!(navigator.handle_signal(ExternalSignal::BackRequested).unwrap());
    assert_eq!(
        navigator.take_signals(),
        vec![NavigationSignal::StateChanged {
            url: "/home".into()
        }]
    );
    assert!(!navigator.go_back().unwrap());
}

#[test]
fn restores_persisted_state() {
    let mut original = navigator();
    original
        .navigate(&path("tabs/search"), &params(json!({"q": "x"})), NavigateOptions::default())
        .unwrap();
    let saved = original.state().to_json().unwrap();

    let restored = Navigator::with_initial_state(
        tree(),
        NavigationState::from_json(&saved).unwrap(),
        NavigatorConfig::default(),
    )
    .unwrap();
    assert_eq!(restored.current_url().unwrap(), "/tabs/search?q=x");
}

#[test]
fn reset_returns_to_initial_state() {
    let mut navigator = navigator();
    navigator
        .navigate(&path("tabs/feed"), &Params::new(), NavigateOptions::default())
        .unwrap();
    navigator.take_signals();
    assert!(navigator.reset().unwrap());
    assert_eq!(navigator.current_url().unwrap(), "/home");
    assert!(!navigator.reset().unwrap());
}

#[test]
fn json_lines_logger_writes_navigation_events() {
    let buffer = SharedBuffer::default();
    let sink = JsonLinesSink::new(buffer.clone()).with_min_level(LogLevel::Info);
    let config = NavigatorConfig {
        logger: Some(Logger::new(sink)),
        ..NavigatorConfig::default()
    };
    let mut navigator = Navigator::new(tree(), config).unwrap();
    navigator
        .navigate(&path("article"), &params(json!({"id": 3})), NavigateOptions::default())
        .unwrap();
    assert!(navigator.go_back().unwrap());
    assert!(!navigator.go_back().unwrap());

    let text = String::from_utf8(buffer.0.lock().unwrap().clone()).unwrap();
    let events: Vec<Value> = text
        .lines()
        .map(|line| serde_json::from_str(line).unwrap())
        .collect();
    let messages: Vec<_> = events
        .iter()
        .map(|event| event["message"].as_str().unwrap_or_default())
        .collect();
    assert_eq!(messages, vec!["navigation_committed", "back_navigated"]);
    assert_eq!(events[0]["target"], json!("nav::navigator"));
    assert_eq!(events[0]["fields"]["url"], json!("/article?id=3"));
}

#[test]
fn instrumentation_records_activity() {
    let sink = MemorySink::new();
    let audit = Arc::new(BufferedAudit::new());
    let mut config = NavigatorConfig {
        logger: Some(Logger::new(sink.clone())),
        audit: Some(audit.clone()),
        ..NavigatorConfig::default()
    };
    config.enable_metrics();
    let mut navigator = Navigator::new(tree(), config).unwrap();

    navigator
        .navigate(&path("nowhere"), &Params::new(), NavigateOptions::default())
        .unwrap();
    navigator
        .navigate(&path("nowhere"), &Params::new(), NavigateOptions::default())
        .unwrap();
    let _ = navigator.navigate(&path("article"), &Params::new(), NavigateOptions::default());

    let snapshot = navigator.metrics_snapshot().unwrap();
    assert_eq!(snapshot.requests, 3);
    assert_eq!(snapshot.commits, 1);
    assert_eq!(snapshot.discarded, 1);
    assert_eq!(snapshot.not_found_recoveries, 2);
    assert_eq!(snapshot.failures, 1);

    let stages = audit.stages();
    assert_eq!(stages[0], NavigationAuditStage::NavigatorConstructed);
    assert!(stages.contains(&NavigationAuditStage::NotFoundRecovered));
    assert!(stages.contains(&NavigationAuditStage::NavigationDiscarded));
    assert_eq!(stages.last(), Some(&NavigationAuditStage::NavigationFailed));

    navigator.emit_metrics();
    let messages = sink.messages();
    assert!(messages.contains(&"not_found_recovered".to_string()));
    assert!(messages.contains(&"navigation_committed".to_string()));
    assert!(messages.contains(&"navigation_failed".to_string()));
    assert_eq!(messages.last().map(String::as_str), Some("navigation_metrics"));
}

#[tokio::test(start_paused = true)]
async fn deferred_finalize_after_window() {
    let mut navigator = navigator();
    let pending = navigator
        .prepare_navigation(&path("tabs/feed"), &Params::new(), NavigateOptions::default())
        .unwrap();
    let (deferred, _canceller) = navigator.deferred_commit();
    assert_eq!(deferred.window(), Duration::from_millis(150));

    let trigger = deferred.wait(std::future::pending::<()>()).await;
    assert_eq!(trigger, CommitTrigger::WindowElapsed);
    assert_eq!(navigator.current_url().unwrap(), "/home");
    assert!(navigator.finalize(pending).unwrap());
    assert_eq!(navigator.current_url().unwrap(), "/tabs/feed");
}
