//! Navigate engine: turns a logical path plus raw params into a new state tree.
//!
//! Every segment either reuses an entry already mounted in its container
//! (truncating a stack back to it, or refocusing a switch) or mounts a fresh
//! default subtree. A path that does not resolve falls back to the nearest
//! ancestor container declaring a not-found handler.

mod back;

pub use back::{apply_back, can_go_back};

use crate::error::{NavigationError, Result};
use crate::params::Params;
use crate::routes::RouteIndex;
use crate::state::{
    AddressStep, ContainerKind, NavigationState, NodeKind, NotFoundInfo, StateAddress, StateNode,
};
use crate::store::{ModifyOptions, NavigationStore};

/// Candidate produced by [`plan_navigation`]; nothing is committed yet.
#[derive(Debug, Clone)]
pub struct NavigationPlan {
    pub state: NavigationState,
    pub changed: bool,
    /// Address of the node the request ended on (a container when recovered).
    pub terminal: StateAddress,
    /// Set when the request was redirected to a not-found handler.
    pub not_found: Option<NotFoundInfo>,
}

/// Compute the state that navigating to `path` would produce, without committing.
pub fn plan_navigation(
    store: &mut NavigationStore,
    routes: &RouteIndex,
    path: &[String],
    raw: &Params,
) -> Result<NavigationPlan> {
    let mut terminal = StateAddress::new();
    let attempt = store.modify(
        |draft| {
            terminal = apply_path(draft, routes, path, raw)?;
            draft.clear_not_found_flags();
            Ok(())
        },
        ModifyOptions::dry_run(),
    );

    match attempt {
        Ok(modification) => Ok(NavigationPlan {
            state: modification.state,
            changed: modification.changed,
            terminal,
            not_found: None,
        }),
        Err(NavigationError::NotFound { path: reached }) => {
            plan_not_found(store, routes, path, raw, &reached)
        }
        Err(err) => Err(err),
    }
}

/// Retarget a failed request at the nearest ancestor container with a not-found
/// handler and mark the node it lands on.
fn plan_not_found(
    store: &mut NavigationStore,
    routes: &RouteIndex,
    path: &[String],
    raw: &Params,
    reached: &[String],
) -> Result<NavigationPlan> {
    let resolvable = reached.len().saturating_sub(1);
    for depth in (0..=resolvable).rev() {
        let ancestor = &reached[..depth];
        let definition = routes.lookup(ancestor)?;
        let has_handler = definition
            .as_container()
            .is_some_and(|container| container.not_found.is_some());
        if !has_handler {
            continue;
        }

        let info = NotFoundInfo {
            orig_path: path.to_vec(),
            orig_params: raw.clone(),
        };
        let mut terminal = StateAddress::new();
        let modification = store.modify(
            |draft| {
                terminal = apply_path(draft, routes, ancestor, raw)?;
                draft.clear_not_found_flags();
                draft.node_at_mut(&terminal)?.info_for_rendering_not_found_error =
                    Some(info.clone());
                Ok(())
            },
            ModifyOptions::dry_run(),
        )?;
        return Ok(NavigationPlan {
            state: modification.state,
            changed: modification.changed,
            terminal,
            not_found: Some(info),
        });
    }
    Err(NavigationError::not_found(reached))
}

/// Mutate `draft` so that `path` is mounted and focused; returns the address of
/// the last segment's node.
pub fn apply_path(
    draft: &mut NavigationState,
    routes: &RouteIndex,
    path: &[String],
    raw: &Params,
) -> Result<StateAddress> {
    let root_definition = routes.lookup(&[])?;
    let mut address = StateAddress::new();
    let mut node = draft.root_mut();
    node.params = root_definition
        .params()
        .and_then(|schema| schema.extract(raw));

    for (depth, segment) in path.iter().enumerate() {
        let definition = routes.lookup(&path[..=depth])?;
        let extracted = definition.params().and_then(|schema| schema.extract(raw));

        let (step, next) = match &mut node.kind {
            NodeKind::Stack { stack } => {
                let existing = stack
                    .iter()
                    .position(|entry| entry.path == *segment && entry.params == extracted);
                let index = match existing {
                    Some(index) => {
                        stack.truncate(index + 1);
                        index
                    }
                    None => {
                        stack.push(StateNode::initial(segment, &definition, raw)?);
                        stack.len() - 1
                    }
                };
                let step = AddressStep::new(ContainerKind::Stack, index, segment.clone());
                (step, &mut stack[index])
            }
            NodeKind::Switch {
                focused_switch_index,
                switches,
            } => {
                let index = match switches.iter().position(|entry| entry.path == *segment) {
                    Some(index) => {
                        switches[index].params = extracted;
                        index
                    }
                    None => {
                        switches.push(StateNode::initial(segment, &definition, raw)?);
                        switches.len() - 1
                    }
                };
                *focused_switch_index = index;
                let step = AddressStep::new(ContainerKind::Switch, index, segment.clone());
                (step, &mut switches[index])
            }
            NodeKind::Leaf => {
                return Err(NavigationError::internal(format!(
                    "leaf `{}` reached before `/{}` was exhausted",
                    node.path,
                    path.join("/")
                )));
            }
        };

        address.push(step);
        node = next;
    }
    Ok(address)
}
