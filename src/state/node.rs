use serde::{Deserialize, Serialize};

use crate::error::{NavigationError, Result};
use crate::params::Params;
use crate::routes::{RouteDefinition, RouteIndex};

use super::{AddressStep, ContainerKind, LogicalPath};

/// Marks a node that renders a not-found view in place of its content.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NotFoundInfo {
    pub orig_path: LogicalPath,
    #[serde(default)]
    pub orig_params: Params,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum NodeKind {
    Stack {
        stack: Vec<StateNode>,
    },
    #[serde(rename_all = "camelCase")]
    Switch {
        focused_switch_index: usize,
        switches: Vec<StateNode>,
    },
    Leaf,
}

/// One mounted route. `params` only holds the keys this level declares.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StateNode {
    pub path: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub params: Option<Params>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub info_for_rendering_not_found_error: Option<NotFoundInfo>,
    #[serde(flatten)]
    pub kind: NodeKind,
}

impl StateNode {
    pub fn new(path: impl Into<String>, kind: NodeKind) -> Self {
        Self {
            path: path.into(),
            params: None,
            info_for_rendering_not_found_error: None,
            kind,
        }
    }

    pub fn with_params(mut self, params: Option<Params>) -> Self {
        self.params = params;
        self
    }

    /// Build the default subtree for `definition`: containers mount their
    /// initial child recursively. Each level keeps the subset of `raw` it declares.
    pub fn initial(name: &str, definition: &RouteDefinition, raw: &Params) -> Result<Self> {
        let params = definition.params().and_then(|schema| schema.extract(raw));
        let kind = match definition.as_container() {
            None => NodeKind::Leaf,
            Some(container) => {
                let (child_name, child) = container.initial_child().ok_or_else(|| {
                    NavigationError::internal(format!("container `{name}` has no initial child"))
                })?;
                let entry = Self::initial(child_name, child, raw)?;
                match container.kind {
                    ContainerKind::Stack => NodeKind::Stack { stack: vec![entry] },
                    ContainerKind::Switch => NodeKind::Switch {
                        focused_switch_index: 0,
                        switches: vec![entry],
                    },
                }
            }
        };
        Ok(Self::new(name, kind).with_params(params))
    }

    pub fn container_kind(&self) -> Option<ContainerKind> {
        match self.kind {
            NodeKind::Stack { .. } => Some(ContainerKind::Stack),
            NodeKind::Switch { .. } => Some(ContainerKind::Switch),
            NodeKind::Leaf => None,
        }
    }

    pub fn entries(&self) -> &[StateNode] {
        match &self.kind {
            NodeKind::Stack { stack } => stack,
            NodeKind::Switch { switches, .. } => switches,
            NodeKind::Leaf => &[],
        }
    }

    fn entries_mut(&mut self) -> Option<&mut Vec<StateNode>> {
        match &mut self.kind {
            NodeKind::Stack { stack } => Some(stack),
            NodeKind::Switch { switches, .. } => Some(switches),
            NodeKind::Leaf => None,
        }
    }

    fn clear_not_found(&mut self) -> bool {
        let mut cleared = self.info_for_rendering_not_found_error.take().is_some();
        if let Some(entries) = self.entries_mut() {
            for entry in entries {
                cleared |= entry.clear_not_found();
            }
        }
        cleared
    }

    fn entry(&self, step: &AddressStep) -> Result<&StateNode> {
        self.entries()
            .get(step.index)
            .filter(|entry| self.container_kind() == Some(step.kind) && entry.path == step.name)
            .ok_or_else(|| address_mismatch(&self.path, step))
    }

    fn entry_mut(&mut self, step: &AddressStep) -> Result<&mut StateNode> {
        let kind = self.container_kind();
        let path = self.path.clone();
        self.entries_mut()
            .and_then(|entries| entries.get_mut(step.index))
            .filter(|entry| kind == Some(step.kind) && entry.path == step.name)
            .ok_or_else(|| address_mismatch(&path, step))
    }
}

fn address_mismatch(at: &str, step: &AddressStep) -> NavigationError {
    NavigationError::internal(format!(
        "address step {:?}[{}] `{}` does not match state under `{at}`",
        step.kind, step.index, step.name
    ))
}

/// The whole navigation state; the root node is always a container.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NavigationState {
    root: StateNode,
}

impl NavigationState {
    pub fn new(root: StateNode) -> Self {
        Self { root }
    }

    /// Generate the startup state by mounting the default route at every level.
    pub fn initial(routes: &RouteIndex) -> Result<Self> {
        StateNode::initial("", routes.root(), &Params::new()).map(Self::new)
    }

    pub fn root(&self) -> &StateNode {
        &self.root
    }

    pub fn root_mut(&mut self) -> &mut StateNode {
        &mut self.root
    }

    pub fn node_at(&self, address: &[AddressStep]) -> Result<&StateNode> {
        address
            .iter()
            .try_fold(&self.root, |node, step| node.entry(step))
    }

    pub fn node_at_mut(&mut self, address: &[AddressStep]) -> Result<&mut StateNode> {
        let mut node = &mut self.root;
        for step in address {
            node = node.entry_mut(step)?;
        }
        Ok(node)
    }

    /// Remove every not-found marker in the tree; reports whether any existed.
    pub fn clear_not_found_flags(&mut self) -> bool {
        self.root.clear_not_found()
    }

    /// Deepest not-found marker along `address`, root included.
    pub fn not_found_along(&self, address: &[AddressStep]) -> Result<Option<&NotFoundInfo>> {
        let mut found = self.root.info_for_rendering_not_found_error.as_ref();
        let mut node = &self.root;
        for step in address {
            node = node.entry(step)?;
            if let Some(info) = node.info_for_rendering_not_found_error.as_ref() {
                found = Some(info);
            }
        }
        Ok(found)
    }

    /// blake3 digest of the canonical JSON form.
    pub fn fingerprint(&self) -> blake3::Hash {
        let bytes = serde_json::to_vec(self).unwrap_or_default();
        blake3::hash(&bytes)
    }

    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string(self)
    }

    pub fn from_json(text: &str) -> serde_json::Result<Self> {
        serde_json::from_str(text)
    }
}
