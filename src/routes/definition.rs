use std::collections::HashSet;
use std::sync::Arc;

use serde_json::Value;

use crate::error::{NavigationError, Result};
use crate::params::ParamSchema;
use crate::state::ContainerKind;

const RESERVED_NAME_CHARS: &[char] = &['/', '?', '&', '=', '#', '%'];

/// Screen without children.
#[derive(Debug, Clone, Default)]
pub struct LeafRoute {
    pub component: Option<String>,
    pub params: Option<ParamSchema>,
    pub not_found: Option<String>,
}

impl LeafRoute {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn component(mut self, component: impl Into<String>) -> Self {
        self.component = Some(component.into());
        self
    }

    pub fn params(mut self, schema: ParamSchema) -> Self {
        self.params = Some(schema);
        self
    }

    pub fn not_found(mut self, handler: impl Into<String>) -> Self {
        self.not_found = Some(handler.into());
        self
    }
}

/// Stack or switch container with ordered, named children.
#[derive(Debug, Clone)]
pub struct ContainerRoute {
    pub kind: ContainerKind,
    pub children: Vec<(String, Arc<RouteDefinition>)>,
    pub initial: Option<String>,
    pub params: Option<ParamSchema>,
    pub not_found: Option<String>,
    /// Rendering options for children; opaque to the engine.
    pub child_options: Option<Value>,
    /// Whether unfocused switch children stay mounted; opaque to the engine.
    pub keep_alive: bool,
}

impl ContainerRoute {
    fn with_kind(kind: ContainerKind) -> Self {
        Self {
            kind,
            children: Vec::new(),
            initial: None,
            params: None,
            not_found: None,
            child_options: None,
            keep_alive: false,
        }
    }

    pub fn stack() -> Self {
        Self::with_kind(ContainerKind::Stack)
    }

    pub fn switch() -> Self {
        Self::with_kind(ContainerKind::Switch)
    }

    pub fn child(mut self, name: impl Into<String>, definition: impl Into<RouteDefinition>) -> Self {
        self.children
            .push((name.into(), Arc::new(definition.into())));
        self
    }

    pub fn initial(mut self, name: impl Into<String>) -> Self {
        self.initial = Some(name.into());
        self
    }

    pub fn params(mut self, schema: ParamSchema) -> Self {
        self.params = Some(schema);
        self
    }

    pub fn not_found(mut self, handler: impl Into<String>) -> Self {
        self.not_found = Some(handler.into());
        self
    }

    pub fn child_options(mut self, options: Value) -> Self {
        self.child_options = Some(options);
        self
    }

    pub fn keep_alive(mut self, keep_alive: bool) -> Self {
        self.keep_alive = keep_alive;
        self
    }

    pub fn get(&self, name: &str) -> Option<&Arc<RouteDefinition>> {
        self.children
            .iter()
            .find(|(child, _)| child == name)
            .map(|(_, definition)| definition)
    }

    /// The child mounted by default: the declared initial child, else the first one.
    pub fn initial_child(&self) -> Option<(&str, &Arc<RouteDefinition>)> {
        match &self.initial {
            Some(name) => self
                .children
                .iter()
                .find(|(child, _)| child == name)
                .map(|(child, definition)| (child.as_str(), definition)),
            None => self
                .children
                .first()
                .map(|(child, definition)| (child.as_str(), definition)),
        }
    }
}

/// Immutable route definition node.
#[derive(Debug, Clone)]
pub enum RouteDefinition {
    Leaf(LeafRoute),
    Container(ContainerRoute),
}

impl From<LeafRoute> for RouteDefinition {
    fn from(route: LeafRoute) -> Self {
        Self::Leaf(route)
    }
}

impl From<ContainerRoute> for RouteDefinition {
    fn from(route: ContainerRoute) -> Self {
        Self::Container(route)
    }
}

impl RouteDefinition {
    pub fn params(&self) -> Option<&ParamSchema> {
        match self {
            Self::Leaf(leaf) => leaf.params.as_ref(),
            Self::Container(container) => container.params.as_ref(),
        }
    }

    pub fn not_found(&self) -> Option<&str> {
        match self {
            Self::Leaf(leaf) => leaf.not_found.as_deref(),
            Self::Container(container) => container.not_found.as_deref(),
        }
    }

    pub fn as_container(&self) -> Option<&ContainerRoute> {
        match self {
            Self::Container(container) => Some(container),
            Self::Leaf(_) => None,
        }
    }

    pub fn is_leaf(&self) -> bool {
        matches!(self, Self::Leaf(_))
    }

    pub fn child(&self, name: &str) -> Option<&Arc<RouteDefinition>> {
        self.as_container().and_then(|container| container.get(name))
    }
}

/// Validated route tree. The root is always a container.
#[derive(Debug, Clone)]
pub struct RouteTree {
    root: Arc<RouteDefinition>,
}

impl RouteTree {
    pub fn new(root: impl Into<RouteDefinition>) -> Result<Self> {
        let root = root.into();
        if root.is_leaf() {
            return Err(NavigationError::InvalidRouteTree(
                "root route must be a stack or switch container".to_string(),
            ));
        }
        validate_node(&root, &mut Vec::new())?;
        Ok(Self {
            root: Arc::new(root),
        })
    }

    pub fn root(&self) -> &Arc<RouteDefinition> {
        &self.root
    }
}

fn validate_node(definition: &RouteDefinition, path: &mut Vec<String>) -> Result<()> {
    let Some(container) = definition.as_container() else {
        return Ok(());
    };
    let at = format!("/{}", path.join("/"));
    if container.children.is_empty() {
        return Err(NavigationError::InvalidRouteTree(format!(
            "container `{at}` has no children"
        )));
    }
    if container.initial_child().is_none() {
        return Err(NavigationError::InvalidRouteTree(format!(
            "container `{at}` names a missing initial child `{}`",
            container.initial.as_deref().unwrap_or_default()
        )));
    }

    let mut seen = HashSet::new();
    for (name, child) in &container.children {
        if name.is_empty()
            || name.contains(RESERVED_NAME_CHARS)
            || name.chars().any(char::is_whitespace)
        {
            return Err(NavigationError::InvalidRouteTree(format!(
                "route name `{name}` under `{at}` is not a valid path segment"
            )));
        }
        if !seen.insert(name.as_str()) {
            return Err(NavigationError::InvalidRouteTree(format!(
                "duplicate route `{name}` under `{at}`"
            )));
        }
        path.push(name.clone());
        validate_node(child, path)?;
        path.pop();
    }
    Ok(())
}
