use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use crate::error::{NavigationError, Result};

use super::{RouteDefinition, RouteTree};

/// Resolves logical paths to route definitions, caching every successful lookup
/// by its slash-joined key.
#[derive(Debug)]
pub struct RouteIndex {
    tree: RouteTree,
    cache: Mutex<HashMap<String, Arc<RouteDefinition>>>,
}

impl RouteIndex {
    pub fn new(tree: RouteTree) -> Self {
        Self {
            tree,
            cache: Mutex::new(HashMap::new()),
        }
    }

    pub fn root(&self) -> &Arc<RouteDefinition> {
        self.tree.root()
    }

    /// Look up the definition at `path`; the empty path is the root.
    pub fn lookup(&self, path: &[String]) -> Result<Arc<RouteDefinition>> {
        let key = path.join("/");
        {
            let cache = self
                .cache
                .lock()
                .map_err(|_| NavigationError::internal("route cache poisoned"))?;
            if let Some(definition) = cache.get(&key) {
                return Ok(Arc::clone(definition));
            }
        }

        let mut current = Arc::clone(self.tree.root());
        for (depth, segment) in path.iter().enumerate() {
            let next = current
                .child(segment)
                .cloned()
                .ok_or_else(|| NavigationError::not_found(&path[..=depth]))?;
            current = next;
        }

        self.cache
            .lock()
            .map_err(|_| NavigationError::internal("route cache poisoned"))?
            .insert(key, Arc::clone(&current));
        Ok(current)
    }

    /// Definitions for the root and every prefix of `path`, stopping at the
    /// first segment that does not resolve. Other lookup failures propagate.
    pub fn resolve_levels(&self, path: &[String]) -> Result<Vec<Arc<RouteDefinition>>> {
        let mut levels = Vec::with_capacity(path.len() + 1);
        for depth in 0..=path.len() {
            match self.lookup(&path[..depth]) {
                Ok(definition) => levels.push(definition),
                Err(NavigationError::NotFound { .. }) => break,
                Err(err) => return Err(err),
            }
        }
        Ok(levels)
    }

    pub fn cached_len(&self) -> usize {
        self.cache.lock().map(|cache| cache.len()).unwrap_or(0)
    }
}
