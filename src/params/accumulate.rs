use crate::error::{NavigationError, Result, ValidationError};
use crate::routes::{RouteDefinition, RouteIndex};
use crate::state::{AddressStep, NavigationState, StateNode, to_logical_path};

use super::Params;

/// Validate and merge the params of every level along `address`, root first.
/// Deeper levels overwrite same-named keys from shallower ones. Every level
/// with a schema is validated, even when it carries no params.
pub fn accumulate(
    state: &NavigationState,
    address: &[AddressStep],
    routes: &RouteIndex,
) -> Result<Params> {
    let path = to_logical_path(address);
    let mut accumulated = Params::new();

    let root = routes.lookup(&[])?;
    merge_level(state.root(), &root, &path[..0], &mut accumulated)?;

    for depth in 1..=address.len() {
        let node = state.node_at(&address[..depth])?;
        let definition = routes.lookup(&path[..depth])?;
        merge_level(node, &definition, &path[..depth], &mut accumulated)?;
    }
    Ok(accumulated)
}

fn merge_level(
    node: &StateNode,
    definition: &RouteDefinition,
    path: &[String],
    accumulated: &mut Params,
) -> Result<()> {
    let raw = node.params.as_ref().filter(|raw| !raw.is_empty());
    let schema = match (definition.params(), raw) {
        (None, None) => return Ok(()),
        (None, Some(_)) => {
            return Err(NavigationError::internal(format!(
                "route `/{}` carries params but declares no schema",
                path.join("/")
            )));
        }
        (Some(schema), _) => schema,
    };
    let coerced = schema
        .validate(raw.unwrap_or(&Params::new()))
        .map_err(|reason| ValidationError::new(path, accumulated.clone(), reason))?;
    accumulated.extend(coerced);
    Ok(())
}
