use crate::error::{NavigationError, Result};

use super::{AddressStep, ContainerKind, NavigationState, NodeKind, StateAddress};

/// Address of the focused leaf: descend into the last stack entry or the
/// focused switch entry until a leaf is reached.
pub fn resolve_focus(state: &NavigationState) -> Result<StateAddress> {
    let mut address = StateAddress::new();
    let mut node = state.root();
    loop {
        let (kind, index, next) = match &node.kind {
            NodeKind::Leaf => return Ok(address),
            NodeKind::Stack { stack } => {
                let index = stack.len().checked_sub(1).ok_or_else(|| {
                    NavigationError::internal(format!("empty stack at `{}`", node.path))
                })?;
                (ContainerKind::Stack, index, &stack[index])
            }
            NodeKind::Switch {
                focused_switch_index,
                switches,
            } => {
                let next = switches.get(*focused_switch_index).ok_or_else(|| {
                    NavigationError::internal(format!(
                        "focused switch index {focused_switch_index} out of range at `{}` ({} entries)",
                        node.path,
                        switches.len()
                    ))
                })?;
                (ContainerKind::Switch, *focused_switch_index, next)
            }
        };
        address.push(AddressStep::new(kind, index, next.path.clone()));
        node = next;
    }
}
