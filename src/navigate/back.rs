use crate::error::Result;
use crate::state::{NavigationState, NodeKind, resolve_focus};

/// Step back from the focused screen, editing `draft` in place. Returns `false`
/// without touching the draft when there is nowhere to go back to.
///
/// The innermost focused entry with a non-zero index decides: its stack loses
/// the top entry, or its switch returns to the first entry. Switches never
/// shrink.
pub fn apply_back(draft: &mut NavigationState) -> Result<bool> {
    let address = resolve_focus(draft)?;
    let Some(position) = address.iter().rposition(|step| step.index != 0) else {
        return Ok(false);
    };

    let container = draft.node_at_mut(&address[..position])?;
    match &mut container.kind {
        NodeKind::Stack { stack } => {
            if stack.len() <= 1 {
                return Ok(false);
            }
            stack.pop();
        }
        NodeKind::Switch {
            focused_switch_index,
            ..
        } => *focused_switch_index = 0,
        NodeKind::Leaf => return Ok(false),
    }
    draft.clear_not_found_flags();
    Ok(true)
}

/// Whether [`apply_back`] would change `state`.
pub fn can_go_back(state: &NavigationState) -> Result<bool> {
    let mut draft = state.clone();
    apply_back(&mut draft)
}
