//! Live navigation state: the serializable tree of mounted screens, the state
//! addresses used to locate nodes in it, and focus resolution.

mod address;
mod focus;
mod node;

pub use address::{AddressStep, ContainerKind, LogicalPath, StateAddress, parse_logical_path, to_logical_path};
pub use focus::resolve_focus;
pub use node::{NavigationState, NodeKind, NotFoundInfo, StateNode};
