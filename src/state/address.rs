use serde::{Deserialize, Serialize};

/// Route names from the root to a node; the externally meaningful address.
pub type LogicalPath = Vec<String>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ContainerKind {
    Stack,
    Switch,
}

/// One descent from a container into one of its entries.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AddressStep {
    pub kind: ContainerKind,
    pub index: usize,
    pub name: String,
}

impl AddressStep {
    pub fn new(kind: ContainerKind, index: usize, name: impl Into<String>) -> Self {
        Self {
            kind,
            index,
            name: name.into(),
        }
    }
}

/// Location of a node inside a live state tree, root first. Only meaningful
/// against the state it was derived from.
pub type StateAddress = Vec<AddressStep>;

/// Project a state address onto its route names.
pub fn to_logical_path(address: &[AddressStep]) -> LogicalPath {
    address.iter().map(|step| step.name.clone()).collect()
}

/// Split `a/b/c` (leading and repeated slashes ignored) into a logical path.
pub fn parse_logical_path(text: &str) -> LogicalPath {
    text.split('/')
        .filter(|segment| !segment.is_empty())
        .map(str::to_string)
        .collect()
}
