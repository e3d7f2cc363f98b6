mod types;

pub use types::{NavigationError, Result, ValidationError};
