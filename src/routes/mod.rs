//! Static route definitions and the memoized definition index.
//!
//! The route tree is declared once and never mutated afterwards, which is what
//! makes the path-keyed lookup cache in [`RouteIndex`] safe without eviction.

mod definition;
mod index;

pub use definition::{ContainerRoute, LeafRoute, RouteDefinition, RouteTree};
pub use index::RouteIndex;
