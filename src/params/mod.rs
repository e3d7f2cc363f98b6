//! Per-route parameter schemas and root-to-leaf parameter accumulation.
//!
//! Every route level may declare a [`ParamSchema`]. Raw params stored on a live
//! state node only ever contain the keys that level declares; the flat params
//! of a focused screen are produced by [`accumulate`], which validates each
//! level against its own schema and merges the results from the root down.

mod accumulate;
mod schema;

pub use accumulate::accumulate;
pub use schema::{ParamKind, ParamSchema, ParamSpec, Params};
