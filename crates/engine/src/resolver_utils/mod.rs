//! Field and selection-set resolution.
//!
//! `container` drives a selection set over one composite value, `field`
//! runs a single field through the middleware chain and shapes its output,
//! `list` handles list positions with per-item error isolation.

mod container;
mod field;
mod list;

pub(crate) use container::resolve_container;
pub(crate) use field::{resolve_field, shape_output};
