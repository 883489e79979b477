//! Extension record model and the sorted registry that holds them.
//!
//! The registry is the only shared collection in the core: discovery and
//! direct registration write to it, renderers read it once per frame.

pub mod record;
pub mod registry;
