//! Menu rendering.
//!
//! # Responsibility
//! - Draw the aggregated "Mods" menu inline in the host menu bar.
//! - Draw the same content in a standalone window when splicing failed.
//!
//! # Invariants
//! - Extension faults are contained per entry; the frame always completes.
//! - Renderers only read entries; a failing entry never mutates the registry.

pub mod dispatcher;
pub mod fallback;
pub mod ui;
