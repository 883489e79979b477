//! Host routine splicing.
//!
//! The host's menu-drawing routine is modeled as an instruction sequence.
//! The injector locates the last call to the anchor method and splices a
//! dispatch call a fixed distance after it. A missing anchor is a normal,
//! reported outcome that switches the service to the fallback window.

pub mod injector;
pub mod instruction;
