//! Shared "Mods" menu for independently compiled host extensions.
//!
//! Extensions contribute menu entries by marker, by naming convention, or by
//! direct registration. The core splices a dispatch call into the host's
//! menu-bar routine and falls back to a standalone window when it cannot.

pub mod config;
pub mod discovery;
pub mod extension;
pub mod logging;
pub mod render;
pub mod service;
pub mod splice;

pub use config::{ConfigError, ModMenuConfig};
pub use discovery::engine::{derive_label, DiscoveryEngine, EntryMatch, MatchedRule};
pub use discovery::module::{
    ExtensionModule, LinkedModules, Marker, MethodInfo, ModuleDescriptor, ModuleList,
    ModuleSource, StaticModule, TypeInfo, Visibility,
};
pub use discovery::{DiscoveryError, DiscoveryReport};
pub use extension::record::{ExtensionRecord, RenderFn};
pub use extension::registry::Registry;
pub use logging::{default_log_level, init_logging, logging_status, LoggingError, LoggingStatus};
pub use render::dispatcher::{DispatchReport, RenderDispatcher};
pub use render::fallback::FallbackRenderer;
pub use render::ui::{MenuUi, UiError};
pub use service::ModMenu;
pub use splice::injector::{AnchorPattern, AppliedSplice, ScanDirection, SpliceError, SpliceInjector};
pub use splice::instruction::{HostRoutine, Instruction, MethodRef, OpCode, Operand};

/// Re-exported so extensions can submit [`ModuleDescriptor`]s without a
/// direct `inventory` dependency.
pub use inventory;

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
