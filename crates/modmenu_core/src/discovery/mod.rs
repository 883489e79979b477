//! Extension entry-point discovery.
//!
//! # Responsibility
//! - Walk every module exposed by a [`module::ModuleSource`].
//! - Turn marked or conventionally named methods into extension records.
//!
//! # Invariants
//! - A failing module, type or constructor never aborts the scan.
//! - Records come out sorted by the registry rules.

use std::error::Error;
use std::fmt::{Display, Formatter};

pub mod engine;
pub mod module;

/// Counters summarizing one discovery pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DiscoveryReport {
    /// Modules whose type table was read.
    pub modules_scanned: usize,
    /// Modules skipped by name prefix.
    pub modules_excluded: usize,
    /// Modules whose type table could not be read.
    pub modules_failed: usize,
    /// Types whose members could not be listed.
    pub types_failed: usize,
    /// Matched methods skipped by a binding or marker error.
    pub entries_skipped: usize,
    /// Entries produced by this pass.
    pub entries_found: usize,
}

/// Local, recoverable discovery failures.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DiscoveryError {
    ModuleLoad { module: String, reason: String },
    TypeLoad { type_name: String, reason: String },
    MissingConstructor { type_name: String },
    Construction { type_name: String, reason: String },
    ReceiverMismatch { type_name: String, receiver: &'static str },
    MissingMarkerField { type_name: String, method: String, field: String },
}

impl Display for DiscoveryError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::ModuleLoad { module, reason } => {
                write!(f, "could not scan module {module}: {reason}")
            }
            Self::TypeLoad { type_name, reason } => {
                write!(f, "could not scan type {type_name}: {reason}")
            }
            Self::MissingConstructor { type_name } => {
                write!(f, "type {type_name} has no default constructor")
            }
            Self::Construction { type_name, reason } => {
                write!(f, "could not construct {type_name}: {reason}")
            }
            Self::ReceiverMismatch {
                type_name,
                receiver,
            } => write!(f, "instance of {type_name} is not a {receiver}"),
            Self::MissingMarkerField {
                type_name,
                method,
                field,
            } => write!(f, "marker on {type_name}.{method} has no {field} field"),
        }
    }
}

impl Error for DiscoveryError {}
