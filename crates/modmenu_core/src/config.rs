//! Mod menu configuration.
//!
//! # Responsibility
//! - Hold every tunable name, prefix and offset used by discovery, splicing
//!   and rendering.
//! - Provide defaults matching the stock host integration.
//!
//! # Invariants
//! - A `ModMenu` service is only ever built from a validated config.

use crate::splice::instruction::MethodRef;
use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Default aggregating menu label.
pub const DEFAULT_MENU_LABEL: &str = "Mods";
/// Default fallback window title.
pub const DEFAULT_BACKUP_WINDOW_TITLE: &str = "Mod Menu Backup";
/// Default marker type name recognized by the explicit-tag rule.
pub const DEFAULT_MARKER_TYPE_NAME: &str = "ModMenuEntryAttribute";
/// Default marker payload field carrying the label.
pub const DEFAULT_MARKER_LABEL_FIELD: &str = "MenuName";
/// Default routine patched in the host.
pub const DEFAULT_TARGET_ROUTINE: &str = "DrawMenuBar";
/// Default instruction distance between anchor and spliced call.
pub const DEFAULT_ANCHOR_OFFSET: usize = 4;

const DEFAULT_EXCLUDED_MODULE_PREFIXES: &[&str] =
    &["System", "Microsoft", "netstandard", "mscorlib"];
const DEFAULT_CONVENTION_METHOD_NAMES: &[&str] = &["CreateModMenu", "DrawModMenu"];
const DEFAULT_LABEL_STRIP_TOKENS: &[&str] = &["Mod", "Menu"];

/// Runtime configuration for one `ModMenu` service.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ModMenuConfig {
    /// Label of the aggregating menu in the host menu bar.
    pub menu_label: String,
    /// Title of the standalone window used when splicing fails.
    pub backup_window_title: String,
    /// Initial visibility of the standalone window.
    pub show_backup_window: bool,
    /// Module name prefixes skipped during discovery.
    pub excluded_module_prefixes: Vec<String>,
    /// Marker type name matched by simple name, not identity.
    pub marker_type_name: String,
    /// Marker payload field holding the menu label.
    pub marker_label_field: String,
    /// Method names recognized by the naming convention rule.
    pub convention_method_names: Vec<String>,
    /// Literal substrings deleted from a type name to derive a label.
    pub label_strip_tokens: Vec<String>,
    /// Host routine receiving the dispatch call.
    pub target_routine: String,
    /// Call whose last occurrence anchors the splice.
    pub anchor_call: MethodRef,
    /// Call spliced into the host routine.
    pub dispatch_call: MethodRef,
    /// Slots between the anchor and the inserted call.
    pub anchor_offset: usize,
}

impl Default for ModMenuConfig {
    fn default() -> Self {
        Self {
            menu_label: DEFAULT_MENU_LABEL.to_string(),
            backup_window_title: DEFAULT_BACKUP_WINDOW_TITLE.to_string(),
            show_backup_window: true,
            excluded_module_prefixes: to_strings(DEFAULT_EXCLUDED_MODULE_PREFIXES),
            marker_type_name: DEFAULT_MARKER_TYPE_NAME.to_string(),
            marker_label_field: DEFAULT_MARKER_LABEL_FIELD.to_string(),
            convention_method_names: to_strings(DEFAULT_CONVENTION_METHOD_NAMES),
            label_strip_tokens: to_strings(DEFAULT_LABEL_STRIP_TOKENS),
            target_routine: DEFAULT_TARGET_ROUTINE.to_string(),
            anchor_call: MethodRef::new("ImGui", "EndMenu"),
            dispatch_call: MethodRef::new("ModMenu", "RenderMenu"),
            anchor_offset: DEFAULT_ANCHOR_OFFSET,
        }
    }
}

impl ModMenuConfig {
    /// Validates value-level invariants.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.menu_label.trim().is_empty() {
            return Err(ConfigError::EmptyValue("menu_label"));
        }
        if self.backup_window_title.trim().is_empty() {
            return Err(ConfigError::EmptyValue("backup_window_title"));
        }
        if self.marker_type_name.trim().is_empty() {
            return Err(ConfigError::EmptyValue("marker_type_name"));
        }
        if self.marker_label_field.trim().is_empty() {
            return Err(ConfigError::EmptyValue("marker_label_field"));
        }
        if self.convention_method_names.is_empty() {
            return Err(ConfigError::EmptyValue("convention_method_names"));
        }
        if self.target_routine.trim().is_empty() {
            return Err(ConfigError::EmptyValue("target_routine"));
        }
        if self.anchor_offset == 0 {
            return Err(ConfigError::ZeroAnchorOffset);
        }
        Ok(())
    }
}

fn to_strings(values: &[&str]) -> Vec<String> {
    values.iter().map(|value| value.to_string()).collect()
}

/// Configuration validation errors.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    EmptyValue(&'static str),
    ZeroAnchorOffset,
}

impl Display for ConfigError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::EmptyValue(field) => write!(f, "config value must not be empty: {field}"),
            Self::ZeroAnchorOffset => write!(f, "anchor_offset must be positive"),
        }
    }
}

impl Error for ConfigError {}
