//! Immediate-mode rendering primitives consumed by the renderers.

use std::error::Error;
use std::fmt::{Display, Formatter};

/// Begin/end primitives of the host's immediate-mode UI.
///
/// # Contract
/// - `end_*` is called only after the matching `begin_*` returned `Ok(true)`.
/// - `begin_window` may clear `open` when the user closes the window.
pub trait MenuUi {
    fn begin_menu(&mut self, label: &str, enabled: bool) -> Result<bool, UiError>;
    fn end_menu(&mut self) -> Result<(), UiError>;
    fn begin_window(&mut self, title: &str, open: &mut bool) -> Result<bool, UiError>;
    fn end_window(&mut self) -> Result<(), UiError>;
}

/// Failure reported by a rendering primitive.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UiError {
    pub primitive: &'static str,
    pub message: String,
}

impl UiError {
    /// Failure of `primitive`, e.g. `begin_menu`.
    pub fn new(primitive: &'static str, message: impl Into<String>) -> Self {
        Self {
            primitive,
            message: message.into(),
        }
    }
}

impl Display for UiError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} failed: {}", self.primitive, self.message)
    }
}

impl Error for UiError {}
