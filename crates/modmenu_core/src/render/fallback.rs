//! Standalone backup window used when the menu bar splice failed.
//!
//! # Invariants
//! - Nothing raised while drawing the window or its entries escapes to the
//!   host.

use crate::extension::record::ExtensionRecord;
use crate::render::dispatcher::{panic_message, render_entries, DispatchReport};
use crate::render::ui::{MenuUi, UiError};
use log::error;
use std::panic::{catch_unwind, AssertUnwindSafe};

/// Draws the same per-entry submenus as the dispatcher inside a closable
/// window instead of the host menu bar.
#[derive(Debug, Clone, Copy)]
pub struct FallbackRenderer<'a> {
    title: &'a str,
}

impl<'a> FallbackRenderer<'a> {
    /// Renderer for a window titled `title`.
    pub fn new(title: &'a str) -> Self {
        Self { title }
    }

    /// `open` is cleared when the user closes the window.
    pub fn draw(
        &self,
        ui: &mut dyn MenuUi,
        entries: &[ExtensionRecord],
        open: &mut bool,
    ) -> DispatchReport {
        let mut report = DispatchReport::default();
        let outcome = catch_unwind(AssertUnwindSafe(|| {
            self.draw_window(&mut *ui, entries, &mut *open, &mut report)
        }));
        match outcome {
            Ok(Ok(())) => {}
            Ok(Err(err)) => error!(
                "event=backup_window module=render status=error window=\"{}\" error=\"{}\"",
                self.title, err
            ),
            Err(payload) => error!(
                "event=backup_window module=render status=error window=\"{}\" panic=\"{}\"",
                self.title,
                panic_message(payload.as_ref())
            ),
        }
        report
    }

    fn draw_window(
        &self,
        ui: &mut dyn MenuUi,
        entries: &[ExtensionRecord],
        open: &mut bool,
        report: &mut DispatchReport,
    ) -> Result<(), UiError> {
        if !ui.begin_window(self.title, open)? {
            return Ok(());
        }
        report.opened = true;
        render_entries(ui, entries, report);
        ui.end_window()
    }
}
