//! Aggregated menu rendering with per-entry fault isolation.
//!
//! # Invariants
//! - A panicking entry is logged by name and never stops later entries.
//! - Every submenu opened for an entry is closed, even when its body fails.
//! - Nothing raised while drawing escapes to the host.

use crate::extension::record::ExtensionRecord;
use crate::render::ui::{MenuUi, UiError};
use log::error;
use std::any::Any;
use std::panic::{catch_unwind, AssertUnwindSafe};

/// Outcome of one aggregated draw.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DispatchReport {
    /// Whether the aggregating container opened.
    pub opened: bool,
    /// Entries whose body ran to completion.
    pub rendered: usize,
    /// Names of entries whose body panicked.
    pub faulted: Vec<String>,
    /// Entries whose submenu failed to open.
    pub skipped: usize,
}

/// Draws every entry inside the host menu bar under one aggregating menu.
#[derive(Debug, Clone, Copy)]
pub struct RenderDispatcher<'a> {
    menu_label: &'a str,
}

impl<'a> RenderDispatcher<'a> {
    /// Dispatcher drawing under the aggregating menu `menu_label`.
    pub fn new(menu_label: &'a str) -> Self {
        Self { menu_label }
    }

    /// Draws the aggregating menu and one submenu per entry.
    pub fn draw(&self, ui: &mut dyn MenuUi, entries: &[ExtensionRecord]) -> DispatchReport {
        let mut report = DispatchReport::default();
        let outcome = catch_unwind(AssertUnwindSafe(|| {
            self.draw_menu(&mut *ui, entries, &mut report)
        }));
        match outcome {
            Ok(Ok(())) => {}
            Ok(Err(err)) => error!(
                "event=menu_dispatch module=render status=error menu=\"{}\" error=\"{}\"",
                self.menu_label, err
            ),
            Err(payload) => error!(
                "event=menu_dispatch module=render status=error menu=\"{}\" panic=\"{}\"",
                self.menu_label,
                panic_message(payload.as_ref())
            ),
        }
        report
    }

    fn draw_menu(
        &self,
        ui: &mut dyn MenuUi,
        entries: &[ExtensionRecord],
        report: &mut DispatchReport,
    ) -> Result<(), UiError> {
        if !ui.begin_menu(self.menu_label, true)? {
            return Ok(());
        }
        report.opened = true;
        render_entries(ui, entries, report);
        ui.end_menu()
    }
}

/// Draws one submenu per entry and runs its body behind a panic guard.
pub(crate) fn render_entries(
    ui: &mut dyn MenuUi,
    entries: &[ExtensionRecord],
    report: &mut DispatchReport,
) {
    for entry in entries {
        match ui.begin_menu(entry.name(), true) {
            Ok(true) => {}
            Ok(false) => continue,
            Err(err) => {
                error!(
                    "event=entry_open module=render status=error entry=\"{}\" error=\"{}\"",
                    entry.name(),
                    err
                );
                report.skipped += 1;
                continue;
            }
        }

        match render_guarded(entry) {
            Ok(()) => report.rendered += 1,
            Err(message) => {
                error!(
                    "event=entry_render module=render status=error entry=\"{}\" panic=\"{}\"",
                    entry.name(),
                    message
                );
                report.faulted.push(entry.name().to_string());
            }
        }

        if let Err(err) = ui.end_menu() {
            error!(
                "event=entry_close module=render status=error entry=\"{}\" error=\"{}\"",
                entry.name(),
                err
            );
        }
    }
}

/// Runs an entry's callback, converting a panic into its message.
pub fn render_guarded(entry: &ExtensionRecord) -> Result<(), String> {
    catch_unwind(AssertUnwindSafe(|| entry.render()))
        .map_err(|payload| panic_message(payload.as_ref()))
}

pub(crate) fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        (*message).to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "non-string panic payload".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::{panic_message, render_guarded};
    use crate::extension::record::ExtensionRecord;

    #[test]
    fn render_guarded_reports_panic_payloads() {
        let ok = ExtensionRecord::new("ok", || {});
        assert_eq!(render_guarded(&ok), Ok(()));

        let str_panic = ExtensionRecord::new("str", || panic!("static message"));
        assert_eq!(render_guarded(&str_panic), Err("static message".to_string()));

        let string_panic = ExtensionRecord::new("string", || panic!("code {}", 7));
        assert_eq!(render_guarded(&string_panic), Err("code 7".to_string()));
    }

    #[test]
    fn panic_message_handles_opaque_payloads() {
        let payload: Box<dyn std::any::Any + Send> = Box::new(42_u32);
        assert_eq!(panic_message(payload.as_ref()), "non-string panic payload");
    }
}
