//! Long-lived mod menu service.
//!
//! # Responsibility
//! - Own the registry, the discovery latch, the splice failure flag and the
//!   backup window visibility for one host integration.
//! - Expose the host lifecycle hooks: all-mods-loaded, after-gui, unload.
//!
//! # Invariants
//! - Discovery runs at most once per service.
//! - The splice is attempted at most once per service; later patch calls
//!   replay the first outcome without touching the routine.
//! - No extension callback runs while the registry lock is held.

use crate::config::{ConfigError, ModMenuConfig};
use crate::discovery::engine::DiscoveryEngine;
use crate::discovery::module::ModuleSource;
use crate::discovery::DiscoveryReport;
use crate::extension::record::ExtensionRecord;
use crate::extension::registry::Registry;
use crate::render::dispatcher::{DispatchReport, RenderDispatcher};
use crate::render::fallback::FallbackRenderer;
use crate::render::ui::MenuUi;
use crate::splice::injector::{revert, AnchorPattern, AppliedSplice, SpliceError, SpliceInjector};
use crate::splice::instruction::HostRoutine;
use log::{debug, error, info};
use once_cell::sync::OnceCell;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

/// Mod menu integration state for one host process.
pub struct ModMenu {
    config: ModMenuConfig,
    sources: Vec<Arc<dyn ModuleSource>>,
    registry: Mutex<Registry>,
    discovery: OnceCell<DiscoveryReport>,
    patch_outcome: OnceCell<Result<(), SpliceError>>,
    show_backup_window: AtomicBool,
    splices: Mutex<Vec<AppliedSplice>>,
}

impl ModMenu {
    /// Builds a service from a validated config, with no module sources.
    pub fn new(config: ModMenuConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        let show_backup_window = config.show_backup_window;
        Ok(Self {
            config,
            sources: Vec::new(),
            registry: Mutex::new(Registry::new()),
            discovery: OnceCell::new(),
            patch_outcome: OnceCell::new(),
            show_backup_window: AtomicBool::new(show_backup_window),
            splices: Mutex::new(Vec::new()),
        })
    }

    /// Adds a module source scanned by [`ModMenu::initialize`].
    pub fn with_source(mut self, source: impl ModuleSource + 'static) -> Self {
        self.sources.push(Arc::new(source));
        self
    }

    /// Validated configuration.
    pub fn config(&self) -> &ModMenuConfig {
        &self.config
    }

    /// Scans all module sources once; later calls return the first report.
    pub fn initialize(&self) -> DiscoveryReport {
        *self.discovery.get_or_init(|| {
            let engine = DiscoveryEngine::new(&self.config);
            let mut found = Vec::new();
            let mut report = DiscoveryReport::default();
            for source in &self.sources {
                let (records, partial) = engine.scan(source.as_ref());
                found.extend(records);
                report.modules_scanned += partial.modules_scanned;
                report.modules_excluded += partial.modules_excluded;
                report.modules_failed += partial.modules_failed;
                report.types_failed += partial.types_failed;
                report.entries_skipped += partial.entries_skipped;
                report.entries_found += partial.entries_found;
            }

            let mut registry = self.registry();
            registry.extend(found);
            info!(
                "event=modmenu_init module=service status=ok discovered={} registered={}",
                report.entries_found,
                registry.len()
            );
            report
        })
    }

    /// Whether discovery has run.
    pub fn is_initialized(&self) -> bool {
        self.discovery.get().is_some()
    }

    /// Report of the discovery run, once it happened.
    pub fn discovery_report(&self) -> Option<DiscoveryReport> {
        self.discovery.get().copied()
    }

    /// Registers one entry directly, bypassing discovery.
    pub fn add_entry(&self, name: impl Into<String>, render: impl Fn() + Send + Sync + 'static) {
        let record = ExtensionRecord::new(name, render);
        info!(
            "event=entry_registered module=service status=ok label=\"{}\"",
            record.name()
        );
        self.registry().add(record);
    }

    /// Snapshot of the registry in menu order.
    pub fn entries(&self) -> Vec<ExtensionRecord> {
        self.registry().entries().to_vec()
    }

    /// Entry labels in menu order.
    pub fn entry_names(&self) -> Vec<String> {
        self.registry()
            .iter()
            .map(|record| record.name().to_string())
            .collect()
    }

    /// Splices the dispatch call into the host routine.
    ///
    /// Only the first call patches; later calls return its outcome. On
    /// failure the routine is left untouched and the backup window is
    /// enabled for the rest of the service lifetime.
    pub fn patch(&self, routine: &mut HostRoutine) -> Result<(), SpliceError> {
        let mut attempted = false;
        let outcome = self.patch_outcome.get_or_init(|| {
            attempted = true;
            let injector = SpliceInjector::new(
                self.config.target_routine.clone(),
                AnchorPattern::last_call_to(
                    self.config.anchor_call.clone(),
                    self.config.anchor_offset,
                ),
                self.config.dispatch_call.clone(),
            );
            injector
                .inject(routine)
                .map(|applied| self.splices().push(applied))
        });
        if !attempted {
            debug!(
                "event=splice_skipped module=service status=skip routine={} reason=already_attempted",
                routine.name()
            );
        }
        outcome.clone()
    }

    /// Whether the one splice attempt failed.
    pub fn injection_failed(&self) -> bool {
        matches!(self.patch_outcome.get(), Some(Err(_)))
    }

    /// Whether the backup window is shown after a failed splice.
    pub fn backup_window_visible(&self) -> bool {
        self.show_backup_window.load(Ordering::SeqCst)
    }

    /// Shows or hides the backup window.
    pub fn set_backup_window_visible(&self, visible: bool) {
        self.show_backup_window.store(visible, Ordering::SeqCst);
    }

    /// Splice target: draws the aggregated menu inside the host menu bar.
    pub fn render_menu(&self, ui: &mut dyn MenuUi) -> DispatchReport {
        self.initialize();
        let entries = self.entries();
        RenderDispatcher::new(&self.config.menu_label).draw(ui, &entries)
    }

    /// Draws the backup window when the splice failed and the window is
    /// visible; `None` otherwise.
    pub fn render_backup_window(&self, ui: &mut dyn MenuUi) -> Option<DispatchReport> {
        if !self.injection_failed() || !self.backup_window_visible() {
            return None;
        }
        self.initialize();
        let entries = self.entries();
        let mut open = true;
        let report =
            FallbackRenderer::new(&self.config.backup_window_title).draw(ui, &entries, &mut open);
        if !open {
            self.set_backup_window_visible(false);
        }
        Some(report)
    }

    /// Host hook: every extension has been loaded.
    pub fn on_all_mods_loaded(&self, routine: &mut HostRoutine) {
        self.initialize();
        // Failure is already logged and recorded in the flag.
        let _ = self.patch(routine);
    }

    /// Host hook: runs after the host's normal UI each frame.
    pub fn on_after_gui(&self, ui: &mut dyn MenuUi) -> Option<DispatchReport> {
        self.render_backup_window(ui)
    }

    /// Host hook: removes every splice this service applied to `routine`.
    /// Returns the number of reverted splices.
    pub fn on_unload(&self, routine: &mut HostRoutine) -> usize {
        let mut splices = self.splices();
        let mut reverted = 0;
        // Reverse order keeps recorded indexes valid for earlier splices.
        while let Some(applied) = splices.pop() {
            match revert(routine, &applied) {
                Ok(()) => reverted += 1,
                Err(err) => error!(
                    "event=splice_reverted module=service status=error routine={} error=\"{}\"",
                    routine.name(),
                    err
                ),
            }
        }
        info!(
            "event=splice_reverted module=service status=ok routine={} reverted={}",
            routine.name(),
            reverted
        );
        reverted
    }

    fn registry(&self) -> MutexGuard<'_, Registry> {
        self.registry.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn splices(&self) -> MutexGuard<'_, Vec<AppliedSplice>> {
        self.splices.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
