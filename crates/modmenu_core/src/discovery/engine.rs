//! Discovery rules and the module scan.
//!
//! Two independent rules are evaluated per method, marker first:
//! - marker: a marker whose simple type name matches the configured name;
//!   its label field is used verbatim, even when empty.
//! - naming convention: a public static method with a configured name; the
//!   label is derived from the declaring type's name.
//!
//! A panic raised by extension code while listing modules, listing a
//! module's types or constructing a receiver fails only that unit.

use crate::config::ModMenuConfig;
use crate::discovery::module::{MethodBinding, MethodInfo, ModuleSource, TypeInfo};
use crate::discovery::{DiscoveryError, DiscoveryReport};
use crate::extension::record::{ExtensionRecord, RenderFn};
use crate::render::dispatcher::panic_message;
use log::{debug, error, info};
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::Arc;

/// Which rule produced a match.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MatchedRule {
    Marker,
    NamingConvention,
}

impl MatchedRule {
    /// Value used in log lines.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Marker => "marker",
            Self::NamingConvention => "naming_convention",
        }
    }
}

/// Label and rule for one matched method.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EntryMatch {
    pub label: String,
    pub rule: MatchedRule,
}

/// Stateless scanner configured by a [`ModMenuConfig`].
#[derive(Debug, Clone, Copy)]
pub struct DiscoveryEngine<'a> {
    config: &'a ModMenuConfig,
}

impl<'a> DiscoveryEngine<'a> {
    /// Engine applying the rules and exclusions in `config`.
    pub fn new(config: &'a ModMenuConfig) -> Self {
        Self { config }
    }

    /// Whether a module is skipped by the exclusion prefix list.
    pub fn is_excluded(&self, module_name: &str) -> bool {
        self.config
            .excluded_module_prefixes
            .iter()
            .any(|prefix| module_name.starts_with(prefix.as_str()))
    }

    /// Applies the marker rule, then the naming convention rule.
    pub fn match_method(
        &self,
        type_info: &TypeInfo,
        method: &MethodInfo,
    ) -> Result<Option<EntryMatch>, DiscoveryError> {
        let marker = method
            .markers()
            .iter()
            .find(|marker| simple_name(marker.type_name()) == self.config.marker_type_name);
        if let Some(marker) = marker {
            let label = marker
                .field(&self.config.marker_label_field)
                .ok_or_else(|| DiscoveryError::MissingMarkerField {
                    type_name: type_info.full_name(),
                    method: method.name().to_string(),
                    field: self.config.marker_label_field.clone(),
                })?;
            return Ok(Some(EntryMatch {
                label: label.to_string(),
                rule: MatchedRule::Marker,
            }));
        }

        let conventional = self
            .config
            .convention_method_names
            .iter()
            .any(|name| name == method.name());
        if conventional && method.is_public() && method.is_static() {
            return Ok(Some(EntryMatch {
                label: derive_label(type_info.name(), &self.config.label_strip_tokens),
                rule: MatchedRule::NamingConvention,
            }));
        }
        Ok(None)
    }

    /// Scans every non-excluded module once and returns the records found,
    /// in discovery order.
    pub fn scan(&self, source: &dyn ModuleSource) -> (Vec<ExtensionRecord>, DiscoveryReport) {
        info!("event=discovery_start module=discovery status=ok");
        let mut records = Vec::new();
        let mut report = DiscoveryReport::default();

        let modules = match catch_unwind(AssertUnwindSafe(|| source.modules())) {
            Ok(modules) => modules,
            Err(payload) => {
                error!(
                    "event=discovery_start module=discovery status=error panic=\"{}\"",
                    panic_message(payload.as_ref())
                );
                Vec::new()
            }
        };

        for module in modules {
            let module_name = module.name();
            if self.is_excluded(module_name) {
                report.modules_excluded += 1;
                continue;
            }

            let types = catch_unwind(AssertUnwindSafe(|| module.types()))
                .unwrap_or_else(|payload| {
                    Err(DiscoveryError::ModuleLoad {
                        module: module_name.to_string(),
                        reason: format!(
                            "type table panicked: {}",
                            panic_message(payload.as_ref())
                        ),
                    })
                });
            let types = match types {
                Ok(types) => types,
                Err(err) => {
                    debug!(
                        "event=module_scan module=discovery status=error module_name={} error=\"{}\"",
                        module_name, err
                    );
                    report.modules_failed += 1;
                    continue;
                }
            };
            report.modules_scanned += 1;

            for type_info in &types {
                if let Err(err) = self.scan_type(type_info, &mut records, &mut report) {
                    debug!(
                        "event=type_scan module=discovery status=error module_name={} type={} error=\"{}\"",
                        module_name,
                        type_info.full_name(),
                        err
                    );
                    report.types_failed += 1;
                }
            }
        }

        report.entries_found = records.len();
        info!(
            "event=discovery_complete module=discovery status=ok entries={} modules_scanned={} modules_excluded={} modules_failed={} types_failed={} entries_skipped={}",
            report.entries_found,
            report.modules_scanned,
            report.modules_excluded,
            report.modules_failed,
            report.types_failed,
            report.entries_skipped
        );
        (records, report)
    }

    fn scan_type(
        &self,
        type_info: &TypeInfo,
        records: &mut Vec<ExtensionRecord>,
        report: &mut DiscoveryReport,
    ) -> Result<(), DiscoveryError> {
        for method in type_info.methods()? {
            let matched = match self.match_method(type_info, method) {
                Ok(Some(matched)) => matched,
                Ok(None) => continue,
                Err(err) => {
                    debug!(
                        "event=entry_skipped module=discovery status=skip error=\"{}\"",
                        err
                    );
                    report.entries_skipped += 1;
                    continue;
                }
            };

            match bind_method(type_info, method) {
                Ok(render) => {
                    info!(
                        "event=entry_found module=discovery status=ok label=\"{}\" type={} method={} binding={} rule={} label_empty={}",
                        matched.label,
                        type_info.full_name(),
                        method.name(),
                        if method.is_static() { "static" } else { "instance" },
                        matched.rule.as_str(),
                        matched.label.is_empty()
                    );
                    records.push(ExtensionRecord::from_shared(matched.label, render));
                }
                Err(err) => {
                    debug!(
                        "event=entry_skipped module=discovery status=skip label=\"{}\" method={} error=\"{}\"",
                        matched.label,
                        method.name(),
                        err
                    );
                    report.entries_skipped += 1;
                }
            }
        }
        Ok(())
    }
}

/// Builds the render callback for a matched method.
///
/// Instance methods get a freshly constructed receiver per binding.
pub fn bind_method(type_info: &TypeInfo, method: &MethodInfo) -> Result<RenderFn, DiscoveryError> {
    match method.binding() {
        MethodBinding::Static(call) => Ok(Arc::clone(call)),
        MethodBinding::Instance {
            receiver,
            accepts,
            call,
        } => {
            let instance = type_info.construct()?;
            if !accepts(&instance) {
                return Err(DiscoveryError::ReceiverMismatch {
                    type_name: type_info.full_name(),
                    receiver: *receiver,
                });
            }
            let call = Arc::clone(call);
            Ok(Arc::new(move || call(&instance)))
        }
    }
}

/// Deletes every strip token from `type_name` and trims the result.
/// Falls back to the unmodified name when nothing is left.
pub fn derive_label(type_name: &str, strip_tokens: &[String]) -> String {
    let stripped = strip_tokens
        .iter()
        .filter(|token| !token.is_empty())
        .fold(type_name.to_string(), |label, token| {
            label.replace(token.as_str(), "")
        });
    match stripped.trim() {
        "" => type_name.to_string(),
        label => label.to_string(),
    }
}

fn simple_name(type_name: &str) -> &str {
    type_name.rsplit(['.', ':']).next().unwrap_or(type_name)
}
