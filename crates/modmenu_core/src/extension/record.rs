//! Extension record model.
//!
//! # Invariants
//! - A record is immutable once constructed.
//! - Two records may share a name; identity is positional, not by label.

use std::fmt::{Debug, Formatter};
use std::sync::Arc;

/// Zero-argument render callback supplied by the owning extension.
pub type RenderFn = Arc<dyn Fn() + Send + Sync>;

/// One menu contribution: a label plus the callback drawing its body.
///
/// Cloning is cheap and shares the callback.
#[derive(Clone)]
pub struct ExtensionRecord {
    name: String,
    render: RenderFn,
}

impl ExtensionRecord {
    /// Creates a record from a label and a render closure.
    pub fn new(name: impl Into<String>, render: impl Fn() + Send + Sync + 'static) -> Self {
        Self::from_shared(name, Arc::new(render))
    }

    /// Creates a record around an already shared callback.
    pub fn from_shared(name: impl Into<String>, render: RenderFn) -> Self {
        Self {
            name: name.into(),
            render,
        }
    }

    /// Menu label shown for this entry.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Invokes the extension callback. Panics raised by the callback are
    /// not caught here.
    pub fn render(&self) {
        (self.render)()
    }
}

impl Debug for ExtensionRecord {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ExtensionRecord")
            .field("name", &self.name)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::ExtensionRecord;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    #[test]
    fn render_invokes_callback_each_time() {
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&calls);
        let record = ExtensionRecord::new("Example", move || {
            counter.fetch_add(1, Ordering::SeqCst);
        });

        record.render();
        record.clone().render();

        assert_eq!(record.name(), "Example");
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn debug_output_names_entry_without_callback() {
        let record = ExtensionRecord::new("", || {});
        let debug = format!("{record:?}");
        assert!(debug.contains("ExtensionRecord"));
        assert!(debug.contains("name: \"\""));
    }
}
