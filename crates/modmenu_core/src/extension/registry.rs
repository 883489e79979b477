//! Ordered registry of menu contributions.
//!
//! # Invariants
//! - After every mutation entries are sorted by name, case-insensitively.
//! - Equal names keep their insertion order (stable sort).
//! - Names are never validated or deduplicated.

use crate::extension::record::{ExtensionRecord, RenderFn};
use std::cmp::Ordering;

/// Sorted collection of extension records.
#[derive(Debug, Default, Clone)]
pub struct Registry {
    entries: Vec<ExtensionRecord>,
}

impl Registry {
    /// Empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends one record and restores the sort invariant.
    pub fn add(&mut self, record: ExtensionRecord) {
        self.entries.push(record);
        sort_entries(&mut self.entries);
    }

    /// Convenience form of [`Registry::add`] for a label and shared callback.
    pub fn add_entry(&mut self, name: impl Into<String>, render: RenderFn) {
        self.add(ExtensionRecord::from_shared(name, render));
    }

    /// Appends a batch of records and sorts once.
    pub fn extend(&mut self, records: impl IntoIterator<Item = ExtensionRecord>) {
        self.entries.extend(records);
        sort_entries(&mut self.entries);
    }

    /// Entries in menu order.
    pub fn iter(&self) -> std::slice::Iter<'_, ExtensionRecord> {
        self.entries.iter()
    }

    /// Entries in menu order, as a slice.
    pub fn entries(&self) -> &[ExtensionRecord] {
        &self.entries
    }

    /// Number of registered entries.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether no entry is registered.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl<'a> IntoIterator for &'a Registry {
    type Item = &'a ExtensionRecord;
    type IntoIter = std::slice::Iter<'a, ExtensionRecord>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

/// Case-insensitive ordinal comparison used for menu ordering.
pub fn compare_names(left: &str, right: &str) -> Ordering {
    left.chars()
        .flat_map(char::to_uppercase)
        .cmp(right.chars().flat_map(char::to_uppercase))
}

fn sort_entries(entries: &mut [ExtensionRecord]) {
    // `sort_by` is stable.
    entries.sort_by(|a, b| compare_names(a.name(), b.name()));
}
