//! Capability-filtered batch queries.
//!
//! Filters never fail as a whole. Any name that cannot be built or read is
//! logged, recorded in the report's `skipped` list with the reason, and the
//! batch carries on.

use crate::core::{Component, ComponentQueryItem, HasCapabilities};
use crate::db::ComponentStore;
use crate::ops::factory::{ComponentFactory, GetOptions};

/// A name that was left out of a filter result because it failed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Skip {
    pub name: String,
    pub reason: String,
}

/// The outcome of a batch filter.
#[derive(Debug, Clone)]
pub struct FilterReport<T> {
    /// Items that have the requested capability
    pub matched: Vec<T>,
    /// Items that could not be examined
    pub skipped: Vec<Skip>,
    /// Number of names examined
    pub total: usize,
}

impl<T> Default for FilterReport<T> {
    fn default() -> Self {
        FilterReport {
            matched: Vec::new(),
            skipped: Vec::new(),
            total: 0,
        }
    }
}

impl<T> FilterReport<T> {
    /// One line summary, e.g. "3 of 5 components returned".
    pub fn summary(&self) -> String {
        let mut line = format!("{} of {} components returned", self.matched.len(), self.total);
        if !self.skipped.is_empty() {
            line.push_str(&format!(" ({} skipped)", self.skipped.len()));
        }
        line
    }

    /// True when nothing was skipped.
    pub fn is_complete(&self) -> bool {
        self.skipped.is_empty()
    }

    fn skip(&mut self, name: &str, reason: impl Into<String>) {
        let reason = reason.into();
        tracing::error!("skipping `{}`: {}", name, reason);
        self.skipped.push(Skip {
            name: name.to_string(),
            reason,
        });
    }
}

/// Build each of `names` through the factory. Names that fail to build are
/// skipped; every built component is in `matched`.
pub fn build_each<I, S>(
    factory: &ComponentFactory<'_>,
    names: I,
    opts: &GetOptions,
) -> FilterReport<Component>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut report = FilterReport::default();

    for name in names {
        let name = name.as_ref();
        report.total += 1;
        match factory.get(name, opts) {
            Ok(component) => report.matched.push(component),
            Err(e) => report.skip(name, e.to_string()),
        }
    }
    report
}

/// Build every registered component (through the cache) and keep those
/// with capability `tag`.
pub fn filter_by_capability(factory: &ComponentFactory<'_>, tag: &str) -> FilterReport<Component> {
    let mut report = build_each(factory, factory.registry().names(), &GetOptions::default());
    report.matched.retain(|component| component.has_capability(tag));

    tracing::info!("filter `{}`: {}", tag, report.summary());
    report
}

/// Read each of `names` from the index and keep those with capability
/// `tag`. Names that are not in the index are skipped.
pub fn filter_stored<I, S>(store: &ComponentStore, names: I, tag: &str) -> FilterReport<ComponentQueryItem>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut report = FilterReport::default();

    for name in names {
        let name = name.as_ref();
        report.total += 1;
        match store.query_by_name(name) {
            Ok(Some(item)) => {
                if item.has_capability(tag) {
                    report.matched.push(item);
                }
            }
            Ok(None) => report.skip(name, "not in the index"),
            Err(e) => report.skip(name, e.to_string()),
        }
    }

    tracing::info!("stored filter `{}`: {}", tag, report.summary());
    report
}
