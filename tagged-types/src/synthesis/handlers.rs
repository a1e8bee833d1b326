//! Per-variant handlers for [`UnionType::match_on`](super::UnionType::match_on).

use indexmap::IndexMap;
use std::fmt;

use crate::value::Instance;

type Handler<'a, R> = Box<dyn Fn(&Instance) -> R + 'a>;

/// A set of handlers keyed by variant name.
///
/// ```rust,ignore
/// let area = shape.match_on(&circle, &Handlers::new()
///     .on("Circle", |c| PI * radius(c).powi(2))
///     .on("Square", |s| side(s).powi(2)))?;
/// ```
pub struct Handlers<'a, R> {
    arms: IndexMap<String, Handler<'a, R>>,
}

impl<'a, R> Handlers<'a, R> {
    pub fn new() -> Self {
        Self {
            arms: IndexMap::new(),
        }
    }

    /// Add (or replace) the handler for `variant`.
    pub fn on(mut self, variant: impl Into<String>, handler: impl Fn(&Instance) -> R + 'a) -> Self {
        self.arms.insert(variant.into(), Box::new(handler));
        self
    }

    pub fn contains(&self, variant: &str) -> bool {
        self.arms.contains_key(variant)
    }

    /// Variant names with a handler, in insertion order.
    pub fn variants(&self) -> impl Iterator<Item = &str> {
        self.arms.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.arms.len()
    }

    pub fn is_empty(&self) -> bool {
        self.arms.is_empty()
    }

    pub(crate) fn get(&self, variant: &str) -> Option<&Handler<'a, R>> {
        self.arms.get(variant)
    }
}

impl<R> Default for Handlers<'_, R> {
    fn default() -> Self {
        Self::new()
    }
}

impl<R> fmt::Debug for Handlers<'_, R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Handlers")
            .field("variants", &self.arms.keys().collect::<Vec<_>>())
            .finish()
    }
}
