//! Transform Registry
//!
//! Maps genre display names (e.g. "horror") to the pure line rewrite owned by
//! that genre. Registration order is significant: it fixes which rank serves
//! which genre and which reader records the order ledger.

use super::rules;
use crate::unit::Tag;

use std::fmt;
use std::sync::Arc;

pub const HORROR: &str = "horror";
pub const COMEDY: &str = "comedy";
pub const FANTASY: &str = "fantasy";
pub const SCIENCE_FICTION: &str = "science-fiction";

/// Type alias for a thread-safe, stateless line rewrite.
pub type TransformFn = Arc<dyn Fn(&str) -> String + Send + Sync>;

/// One registered genre.
#[derive(Clone)]
pub struct TagEntry {
    /// Name matched against header lines.
    pub tag: Tag,
    /// Internal role name used when describing the worker (e.g. "SciFi").
    pub role: String,
    pub transform: TransformFn,
}

impl TagEntry {
    pub fn apply(&self, line: &str) -> String {
        (self.transform)(line)
    }
}

impl fmt::Debug for TagEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TagEntry")
            .field("tag", &self.tag)
            .field("role", &self.role)
            .finish_non_exhaustive()
    }
}

/// Registry holding every genre the group knows about, in declaration order.
#[derive(Clone, Debug, Default)]
pub struct TransformRegistry {
    entries: Vec<TagEntry>,
}

impl TransformRegistry {
    /// Creates a new, empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// The four reference genres, in rank order.
    pub fn standard() -> Self {
        let mut registry = Self::new();
        registry.register(HORROR, "Horror", rules::double_consonants);
        registry.register(COMEDY, "Comedy", rules::alternate_case);
        registry.register(FANTASY, "Fantasy", rules::title_case);
        registry.register(SCIENCE_FICTION, "SciFi", rules::reverse_every_seventh);
        registry
    }

    /// Registers a rewrite under a header name.
    ///
    /// Re-registering an existing name replaces its role and rewrite but keeps
    /// its position.
    pub fn register<F>(&mut self, name: &str, role: &str, transform: F)
    where
        F: Fn(&str) -> String + Send + Sync + 'static,
    {
        let entry = TagEntry {
            tag: Tag::new(name),
            role: role.to_string(),
            transform: Arc::new(transform),
        };

        match self.entries.iter_mut().find(|existing| existing.tag == entry.tag) {
            Some(existing) => *existing = entry,
            None => self.entries.push(entry),
        }

        tracing::debug!("Registered transform for '{}' ({})", name, role);
    }

    pub fn get(&self, name: &str) -> Option<&TagEntry> {
        self.entries.iter().find(|entry| entry.tag.as_str() == name)
    }

    /// Returns the tag whose display name equals `line`, if any.
    pub fn match_header(&self, line: &str) -> Option<&Tag> {
        self.get(line).map(|entry| &entry.tag)
    }

    /// Rewrites `line` with the transform registered for `tag`.
    pub fn apply(&self, tag: &Tag, line: &str) -> Option<String> {
        self.get(tag.as_str()).map(|entry| entry.apply(line))
    }

    pub fn entries(&self) -> &[TagEntry] {
        &self.entries
    }

    pub fn tags(&self) -> impl Iterator<Item = &Tag> {
        self.entries.iter().map(|entry| &entry.tag)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
