#![forbid(unsafe_code)]

//! Handle table mapping host objects to [`NodeId`]s.
//!
//! Controllers only ever see `NodeId`s. The browser host interns each DOM
//! element it hands out so that the same element always maps to the same id,
//! and ids map back to elements for mutation.
//!
//! # Invariants
//!
//! 1. `intern(x)` twice returns the same id.
//! 2. Ids are dense and never reused within one registry.

use siteui_core::NodeId;

/// Interning table from host objects to node ids.
#[derive(Debug, Clone)]
pub struct NodeRegistry<T> {
    entries: Vec<T>,
}

impl<T> Default for NodeRegistry<T> {
    fn default() -> Self {
        Self {
            entries: Vec::new(),
        }
    }
}

impl<T: PartialEq> NodeRegistry<T> {
    /// Create an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Return the id for `item`, assigning a new one on first sight.
    pub fn intern(&mut self, item: T) -> NodeId {
        if let Some(id) = self.lookup(&item) {
            return id;
        }
        let id = NodeId(self.entries.len() as u32);
        self.entries.push(item);
        id
    }

    /// Id previously assigned to `item`, if any.
    #[must_use]
    pub fn lookup(&self, item: &T) -> Option<NodeId> {
        self.entries
            .iter()
            .position(|entry| entry == item)
            .map(|idx| NodeId(idx as u32))
    }

    /// The object behind `id`.
    #[must_use]
    pub fn get(&self, id: NodeId) -> Option<&T> {
        self.entries.get(id.0 as usize)
    }

    /// Number of interned objects.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Check if nothing has been interned.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Forget every entry. Previously issued ids become dangling.
    pub fn clear(&mut self) {
        self.entries.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::NodeRegistry;
    use siteui_core::NodeId;

    #[test]
    fn intern_is_stable() {
        let mut reg = NodeRegistry::new();
        let a = reg.intern("overlay");
        let b = reg.intern("toggle");
        assert_eq!(reg.intern("overlay"), a);
        assert_ne!(a, b);
        assert_eq!(reg.len(), 2);
    }

    #[test]
    fn ids_map_back() {
        let mut reg = NodeRegistry::new();
        let id = reg.intern(String::from("doc-install"));
        assert_eq!(reg.get(id).map(String::as_str), Some("doc-install"));
        assert_eq!(reg.get(NodeId(7)), None);
        assert_eq!(reg.lookup(&String::from("doc-faq")), None);
    }

    #[test]
    fn clear_empties() {
        let mut reg = NodeRegistry::new();
        reg.intern(1u8);
        reg.clear();
        assert!(reg.is_empty());
        assert_eq!(reg.intern(2u8), NodeId(0));
    }
}
