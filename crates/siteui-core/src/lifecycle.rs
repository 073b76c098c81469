#![forbid(unsafe_code)]

//! Scoped acquisition of host resources.
//!
//! A [`Scope`] collects release actions (remove a listener, disconnect an
//! observer, cancel a frame request) as resources are acquired. Releasing the
//! scope, explicitly or by dropping it, runs every action exactly once in
//! reverse acquisition order.
//!
//! # Invariants
//!
//! 1. Each deferred action runs at most once.
//! 2. Actions run in LIFO order.
//! 3. `release()` on an empty or already-released scope is a no-op.
//! 4. Dropping the scope releases it, so early returns cannot leak resources.

/// An ordered set of release actions tied to a controller's lifetime.
#[derive(Default)]
pub struct Scope {
    releases: Vec<Box<dyn FnOnce()>>,
}

impl std::fmt::Debug for Scope {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Scope")
            .field("pending", &self.releases.len())
            .finish()
    }
}

impl Scope {
    /// Create an empty scope.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register an action to run when the scope is released.
    pub fn defer(&mut self, release: impl FnOnce() + 'static) {
        self.releases.push(Box::new(release));
    }

    /// Number of actions still waiting to run.
    #[must_use]
    pub fn len(&self) -> usize {
        self.releases.len()
    }

    /// Check if nothing is held.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.releases.is_empty()
    }

    /// Run every pending action, newest first.
    pub fn release(&mut self) {
        while let Some(release) = self.releases.pop() {
            release();
        }
    }
}

impl Drop for Scope {
    fn drop(&mut self) {
        self.release();
    }
}

#[cfg(test)]
mod tests {
    use super::Scope;
    use std::cell::RefCell;
    use std::rc::Rc;

    #[test]
    fn release_runs_in_reverse_order_once() {
        let log = Rc::new(RefCell::new(Vec::new()));
        let mut scope = Scope::new();
        for i in 0..3 {
            let log = Rc::clone(&log);
            scope.defer(move || log.borrow_mut().push(i));
        }
        assert_eq!(scope.len(), 3);
        scope.release();
        scope.release();
        assert_eq!(*log.borrow(), vec![2, 1, 0]);
        assert!(scope.is_empty());
    }

    #[test]
    fn drop_releases() {
        let released = Rc::new(RefCell::new(false));
        {
            let mut scope = Scope::new();
            let flag = Rc::clone(&released);
            scope.defer(move || *flag.borrow_mut() = true);
        }
        assert!(*released.borrow());
    }

    #[test]
    fn empty_scope_release_is_noop() {
        let mut scope = Scope::new();
        scope.release();
        assert!(scope.is_empty());
    }
}
