//! Re-entrancy guard for evaluation passes. Writing a proxy value onto its
//! target can make the host schedule another evaluation from inside the
//! current one; that nested pass must not run.

use std::cell::Cell;
use std::rc::Rc;

/// Shared flag; clones observe the same lock.
#[derive(Clone, Debug, Default)]
pub struct UpdateLock(Rc<Cell<bool>>);

impl UpdateLock {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_held(&self) -> bool {
        self.0.get()
    }

    /// Take the lock, or `None` if a pass already holds it.
    pub fn try_acquire(&self) -> Option<UpdateGuard> {
        if self.0.replace(true) {
            return None;
        }
        Some(UpdateGuard {
            flag: Rc::clone(&self.0),
        })
    }
}

/// Releases the lock when dropped.
#[must_use = "the lock is released as soon as the guard is dropped"]
#[derive(Debug)]
pub struct UpdateGuard {
    flag: Rc<Cell<bool>>,
}

impl Drop for UpdateGuard {
    fn drop(&mut self) {
        self.flag.set(false);
    }
}
