//! Single-flight guard for one kind of outstanding request.
//!
//! The session runs on one thread, so the flag is a shared `Cell`. A
//! request holds an [`InFlightToken`] for as long as it is outstanding;
//! dropping the token, on success or failure alike, frees the guard.

use std::cell::Cell;
use std::rc::Rc;

/// Allows at most one outstanding request of a kind.
#[derive(Debug, Default)]
pub struct InFlight {
    busy: Rc<Cell<bool>>,
}

impl InFlight {
    /// Create an idle guard.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Claim the guard, or `None` if a request is already outstanding.
    #[must_use]
    pub fn try_acquire(&self) -> Option<InFlightToken> {
        if self.busy.replace(true) {
            return None;
        }
        Some(InFlightToken {
            busy: Rc::clone(&self.busy),
        })
    }

    /// Whether a request is outstanding.
    #[must_use]
    pub fn is_busy(&self) -> bool {
        self.busy.get()
    }
}

/// Proof that the holder owns the guard. Releases it on drop.
#[derive(Debug)]
pub struct InFlightToken {
    busy: Rc<Cell<bool>>,
}

impl Drop for InFlightToken {
    fn drop(&mut self) {
        self.busy.set(false);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn second_acquire_is_rejected_until_release() {
        let guard = InFlight::new();
        let token = guard.try_acquire();
        assert!(token.is_some());
        assert!(guard.is_busy());
        assert!(guard.try_acquire().is_none());
        drop(token);
        assert!(!guard.is_busy());
        assert!(guard.try_acquire().is_some());
    }

    #[test]
    fn independent_guards_do_not_interact() {
        let a = InFlight::new();
        let b = InFlight::new();
        let _ta = a.try_acquire();
        assert!(b.try_acquire().is_some());
    }
}
