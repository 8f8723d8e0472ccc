//! Detail overlay / lightbox navigation
//!
//! [`ScrollLock`] is a counted resource shared by everything that can
//! suppress page scrolling. Each open overlay holds one [`ScrollGuard`];
//! the page scrolls again once the last guard is dropped, whatever path
//! closed the overlay.

use ministry_records::RecordId;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tracing::trace;

/// Shared scroll-suppression counter
#[derive(Debug, Clone, Default)]
pub struct ScrollLock {
    holders: Arc<AtomicUsize>,
}

impl ScrollLock {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Suppress scrolling until the returned guard is dropped
    #[must_use = "scrolling is released as soon as the guard is dropped"]
    pub fn acquire(&self) -> ScrollGuard {
        let holders = self.holders.fetch_add(1, Ordering::SeqCst) + 1;
        trace!(holders, "scroll lock acquired");
        ScrollGuard {
            holders: Arc::clone(&self.holders),
        }
    }

    #[inline]
    #[must_use]
    pub fn is_locked(&self) -> bool {
        self.holders() > 0
    }

    #[inline]
    #[must_use]
    pub fn holders(&self) -> usize {
        self.holders.load(Ordering::SeqCst)
    }
}

/// One hold on a [`ScrollLock`]
#[derive(Debug)]
pub struct ScrollGuard {
    holders: Arc<AtomicUsize>,
}

impl Drop for ScrollGuard {
    fn drop(&mut self) {
        let before = self.holders.fetch_sub(1, Ordering::SeqCst);
        trace!(holders = before.saturating_sub(1), "scroll lock released");
    }
}

/// Focus over the visible subset
///
/// Every operation takes the current visible id sequence, so focus can
/// never point past a filter change: a focused id that is no longer
/// visible closes the overlay.
#[derive(Debug)]
pub struct Navigator {
    lock: ScrollLock,
    focused: Option<RecordId>,
    guard: Option<ScrollGuard>,
}

impl Navigator {
    #[must_use]
    pub fn new(lock: ScrollLock) -> Self {
        Self {
            lock,
            focused: None,
            guard: None,
        }
    }

    #[inline]
    #[must_use]
    pub fn focused(&self) -> Option<&RecordId> {
        self.focused.as_ref()
    }

    #[inline]
    #[must_use]
    pub fn is_open(&self) -> bool {
        self.focused.is_some()
    }

    /// Focus `id`; ignored when it is not visible
    pub fn open(&mut self, id: &RecordId, visible: &[RecordId]) -> bool {
        if !visible.contains(id) {
            return false;
        }
        self.focused = Some(id.clone());
        if self.guard.is_none() {
            self.guard = Some(self.lock.acquire());
        }
        true
    }

    pub fn close(&mut self) {
        self.focused = None;
        self.guard = None;
    }

    /// Advance with wraparound
    pub fn next(&mut self, visible: &[RecordId]) -> Option<&RecordId> {
        self.step(visible, 1)
    }

    /// Step back with wraparound
    pub fn previous(&mut self, visible: &[RecordId]) -> Option<&RecordId> {
        self.step(visible, visible.len().saturating_sub(1))
    }

    fn step(&mut self, visible: &[RecordId], offset: usize) -> Option<&RecordId> {
        let current = self.focused.as_ref()?;
        let Some(pos) = visible.iter().position(|id| id == current) else {
            self.close();
            return None;
        };
        if visible.len() > 1 {
            self.focused = Some(visible[(pos + offset) % visible.len()].clone());
        }
        self.focused.as_ref()
    }

    /// Close when the focused record left the visible subset
    ///
    /// Returns `true` if the overlay was closed.
    pub fn reconcile(&mut self, visible: &[RecordId]) -> bool {
        match &self.focused {
            Some(id) if !visible.contains(id) => {
                self.close();
                true
            }
            _ => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ids(raw: &[&str]) -> Vec<RecordId> {
        raw.iter().copied().map(RecordId::from).collect()
    }

    #[test]
    fn wraps_both_ways() {
        let visible = ids(&["a", "b", "c"]);
        let mut nav = Navigator::new(ScrollLock::new());
        assert!(nav.open(&RecordId::new("c"), &visible));
        assert_eq!(nav.next(&visible).map(RecordId::as_str), Some("a"));
        assert_eq!(nav.previous(&visible).map(RecordId::as_str), Some("c"));
        assert_eq!(nav.previous(&visible).map(RecordId::as_str), Some("b"));
    }

    #[test]
    fn single_element_is_a_no_op() {
        let visible = ids(&["only"]);
        let mut nav = Navigator::new(ScrollLock::new());
        nav.open(&RecordId::new("only"), &visible);
        assert_eq!(nav.next(&visible).map(RecordId::as_str), Some("only"));
        assert_eq!(nav.previous(&visible).map(RecordId::as_str), Some("only"));
    }

    #[test]
    fn closed_navigator_ignores_steps() {
        let visible = ids(&["a", "b"]);
        let mut nav = Navigator::new(ScrollLock::new());
        assert!(nav.next(&visible).is_none());
        assert!(!nav.open(&RecordId::new("zzz"), &visible));
        assert!(!nav.is_open());
    }

    #[test]
    fn reconcile_closes_on_stale_focus() {
        let lock = ScrollLock::new();
        let mut nav = Navigator::new(lock.clone());
        nav.open(&RecordId::new("b"), &ids(&["a", "b"]));
        assert!(lock.is_locked());

        assert!(!nav.reconcile(&ids(&["b"])));
        assert!(nav.reconcile(&ids(&["a"])));
        assert!(!nav.is_open());
        assert!(!lock.is_locked());
    }

    #[test]
    fn stepping_from_filtered_out_focus_closes() {
        let lock = ScrollLock::new();
        let mut nav = Navigator::new(lock.clone());
        nav.open(&RecordId::new("a"), &ids(&["a", "b"]));
        assert!(nav.next(&ids(&["b", "c"])).is_none());
        assert!(!lock.is_locked());
    }

    #[test]
    fn reopening_holds_one_guard() {
        let lock = ScrollLock::new();
        let visible = ids(&["a", "b"]);
        let mut nav = Navigator::new(lock.clone());
        nav.open(&RecordId::new("a"), &visible);
        nav.open(&RecordId::new("b"), &visible);
        assert_eq!(lock.holders(), 1);
    }

    #[test]
    fn lock_is_shared_across_holders() {
        let lock = ScrollLock::new();
        let first = lock.acquire();
        let second = lock.acquire();
        drop(first);
        assert!(lock.is_locked());
        drop(second);
        assert!(!lock.is_locked());
    }

    #[test]
    fn dropping_open_navigator_releases() {
        let lock = ScrollLock::new();
        {
            let mut nav = Navigator::new(lock.clone());
            nav.open(&RecordId::new("a"), &ids(&["a"]));
            assert!(lock.is_locked());
        }
        assert!(!lock.is_locked());
    }
}
