//! Cooperative cancellation for long-running mesh operations.
//!
//! Construction checks once per inserted point, constraint enforcement once per walk
//! iteration and contour extraction once per level. Checks happen only between atomic
//! link edits, so a cancelled operation always leaves a valid link store behind.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

/// Polled by long-running operations; returning `true` aborts with a `Cancelled` error.
///
/// # Examples
///
/// ```rust
/// use tinlink::core::traits::cancellation::{CancelToken, CancellationCheck, NeverCancel};
///
/// assert!(!NeverCancel.is_cancelled());
///
/// let token = CancelToken::new();
/// let handle = token.clone();
/// assert!(!token.is_cancelled());
/// handle.cancel();
/// assert!(token.is_cancelled());
/// ```
pub trait CancellationCheck {
    /// Returns `true` once the operation should stop.
    fn is_cancelled(&self) -> bool;
}

/// A check that never cancels.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct NeverCancel;

impl CancellationCheck for NeverCancel {
    #[inline]
    fn is_cancelled(&self) -> bool {
        false
    }
}

/// Shareable cancellation flag.
///
/// Clones share the same flag, so one clone can be handed to the worker and another kept
/// by whoever decides to cancel.
#[derive(Clone, Debug, Default)]
pub struct CancelToken {
    flag: Arc<AtomicBool>,
}

impl CancelToken {
    /// Creates a token in the not-cancelled state.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Requests cancellation.
    pub fn cancel(&self) {
        self.flag.store(true, Ordering::Relaxed);
    }

    /// Clears a previous request so the token can be reused.
    pub fn reset(&self) {
        self.flag.store(false, Ordering::Relaxed);
    }
}

impl CancellationCheck for CancelToken {
    #[inline]
    fn is_cancelled(&self) -> bool {
        self.flag.load(Ordering::Relaxed)
    }
}

impl<T: CancellationCheck + ?Sized> CancellationCheck for &T {
    #[inline]
    fn is_cancelled(&self) -> bool {
        (**self).is_cancelled()
    }
}

/// Cancels after a fixed number of polls. Used to exercise cancellation paths.
#[derive(Debug)]
pub struct CancelAfter {
    remaining: std::sync::atomic::AtomicUsize,
}

impl CancelAfter {
    /// Allows `polls` checks to pass before reporting cancellation.
    #[must_use]
    pub const fn new(polls: usize) -> Self {
        Self {
            remaining: std::sync::atomic::AtomicUsize::new(polls),
        }
    }
}

impl CancellationCheck for CancelAfter {
    fn is_cancelled(&self) -> bool {
        self.remaining
            .fetch_update(Ordering::Relaxed, Ordering::Relaxed, |n| n.checked_sub(1))
            .is_err()
    }
}
