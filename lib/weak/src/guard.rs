use crate::shared::SharedData;
use alloc::sync::{Arc, Weak};
use core::fmt::Debug;
use spin::relax::{RelaxStrategy, Spin};

/// Scope guard for an object wrapped by a [WeakPtrFactory](crate::WeakPtrFactory).
///
/// While a non-empty guard is alive the factory cannot finish invalidating, so
/// the object is guaranteed not to be destroyed. Obtain one with
/// [WeakPtr::lock](crate::WeakPtr::lock) and read through it with
/// [WeakPtr::get](crate::WeakPtr::get).
///
/// Keep the scope short: the owning thread blocks in its destructor until every
/// guard is gone. Never drop the owner on a thread that still holds a guard for it.
#[must_use = "the object is only protected while the guard is alive"]
pub struct WeakPtrGuard<R: RelaxStrategy = Spin> {
    strong: Option<Arc<SharedData<R>>>,
}

impl<R: RelaxStrategy> WeakPtrGuard<R> {
    /// `strong` must carry one read reservation taken by the caller.
    pub(crate) fn new(strong: Arc<SharedData<R>>) -> Self {
        debug_assert!(strong.valid(), "guard built over an invalid cell");
        WeakPtrGuard {
            strong: Some(strong),
        }
    }

    pub(crate) const fn empty() -> Self {
        WeakPtrGuard { strong: None }
    }

    /// Whether this guard protects a live object.
    ///
    /// `false` if the object had already expired, was being invalidated, or the
    /// pointer was never attached.
    pub fn is_locked(&self) -> bool {
        self.strong.is_some()
    }

    /// Whether this guard holds a reservation on the cell `weak` points to.
    pub(crate) fn protects(&self, weak: &Weak<SharedData<R>>) -> bool {
        self.strong
            .as_ref()
            .is_some_and(|strong| core::ptr::eq(Arc::as_ptr(strong), weak.as_ptr()))
    }
}

impl<R: RelaxStrategy> Drop for WeakPtrGuard<R> {
    fn drop(&mut self) {
        if let Some(strong) = self.strong.take() {
            strong.shared_unlock();
        }
    }
}

impl<R: RelaxStrategy> Debug for WeakPtrGuard<R> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("WeakPtrGuard")
            .field("locked", &self.is_locked())
            .finish()
    }
}
