//! Heap owner that carries its own [WeakPtrFactory].
//!
//! Embedding a factory needs the object's final address up front and a careful
//! field order. [WeakBox] gets both right by construction: the value is boxed
//! before the factory is attached, and the factory is invalidated before the
//! box is freed.

use crate::{factory::WeakPtrFactory, handle::WeakPtr, method::WeakMethod};
use alloc::boxed::Box;
use core::{fmt::Debug, mem::ManuallyDrop, ops::Deref, ptr::NonNull};
use spin::relax::{RelaxStrategy, Spin};

/// Owning pointer whose value can be reached through [WeakPtr]s.
///
/// There is no `DerefMut`: other threads may be reading the value through a
/// guard at any time.
pub struct WeakBox<T: ?Sized, R: RelaxStrategy = Spin> {
    factory: WeakPtrFactory<T, R>,
    value: NonNull<T>,
}

// Dropping the box may free `T` on this thread while others still hold `&T`.
unsafe impl<T: ?Sized + Send + Sync, R: RelaxStrategy> Send for WeakBox<T, R> {}
unsafe impl<T: ?Sized + Sync, R: RelaxStrategy> Sync for WeakBox<T, R> {}

impl<T, R: RelaxStrategy> WeakBox<T, R> {
    pub fn new(value: T) -> Self {
        Self::from_box(Box::new(value))
    }

    /// Take the value back out. Invalidates all weak pointers first.
    pub fn into_inner(self) -> T {
        let this = ManuallyDrop::new(self);
        this.factory.invalidate();
        // SAFETY: `this` is never dropped, so the factory and the allocation are
        // each released exactly once, here.
        unsafe {
            drop(core::ptr::read(&this.factory));
            *Box::from_raw(this.value.as_ptr())
        }
    }
}

impl<T: ?Sized, R: RelaxStrategy> WeakBox<T, R> {
    pub fn from_box(value: Box<T>) -> Self {
        let value = NonNull::from(Box::leak(value));
        WeakBox {
            // SAFETY: the allocation is ours and is only freed after invalidation.
            factory: unsafe { WeakPtrFactory::new(value) },
            value,
        }
    }

    pub fn make_weak_ptr(&self) -> WeakPtr<T, R> {
        self.factory.make_weak_ptr()
    }

    /// See [WeakPtrFactory::make_weak_method].
    pub fn make_weak_method<A, O, F>(&self, method: F) -> WeakMethod<T, F, R>
    where
        F: Fn(&T, A) -> O,
    {
        self.factory.make_weak_method(method)
    }

    pub fn factory(&self) -> &WeakPtrFactory<T, R> {
        &self.factory
    }
}

impl<T: ?Sized, R: RelaxStrategy> Deref for WeakBox<T, R> {
    type Target = T;

    fn deref(&self) -> &T {
        // SAFETY: the allocation lives as long as `self`.
        unsafe { self.value.as_ref() }
    }
}

impl<T: ?Sized, R: RelaxStrategy> Drop for WeakBox<T, R> {
    fn drop(&mut self) {
        self.factory.invalidate();
        // SAFETY: no guard is left, and no new one can be taken.
        drop(unsafe { Box::from_raw(self.value.as_ptr()) });
    }
}

impl<T: ?Sized + Debug, R: RelaxStrategy> Debug for WeakBox<T, R> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("WeakBox")
            .field("value", &&**self)
            .field("factory", &self.factory)
            .finish()
    }
}
