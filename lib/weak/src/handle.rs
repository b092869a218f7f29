//! Weak pointers to objects owned elsewhere.
//!
//! A [WeakPtr] never owns its object. It refers to the object through the
//! [WeakPtrFactory](crate::WeakPtrFactory) embedded in it:
//! - [WeakPtr::expired] is a quick, non-blocking liveness check.
//! - [WeakPtr::lock] returns a [WeakPtrGuard] that keeps the object from being
//!   destroyed while it is held.
//! - [WeakPtr::get] is the only way to reach the object, and it needs a guard.
//!
//! Holding a guard keeps the object's *memory* alive. It does not make the object
//! thread-safe; only `&T` is ever handed out, so shared mutation has to go through
//! the object's own synchronization.

use crate::{
    error::LockError,
    guard::WeakPtrGuard,
    shared::{CellState, SharedData},
};
use alloc::sync::Weak;
use core::{fmt::Debug, ptr::NonNull};
use log::trace;
use spin::relax::{RelaxStrategy, Spin};

/// Weak (non-owning) pointer to an object that carries a [WeakPtrFactory](crate::WeakPtrFactory).
///
/// Weak pointers are safe to keep around after the object is gone; every access
/// path reports the object as absent from then on.
pub struct WeakPtr<T: ?Sized, R: RelaxStrategy = Spin> {
    weak: Weak<SharedData<R>>,
    ptr: Option<NonNull<T>>,
}

// Only `&T` is reachable through a weak pointer, from whichever thread holds it.
unsafe impl<T: ?Sized + Sync, R: RelaxStrategy> Send for WeakPtr<T, R> {}
unsafe impl<T: ?Sized + Sync, R: RelaxStrategy> Sync for WeakPtr<T, R> {}

impl<T: ?Sized, R: RelaxStrategy> WeakPtr<T, R> {
    pub(crate) fn new(weak: Weak<SharedData<R>>, ptr: NonNull<T>) -> Self {
        WeakPtr {
            weak,
            ptr: Some(ptr),
        }
    }

    /// Get a guard that keeps the object from being deleted while it is held.
    ///
    /// The guard is empty if the object has already expired, if invalidation has
    /// started, or if this pointer is empty. Check it with [WeakPtrGuard::is_locked]
    /// or go straight to [WeakPtr::get].
    ///
    /// This may spin while the owning thread holds the write side of the lock,
    /// which only lasts for the store that marks the object invalid.
    ///
    /// There **must** be only one guard referring to the same factory in a scope
    /// at a time.
    pub fn lock(&self) -> WeakPtrGuard<R> {
        let Some(strong) = self.weak.upgrade() else {
            return WeakPtrGuard::empty();
        };
        let state = strong.state();
        if state.contains(CellState::INVALIDATING) {
            if state.contains(CellState::VALID) {
                trace!("weak: lock refused, invalidation in progress");
            }
            return WeakPtrGuard::empty();
        }
        strong.shared_lock();
        if strong.valid() {
            return WeakPtrGuard::new(strong);
        }
        strong.shared_unlock();
        WeakPtrGuard::empty()
    }

    /// Non-blocking [WeakPtr::lock] that reports why no guard was produced.
    pub fn try_lock(&self) -> Result<WeakPtrGuard<R>, LockError> {
        if self.is_empty() {
            return Err(LockError::Empty);
        }
        let strong = self.weak.upgrade().ok_or(LockError::Expired)?;
        let state = strong.state();
        if !state.contains(CellState::VALID) {
            return Err(LockError::Expired);
        }
        if state.contains(CellState::INVALIDATING) || !strong.try_shared_lock() {
            return Err(LockError::Invalidating);
        }
        if strong.valid() {
            Ok(WeakPtrGuard::new(strong))
        } else {
            strong.shared_unlock();
            Err(LockError::Expired)
        }
    }

    /// Quick non-blocking check that the object has been destroyed.
    ///
    /// If the factory lives on another thread a `false` result can be stale by the
    /// time it is read, but a `true` result is always correct.
    pub fn expired(&self) -> bool {
        self.weak.upgrade().map_or(true, |strong| !strong.valid())
    }

    /// Opposite of [WeakPtr::expired], with the same caveats.
    pub fn is_alive(&self) -> bool {
        !self.expired()
    }

    /// Whether this pointer was default-constructed and never attached.
    pub fn is_empty(&self) -> bool {
        self.ptr.is_none()
    }

    /// Whether both pointers were issued by the same factory.
    pub fn ptr_eq<U: ?Sized>(&self, other: &WeakPtr<U, R>) -> bool {
        !self.is_empty() && Weak::ptr_eq(&self.weak, &other.weak)
    }

    /// Borrow the object for as long as `guard` is held.
    ///
    /// Returns `None` when the guard is empty or was taken from a different factory.
    pub fn get<'g>(&self, guard: &'g WeakPtrGuard<R>) -> Option<&'g T> {
        if !guard.protects(&self.weak) {
            return None;
        }
        // SAFETY: the guard holds a read reservation on this cell and saw it valid,
        // so the factory cannot finish invalidating, and by its construction
        // contract the object stays in place until then.
        self.object().map(|ptr| unsafe { ptr.as_ref() })
    }

    /// Run `f` on the object under a guard, if it is still alive.
    pub fn with<U>(&self, f: impl FnOnce(&T) -> U) -> Option<U> {
        let guard = self.lock();
        self.get(&guard).map(f)
    }

    /// Pointer to the object, `None` if expired.
    ///
    /// The caller **must** already hold a guard from [WeakPtr::lock] and keep it
    /// for as long as the pointer is used.
    pub(crate) fn object(&self) -> Option<NonNull<T>> {
        let strong = self.weak.upgrade()?;
        if strong.valid() { self.ptr } else { None }
    }

    /// Convert into a weak pointer to a related type, keeping the same factory.
    ///
    /// Prefer the [upcast!](crate::upcast) macro, which only allows pointer
    /// coercions the compiler can check.
    ///
    /// # Safety
    ///
    /// `f` must return a pointer into the same allocation as its argument, valid
    /// for reads as `U` for as long as the original object is.
    pub unsafe fn cast_unchecked<U: ?Sized>(
        self,
        f: impl FnOnce(NonNull<T>) -> NonNull<U>,
    ) -> WeakPtr<U, R> {
        WeakPtr {
            weak: self.weak,
            ptr: self.ptr.map(f),
        }
    }
}

impl<T: ?Sized, R: RelaxStrategy> Default for WeakPtr<T, R> {
    /// An empty pointer: always expired, never locks.
    fn default() -> Self {
        WeakPtr {
            weak: Weak::new(),
            ptr: None,
        }
    }
}

impl<T: ?Sized, R: RelaxStrategy> Clone for WeakPtr<T, R> {
    fn clone(&self) -> Self {
        WeakPtr {
            weak: self.weak.clone(),
            ptr: self.ptr,
        }
    }
}

impl<T: ?Sized, R: RelaxStrategy> Debug for WeakPtr<T, R> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("WeakPtr")
            .field("ptr", &self.ptr.map(|ptr| ptr.cast::<()>()))
            .field("expired", &self.expired())
            .finish()
    }
}

/// Convert a [WeakPtr] into a weak pointer to a type its pointee coerces to,
/// typically a trait object.
///
/// ```
/// use core::fmt::Display;
/// use weak::{WeakBox, WeakPtr, upcast};
///
/// let owner: WeakBox<u32> = WeakBox::new(7);
/// let shown: WeakPtr<dyn Display + Sync> = upcast!(owner.make_weak_ptr() => dyn Display + Sync);
/// assert_eq!(shown.with(|value| value.to_string()), Some("7".to_string()));
///
/// drop(owner);
/// assert!(shown.expired());
/// ```
#[macro_export]
macro_rules! upcast {
    ($ptr:expr => $target:ty) => {
        // SAFETY: the closure is an implicit pointer coercion, checked by the compiler.
        unsafe {
            $crate::WeakPtr::cast_unchecked($ptr, |ptr| -> ::core::ptr::NonNull<$target> { ptr })
        }
    };
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::factory::WeakPtrFactory;
    use alloc::boxed::Box;

    struct Object {
        value: u32,
    }

    fn attach(object: &Object) -> WeakPtrFactory<Object> {
        // SAFETY: every test drops the factory before the object.
        unsafe { WeakPtrFactory::new(NonNull::from(object)) }
    }

    #[test]
    fn test_lock_live_object() {
        let object = Box::new(Object { value: 42 });
        let factory = attach(&object);
        let ptr = factory.make_weak_ptr();

        let guard = ptr.lock();
        assert!(guard.is_locked());
        let seen = ptr.get(&guard).unwrap();
        assert!(core::ptr::eq(seen, &*object));
        assert_eq!(seen.value, 42);
        drop(guard);
        drop(factory);
    }

    #[test]
    fn test_expired_after_factory_drop() {
        let object = Box::new(Object { value: 1 });
        let factory = attach(&object);
        let ptr = factory.make_weak_ptr();
        let copy = ptr.clone();
        assert!(ptr.is_alive());

        drop(factory);
        for p in [&ptr, &copy] {
            assert!(p.expired());
            assert!(!p.is_alive());
            assert!(!p.lock().is_locked());
            assert!(p.object().is_none());
        }
        assert_eq!(ptr.with(|o| o.value), None);
    }

    #[test]
    fn test_default_is_empty() {
        let ptr: WeakPtr<Object> = WeakPtr::default();
        assert!(ptr.is_empty());
        assert!(ptr.expired());
        assert!(!ptr.lock().is_locked());
        assert_eq!(ptr.try_lock().unwrap_err(), LockError::Empty);
        assert!(!ptr.ptr_eq(&WeakPtr::<Object>::default()));
    }

    #[test]
    fn test_get_rejects_foreign_guard() {
        let first = Box::new(Object { value: 1 });
        let second = Box::new(Object { value: 2 });
        let first_factory = attach(&first);
        let second_factory = attach(&second);
        let first_ptr = first_factory.make_weak_ptr();
        let second_ptr = second_factory.make_weak_ptr();

        let guard = second_ptr.lock();
        assert!(first_ptr.get(&guard).is_none());
        assert_eq!(second_ptr.get(&guard).map(|o| o.value), Some(2));
        assert!(!first_ptr.ptr_eq(&second_ptr));
        assert!(first_ptr.ptr_eq(&first_factory.make_weak_ptr()));
    }

    #[test]
    fn test_try_lock() {
        let object = Box::new(Object { value: 3 });
        let factory = attach(&object);
        let ptr = factory.make_weak_ptr();

        let guard = ptr.try_lock().unwrap();
        assert_eq!(ptr.get(&guard).map(|o| o.value), Some(3));
        drop(guard);

        drop(factory);
        assert_eq!(ptr.try_lock().unwrap_err(), LockError::Expired);
    }

    #[test]
    fn test_lock_on_expired_has_no_side_effects() {
        let object = Box::new(Object { value: 0 });
        let factory = attach(&object);
        let ptr = factory.make_weak_ptr();
        let keep_alive = ptr.weak.upgrade().unwrap();
        drop(factory);

        for _ in 0..100 {
            assert!(!ptr.lock().is_locked());
        }
        assert_eq!(keep_alive.readers(), 0);
    }
}
