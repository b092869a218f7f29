use crate::{handle::WeakPtr, method::WeakMethod, shared::SharedData};
use alloc::sync::Arc;
use core::{fmt::Debug, ptr::NonNull};
use spin::relax::{RelaxStrategy, Spin};

/// Object wrapper that can create weak pointers.
///
/// The factory lives inside the object it describes. Dropping it invalidates
/// every [WeakPtr] it issued, blocking until no [WeakPtrGuard](crate::WeakPtrGuard)
/// for the object remains.
///
/// **WARNING**: Rust drops fields in declaration order, so the factory must be the
/// **first** field of the object. A type with its own [Drop] must call
/// [WeakPtrFactory::invalidate] before touching any other state in `drop`.
/// [WeakBox](crate::WeakBox) takes care of both for objects that do not need to
/// embed the factory themselves.
pub struct WeakPtrFactory<T: ?Sized, R: RelaxStrategy = Spin> {
    strong: Arc<SharedData<R>>,
    obj: NonNull<T>,
}

// The factory only ever hands `&T` to other threads.
unsafe impl<T: ?Sized + Sync, R: RelaxStrategy> Send for WeakPtrFactory<T, R> {}
unsafe impl<T: ?Sized + Sync, R: RelaxStrategy> Sync for WeakPtrFactory<T, R> {}

impl<T: ?Sized, R: RelaxStrategy> WeakPtrFactory<T, R> {
    /// Attach a factory to the object at `obj`.
    ///
    /// # Safety
    ///
    /// The object must stay at `obj`, and must not be freed or mutably borrowed,
    /// until this factory is dropped or [WeakPtrFactory::invalidate] has returned.
    pub unsafe fn new(obj: NonNull<T>) -> Self {
        WeakPtrFactory {
            strong: Arc::new(SharedData::new()),
            obj,
        }
    }

    /// Make a weak pointer to the object.
    pub fn make_weak_ptr(&self) -> WeakPtr<T, R> {
        WeakPtr::new(Arc::downgrade(&self.strong), self.obj)
    }

    /// Make a weak wrapper for calling `method` on the object.
    ///
    /// While the object exists, calling the wrapper is equivalent to calling
    /// `method` with it, and the object cannot be deleted during the call. Once it
    /// is gone, calls are ignored.
    pub fn make_weak_method<A, O, F>(&self, method: F) -> WeakMethod<T, F, R>
    where
        F: Fn(&T, A) -> O,
    {
        WeakMethod::new(self.make_weak_ptr(), method)
    }

    /// Invalidate every weak pointer to the object now, instead of on drop.
    ///
    /// Blocks until all outstanding guards are released. Calling it again, or
    /// dropping the factory afterwards, does nothing more.
    pub fn invalidate(&self) {
        self.strong.invalidate();
    }

    pub fn is_valid(&self) -> bool {
        self.strong.valid()
    }
}

impl<T: ?Sized, R: RelaxStrategy> Drop for WeakPtrFactory<T, R> {
    fn drop(&mut self) {
        self.strong.invalidate();
    }
}

impl<T: ?Sized, R: RelaxStrategy> Debug for WeakPtrFactory<T, R> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("WeakPtrFactory")
            .field("obj", &self.obj.cast::<()>())
            .field("shared", &self.strong)
            .finish()
    }
}
