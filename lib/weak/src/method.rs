use crate::handle::WeakPtr;
use spin::relax::{RelaxStrategy, Spin};

/// A method bound to an object through a [WeakPtr].
///
/// Made by [WeakPtrFactory::make_weak_method](crate::WeakPtrFactory::make_weak_method).
/// Arguments are passed as one value; use a tuple for more than one.
pub struct WeakMethod<T: ?Sized, F, R: RelaxStrategy = Spin> {
    ptr: WeakPtr<T, R>,
    method: F,
}

impl<T: ?Sized, F, R: RelaxStrategy> WeakMethod<T, F, R> {
    pub fn new(ptr: WeakPtr<T, R>, method: F) -> Self {
        WeakMethod { ptr, method }
    }

    /// Call the method if the object is still alive.
    ///
    /// The object cannot be deleted until the call returns. Returns `None`, without
    /// calling anything, once it is gone.
    pub fn call<A, O>(&self, args: A) -> Option<O>
    where
        F: Fn(&T, A) -> O,
    {
        let guard = self.ptr.lock();
        let obj = self.ptr.get(&guard)?;
        Some((self.method)(obj, args))
    }

    /// Turn this into a plain closure that drops the method's result.
    pub fn into_fn<A, O>(self) -> impl Fn(A)
    where
        F: Fn(&T, A) -> O,
    {
        move |args| {
            let _ = self.call(args);
        }
    }

    pub fn weak_ptr(&self) -> &WeakPtr<T, R> {
        &self.ptr
    }
}

impl<T: ?Sized, F: Clone, R: RelaxStrategy> Clone for WeakMethod<T, F, R> {
    fn clone(&self) -> Self {
        WeakMethod {
            ptr: self.ptr.clone(),
            method: self.method.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use crate::WeakBox;
    use core::sync::atomic::{AtomicUsize, Ordering};

    struct Counter {
        value: AtomicUsize,
    }

    impl Counter {
        fn add(&self, by: usize) -> usize {
            self.value.fetch_add(by, Ordering::Relaxed) + by
        }
    }

    #[test]
    fn test_call_while_alive() {
        let owner: WeakBox<Counter> = WeakBox::new(Counter {
            value: AtomicUsize::new(0),
        });
        let add = owner.make_weak_method(Counter::add);
        assert_eq!(add.call(2), Some(2));
        assert_eq!(add.clone().call(3), Some(5));
        assert_eq!(owner.value.load(Ordering::Relaxed), 5);
    }

    #[test]
    fn test_call_after_expiry_is_ignored() {
        let outside = alloc::sync::Arc::new(AtomicUsize::new(0));
        let owner: WeakBox<Counter> = WeakBox::new(Counter {
            value: AtomicUsize::new(0),
        });
        let seen = outside.clone();
        let add = owner.make_weak_method(move |counter: &Counter, by: usize| {
            seen.fetch_add(1, Ordering::Relaxed);
            counter.add(by)
        });
        assert_eq!(add.call(1), Some(1));

        drop(owner);
        assert_eq!(add.call(1), None);
        assert!(add.weak_ptr().expired());
        assert_eq!(outside.load(Ordering::Relaxed), 1);
    }

    #[test]
    fn test_tuple_arguments_and_into_fn() {
        let owner: WeakBox<Counter> = WeakBox::new(Counter {
            value: AtomicUsize::new(0),
        });
        let add_twice = owner
            .make_weak_method(|counter: &Counter, (a, b): (usize, usize)| {
                counter.add(a);
                counter.add(b);
            })
            .into_fn();
        add_twice((1, 2));
        assert_eq!(owner.value.load(Ordering::Relaxed), 3);

        drop(owner);
        add_twice((1, 2));
    }
}
