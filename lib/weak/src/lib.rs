//! Thread-aware weak pointers.
//!
//! A [WeakPtrFactory] lives inside an object and hands out [WeakPtr]s to it.
//! Unlike [alloc::sync::Weak], a weak pointer here can be turned into a
//! [WeakPtrGuard] that *pauses* the object's destruction: dropping the factory
//! blocks until every outstanding guard is released, then marks all weak
//! pointers expired for good.
//!
//! ```
//! use core::sync::atomic::{AtomicUsize, Ordering};
//! use weak::WeakBox;
//!
//! let owner: WeakBox<AtomicUsize> = WeakBox::new(AtomicUsize::new(0));
//! let ptr = owner.make_weak_ptr();
//!
//! let worker = std::thread::spawn(move || {
//!     let guard = ptr.lock();
//!     // `owner` cannot be freed before `guard` goes away
//!     if let Some(counter) = ptr.get(&guard) {
//!         counter.fetch_add(1, Ordering::Relaxed);
//!     }
//! });
//! worker.join().unwrap();
//! assert_eq!(owner.load(Ordering::Relaxed), 1);
//! ```
//!
//! Only the object's lifetime is managed. Its own state still needs its own
//! synchronization, since several threads may hold guards at once.
//!
//! New guards are refused as soon as invalidation starts, so a steady stream of
//! readers cannot keep the owning thread waiting forever. Waiting threads spin
//! with the relax strategy `R` (see [spin::relax]).

#![no_std]
extern crate alloc;

#[macro_use]
mod logging;

mod error;
mod factory;
mod guard;
mod handle;
mod method;
mod owned;
mod shared;

pub use error::LockError;
pub use factory::WeakPtrFactory;
pub use guard::WeakPtrGuard;
pub use handle::WeakPtr;
pub use method::WeakMethod;
pub use owned::WeakBox;

#[cfg(feature = "std")]
pub use spin::relax::Yield;
pub use spin::relax::{Loop, RelaxStrategy, Spin};
