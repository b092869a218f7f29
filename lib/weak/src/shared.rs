//! Liveness state shared by a factory and every pointer it issued.

use bitflags::bitflags;
use core::sync::atomic::{AtomicU8, Ordering};
use spin::{
    relax::{RelaxStrategy, Spin},
    rwlock::RwLock,
};

bitflags! {
    /// Snapshot of a factory's liveness state.
    ///
    /// A missing `VALID` alone means expired; `INVALIDATING` stays set afterwards.
    pub(crate) struct CellState: u8 {
        /// The object is alive. Cleared exactly once, under the write lock.
        const VALID = 0b01;
        /// Invalidation has started; new guards are refused from then on.
        const INVALIDATING = 0b10;
    }
}

/// The block a [WeakPtrFactory](crate::WeakPtrFactory) owns and its weak pointers refer to.
///
/// Read reservations on `lock` are the guards' access windows; the write side is
/// taken exactly once, to clear [CellState::VALID].
pub(crate) struct SharedData<R: RelaxStrategy = Spin> {
    lock: RwLock<(), R>, // Blocks on factory invalidation.
    state: AtomicU8,
}

impl<R: RelaxStrategy> SharedData<R> {
    pub fn new() -> Self {
        SharedData {
            lock: RwLock::new(()),
            state: AtomicU8::new(CellState::VALID.bits()),
        }
    }

    pub fn state(&self) -> CellState {
        CellState::from_bits_truncate(self.state.load(Ordering::Acquire))
    }

    /// Once this returns `false` it returns `false` forever.
    pub fn valid(&self) -> bool {
        self.state().contains(CellState::VALID)
    }

    pub fn readers(&self) -> usize {
        self.lock.reader_count()
    }

    /// Take a read reservation that outlives any borrow of `self`.
    ///
    /// Must be paired with exactly one [SharedData::shared_unlock].
    pub fn shared_lock(&self) {
        core::mem::forget(self.lock.read());
    }

    /// Non-blocking [SharedData::shared_lock]. Fails while the write side is held.
    pub fn try_shared_lock(&self) -> bool {
        match self.lock.try_read() {
            Some(guard) => {
                core::mem::forget(guard);
                true
            }
            None => false,
        }
    }

    pub fn shared_unlock(&self) {
        debug_assert!(self.readers() > 0, "unbalanced shared unlock");
        // SAFETY: every call is paired with a reservation whose guard was forgotten.
        unsafe { self.lock.force_read_decrement() };
    }

    /// Clear [CellState::VALID], waiting for every outstanding reservation first.
    ///
    /// [CellState::INVALIDATING] is published before waiting so that new readers back
    /// off instead of queueing behind us. Calling this on an already invalid cell
    /// is a no-op.
    pub fn invalidate(&self) {
        let prev = CellState::from_bits_truncate(
            self.state
                .fetch_or(CellState::INVALIDATING.bits(), Ordering::AcqRel),
        );
        if !prev.contains(CellState::VALID) {
            return;
        }
        if self.readers() > 0 {
            debug_ex!(
                "weak: invalidating with {} outstanding guard(s), draining",
                self.readers()
            );
        }
        let guard = self.lock.write();
        self.state
            .fetch_and(!CellState::VALID.bits(), Ordering::AcqRel);
        drop(guard);
        debug_ex!("weak: invalidated");
    }
}

impl<R: RelaxStrategy> core::fmt::Debug for SharedData<R> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("SharedData")
            .field("state", &self.state())
            .field("readers", &self.readers())
            .finish()
    }
}
