//! Errors reported by the non-blocking acquisition path.

use core::fmt::{Display, Formatter};

/// Reason a [WeakPtr::try_lock](crate::WeakPtr::try_lock) call did not produce a guard.
///
/// The blocking [WeakPtr::lock](crate::WeakPtr::lock) never fails; it folds all of these
/// into an empty guard.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LockError {
    /// The pointer was default-constructed and never attached to an object.
    Empty,
    /// The object has been invalidated. This is permanent.
    Expired,
    /// Invalidation has started but not finished; the object is about to expire.
    Invalidating,
}

impl Display for LockError {
    fn fmt(&self, f: &mut Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::Empty => write!(f, "weak pointer is empty"),
            Self::Expired => write!(f, "object has expired"),
            Self::Invalidating => write!(f, "object is being invalidated"),
        }
    }
}

impl core::error::Error for LockError {}

#[cfg(test)]
mod tests {
    use super::*;
    use alloc::string::ToString;

    #[test]
    fn test_display() {
        assert_eq!(LockError::Empty.to_string(), "weak pointer is empty");
        assert_eq!(LockError::Expired.to_string(), "object has expired");
        assert_eq!(
            LockError::Invalidating.to_string(),
            "object is being invalidated"
        );
    }
}
