//! Logging helpers.
//!
//! The crate only talks to the [log] facade; installing a logger is up to the
//! embedding kernel or application.

/// Debug-level log that is only compiled in debug builds.
///
/// The arguments are not evaluated at all in release builds, so it is fine to
/// pass diagnostics that cost an atomic load or two.
macro_rules! debug_ex {
    // debug_ex!(target: "my_target", "a {} event", "log")
    (target: $target:expr, $($arg:tt)+) => {
        #[cfg(debug_assertions)]
        {
            ::log::log!(target: $target, ::log::Level::Debug, $($arg)+)
        }
    };

    // debug_ex!("a {} event", "log")
    ($($arg:tt)+) => {
        #[cfg(debug_assertions)]
        {
            ::log::log!(::log::Level::Debug, $($arg)+)
        }
    };
}
