//! Millisecond time source

/// Monotonic millisecond counter.
///
/// Only differences between two readings are used, so the counter may start
/// anywhere and is allowed to wrap at `u32::MAX`.
pub trait Clock {
    fn now_ms(&self) -> u32;
}

impl<F> Clock for F
where
    F: Fn() -> u32,
{
    fn now_ms(&self) -> u32 {
        self()
    }
}
