use std::sync::{Mutex, MutexGuard, PoisonError};

pub trait MutexUtils<T> {
    /// Run the function while holding the lock, releasing it right after.
    ///
    /// A poisoned mutex is entered anyway.
    fn with_lock<R>(&self, f: impl FnOnce(MutexGuard<'_, T>) -> R) -> R;
}

impl<T> MutexUtils<T> for Mutex<T> {
    fn with_lock<R>(&self, f: impl FnOnce(MutexGuard<'_, T>) -> R) -> R {
        f(self.lock().unwrap_or_else(PoisonError::into_inner))
    }
}
