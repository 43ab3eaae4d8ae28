//! Thread-safe scanner handle
//!
//! The protocol allows one exchange at a time per link. `SharedScanner`
//! puts the scanner behind a mutex so several threads can use one link,
//! each holding the lock for a whole exchange.

use std::sync::Arc;

use parking_lot::{Mutex, MutexGuard};

use opnrust_transport::Transport;

use crate::scanner::Scanner;

/// Cloneable handle to one scanner
pub struct SharedScanner<T = Box<dyn Transport>> {
    inner: Arc<Mutex<Scanner<T>>>,
}

impl<T: Transport> SharedScanner<T> {
    pub fn new(scanner: Scanner<T>) -> Self {
        Self {
            inner: Arc::new(Mutex::new(scanner)),
        }
    }

    /// Block until no other exchange is in flight
    pub fn lock(&self) -> MutexGuard<'_, Scanner<T>> {
        self.inner.lock()
    }

    /// Take the scanner only if it is idle
    pub fn try_lock(&self) -> Option<MutexGuard<'_, Scanner<T>>> {
        self.inner.try_lock()
    }

    /// Run several operations without another thread interleaving
    pub fn with<R>(&self, f: impl FnOnce(&mut Scanner<T>) -> R) -> R {
        f(&mut self.inner.lock())
    }
}

impl<T> Clone for SharedScanner<T> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<T: Transport> From<Scanner<T>> for SharedScanner<T> {
    fn from(scanner: Scanner<T>) -> Self {
        Self::new(scanner)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use opnrust_transport::MemoryTransport;

    #[test]
    fn test_clones_share_scanner() {
        let shared = SharedScanner::new(Scanner::new(MemoryTransport::new()));
        let other = shared.clone();

        shared.lock().connect().unwrap();
        assert!(other.lock().is_connected());
    }

    #[test]
    fn test_try_lock_while_busy() {
        let shared = SharedScanner::new(Scanner::new(MemoryTransport::new()));

        let guard = shared.lock();
        assert!(shared.try_lock().is_none());
        drop(guard);

        assert!(shared.try_lock().is_some());
    }

    #[test]
    fn test_with() {
        let shared = SharedScanner::from(Scanner::new(MemoryTransport::new()));
        let connected = shared.with(|scanner| {
            scanner.connect().unwrap();
            scanner.is_connected()
        });
        assert!(connected);
    }
}
