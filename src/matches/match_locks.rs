use std::hash::Hash;
use std::sync::Arc;

use dashmap::DashMap;
use parking_lot::Mutex;

/// One mutex per key, created on first use and dropped once nobody waits on
/// it.
///
/// Holding the guard for a key serializes every operation on that entity while
/// leaving other keys free.
#[derive(Debug)]
pub struct KeyedLocks<K: Eq + Hash> {
    locks: DashMap<K, Arc<Mutex<()>>>,
}

impl<K: Eq + Hash> Default for KeyedLocks<K> {
    fn default() -> Self {
        Self { locks: DashMap::new() }
    }
}

impl<K: Eq + Hash + Clone> KeyedLocks<K> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Runs `f` while holding the lock for `key`.
    pub fn with_lock<T>(&self, key: &K, f: impl FnOnce() -> T) -> T {
        let slot = self
            .locks
            .entry(key.clone())
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .clone();

        let result = {
            let _guard = slot.lock();
            f()
        };

        // The map's own reference is the last one left when no other caller
        // holds or waits on this slot.
        drop(slot);
        self.locks.remove_if(key, |_, lock| Arc::strong_count(lock) == 1);
        result
    }

    #[cfg(test)]
    pub(crate) fn len(&self) -> usize {
        self.locks.len()
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::thread;

    use super::*;

    #[test]
    fn same_key_runs_one_at_a_time() {
        let locks = Arc::new(KeyedLocks::<u32>::new());
        let inside = Arc::new(AtomicUsize::new(0));
        let overlaps = Arc::new(AtomicUsize::new(0));

        let handles: Vec<_> = (0..8)
            .map(|_| {
                let locks = Arc::clone(&locks);
                let inside = Arc::clone(&inside);
                let overlaps = Arc::clone(&overlaps);
                thread::spawn(move || {
                    locks.with_lock(&1, || {
                        if inside.fetch_add(1, Ordering::SeqCst) != 0 {
                            overlaps.fetch_add(1, Ordering::SeqCst);
                        }
                        thread::sleep(std::time::Duration::from_millis(2));
                        inside.fetch_sub(1, Ordering::SeqCst);
                    })
                })
            })
            .collect();

        for handle in handles {
            handle.join().expect("worker finished");
        }
        assert_eq!(overlaps.load(Ordering::SeqCst), 0);
        assert_eq!(locks.len(), 0);
    }

    #[test]
    fn released_keys_leave_no_entry_behind() {
        let locks = KeyedLocks::<u32>::new();
        for key in 0..100 {
            assert_eq!(locks.with_lock(&key, || key * 2), key * 2);
        }
        assert_eq!(locks.len(), 0);

        // Re-entering a different key while one is held keeps both until
        // each is released.
        locks.with_lock(&1, || {
            locks.with_lock(&2, || assert_eq!(locks.len(), 2));
            assert_eq!(locks.len(), 1);
        });
        assert_eq!(locks.len(), 0);
    }
}
