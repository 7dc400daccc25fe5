use std::sync::{Condvar, Mutex};

struct BarrierState {
    remain: usize,
    // Wait predicate. The count of completed barrier cycles; must not depend
    // on `remain`, which is reset the moment the last thread arrives.
    generation: u64,
}

/// A count-down barrier over a fixed set of threads, with a serial-point
/// callback executed by exactly one thread per cycle.
pub struct Barrier {
    thread_count: usize,
    lock: Mutex<BarrierState>,
    cv: Condvar,
}

impl Barrier {
    pub fn new(thread_count: usize) -> Self {
        assert!(thread_count > 0, "Barrier needs at least one thread");
        Self {
            thread_count,
            lock: Mutex::new(BarrierState { remain: thread_count, generation: 0 }),
            cv: Condvar::new(),
        }
    }

    /// Blocks until all threads have called. Returns `true` on the one
    /// thread serialized as last.
    pub fn wait(&self) -> bool {
        self.wait_with(|| {})
    }

    /// Like [`wait`](Self::wait), additionally running `on_serial` on the
    /// last arriving thread before any thread is released.
    pub fn wait_with<F: FnOnce()>(&self, on_serial: F) -> bool {
        let mut state = self.lock.lock().expect("Barrier lock poisoned");
        let generation = state.generation;
        state.remain -= 1;
        if state.remain > 0 {
            while state.generation == generation {
                state = self.cv.wait(state).expect("Barrier lock poisoned");
            }
            false
        } else {
            state.remain = self.thread_count;
            state.generation += 1;
            // Still under the lock: waiters cannot resume until it drops.
            on_serial();
            drop(state);
            self.cv.notify_all();
            true
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crossbeam_utils::thread;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    #[test]
    fn threads_stay_in_lockstep() {
        const THREADS: usize = 8;
        const ROUNDS: usize = 4;
        let barrier = Barrier::new(THREADS);
        let arrived = AtomicUsize::new(0);

        thread::scope(|s| {
            for tid in 0..THREADS {
                let barrier = &barrier;
                let arrived = &arrived;
                s.spawn(move |_| {
                    for round in 0..ROUNDS {
                        // Stagger arrivals.
                        std::thread::sleep(Duration::from_millis((tid * round) as u64));
                        let seen = arrived.fetch_add(1, Ordering::SeqCst);
                        // No thread from a later round can have arrived yet.
                        assert!(seen < (round + 1) * THREADS);
                        barrier.wait();
                    }
                });
            }
        })
        .expect("Error joining barrier test threads");
        assert_eq!(arrived.load(Ordering::SeqCst), THREADS * ROUNDS);
    }

    #[test]
    fn serial_callback_runs_once_per_cycle() {
        const THREADS: usize = 4;
        const ROUNDS: usize = 10;
        let barrier = Barrier::new(THREADS);
        let serial_calls = AtomicUsize::new(0);

        thread::scope(|s| {
            for _ in 0..THREADS {
                let barrier = &barrier;
                let serial_calls = &serial_calls;
                s.spawn(move |_| {
                    let mut serial_count = 0;
                    for _ in 0..ROUNDS {
                        if barrier.wait_with(|| {
                            serial_calls.fetch_add(1, Ordering::SeqCst);
                        }) {
                            serial_count += 1;
                        }
                    }
                    serial_count
                });
            }
        })
        .expect("Error joining barrier test threads");
        assert_eq!(serial_calls.load(Ordering::SeqCst), ROUNDS);
    }
}
