//! Inter-worker communication and synchronization.
//!
//! [`CommSync`] is the sole cross-worker coupling: an NxN matrix of
//! single-producer single-consumer message streams, a count-down barrier,
//! and an AND-reducing barrier variant used for the global convergence vote.

pub mod barrier;
pub mod stream;

use crate::comm::barrier::Barrier;
use crate::comm::stream::{KeyValue, Stream};
use std::cell::UnsafeCell;
use std::mem;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

/// A stream slot of the NxN matrix.
///
/// Not synchronized by itself: slot `[p][c]` is written only by worker `p`
/// and read only by worker `c`, and every ownership hand-over goes through
/// one of the barriers, which orders the accesses.
struct StreamCell<K, V>(UnsafeCell<Stream<KeyValue<K, V>>>);

// SAFETY: see the single-writer discipline above; CommSync's public API
// upholds it by construction (send/prod_reset touch only the caller's row,
// drain/cons_reset touch only the caller's column, with barriers between
// conflicting phases).
unsafe impl<K: Send, V: Send> Sync for StreamCell<K, V> {}

impl<K, V> StreamCell<K, V> {
    fn new() -> Self {
        Self(UnsafeCell::new(Stream::new()))
    }

    #[allow(clippy::mut_from_ref)]
    unsafe fn get_mut(&self) -> &mut Stream<KeyValue<K, V>> {
        &mut *self.0.get()
    }
}

/// Communication and synchronization utility shared by all workers of a run.
///
/// `streams[p][c]` carries messages from producer `p` to consumer `c`.
/// Within one stream, insertion order is preserved; across streams entering
/// the same consumer there is no order, which is why update combine must be
/// commutative and associative.
pub struct CommSync<K, V> {
    thread_count: usize,
    bar: Barrier,
    // AND-reduce registers. `and_cur` collects the current cycle; the serial
    // callback of the barrier publishes it to `and_last` and re-arms
    // `and_cur` to true, exactly once per cycle.
    and_cur: AtomicBool,
    and_last: AtomicBool,
    streams: Vec<Vec<StreamCell<K, V>>>,
    send_counts: Vec<AtomicUsize>,
}

impl<K, V> CommSync<K, V> {
    pub fn new(thread_count: usize) -> Self {
        let streams = (0..thread_count)
            .map(|_| (0..thread_count).map(|_| StreamCell::new()).collect())
            .collect();
        Self {
            thread_count,
            bar: Barrier::new(thread_count),
            and_cur: AtomicBool::new(true),
            and_last: AtomicBool::new(false),
            streams,
            send_counts: (0..thread_count).map(|_| AtomicUsize::new(0)).collect(),
        }
    }

    pub fn thread_count(&self) -> usize {
        self.thread_count
    }

    /// Blocks the caller until all workers have called.
    pub fn barrier(&self) {
        self.bar.wait();
    }

    /// Barrier that also folds `input` via logical AND across all callers;
    /// every caller receives the identical reduced value.
    pub fn barrier_and(&self, input: bool) -> bool {
        if !input {
            self.and_cur.store(false, Ordering::SeqCst);
        }
        self.bar.wait_with(|| {
            let reduced = self.and_cur.swap(true, Ordering::SeqCst);
            self.and_last.store(reduced, Ordering::SeqCst);
        });
        self.and_last.load(Ordering::SeqCst)
    }

    /// Appends a message from producer `prod` to consumer `cons`. Never
    /// blocks; lock-free with respect to every other producer's rows.
    ///
    /// Must only be called by worker `prod`.
    pub fn send(&self, prod: usize, cons: usize, key: K, val: V) {
        // SAFETY: single writer (worker `prod`); the consumer reads this
        // slot only after the barrier embedded in `drain`.
        let stream = unsafe { self.streams[prod][cons].get_mut() };
        stream.put(KeyValue::new(key, val));
        self.send_counts[prod].fetch_add(1, Ordering::Relaxed);
    }

    /// Total messages sent by producer `prod` so far.
    pub fn send_count(&self, prod: usize) -> usize {
        self.send_counts[prod].load(Ordering::Relaxed)
    }

    /// Empties producer `prod`'s outgoing row. Only safe at the top of the
    /// next iteration: the iteration-end barrier guarantees every consumer
    /// has drained the previous round.
    ///
    /// Must only be called by worker `prod`.
    pub fn prod_reset(&self, prod: usize) {
        for cell in &self.streams[prod] {
            // SAFETY: single writer; consumers of the previous iteration
            // have quiesced behind the iteration-end barrier.
            unsafe { cell.get_mut() }.reset();
        }
    }

    /// Empties consumer `cons`'s incoming column after its inbox has been
    /// processed.
    ///
    /// Must only be called by worker `cons`.
    pub fn cons_reset(&self, cons: usize) {
        for row in &self.streams {
            // SAFETY: single reader (worker `cons`); producers for the next
            // iteration start writing only after the iteration-end barrier.
            unsafe { row[cons].get_mut() }.reset();
        }
    }

    /// Collects everything sent to consumer `cons` this iteration and
    /// distributes it into `parts` sub-streams by `hash(key) % parts`, so
    /// the gather loop works on cache-resident subpartitions.
    ///
    /// Blocks on an internal barrier first, so that no consumer ever
    /// observes a partial send: the returned partitions are always complete.
    ///
    /// Must only be called by worker `cons`, once per iteration.
    pub fn drain<F>(&self, cons: usize, parts: usize, hash: F) -> Vec<Stream<KeyValue<K, V>>>
    where
        F: Fn(&K) -> usize,
    {
        // All producers have finished sending once everyone arrives here.
        self.barrier();

        let parts = parts.max(1);
        let mut partitions = (0..parts).map(|_| Stream::new()).collect::<Vec<_>>();

        // Local stream: with a single partition its storage moves wholesale.
        if parts == 1 {
            // SAFETY: worker `cons` owns both the producer and consumer side
            // of its diagonal slot.
            partitions[0].swap(unsafe { self.streams[cons][cons].get_mut() });
        } else {
            // SAFETY: as above.
            let local = mem::take(unsafe { self.streams[cons][cons].get_mut() });
            for kv in local {
                let pid = hash(&kv.key) % parts;
                partitions[pid].put(kv);
            }
        }

        // Remote streams.
        for prod in 0..self.thread_count {
            if prod == cons {
                continue;
            }
            // SAFETY: single reader for column `cons`; producers are behind
            // the barrier above and will not touch the slot again before
            // their next `prod_reset`, which another barrier orders after
            // this drain.
            let stream = mem::take(unsafe { self.streams[prod][cons].get_mut() });
            for kv in stream {
                let pid = hash(&kv.key) % parts;
                partitions[pid].put(kv);
            }
        }

        partitions
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crossbeam_utils::thread;

    const THREADS: usize = 8;

    fn run_workers<F>(cs: &CommSync<u32, f64>, f: F)
    where
        F: Fn(usize, &CommSync<u32, f64>) + Sync,
    {
        thread::scope(|s| {
            for tid in 0..THREADS {
                let f = &f;
                s.spawn(move |_| f(tid, cs));
            }
        })
        .expect("Error joining comm test threads");
    }

    #[test]
    fn barrier_and_is_unanimous() {
        let cs = CommSync::<u32, f64>::new(4);
        let run = |inputs: [bool; 4], expected: bool| {
            thread::scope(|s| {
                for tid in 0..4 {
                    let cs = &cs;
                    s.spawn(move |_| {
                        assert_eq!(cs.barrier_and(inputs[tid]), expected);
                    });
                }
            })
            .expect("Error joining comm test threads");
        };

        // One dissenter pulls everyone to false.
        run([true, true, false, true], false);
        // The reduction register is re-armed for the next cycle.
        run([true, true, true, true], true);
        run([false, false, false, false], false);
        run([true, true, true, true], true);
    }

    // Each producer sends `prod * cons` pairs to each consumer; consumers
    // check counts and value sums across subpartitions. Runs three rounds in
    // a row to exercise the reset discipline.
    #[test]
    fn exchange_rounds() {
        let cs = CommSync::<u32, f64>::new(THREADS);
        let worker = |tid: usize, cs: &CommSync<u32, f64>| {
            cs.prod_reset(tid);

            for cons in 0..THREADS {
                for i in 0..(tid * cons) {
                    cs.send(tid, cons, tid as u32, 0.1 * i as f64);
                }
            }

            let mut kv_counts = vec![0_usize; THREADS];
            let mut sum = 0.0;
            let partitions = cs.drain(tid, THREADS, |key| *key as usize);
            assert_eq!(partitions.len(), THREADS);
            for partition in &partitions {
                for kv in partition {
                    kv_counts[kv.key as usize] += 1;
                    sum += kv.val;
                }
            }

            cs.cons_reset(tid);

            for (prod, count) in kv_counts.iter().enumerate() {
                assert_eq!(prod * tid, *count);
            }
            let expect: f64 =
                (0..THREADS).map(|prod| (0..prod * tid).map(|i| 0.1 * i as f64).sum::<f64>()).sum();
            assert!((sum - expect).abs() < 1e-6);

            // Keep the next round's prod_reset safely behind this round.
            cs.barrier_and(true);
        };

        run_workers(&cs, worker);
        run_workers(&cs, worker);
        run_workers(&cs, worker);
    }

    #[test]
    fn stream_fifo_per_producer() {
        let cs = CommSync::<u32, f64>::new(THREADS);
        run_workers(&cs, |tid, cs| {
            cs.prod_reset(tid);
            // Keys carry the producer, values the send order.
            for i in 0..50_u32 {
                cs.send(tid, 0, tid as u32, f64::from(i));
            }
            let partitions = cs.drain(tid, 1, |_| 0);
            if tid == 0 {
                assert_eq!(partitions.len(), 1);
                assert_eq!(partitions[0].len(), 50 * THREADS);
                // Between producers the order is undefined, but each
                // producer's own messages arrive in insertion order.
                let mut next_per_producer = vec![0_u32; THREADS];
                for kv in &partitions[0] {
                    let expected = &mut next_per_producer[kv.key as usize];
                    assert_eq!(kv.val, f64::from(*expected));
                    *expected += 1;
                }
            }
            cs.cons_reset(tid);
            cs.barrier_and(true);
        });
    }

    #[test]
    fn prod_reset_then_drain_is_empty() {
        let cs = CommSync::<u32, f64>::new(THREADS);
        run_workers(&cs, |tid, cs| {
            for cons in 0..THREADS {
                cs.send(tid, cons, tid as u32, 1.0);
            }
            // Everyone discards their outgoing row before anyone drains.
            cs.barrier();
            cs.prod_reset(tid);
            let partitions = cs.drain(tid, 4, |key| *key as usize);
            assert!(partitions.iter().all(Stream::is_empty));
            cs.cons_reset(tid);
        });
    }

    #[test]
    fn send_counts_accumulate() {
        let cs = CommSync::<u32, f64>::new(2);
        thread::scope(|s| {
            let cs = &cs;
            s.spawn(move |_| {
                for _ in 0..5 {
                    cs.send(0, 1, 7, 1.0);
                }
                cs.barrier();
            });
            s.spawn(move |_| {
                cs.barrier();
                assert_eq!(cs.send_count(0), 5);
                assert_eq!(cs.send_count(1), 0);
            });
        })
        .expect("Error joining comm test threads");
    }
}
