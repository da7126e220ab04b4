//! Channel-fed parallel mode for [`GridExecutor`].
//!
//! A producer (the calling thread) runs the same odometer enumeration as the
//! sequential mode and pushes coordinates onto an unbounded channel. One
//! worker thread per caller-supplied context pops coordinates and invokes the
//! callback against its own context, so a context is never touched by two
//! threads. On the first callback error a shared stop flag halts production,
//! queued-but-unprocessed coordinates are dropped, every thread is joined,
//! and the first captured error is returned.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Mutex;

use crate::error::{Error, Result};

use super::{advance, GridExecutor};

impl GridExecutor {
    /// Visit every tuple using one worker thread per context.
    ///
    /// Pool size equals `contexts.len()`; the slice must be non-empty.
    /// Visits the same set of tuples as [`GridExecutor::execute`], with no
    /// ordering guarantee across workers. Within one worker, coordinates are
    /// processed in dispatch order. Returns only after all worker threads
    /// have been joined, success or failure.
    pub fn execute_parallel<T, F>(&self, contexts: &mut [T], callback: F) -> Result<()>
    where
        T: Send,
        F: Fn(&[i64], &mut T) -> Result<()> + Sync,
    {
        if contexts.is_empty() {
            return Err(Error::InvalidBounds(
                "parallel execution needs at least one worker context".into(),
            ));
        }

        let (tx, rx) = crossbeam_channel::unbounded::<Vec<i64>>();
        let stop = AtomicBool::new(false);
        let first_error: Mutex<Option<Error>> = Mutex::new(None);

        std::thread::scope(|scope| {
            for context in contexts.iter_mut() {
                let rx = rx.clone();
                let stop = &stop;
                let first_error = &first_error;
                let callback = &callback;
                scope.spawn(move || {
                    while let Ok(coord) = rx.recv() {
                        // Cooperative cancellation: checked between tasks only.
                        if stop.load(Ordering::Acquire) {
                            break;
                        }
                        if let Err(err) = callback(&coord, context) {
                            let mut slot = first_error.lock().unwrap();
                            if slot.is_none() {
                                *slot = Some(err);
                            }
                            stop.store(true, Ordering::Release);
                            break;
                        }
                    }
                });
            }
            drop(rx);

            // Producer: identical odometer enumeration, unbounded queue, so
            // it never blocks. Closing the channel lets workers drain and exit.
            let mut cursor = self.min_bounds().to_vec();
            loop {
                if stop.load(Ordering::Acquire) {
                    break;
                }
                if tx.send(cursor.clone()).is_err() {
                    break;
                }
                if !advance(&mut cursor, self.min_bounds(), self.max_bounds()) {
                    break;
                }
            }
            drop(tx);
        });

        match first_error.into_inner().unwrap() {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use std::collections::BTreeSet;

    use rstest::rstest;

    use super::*;

    /// Collect the sequential visitation set for reference.
    fn sequential_set(exec: &GridExecutor) -> BTreeSet<Vec<i64>> {
        let mut set = BTreeSet::new();
        exec.execute(|c| {
            set.insert(c.to_vec());
            Ok(())
        })
        .unwrap();
        set
    }

    #[test]
    fn test_empty_contexts_rejected() {
        let exec = GridExecutor::new(vec![1], vec![4]).unwrap();
        let mut contexts: Vec<Vec<Vec<i64>>> = Vec::new();
        let err = exec
            .execute_parallel(&mut contexts, |_, _| Ok(()))
            .unwrap_err();
        assert!(matches!(err, Error::InvalidBounds(_)));
    }

    #[rstest]
    #[case(1)]
    #[case(2)]
    #[case(3)]
    #[case(7)]
    fn test_parallel_matches_sequential_set(#[case] n_workers: usize) {
        let exec = GridExecutor::new(vec![1, 1, 1], vec![3, 4, 2]).unwrap();
        let expected = sequential_set(&exec);

        let mut contexts: Vec<Vec<Vec<i64>>> = vec![Vec::new(); n_workers];
        exec.execute_parallel(&mut contexts, |coord, seen| {
            seen.push(coord.to_vec());
            Ok(())
        })
        .unwrap();

        let total: usize = contexts.iter().map(|c| c.len()).sum();
        assert_eq!(total as u64, exec.n_cells(), "each tuple dispatched once");

        let union: BTreeSet<Vec<i64>> =
            contexts.into_iter().flatten().collect();
        assert_eq!(union, expected);
    }

    #[test]
    fn test_worker_order_is_dispatch_order() {
        // With one worker the parallel scan degenerates to the sequential
        // order, coordinate by coordinate.
        let exec = GridExecutor::new(vec![1, 1], vec![2, 3]).unwrap();
        let mut sequential = Vec::new();
        exec.execute(|c| {
            sequential.push(c.to_vec());
            Ok(())
        })
        .unwrap();

        let mut contexts = vec![Vec::new()];
        exec.execute_parallel(&mut contexts, |coord, seen: &mut Vec<Vec<i64>>| {
            seen.push(coord.to_vec());
            Ok(())
        })
        .unwrap();
        assert_eq!(contexts[0], sequential);
    }

    #[test]
    fn test_first_error_propagates_and_halts() {
        let exec = GridExecutor::new(vec![0], vec![9_999]).unwrap();
        let mut contexts = vec![0usize; 4];
        let err = exec
            .execute_parallel(&mut contexts, |coord, processed| {
                if coord[0] == 100 {
                    return Err(Error::callback_msg("bad cell"));
                }
                *processed += 1;
                Ok(())
            })
            .unwrap_err();
        assert!(matches!(err, Error::Callback(_)));

        // The stop flag drops queued work: far fewer cells than the full box.
        let total: usize = contexts.iter().sum();
        assert!(total < 10_000);
    }

    #[test]
    fn test_randomized_bounds_agree_with_sequential() {
        use rand::Rng;
        use rand::SeedableRng;

        let mut rng = rand_xoshiro::Xoshiro256PlusPlus::seed_from_u64(0x5eed);
        for _ in 0..10 {
            let n_dims = rng.random_range(1..=4);
            let mut min = Vec::with_capacity(n_dims);
            let mut max = Vec::with_capacity(n_dims);
            for _ in 0..n_dims {
                let lo = rng.random_range(-3..3);
                min.push(lo);
                max.push(lo + rng.random_range(0..4));
            }
            let exec = GridExecutor::new(min, max).unwrap();
            let expected = sequential_set(&exec);

            let n_workers = rng.random_range(1..=4);
            let mut contexts: Vec<BTreeSet<Vec<i64>>> =
                vec![BTreeSet::new(); n_workers];
            exec.execute_parallel(&mut contexts, |coord, seen| {
                seen.insert(coord.to_vec());
                Ok(())
            })
            .unwrap();

            let union: BTreeSet<Vec<i64>> =
                contexts.into_iter().flatten().collect();
            assert_eq!(union, expected);
        }
    }
}
