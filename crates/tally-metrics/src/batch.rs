//! Bounded, cancellable parallel fan-out.
//!
//! Every component processes independent units (one issue or one project).
//! Units run on the rayon pool and write only their own result; there is no
//! shared mutable state during the parallel phase. A caller-imposed timeout
//! is expressed as `max_units`; cancellation stops new units from starting.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use rayon::prelude::*;
use tally_core::ErrorCode;

/// Limits applied to one batch computation.
#[derive(Debug, Clone, Default)]
pub struct BatchOptions {
    /// Process at most this many units; the rest are skipped with
    /// [`ErrorCode::BatchLimitReached`].
    pub max_units: Option<usize>,
    /// When set to `true`, units that have not started yet are skipped with
    /// [`ErrorCode::Cancelled`].
    pub cancel: Option<Arc<AtomicBool>>,
}

impl BatchOptions {
    #[must_use]
    pub const fn unbounded() -> Self {
        Self {
            max_units: None,
            cancel: None,
        }
    }

    #[must_use]
    pub fn with_max_units(mut self, max_units: usize) -> Self {
        self.max_units = Some(max_units);
        self
    }

    #[must_use]
    pub fn with_cancel(mut self, cancel: Arc<AtomicBool>) -> Self {
        self.cancel = Some(cancel);
        self
    }

    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        self.cancel
            .as_ref()
            .is_some_and(|flag| flag.load(Ordering::Relaxed))
    }
}

/// Run `f` over every admitted unit in parallel.
///
/// The result is aligned with `units`: entry `i` is `Ok(f(&units[i]))` or
/// the reason unit `i` was skipped.
pub fn fan_out<U, T, F>(units: &[U], options: &BatchOptions, f: F) -> Vec<Result<T, ErrorCode>>
where
    U: Sync,
    T: Send,
    F: Fn(&U) -> T + Sync + Send,
{
    let limit = options.max_units.map_or(units.len(), |max| max.min(units.len()));
    let (admitted, overflow) = units.split_at(limit);

    let mut results: Vec<Result<T, ErrorCode>> = admitted
        .par_iter()
        .map(|unit| {
            if options.is_cancelled() {
                Err(ErrorCode::Cancelled)
            } else {
                Ok(f(unit))
            }
        })
        .collect();

    results.extend(overflow.iter().map(|_| Err(ErrorCode::BatchLimitReached)));
    results
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn results_stay_aligned_with_units() {
        let units: Vec<u32> = (0..100).collect();
        let out = fan_out(&units, &BatchOptions::unbounded(), |n| n * 2);
        assert_eq!(out.len(), 100);
        for (idx, result) in out.iter().enumerate() {
            assert_eq!(*result, Ok(u32::try_from(idx).unwrap() * 2));
        }
    }

    #[test]
    fn max_units_skips_the_tail() {
        let units = [1, 2, 3, 4];
        let out = fan_out(&units, &BatchOptions::default().with_max_units(2), |n| *n);
        assert_eq!(
            out,
            vec![
                Ok(1),
                Ok(2),
                Err(ErrorCode::BatchLimitReached),
                Err(ErrorCode::BatchLimitReached)
            ]
        );
    }

    #[test]
    fn cancelled_batch_starts_nothing() {
        let flag = Arc::new(AtomicBool::new(true));
        let units = [1, 2, 3];
        let out = fan_out(&units, &BatchOptions::default().with_cancel(flag), |n| *n);
        assert!(out.iter().all(|r| *r == Err(ErrorCode::Cancelled)));
    }

    #[test]
    fn empty_input_is_empty_output() {
        let units: [u8; 0] = [];
        let out = fan_out(&units, &BatchOptions::default().with_max_units(5), |n| *n);
        assert!(out.is_empty());
    }
}
