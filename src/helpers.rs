use crate::{memory::Primitive, Result};
use rayon::prelude::*;

/// Amount of values each parallel reduction task sums up sequentially. Partial sums are combined
/// in chunk order, which keeps every reduction independent of the worker count.
pub(crate) const REDUCTION_CHUNK: usize = 4096;

/// Build the worker pool used for the parallel regions of a single call.
/// `n_threads == 0` lets rayon pick the worker count.
pub(crate) fn thread_pool(n_threads: usize) -> Result<rayon::ThreadPool> {
    Ok(rayon::ThreadPoolBuilder::new()
        .num_threads(n_threads)
        .thread_name(|idx| format!("kcluster-worker-{}", idx))
        .build()?)
}

pub(crate) fn par_sum<T: Primitive>(values: &[T]) -> T {
    values.par_chunks(REDUCTION_CHUNK)
        .map(|chunk| chunk.iter().cloned().sum::<T>())
        .collect::<Vec<T>>()
        .into_iter()
        .sum()
}

/// Write the running sum of **values** into **cumsum**; returns the total.
pub(crate) fn prefix_sum<T: Primitive>(values: &[T], cumsum: &mut [T]) -> T {
    let mut acc = T::zero();
    values.iter().zip(cumsum.iter_mut())
        .for_each(|(v, c)| {
            acc += v;
            *c = acc;
        });
    acc
}

/// Index of the first element in `cumsum[start..]` that is `>= value` (relative to the
/// full slice), or `cumsum.len()` if there is none.
pub(crate) fn lower_bound_from<T: Primitive>(cumsum: &[T], start: usize, value: T) -> usize {
    start + cumsum[start..].partition_point(|&c| c < value)
}

/// Number of candidates evaluated for each greedily chosen center: `floor(2 + ln(k))`.
pub(crate) fn trial_count(k: usize) -> usize {
    (2.0 + (k as f64).ln()).floor() as usize
}

#[cfg(test)]
macro_rules! assert_approx_eq {
	($left: expr, $right: expr, $tol: expr) => ({
		match ($left, $right, $tol) {
			(left_val , right_val, tol_val) => {
				let delta = (left_val - right_val).abs();
				if !(delta < tol_val) {
					panic!(
						"assertion failed: `(left ≈ right)` \
						(left: `{}`, right: `{}`) \
						with ∆={:1.1e} (allowed ∆={:e})",
						left_val , right_val, delta, tol_val
					)
				}
			}
		}
	});
	($left: expr, $right: expr) => (assert_approx_eq!(($left), ($right), 1e-15))
}
