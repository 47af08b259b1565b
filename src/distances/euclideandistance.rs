use crate::{DistanceFunction, Primitive, SampleView};
use rayon::prelude::*;

/// Plain euclidean metric.
///
/// Exposes squared norms, so distances can be evaluated as `|a|² + |b|² - 2<a,b>`.
#[derive(Clone, Copy, Debug, Default)]
pub struct EuclideanDistance;

#[inline(always)]
fn dot<T: Primitive>(a: &[T], b: &[T]) -> T {
    a.iter().zip(b.iter())
        .map(|(x, y)| *x * *y)
        .sum()
}

impl<T: Primitive> DistanceFunction<T> for EuclideanDistance {
    #[inline(always)]
    fn squared_distance(&self, a: &[T], b: &[T]) -> T {
        a.iter().zip(b.iter())
            .map(|(x, y)| *x - *y)
            .map(|v| v * v)
            .sum()
    }

    fn squared_norms(&self, samples: SampleView<'_, T>) -> Option<Vec<T>> {
        Some(samples.par_rows().map(|s| dot(s, s)).collect())
    }

    #[inline(always)]
    fn squared_distance_with_norms(&self, a: &[T], b: &[T], a_norm: T, b_norm: T) -> T {
        // cancellation can push the result slightly below zero, NaN has to pass through
        let two = T::one() + T::one();
        let d = a_norm + b_norm - two * dot(a, b);
        if d < T::zero() { T::zero() } else { d }
    }
}
