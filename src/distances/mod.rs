use crate::{memory::*, Result};

mod euclideandistance;
mod periodicdistance;
mod matrix;

pub use euclideandistance::EuclideanDistance;
pub use periodicdistance::PeriodicEuclideanDistance;
pub use matrix::{compute_distances, Distances};
pub(crate) use matrix::distance_matrix;

/// Metric used to compare samples with each other and with centroids.
///
/// Implementations have to be stateless with respect to the compared points: the distance has to be
/// non-negative, symmetric and deterministic for identical inputs. All of the crate's computations are
/// done on squared distances, the root is only taken when a caller explicitly asks for plain distances.
pub trait DistanceFunction<T: Primitive>: Sync + Send {
    /// Squared distance between the two samples **a** and **b** (both of the same dimensionality).
    fn squared_distance(&self, a: &[T], b: &[T]) -> T;

    /// Distance between the two samples **a** and **b**.
    #[inline(always)]
    fn distance(&self, a: &[T], b: &[T]) -> T {
        self.squared_distance(a, b).sqrt()
    }

    /// Per-sample auxiliary values (squared norms) that speed up repeated distance evaluations.
    /// Metrics without such a shortcut return `None`, which is the default.
    fn squared_norms(&self, _samples: SampleView<'_, T>) -> Option<Vec<T>> {
        None
    }

    /// Squared distance, given the values returned by [`DistanceFunction::squared_norms`] for both samples.
    #[inline(always)]
    fn squared_distance_with_norms(&self, a: &[T], b: &[T], _a_norm: T, _b_norm: T) -> T {
        self.squared_distance(a, b)
    }

    /// Check that the metric can be used with samples of **sample_dims** dimensions.
    fn validate(&self, _sample_dims: usize) -> Result<()> {
        Ok(())
    }
}
