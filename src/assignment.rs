use crate::{helpers, memory::*, DistanceFunction, KMeansError, Result};
use rayon::prelude::*;

/// Nearest-centroid assignment of a set of samples.
///
/// ## Fields
/// - **assignments**: Index of the nearest centroid for each sample, in `[0, k)`
/// - **centroid_distances**: Each sample's squared distance to its assigned centroid
#[derive(Clone, Debug, PartialEq)]
pub struct Assignment<T: Primitive> {
    pub assignments: Vec<usize>,
    pub centroid_distances: Vec<T>,
}
impl<T: Primitive> Assignment<T> {
    /// Sum of squared distances of all samples to their assigned centroid.
    pub fn distsum(&self) -> T {
        self.centroid_distances.iter().cloned().sum()
    }
}

pub(crate) fn ensure_finite<T: Primitive>(value: T, what: &str) -> Result<T> {
    if value.is_finite() {
        Ok(value)
    } else {
        Err(KMeansError::NumericError(format!("{} is {}", what, value)))
    }
}

fn ensure_all_finite<T: Primitive>(distances: &[T]) -> Result<()> {
    match distances.par_iter().position_first(|d| !d.is_finite()) {
        Some(idx) => Err(KMeansError::NumericError(
            format!("distance of sample {} to its centroid is {}", idx, distances[idx]))),
        None => Ok(()),
    }
}

fn ensure_same_dims<T: Primitive>(samples: SampleView<'_, T>, centroids: SampleView<'_, T>) -> Result<()> {
    if samples.sample_dims() != centroids.sample_dims() {
        return Err(KMeansError::DimensionMismatch { expected: samples.sample_dims(), got: centroids.sample_dims() });
    }
    Ok(())
}

/// Assign each sample to its nearest centroid. Ties go to the centroid with the lower index.
/// Distances are evaluated directly by the metric, never through the squared-norm shortcut.
/// Runs inside the currently active thread pool.
pub(crate) fn assign<T, D>(samples: SampleView<'_, T>, centroids: SampleView<'_, T>, distance: &D) -> Result<Assignment<T>>
where
    T: Primitive,
    D: DistanceFunction<T>,
{
    let k = centroids.sample_cnt();
    if k == 0 {
        return Err(KMeansError::InvalidArgument("at least one centroid is required".into()));
    }
    ensure_same_dims(samples, centroids)?;
    let (assignments, centroid_distances): (Vec<usize>, Vec<T>) = samples.par_rows()
        .map(|s| {
            let mut best = (0, distance.squared_distance(s, centroids.nth(0)));
            for ci in 1..k {
                let d = distance.squared_distance(s, centroids.nth(ci));
                if d < best.1 {
                    best = (ci, d);
                }
            }
            best
        })
        .unzip();
    ensure_all_finite(&centroid_distances)?;
    Ok(Assignment { assignments, centroid_distances })
}

/// Check a caller-supplied assignment vector against the sample and centroid counts.
pub(crate) fn validate_assignments(assignments: &[usize], sample_cnt: usize, k: usize) -> Result<()> {
    if assignments.len() != sample_cnt {
        return Err(KMeansError::InvalidArgument(format!(
            "{} assignments given for {} samples", assignments.len(), sample_cnt)));
    }
    if let Some((idx, c)) = assignments.iter().enumerate().find(|&(_, &c)| c >= k) {
        return Err(KMeansError::InvalidArgument(format!(
            "sample {} is assigned to centroid {}, but there are only {} centroids", idx, c, k)));
    }
    Ok(())
}

/// Squared distance of each sample to the centroid it is assigned to.
pub(crate) fn assigned_distances<T, D>(samples: SampleView<'_, T>, centroids: SampleView<'_, T>, assignments: &[usize],
            distance: &D) -> Result<Vec<T>>
where
    T: Primitive,
    D: DistanceFunction<T>,
{
    ensure_same_dims(samples, centroids)?;
    let distances: Vec<T> = samples.par_rows()
        .zip(assignments.par_iter().cloned())
        .map(|(s, ci)| distance.squared_distance(s, centroids.nth(ci)))
        .collect();
    ensure_all_finite(&distances)?;
    Ok(distances)
}

/// Total cost of an assignment: the sum of its squared distances.
pub(crate) fn cost<T: Primitive>(centroid_distances: &[T]) -> Result<T> {
    ensure_finite(helpers::par_sum(centroid_distances), "clustering cost")
}

pub(crate) fn cluster_frequencies(assignments: &[usize], k: usize) -> Vec<usize> {
    let mut centroid_frequency = vec![0usize; k];
    assignments.iter().cloned()
        .for_each(|centroid_id| centroid_frequency[centroid_id] += 1);
    centroid_frequency
}
