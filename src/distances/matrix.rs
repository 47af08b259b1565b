use crate::{helpers, memory::*, DistanceFunction, KMeansError, Result};
use rayon::prelude::*;
use std::borrow::Cow;

/// Dense, row-major matrix of distances between a set of query samples (rows) and a set of
/// reference samples (columns).
#[derive(Clone, Debug, PartialEq)]
pub struct Distances<T: Primitive> {
    n_rows: usize,
    n_cols: usize,
    data: Vec<T>,
}
impl<T: Primitive> Distances<T> {
    #[inline] pub fn n_rows(&self) -> usize { self.n_rows }
    #[inline] pub fn n_cols(&self) -> usize { self.n_cols }
    #[inline] pub fn get(&self, row: usize, col: usize) -> T { self.data[row * self.n_cols + col] }
    #[inline] pub fn row(&self, row: usize) -> &[T] { &self.data[row * self.n_cols..(row + 1) * self.n_cols] }
    pub fn rows(&self) -> impl Iterator<Item = &[T]> { self.data.chunks_exact(self.n_cols.max(1)) }
    pub fn as_slice(&self) -> &[T] { &self.data }
    pub(crate) fn as_mut_slice(&mut self) -> &mut [T] { &mut self.data }
    pub fn into_vec(self) -> Vec<T> { self.data }
}


/// Pairwise squared-distance evaluation between a query and a reference set, using the metric's
/// squared norms whenever they are available for both sides.
pub(crate) struct DistanceKernel<'a, T: Primitive, D: DistanceFunction<T>> {
    distance: &'a D,
    query_norms: Option<Cow<'a, [T]>>,
    reference_norms: Option<Cow<'a, [T]>>,
}
impl<'a, T: Primitive, D: DistanceFunction<T>> DistanceKernel<'a, T, D> {
    pub(crate) fn new(distance: &'a D, query: SampleView<'_, T>, reference: SampleView<'_, T>,
                query_norms: Option<&'a [T]>, reference_norms: Option<&'a [T]>) -> Result<Self> {
        if query.sample_dims() != reference.sample_dims() {
            return Err(KMeansError::DimensionMismatch { expected: reference.sample_dims(), got: query.sample_dims() });
        }
        for (norms, view) in [(query_norms, query), (reference_norms, reference)] {
            if let Some(norms) = norms {
                if norms.len() != view.sample_cnt() {
                    return Err(KMeansError::DimensionMismatch { expected: view.sample_cnt(), got: norms.len() });
                }
            }
        }
        let query_norms = match query_norms {
            Some(norms) => Some(Cow::Borrowed(norms)),
            None => distance.squared_norms(query).map(Cow::Owned),
        };
        let reference_norms = match reference_norms {
            Some(norms) => Some(Cow::Borrowed(norms)),
            None => distance.squared_norms(reference).map(Cow::Owned),
        };
        Ok(Self { distance, query_norms, reference_norms })
    }

    #[inline(always)]
    pub(crate) fn squared(&self, query_idx: usize, q: &[T], reference_idx: usize, r: &[T]) -> T {
        match (&self.query_norms, &self.reference_norms) {
            (Some(qn), Some(rn)) => self.distance.squared_distance_with_norms(q, r, qn[query_idx], rn[reference_idx]),
            _ => self.distance.squared_distance(q, r),
        }
    }
}


/// Fills the distance matrix inside the currently active thread pool.
pub(crate) fn distance_matrix<T, D>(query: SampleView<'_, T>, reference: SampleView<'_, T>,
            query_norms: Option<&[T]>, reference_norms: Option<&[T]>, distance: &D, squared: bool) -> Result<Distances<T>>
where
    T: Primitive,
    D: DistanceFunction<T>,
{
    let kernel = DistanceKernel::new(distance, query, reference, query_norms, reference_norms)?;
    let (n_rows, n_cols) = (query.sample_cnt(), reference.sample_cnt());
    let mut data = vec![T::zero(); n_rows * n_cols];
    if n_cols > 0 {
        // every cell is written by exactly one task
        data.par_iter_mut().enumerate()
            .for_each(|(idx, cell)| {
                let (qi, ri) = (idx / n_cols, idx % n_cols);
                let d = kernel.squared(qi, query.nth(qi), ri, reference.nth(ri));
                *cell = if squared { d } else { d.sqrt() };
            });
    }
    Ok(Distances { n_rows, n_cols, data })
}

/// Compute the dense matrix of distances between every **query** sample (rows) and every
/// **reference** sample (columns).
///
/// ## Arguments
/// - **query_norms** / **reference_norms**: Optionally precomputed results of
///   [`DistanceFunction::squared_norms`] for the respective set; computed on demand otherwise
/// - **distance**: Metric to use
/// - **squared**: Whether to return squared distances
/// - **n_threads**: Amount of worker threads (0 = let rayon decide)
///
/// ## Errors
/// [`KMeansError::DimensionMismatch`] if both sets differ in dimensionality, the metric does not fit their
/// dimensionality, or norms do not match their set.
pub fn compute_distances<T, D>(query: SampleView<'_, T>, reference: SampleView<'_, T>,
            query_norms: Option<&[T]>, reference_norms: Option<&[T]>, distance: &D, squared: bool, n_threads: usize) -> Result<Distances<T>>
where
    T: Primitive,
    D: DistanceFunction<T>,
{
    if query.sample_dims() != reference.sample_dims() {
        return Err(KMeansError::DimensionMismatch { expected: reference.sample_dims(), got: query.sample_dims() });
    }
    distance.validate(query.sample_dims())?;
    helpers::thread_pool(n_threads)?
        .install(|| distance_matrix(query, reference, query_norms, reference_norms, distance, squared))
}
