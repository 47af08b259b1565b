use crate::{KMeansError, Result};
use num::{Float, NumCast, Zero};
use rand::distributions::uniform::SampleUniform;
use rayon::prelude::*;
use std::{
    fmt::{Debug, Display, LowerExp},
    iter::Sum,
    ops::{AddAssign, SubAssign},
    slice::ChunksExact,
};

pub trait Primitive: AddAssign + Sum + SubAssign + Zero + Float + NumCast + SampleUniform
                + PartialOrd + Copy + Default + Display + Debug + Sync + Send + LowerExp + 'static
                + for<'a> AddAssign<&'a Self> {}
impl Primitive for f32 {}
impl Primitive for f64 {}


/// Borrowed, row-major view onto a set of samples.
///
/// The view never copies or mutates the underlying buffer. Its lifetime is bound to the caller's
/// buffer, so the engine cannot hold on to the samples once a call returns.
#[derive(Clone, Copy, Debug)]
pub struct SampleView<'a, T: Primitive> {
    data: &'a [T],
    sample_cnt: usize,
    sample_dims: usize,
}
impl<'a, T: Primitive> SampleView<'a, T> {
    /// Create a new view.
    ///
    /// ## Arguments
    /// - **data**: Samples [row-major] = [<sample0>,<sample1>,<sample2>,...]
    /// - **sample_cnt**: Amount of samples contained in **data**
    /// - **sample_dims**: Amount of dimensions of each sample
    pub fn new(data: &'a [T], sample_cnt: usize, sample_dims: usize) -> Result<Self> {
        if sample_dims == 0 {
            return Err(KMeansError::InvalidArgument("samples need at least one dimension".into()));
        }
        if sample_cnt.checked_mul(sample_dims) != Some(data.len()) {
            return Err(KMeansError::InvalidArgument(format!(
                "buffer of length {} cannot hold {} samples with {} dimensions",
                data.len(), sample_cnt, sample_dims
            )));
        }
        Ok(Self { data, sample_cnt, sample_dims })
    }

    /// Create a view from a row-major buffer, deriving the sample count from its length.
    pub fn from_rows(data: &'a [T], sample_dims: usize) -> Result<Self> {
        if sample_dims == 0 || data.len() % sample_dims != 0 {
            return Err(KMeansError::InvalidArgument(format!(
                "buffer of length {} is not a whole number of {}-dimensional samples",
                data.len(), sample_dims
            )));
        }
        Self::new(data, data.len() / sample_dims, sample_dims)
    }

    #[inline] pub fn sample_cnt(&self) -> usize { self.sample_cnt }
    #[inline] pub fn sample_dims(&self) -> usize { self.sample_dims }
    #[inline] pub fn as_slice(&self) -> &'a [T] { self.data }

    #[inline]
    pub fn nth(&self, idx: usize) -> &'a [T] {
        &self.data[idx * self.sample_dims..(idx + 1) * self.sample_dims]
    }

    pub fn rows(&self) -> ChunksExact<'a, T> {
        self.data.chunks_exact(self.sample_dims)
    }

    pub fn par_rows(&self) -> rayon::slice::ChunksExact<'a, T> {
        self.data.par_chunks_exact(self.sample_dims)
    }
}


/// Row-wise write access for row-major centroid buffers.
pub(crate) trait RowsMut<T> {
    fn set_nth_from_slice(&mut self, idx: usize, sample_dims: usize, src: &[T]);
}
impl<T: Copy> RowsMut<T> for [T] {
    #[inline]
    fn set_nth_from_slice(&mut self, idx: usize, sample_dims: usize, src: &[T]) {
        self[idx * sample_dims..(idx + 1) * sample_dims].copy_from_slice(src);
    }
}
