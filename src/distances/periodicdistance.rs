use crate::{DistanceFunction, KMeansError, Primitive, Result};

/// Euclidean metric in an orthorhombic periodic box (minimum-image convention), as used for
/// molecular simulation frames.
///
/// Each coordinate difference is wrapped into `[-L/2, L/2]` of its box length `L` before squaring.
#[derive(Clone, Debug)]
pub struct PeriodicEuclideanDistance<T: Primitive> {
    box_lengths: Vec<T>,
}

impl<T: Primitive> PeriodicEuclideanDistance<T> {
    /// Create a periodic metric with one box length per dimension.
    pub fn new(box_lengths: Vec<T>) -> Result<Self> {
        if box_lengths.is_empty() {
            return Err(KMeansError::InvalidArgument("periodic box needs at least one dimension".into()));
        }
        if let Some(l) = box_lengths.iter().find(|l| !(l.is_finite() && **l > T::zero())) {
            return Err(KMeansError::InvalidArgument(format!("invalid periodic box length: {}", l)));
        }
        Ok(Self { box_lengths })
    }

    /// Cubic box with edge length **length** in **sample_dims** dimensions.
    pub fn cubic(length: T, sample_dims: usize) -> Result<Self> {
        Self::new(vec![length; sample_dims])
    }

    pub fn box_lengths(&self) -> &[T] {
        &self.box_lengths
    }
}

impl<T: Primitive> DistanceFunction<T> for PeriodicEuclideanDistance<T> {
    #[inline(always)]
    fn squared_distance(&self, a: &[T], b: &[T]) -> T {
        a.iter().zip(b.iter()).zip(self.box_lengths.iter())
            .map(|((x, y), l)| {
                let d = *x - *y;
                d - *l * (d / *l).round()
            })
            .map(|v| v * v)
            .sum()
    }

    fn validate(&self, sample_dims: usize) -> Result<()> {
        if self.box_lengths.len() != sample_dims {
            return Err(KMeansError::DimensionMismatch { expected: sample_dims, got: self.box_lengths.len() });
        }
        Ok(())
    }
}


#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn minimum_image() {
        let metric = PeriodicEuclideanDistance::new(vec![10.0f64, 4.0]).unwrap();
        assert_approx_eq!(metric.squared_distance(&[1.0, 0.0], &[9.0, 0.0]), 4.0, 1e-12);
        assert_approx_eq!(metric.squared_distance(&[0.5, 0.5], &[0.5, 3.5]), 1.0, 1e-12);
        assert_approx_eq!(metric.squared_distance(&[1.0, 1.0], &[2.0, 2.0]), 2.0, 1e-12);
        // images further away than one box length are wrapped as well
        assert_approx_eq!(metric.squared_distance(&[0.0, 0.0], &[21.0, 0.0]), 1.0, 1e-12);
        assert_approx_eq!(metric.distance(&[9.0, 3.0], &[1.0, 1.0]), 8.0f64.sqrt(), 1e-12);
    }

    #[test]
    fn symmetric() {
        let metric = PeriodicEuclideanDistance::cubic(3.0f32, 3).unwrap();
        let (a, b) = ([0.2f32, 2.9, 1.4], [2.7f32, 0.1, 1.6]);
        assert_eq!(metric.squared_distance(&a, &b), metric.squared_distance(&b, &a));
        assert!(metric.squared_distance(&a, &b) < 0.6);
    }

    #[test]
    fn rejects_invalid_boxes() {
        assert!(matches!(PeriodicEuclideanDistance::<f64>::new(vec![]), Err(KMeansError::InvalidArgument(_))));
        assert!(matches!(PeriodicEuclideanDistance::new(vec![1.0, 0.0]), Err(KMeansError::InvalidArgument(_))));
        assert!(matches!(PeriodicEuclideanDistance::new(vec![1.0, f64::NAN]), Err(KMeansError::InvalidArgument(_))));
        let metric = PeriodicEuclideanDistance::cubic(2.0f64, 3).unwrap();
        assert!(metric.validate(3).is_ok());
        assert!(matches!(metric.validate(2), Err(KMeansError::DimensionMismatch { expected: 2, got: 3 })));
    }
}
