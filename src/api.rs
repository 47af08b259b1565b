use crate::{assignment, helpers, memory::*, Assignment, ConvergenceCriterion, DistanceFunction, KMeansError, Result};

/// Answer of a progress callback: whether the running calculation may go on.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Signal {
    Continue,
    Cancel,
}

/// Terminal (or, while iterating, current) status of a refinement.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Status {
    Running,
    /// The convergence criterion was met.
    Converged,
    /// `max_iter` iterations ran without meeting the convergence criterion.
    MaxIterReached,
    /// The `iteration_done` callback asked to stop.
    Cancelled,
}

/// Strategy for clusters that lose all of their samples during a refinement iteration.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum EmptyClusterStrategy {
    /// The centroid of an empty cluster stays where it was.
    #[default]
    KeepPrevious,
    /// The sample farthest away from its centroid (taken from a cluster that keeps at least one sample)
    /// is moved into the empty cluster and becomes its centroid.
    StealFarthest,
}

pub type CenterChosenCallbackFn<'a> = &'a dyn Fn(usize, usize) -> Signal;
pub type IterationDoneCallbackFn<'a, T> = &'a dyn Fn(&KMeansState<T>, usize, T) -> Signal;

/// This is a structure holding various configuration options for k-means calculations, such as
/// the worker count, the random seed, or a couple of callbacks, that can be set to get status information from
/// (and to cancel) a running k-means calculation.
///
/// For a more detailed information about all possible options, have a look at [`KMeansConfigBuilder`].
pub struct KMeansConfig<'a, T: Primitive> {
    /// Callback that is called each time the seeding picked a center
    /// ## Arguments
    /// - **idx**: Index of the center that was just chosen
    /// - **k**: Total amount of centers to choose
    pub(crate) center_chosen: CenterChosenCallbackFn<'a>,
    /// Callback that is called after each refinement iteration that did not converge
    /// ## Arguments
    /// - **state**: Current [`KMeansState`] after the iteration
    /// - **iteration_id**: Number of the current iteration
    /// - **distsum**: New distance sum (**state** contains the distsum from the previous iteration)
    pub(crate) iteration_done: IterationDoneCallbackFn<'a, T>,
    /// Amount of worker threads for each parallel region (0 = let rayon decide)
    pub(crate) n_threads: usize,
    /// Seed of the random number generator; `None` seeds from system entropy
    pub(crate) seed: Option<u64>,
    /// The convergence criterion to use for refinements
    pub(crate) convergence: ConvergenceCriterion<T>,
    /// How to handle clusters without samples during refinements
    pub(crate) empty_clusters: EmptyClusterStrategy,
}
impl<'a, T: Primitive> Default for KMeansConfig<'a, T> {
    fn default() -> Self {
        Self {
            center_chosen: &|_, _| Signal::Continue,
            iteration_done: &|_, _, _| Signal::Continue,
            n_threads: 0,
            seed: None,
            convergence: ConvergenceCriterion::default(),
            empty_clusters: EmptyClusterStrategy::default(),
        }
    }
}
impl<'a, T: Primitive> KMeansConfig<'a, T> {
    /// Use the [`KMeansConfigBuilder`] to build a [`KMeansConfig`] instance.
    pub fn build() -> KMeansConfigBuilder<'a, T> {
        KMeansConfigBuilder { config: KMeansConfig::default() }
    }
    pub fn n_threads(&self) -> usize { self.n_threads }
    pub fn seed(&self) -> Option<u64> { self.seed }
    pub fn convergence(&self) -> ConvergenceCriterion<T> { self.convergence }
    pub fn empty_clusters(&self) -> EmptyClusterStrategy { self.empty_clusters }
}
impl<'a, T: Primitive> std::fmt::Debug for KMeansConfig<'a, T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("KMeansConfig")
            .field("n_threads", &self.n_threads)
            .field("seed", &self.seed)
            .field("convergence", &self.convergence)
            .field("empty_clusters", &self.empty_clusters)
            .finish_non_exhaustive()
    }
}

pub struct KMeansConfigBuilder<'a, T: Primitive> {
    config: KMeansConfig<'a, T>
}
impl<'a, T: Primitive> KMeansConfigBuilder<'a, T> {
    /// Set the callback that should be called each time the seeding chose a center.
    /// Returning [`Signal::Cancel`] stops the seeding with [`KMeansError::Cancelled`].
    pub fn center_chosen(mut self, center_chosen: CenterChosenCallbackFn<'a>) -> Self {
        self.config.center_chosen = center_chosen; self
    }
    /// Set the callback that should be called after each iteration during a running refinement.
    /// Returning [`Signal::Cancel`] stops the refinement with [`Status::Cancelled`].
    pub fn iteration_done(mut self, iteration_done: IterationDoneCallbackFn<'a, T>) -> Self {
        self.config.iteration_done = iteration_done; self
    }
    /// Set the amount of worker threads. The workers only live for the duration of a single call.
    /// ## Default
    /// `0` (let rayon decide)
    pub fn n_threads(mut self, n_threads: usize) -> Self {
        self.config.n_threads = n_threads; self
    }
    /// Use a deterministic random number generator seeded with **seed**. Seeding results are then
    /// repeatable, independent of the worker count.
    pub fn seed(mut self, seed: u64) -> Self {
        self.config.seed = Some(seed); self
    }
    /// Signed variant of [`KMeansConfigBuilder::seed`]: negative values select an entropy-seeded generator.
    pub fn random_seed(mut self, seed: i64) -> Self {
        self.config.seed = u64::try_from(seed).ok(); self
    }
    /// Shorthand for [`ConvergenceCriterion::CostDelta`] with the given **tolerance**.
    /// ## Default
    /// `1e-5`
    pub fn tolerance(mut self, tolerance: T) -> Self {
        self.config.convergence = ConvergenceCriterion::CostDelta { tolerance }; self
    }
    /// Set the convergence criterion to use during a running refinement. For more information,
    /// see documentation of [`ConvergenceCriterion`].
    pub fn convergence(mut self, convergence: ConvergenceCriterion<T>) -> Self {
        self.config.convergence = convergence; self
    }
    /// Set the strategy for clusters without samples.
    /// ## Default
    /// [`EmptyClusterStrategy::KeepPrevious`]
    pub fn empty_clusters(mut self, empty_clusters: EmptyClusterStrategy) -> Self {
        self.config.empty_clusters = empty_clusters; self
    }
    /// Return the internally built configuration structure.
    pub fn build(self) -> KMeansConfig<'a, T> { self.config }
}


/// This is the data-structure storing the current state during a refinement, as
/// well as the final result, as returned by the API.
///
/// ## Generics
/// - **T**: Underlying primitive type that was used for the calculation
///
/// ## Fields
/// - **k**: The amount of clusters
/// - **distsum**: The total sum of squared distances from all samples to their respective centroids (cost)
/// - **centroids**: Calculated cluster centers [row-major] = [<centroid0>,<centroid1>,<centroid2>,...]
/// - **centroid_frequency**: Amount of samples in each centroid
/// - **assignments**: Vector mapping each sample to its respective nearest cluster
/// - **centroid_distances**: Vector containing each sample's squared distance to its centroid
/// - **iterations**: Amount of iterations that were executed
/// - **status**: Why the refinement stopped
#[derive(Clone, Debug)]
pub struct KMeansState<T: Primitive> {
    pub k: usize,
    pub distsum: T,
    pub centroids: Vec<T>,
    pub centroid_frequency: Vec<usize>,
    pub assignments: Vec<usize>,
    pub centroid_distances: Vec<T>,
    pub iterations: usize,
    pub status: Status,

    pub(crate) sample_dims: usize
}
impl<T: Primitive> KMeansState<T> {
    pub(crate) fn new(sample_cnt: usize, sample_dims: usize, centroids: Vec<T>) -> Self {
        let k = centroids.len() / sample_dims;
        Self {
            k,
            distsum: T::infinity(),
            centroids,
            centroid_frequency: vec![0usize;k],
            assignments: vec![0usize;sample_cnt],
            centroid_distances: vec![T::infinity();sample_cnt],
            iterations: 0,
            status: Status::Running,
            sample_dims
        }
    }

    pub(crate) fn apply_assignment(&mut self, assignment: Assignment<T>) {
        self.assignments = assignment.assignments;
        self.centroid_distances = assignment.centroid_distances;
    }

    pub fn sample_dims(&self) -> usize { self.sample_dims }

    pub fn centroid(&self, idx: usize) -> &[T] {
        &self.centroids[idx * self.sample_dims..(idx + 1) * self.sample_dims]
    }
}




/// Entrypoint of this crate's API-Surface.
///
/// Create an instance of this struct, giving the samples you want to operate on and the metric to use.
/// The samples are only borrowed; the primitive type of the passed samples will be the type used internally
/// for all calculations, as well as the result as stored in the returned [`KMeansState`] structure.
///
/// ## Operations
/// - Greedy k-means++ seeding [`KMeans::init_kmeanplusplus`]
/// - Nearest-centroid assignment [`KMeans::assign`]
/// - Cost evaluation [`KMeans::cost`]
/// - Lloyd refinement [`KMeans::kmeans_lloyd`]
/// - Seeding followed by refinement [`KMeans::kmeans`]
pub struct KMeans<'a, T: Primitive, D: DistanceFunction<T>> {
    pub(crate) samples: SampleView<'a, T>,
    pub(crate) distance: D,
}
impl<'a, T: Primitive, D: DistanceFunction<T>> KMeans<'a, T, D> {
    /// Create a new instance of the [`KMeans`] structure.
    ///
    /// ## Arguments
    /// - **samples**: Samples [row-major] = [<sample0>,<sample1>,<sample2>,...]
    /// - **sample_cnt**: Amount of samples, contained in the passed **samples** slice
    /// - **sample_dims**: Amount of dimensions each sample from the **samples** slice has
    /// - **distance**: Metric to use for all calculations
    pub fn new(samples: &'a [T], sample_cnt: usize, sample_dims: usize, distance: D) -> Result<Self> {
        Self::from_view(SampleView::new(samples, sample_cnt, sample_dims)?, distance)
    }

    /// Create a new instance of the [`KMeans`] structure from an existing [`SampleView`].
    pub fn from_view(samples: SampleView<'a, T>, distance: D) -> Result<Self> {
        if samples.sample_cnt() == 0 {
            return Err(KMeansError::InvalidArgument("no samples given".into()));
        }
        distance.validate(samples.sample_dims())?;
        Ok(Self { samples, distance })
    }

    pub fn sample_cnt(&self) -> usize { self.samples.sample_cnt() }
    pub fn sample_dims(&self) -> usize { self.samples.sample_dims() }
    pub fn samples(&self) -> SampleView<'a, T> { self.samples }
    pub fn distance(&self) -> &D { &self.distance }

    pub(crate) fn centroid_view<'c>(&self, centroids: &'c [T]) -> Result<SampleView<'c, T>> {
        if centroids.is_empty() {
            return Err(KMeansError::InvalidArgument("at least one centroid is required".into()));
        }
        if centroids.len() % self.sample_dims() != 0 {
            return Err(KMeansError::InvalidArgument(format!(
                "centroid buffer of length {} does not hold {}-dimensional centroids",
                centroids.len(), self.sample_dims()
            )));
        }
        SampleView::from_rows(centroids, self.sample_dims())
    }

    /// Assign each sample to its nearest centroid.
    ///
    /// ## Arguments
    /// - **centroids**: Centroids [row-major], with the dimensionality of the samples
    /// - **config**: [`KMeansConfig`] instance; only the worker count is used
    ///
    /// ## Returns
    /// The [`Assignment`] (centroid index and squared distance per sample).
    pub fn assign(&self, centroids: &[T], config: &KMeansConfig<'_, T>) -> Result<Assignment<T>> {
        let centroids = self.centroid_view(centroids)?;
        let (samples, distance) = (self.samples, &self.distance);
        helpers::thread_pool(config.n_threads)?
            .install(|| assignment::assign(samples, centroids, distance))
    }

    /// Sum of squared distances of all samples to their nearest centroid.
    ///
    /// ## Arguments
    /// - **centroids**: Centroids [row-major], with the dimensionality of the samples
    /// - **assignments**: Optional, already known assignments of the samples (e.g. from [`KMeans::assign`]).
    ///   The nearest centroids are searched when none are given.
    /// - **config**: [`KMeansConfig`] instance; only the worker count is used
    pub fn cost(&self, centroids: &[T], assignments: Option<&[usize]>, config: &KMeansConfig<'_, T>) -> Result<T> {
        let centroids = self.centroid_view(centroids)?;
        if let Some(assignments) = assignments {
            assignment::validate_assignments(assignments, self.sample_cnt(), centroids.sample_cnt())?;
        }
        let (samples, distance) = (self.samples, &self.distance);
        helpers::thread_pool(config.n_threads)?
            .install(|| {
                let centroid_distances = match assignments {
                    Some(assignments) => assignment::assigned_distances(samples, centroids, assignments, distance)?,
                    None => assignment::assign(samples, centroids, distance)?.centroid_distances,
                };
                assignment::cost(&centroid_distances)
            })
    }

    /// Greedy k-means++ seeding.
    ///
    /// ## Description
    /// The first center is a uniformly drawn sample. Each following center is chosen among
    /// `floor(2 + ln(k))` candidates, that are drawn with a probability proportional to their squared distance
    /// to the nearest center chosen so far (D²-sampling). The candidate leading to the smallest overall
    /// potential (sum of squared distances to the nearest center) wins; on ties the earlier drawn candidate.
    ///
    /// ## Arguments
    /// - **k**: Amount of centers to choose (`1 <= k <= sample_cnt`)
    /// - **config**: [`KMeansConfig`] instance; worker count, seed and the `center_chosen` callback are used
    ///
    /// ## Returns
    /// The **k** chosen centers [row-major], each a copy of one of the samples.
    /// When `center_chosen` returns [`Signal::Cancel`], seeding stops with
    /// [`KMeansError::Cancelled`] carrying the number of centers chosen so far; no partial centers are returned.
    ///
    /// ## Example
    /// ```rust
    /// use kcluster::*;
    ///
    /// let samples = vec![0.0f64, 0.1, 0.2, 10.0, 10.1, 10.2];
    /// let kmean = KMeans::new(&samples, 6, 1, EuclideanDistance).unwrap();
    /// let conf = KMeansConfig::build().seed(42).n_threads(2).build();
    /// let centers = kmean.init_kmeanplusplus(2, &conf).unwrap();
    /// assert_eq!(centers.len(), 2);
    /// ```
    pub fn init_kmeanplusplus(&self, k: usize, config: &KMeansConfig<'_, T>) -> Result<Vec<T>> {
        crate::inits::kmeanplusplus::calculate(self, k, config).map(|seeding| seeding.centroids)
    }

    /// Normal K-Means algorithm implementation (Lloyd), refining the given centroids.
    ///
    /// ## Arguments
    /// - **centroids**: Initial centroids [row-major], e.g. from [`KMeans::init_kmeanplusplus`]
    /// - **max_iter**: Limit the maximum amount of iterations
    /// - **config**: [`KMeansConfig`] instance, containing several configuration options for the calculation.
    ///
    /// ## Returns
    /// Instance of [`KMeansState`], containing the final state (result). A cancelled refinement is not an
    /// error, it is reported via [`Status::Cancelled`].
    ///
    /// ## Example
    /// ```rust
    /// use kcluster::*;
    ///
    /// let samples = vec![0.0f64, 1.0, 2.0, 10.0, 11.0, 12.0];
    /// let kmean = KMeans::new(&samples, 6, 1, EuclideanDistance).unwrap();
    /// let result = kmean.kmeans_lloyd(vec![0.0, 2.0], 100, &KMeansConfig::default()).unwrap();
    ///
    /// assert_eq!(result.status, Status::Converged);
    /// assert_eq!(result.centroids, vec![1.0, 11.0]);
    /// assert_eq!(result.assignments, vec![0, 0, 0, 1, 1, 1]);
    /// ```
    pub fn kmeans_lloyd(&self, centroids: Vec<T>, max_iter: usize, config: &KMeansConfig<'_, T>) -> Result<KMeansState<T>> {
        crate::variants::Lloyd::calculate(self, centroids, max_iter, config)
    }

    /// Seed **k** centers with [`KMeans::init_kmeanplusplus`] and refine them with [`KMeans::kmeans_lloyd`].
    ///
    /// ## Example
    /// ```rust
    /// use kcluster::*;
    ///
    /// let (sample_cnt, sample_dims, k, max_iter) = (2000, 8, 4, 100);
    ///
    /// // Generate some random data
    /// let mut samples = vec![0.0f64;sample_cnt * sample_dims];
    /// samples.iter_mut().for_each(|v| *v = rand::random());
    ///
    /// let kmean = KMeans::new(&samples, sample_cnt, sample_dims, EuclideanDistance).unwrap();
    /// let result = kmean.kmeans(k, max_iter, &KMeansConfig::build().seed(7).build()).unwrap();
    ///
    /// println!("Centroids: {:?}", result.centroids);
    /// println!("Cluster-Assignments: {:?}", result.assignments);
    /// println!("Error: {}", result.distsum);
    /// ```
    pub fn kmeans(&self, k: usize, max_iter: usize, config: &KMeansConfig<'_, T>) -> Result<KMeansState<T>> {
        let centroids = self.init_kmeanplusplus(k, config)?;
        self.kmeans_lloyd(centroids, max_iter, config)
    }
}


#[cfg(test)]
mod tests {
    use super::*;
    use crate::{EuclideanDistance, PeriodicEuclideanDistance};

    #[test]
    fn construction_validates_input() {
        let samples = vec![0.0f64; 6];
        assert!(KMeans::new(&samples, 3, 2, EuclideanDistance).is_ok());
        assert!(matches!(KMeans::new(&samples, 2, 2, EuclideanDistance), Err(KMeansError::InvalidArgument(_))));
        assert!(matches!(KMeans::new(&samples[..0], 0, 2, EuclideanDistance), Err(KMeansError::InvalidArgument(_))));
        let metric = PeriodicEuclideanDistance::cubic(1.0, 3).unwrap();
        assert!(matches!(KMeans::new(&samples, 3, 2, metric), Err(KMeansError::DimensionMismatch { expected: 2, got: 3 })));
    }

    #[test]
    fn config_builder() {
        let conf = KMeansConfig::<f64>::build()
            .n_threads(3)
            .random_seed(-1)
            .tolerance(0.5)
            .empty_clusters(EmptyClusterStrategy::StealFarthest)
            .build();
        assert_eq!(conf.n_threads(), 3);
        assert_eq!(conf.seed(), None);
        assert_eq!(conf.convergence(), ConvergenceCriterion::CostDelta { tolerance: 0.5 });
        assert_eq!(conf.empty_clusters(), EmptyClusterStrategy::StealFarthest);
        assert_eq!(KMeansConfig::<f32>::build().random_seed(12).build().seed(), Some(12));
        assert_eq!((KMeansConfig::<f32>::default().center_chosen)(0, 1), Signal::Continue);
    }

    #[test]
    fn assign_and_cost() {
        let samples = vec![0.0f64, 0.0, 1.0, 0.0, 9.0, 1.0, 10.0, 1.0];
        let kmean = KMeans::new(&samples, 4, 2, EuclideanDistance).unwrap();
        let conf = KMeansConfig::build().n_threads(2).build();
        let centroids = vec![0.5, 0.0, 9.5, 1.0];

        let assignment = kmean.assign(&centroids, &conf).unwrap();
        assert_eq!(assignment.assignments, vec![0, 0, 1, 1]);
        assert_eq!(assignment.distsum(), 1.0);

        assert_eq!(kmean.cost(&centroids, None, &conf).unwrap(), 1.0);
        assert_eq!(kmean.cost(&centroids, Some(&assignment.assignments), &conf).unwrap(), 1.0);
        // a deliberately bad assignment is evaluated as given
        assert_eq!(kmean.cost(&centroids, Some(&[1, 0, 1, 1][..]), &conf).unwrap(), 91.25 + 0.25 + 0.25 + 0.25);

        assert!(matches!(kmean.cost(&centroids, Some(&[0, 2, 1, 1][..]), &conf), Err(KMeansError::InvalidArgument(_))));
        assert!(matches!(kmean.assign(&centroids[..3], &conf), Err(KMeansError::InvalidArgument(_))));
        assert!(matches!(kmean.assign(&[], &conf), Err(KMeansError::InvalidArgument(_))));
    }
}
