//! # kcluster - API documentation
//!
//! kcluster is a small rust library for k-means clustering: greedy k-means++ seeding followed by
//! Lloyd refinement, with all distance work spread over a per-call worker pool.
//!
//! ## Design target
//! Its main target is throughput on large, dense sample sets, you will therefore find
//! most of its API-surface rather plain.
//! An example of this is, that samples are given using a borrowed row-major slice, instead of
//! any high-level arithmetics / matrix crate such as nalgebra or ndarray.
//! Results are deterministic for a fixed seed: neither the worker count nor thread scheduling
//! changes the outcome of a calculation.
//!
//! ## Operations
//! - Greedy k-means++ seeding: [`KMeans::init_kmeanplusplus`]
//! - Nearest-centroid assignment: [`KMeans::assign`]
//! - Cost evaluation: [`KMeans::cost`]
//! - Lloyd refinement: [`KMeans::kmeans_lloyd`]
//! - Distance matrices between two point sets: [`compute_distances`]
//!
//! ## Metrics
//! All operations are generic over a [`DistanceFunction`]. Two metrics are built in:
//! - [`EuclideanDistance`]: squared euclidean distance, seeding uses cached squared norms
//! - [`PeriodicEuclideanDistance`]: minimum-image euclidean distance inside a periodic box
//!
//! ## Supported primitive types
//! - [`f32`]
//! - [`f64`]
//!
//! ## Example
//! ```rust
//! use kcluster::*;
//!
//! fn main() -> Result<()> {
//!     let (sample_cnt, sample_dims, k, max_iter) = (20000, 20, 4, 100);
//!
//!     // Generate some random data
//!     let mut samples = vec![0.0f64;sample_cnt * sample_dims];
//!     samples.iter_mut().for_each(|v| *v = rand::random());
//!
//!     // Seed with greedy k-means++, then refine with Lloyd iterations
//!     let kmean = KMeans::new(&samples, sample_cnt, sample_dims, EuclideanDistance)?;
//!     let result = kmean.kmeans(k, max_iter, &KMeansConfig::build().seed(1).build())?;
//!
//!     println!("Centroids: {:?}", result.centroids);
//!     println!("Cluster-Assignments: {:?}", result.assignments);
//!     println!("Error: {}", result.distsum);
//!     Ok(())
//! }
//! ```
//!
//! ## Example (using the status event callbacks)
//! ```rust
//! use kcluster::*;
//!
//! fn main() -> Result<()> {
//!     let (sample_cnt, sample_dims, k, max_iter) = (20000, 20, 4, 2500);
//!
//!     // Generate some random data
//!     let mut samples = vec![0.0f64;sample_cnt * sample_dims];
//!     samples.iter_mut().for_each(|v| *v = rand::random());
//!
//!     let conf = KMeansConfig::<f64>::build()
//!         .center_chosen(&|idx, k| { println!("Center {}/{} chosen", idx + 1, k); Signal::Continue })
//!         .iteration_done(&|s, nr, new_distsum| {
//!             println!("Iteration {} - Error: {:.2} -> {:.2} | Improvement: {:.2}",
//!                 nr, s.distsum, new_distsum, s.distsum - new_distsum);
//!             Signal::Continue
//!         })
//!         .build();
//!
//!     let kmean = KMeans::new(&samples, sample_cnt, sample_dims, EuclideanDistance)?;
//!     let result = kmean.kmeans(k, max_iter, &conf)?;
//!
//!     println!("Status: {:?} after {} iterations", result.status, result.iterations);
//!     Ok(())
//! }
//! ```
//!
//! ## Short API-Overview / Description
//! Entry-point of the library is the [`KMeans`] struct. This struct is generic over the underlying primitive
//! type and the metric that should be used for the calculations. It borrows the sample data for its lifetime;
//! samples are never copied or modified.
//!
//! The [`KMeans`] struct's instance-methods do not mutate it, so multiple runs can be done in parallel
//! (each of them is already parallelized though). Every call builds its own worker pool, sized by
//! [`KMeansConfig`], which is torn down when the call returns. The state (and finally the result) of a
//! refinement is stored in a [`KMeansState`].

#[macro_use] mod helpers;
mod error;
mod memory;
mod distances;
mod assignment;
mod convergence;
mod api;
mod inits;
mod variants;

pub use error::{KMeansError, Result};
pub use memory::{Primitive, SampleView};
pub use distances::{compute_distances, DistanceFunction, Distances, EuclideanDistance, PeriodicEuclideanDistance};
pub use assignment::Assignment;
pub use convergence::ConvergenceCriterion;
pub use api::{
    CenterChosenCallbackFn, EmptyClusterStrategy, IterationDoneCallbackFn, KMeans, KMeansConfig,
    KMeansConfigBuilder, KMeansState, Signal, Status,
};
