use crate::{assignment, helpers, memory::*, Assignment, DistanceFunction, EmptyClusterStrategy, KMeans, KMeansConfig, KMeansState, Result, Signal, Status};
use log::{debug, info, warn};
use rayon::prelude::*;
use std::cmp::Ordering;

pub(crate) struct Lloyd<T, D> where T: Primitive, D: DistanceFunction<T> {
	_p: std::marker::PhantomData<(T, D)>
}
impl<T, D> Lloyd<T, D> where T: Primitive, D: DistanceFunction<T> {
    /// Sum up all samples of each cluster. Partial sums of fixed-size sample blocks are combined in block order.
    fn cluster_sums(samples: SampleView<'_, T>, assignments: &[usize], k: usize) -> (Vec<T>, Vec<usize>) {
        let sample_dims = samples.sample_dims();
        samples.as_slice().par_chunks(helpers::REDUCTION_CHUNK * sample_dims)
            .zip(assignments.par_chunks(helpers::REDUCTION_CHUNK))
            .map(|(block, block_assignments)| {
                let mut sums = vec![T::zero(); k * sample_dims];
                let mut centroid_frequency = vec![0usize; k];
                block.chunks_exact(sample_dims)
                    .zip(block_assignments.iter().cloned())
                    .for_each(|(s, centroid_id)| {
                        centroid_frequency[centroid_id] += 1;
                        sums[centroid_id * sample_dims..(centroid_id + 1) * sample_dims].iter_mut()
                            .zip(s.iter())
                            .for_each(|(c, v)| *c += v);
                    });
                (sums, centroid_frequency)
            })
            .collect::<Vec<_>>()
            .into_iter()
            .fold((vec![T::zero(); k * sample_dims], vec![0usize; k]), |(mut sums, mut freq), (block_sums, block_freq)| {
                sums.iter_mut().zip(block_sums.iter()).for_each(|(s, b)| *s += b);
                freq.iter_mut().zip(block_freq.iter()).for_each(|(f, b)| *f += b);
                (sums, freq)
            })
    }

    /// Move the samples farthest from their centroid into empty clusters, as long as their own cluster keeps
    /// at least one sample. `new_centroids` holds per-cluster sums and is updated accordingly.
    fn steal_farthest(samples: SampleView<'_, T>, state: &mut KMeansState<T>, new_centroids: &mut [T]) {
        let sample_dims = samples.sample_dims();
        let mut distance_sorted_samples: Vec<usize> = (0..samples.sample_cnt()).collect();
        distance_sorted_samples.sort_by(
            |&i1, &i2| state.centroid_distances[i1].partial_cmp(&state.centroid_distances[i2]).unwrap_or(Ordering::Equal));

        for i in 0..state.k {
            if state.centroid_frequency[i] != 0 {
                continue;
            }
            // Find the sample with the highest distance to its centroid, that is not alone in its cluster
            let donor = distance_sorted_samples.iter().rev().cloned()
                .find(|&sample_id| state.centroid_frequency[state.assignments[sample_id]] > 1);
            let Some(sample_id) = donor else {
                warn!("No sample left to move into empty cluster {}, keeping its centroid", i);
                continue;
            };
            let prev_centroid_id = state.assignments[sample_id];
            // Re-Assign found sample to centroid without any samples
            state.centroid_frequency[prev_centroid_id] -= 1;
            state.centroid_frequency[i] += 1;
            // Centroid is moved into the chosen point -> the points centroid distance is 0
            state.centroid_distances[sample_id] = T::zero();
            // Subtract chosen sample from its previous centroid's sum
            new_centroids[prev_centroid_id * sample_dims..(prev_centroid_id + 1) * sample_dims].iter_mut()
                .zip(samples.nth(sample_id).iter())
                .for_each(|(cv, sv)| { *cv -= *sv; });
            // Chosen sample is single point in cluster -> set cluster's sum to chosen point
            new_centroids.set_nth_from_slice(i, sample_dims, samples.nth(sample_id));
            state.assignments[sample_id] = i;
            debug!("Moved sample {} from cluster {} into empty cluster {}", sample_id, prev_centroid_id, i);
        }
    }

    /// Replace each centroid by the mean of its assigned samples.
    fn update_centroids(pool: &rayon::ThreadPool, samples: SampleView<'_, T>, state: &mut KMeansState<T>, empty_clusters: EmptyClusterStrategy) {
        let sample_dims = samples.sample_dims();
        let (k, assignments) = (state.k, &state.assignments);
        let (mut new_centroids, centroid_frequency) = pool.install(|| Self::cluster_sums(samples, assignments, k));
        state.centroid_frequency = centroid_frequency;

        let empty_cnt = state.centroid_frequency.iter().filter(|&&f| f == 0).count();
        if empty_cnt > 0 {
            warn!("{} of {} clusters without samples ({:?})", empty_cnt, k, empty_clusters);
            if empty_clusters == EmptyClusterStrategy::StealFarthest {
                Self::steal_farthest(samples, state, &mut new_centroids);
            }
        }

        // Calculate new centroids from the cluster sums, empty clusters keep their previous centroid
        state.centroids.chunks_exact_mut(sample_dims)
            .zip(new_centroids.chunks_exact(sample_dims))
            .zip(state.centroid_frequency.iter().cloned())
            .filter(|(_, cfreq)| *cfreq > 0)
            .for_each(|((c, nc), cfreq)| {
                let cfreq = T::from(cfreq).unwrap_or_else(T::infinity);
                c.iter_mut().zip(nc.iter()).for_each(|(c, nc)| *c = *nc / cfreq);
            });
    }

    /// Assign all samples to the current centroids and evaluate the resulting cost.
    fn evaluate(pool: &rayon::ThreadPool, kmean: &KMeans<'_, T, D>, centroids: &[T]) -> Result<(Assignment<T>, T)> {
        let centroids = SampleView::from_rows(centroids, kmean.sample_dims())?;
        pool.install(|| {
            let assignment = assignment::assign(kmean.samples, centroids, &kmean.distance)?;
            let cost = assignment::cost(&assignment.centroid_distances)?;
            Ok((assignment, cost))
        })
    }

    pub fn calculate(kmean: &KMeans<'_, T, D>, centroids: Vec<T>, max_iter: usize, config: &KMeansConfig<'_, T>) -> Result<KMeansState<T>> {
        kmean.centroid_view(&centroids)?;
        let pool = helpers::thread_pool(config.n_threads)?;
        let samples = kmean.samples;

        let mut state = KMeansState::new(samples.sample_cnt(), samples.sample_dims(), centroids);

        // The assignment to the initial centroids is the first iteration's assignment step, its cost is the
        // reference for the first convergence check.
        let (initial, initial_distsum) = Self::evaluate(&pool, kmean, &state.centroids)?;
        state.apply_assignment(initial);
        state.distsum = initial_distsum;
        let mut convergence = config.convergence.create_logic(initial_distsum);
        debug!("Initial cost: {:e}", initial_distsum);

        for i in 1..=max_iter {
            Self::update_centroids(&pool, samples, &mut state, config.empty_clusters);
            let (assignment, new_distsum) = Self::evaluate(&pool, kmean, &state.centroids)?;
            state.apply_assignment(assignment);
            state.iterations = i;
            debug!("Iteration {} - cost: {:e} -> {:e}", i, state.distsum, new_distsum);

            if convergence.converged(new_distsum) {
                state.distsum = new_distsum;
                state.status = Status::Converged;
                break;
            }
            // Notify subscriber about finished iteration
            let signal = (config.iteration_done)(&state, i, new_distsum);
            state.distsum = new_distsum;
            if signal == Signal::Cancel {
                state.status = Status::Cancelled;
                break;
            }
        }
        if state.status == Status::Running {
            state.status = Status::MaxIterReached;
        }
        state.centroid_frequency = assignment::cluster_frequencies(&state.assignments, state.k);

        info!("Lloyd refinement finished: {:?} after {} iteration(s), cost {:e}", state.status, state.iterations, state.distsum);
        Ok(state)
    }
}
