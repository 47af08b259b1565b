use crate::assignment::ensure_finite;
use crate::distances::distance_matrix;
use crate::{helpers, memory::*, DistanceFunction, KMeans, KMeansConfig, KMeansError, Result, Signal};
use log::debug;
use rand::distributions::Open01;
use rand::prelude::*;
use rand::rngs::StdRng;
use rayon::prelude::*;
use std::cmp::Ordering;

/// Outcome of a seeding run.
/// - **centroids**: The chosen centers [row-major]
/// - **potentials**: Total potential after each chosen center
pub(crate) struct Seeding<T: Primitive> {
    pub centroids: Vec<T>,
    pub potentials: Vec<T>,
}

fn notify<T: Primitive>(config: &KMeansConfig<'_, T>, idx: usize, k: usize) -> Result<()> {
    match (config.center_chosen)(idx, k) {
        Signal::Continue => Ok(()),
        Signal::Cancel => {
            debug!("Seeding cancelled after {} of {} centers", idx + 1, k);
            Err(KMeansError::Cancelled { centers_chosen: idx + 1 })
        }
    }
}

pub(crate) fn calculate<T, D>(kmean: &KMeans<'_, T, D>, k: usize, config: &KMeansConfig<'_, T>) -> Result<Seeding<T>>
where
    T: Primitive,
    D: DistanceFunction<T>,
{
    let samples = kmean.samples;
    let distance = &kmean.distance;
    let (sample_cnt, sample_dims) = (samples.sample_cnt(), samples.sample_dims());
    if k == 0 || k > sample_cnt {
        return Err(KMeansError::InvalidArgument(format!(
            "cannot choose {} centers from {} samples", k, sample_cnt
        )));
    }

    let pool = helpers::thread_pool(config.n_threads)?;
    // All random draws happen on the calling thread, their number only depends on k
    let mut rnd = match config.seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_entropy(),
    };
    let n_trials = helpers::trial_count(k);
    let sample_norms = pool.install(|| distance.squared_norms(samples));
    let sample_norms = sample_norms.as_deref();

    let mut centroids = vec![T::zero(); k * sample_dims];
    let mut potentials = Vec::with_capacity(k);

    // Randomly select first centroid
    let first_idx = rnd.gen_range(0..sample_cnt);
    centroids.set_nth_from_slice(0, sample_dims, samples.nth(first_idx));
    // Squared distance of every sample to its nearest chosen center
    let mut potential = pool.install(|| {
        let first = SampleView::new(samples.nth(first_idx), 1, sample_dims)?;
        distance_matrix(first, samples, None, sample_norms, distance, true)
    })?.into_vec();
    let mut cumsum = vec![T::zero(); sample_cnt];
    let mut total = ensure_finite(helpers::prefix_sum(&potential, &mut cumsum), "seeding potential")?;
    potentials.push(total);
    debug!("Center 1 of {}: sample {} (potential {:e})", k, first_idx, total);
    notify(config, 0, k)?;

    let mut trial_values = vec![T::zero(); n_trials];
    let mut candidate_ids = vec![0usize; n_trials];
    let mut candidate_coords = vec![T::zero(); n_trials * sample_dims];
    for c in 1..k { // For each following centroid...
        // Draw trial values from (0, total), so that only samples with a non-zero potential can be hit
        for t in trial_values.iter_mut() {
            let u: f64 = rnd.sample(Open01);
            *t = total * T::from(u).ok_or_else(|| KMeansError::NumericError(format!("cannot represent {}", u)))?;
        }
        trial_values.sort_by(|a, b| a.partial_cmp(b).unwrap_or(Ordering::Equal));

        // Inverse-CDF lookup. Trial values are sorted, so each search continues where the previous one ended.
        let mut search_start = 0;
        for (i, &value) in trial_values.iter().enumerate() {
            search_start = helpers::lower_bound_from(&cumsum, search_start, value);
            candidate_ids[i] = search_start.min(sample_cnt - 1);
            candidate_coords.set_nth_from_slice(i, sample_dims, samples.nth(candidate_ids[i]));
        }

        // Potential each candidate would leave behind, if chosen
        let (updated, candidate_potentials) = pool.install(|| -> Result<_> {
            let candidates = SampleView::new(&candidate_coords, n_trials, sample_dims)?;
            let mut updated = distance_matrix(candidates, samples, None, sample_norms, distance, true)?;
            updated.as_mut_slice().par_iter_mut().enumerate()
                .for_each(|(idx, d)| {
                    let p = potential[idx % sample_cnt];
                    if p < *d {
                        *d = p;
                    }
                });
            let candidate_potentials: Vec<T> = updated.rows().map(helpers::par_sum).collect();
            Ok((updated, candidate_potentials))
        })?;

        // Best candidate, the first one wins on ties
        let best = (1..n_trials).fold(0, |best, trial| {
            if candidate_potentials[trial] < candidate_potentials[best] { trial } else { best }
        });
        ensure_finite(candidate_potentials[best], "seeding potential")?;

        potential.copy_from_slice(updated.row(best));
        total = helpers::prefix_sum(&potential, &mut cumsum);
        centroids.set_nth_from_slice(c, sample_dims, samples.nth(candidate_ids[best]));
        potentials.push(total);
        debug!("Center {} of {}: sample {} (potential {:e})", c + 1, k, candidate_ids[best], total);
        notify(config, c, k)?;
    }

    Ok(Seeding { centroids, potentials })
}
