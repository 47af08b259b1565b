//! End-to-end behaviour of the public API: seeding, assignment, cost and Lloyd refinement.

use kcluster::*;
use rand::prelude::*;
use std::cell::{Cell, RefCell};

fn init_logger() {
    let _ = env_logger::builder().is_test(true).try_init();
}

fn random_samples(seed: u64, sample_cnt: usize, sample_dims: usize) -> Vec<f64> {
    let mut rnd = StdRng::seed_from_u64(seed);
    (0..sample_cnt * sample_dims).map(|_| rnd.gen_range(0.0..10.0)).collect()
}

fn is_sample(samples: &[f64], sample_dims: usize, center: &[f64]) -> bool {
    samples.chunks_exact(sample_dims).any(|s| s == center)
}

#[test]
fn two_separated_clusters_2d() {
    init_logger();
    let samples = vec![0.0f64, 0.0, 1.0, 0.0, 0.0, 1.0, 10.0, 10.0, 11.0, 10.0, 10.0, 11.0];
    let kmean = KMeans::new(&samples, 6, 2, EuclideanDistance).unwrap();

    for seed in 0..20 {
        let conf = KMeansConfig::build().seed(seed).n_threads(2).build();
        let centers = kmean.init_kmeanplusplus(2, &conf).unwrap();
        // one center per cluster
        let near_origin = centers.chunks_exact(2).filter(|c| c[0] < 5.0).count();
        assert_eq!(near_origin, 1, "seed {} picked {:?}", seed, centers);

        let res = kmean.kmeans_lloyd(centers, 100, &conf).unwrap();
        assert_eq!(res.status, Status::Converged);
        assert!(res.iterations <= 3, "needed {} iterations", res.iterations);

        let (a, b) = (res.centroid(0), res.centroid(1));
        let (low, high) = if a[0] < b[0] { (a, b) } else { (b, a) };
        for (v, should) in low.iter().chain(high.iter()).zip([1.0 / 3.0, 1.0 / 3.0, 31.0 / 3.0, 31.0 / 3.0]) {
            assert!((v - should).abs() < 1e-12, "{:?} / {:?}", low, high);
        }
        assert_eq!(res.assignments[0], res.assignments[1]);
        assert_eq!(res.assignments[0], res.assignments[2]);
        assert_eq!(res.assignments[3], res.assignments[4]);
        assert_eq!(res.assignments[3], res.assignments[5]);
        assert_ne!(res.assignments[0], res.assignments[3]);
    }
}

#[test]
fn one_dimensional_refinement() {
    init_logger();
    let samples = vec![0.0f32, 1.0, 2.0, 10.0, 11.0, 12.0];
    let kmean = KMeans::new(&samples, 6, 1, EuclideanDistance).unwrap();
    let res = kmean.kmeans_lloyd(vec![0.0, 12.0], 50, &KMeansConfig::default()).unwrap();

    assert_eq!(res.status, Status::Converged);
    assert!((res.centroids[0] - 1.0).abs() < 1e-6);
    assert!((res.centroids[1] - 11.0).abs() < 1e-6);
    assert_eq!(res.assignments, vec![0, 0, 0, 1, 1, 1]);
    assert_eq!(res.centroid_frequency, vec![3, 3]);
    assert!((res.distsum - 4.0).abs() < 1e-6);
}

#[test]
fn seeding_returns_k_samples() {
    init_logger();
    let (sample_cnt, sample_dims) = (300, 4);
    let samples = random_samples(1, sample_cnt, sample_dims);
    let kmean = KMeans::new(&samples, sample_cnt, sample_dims, EuclideanDistance).unwrap();
    for &k in &[1usize, 3, 10, 64, sample_cnt] {
        let centers = kmean.init_kmeanplusplus(k, &KMeansConfig::build().seed(k as u64).build()).unwrap();
        assert_eq!(centers.len(), k * sample_dims);
        assert!(centers.chunks_exact(sample_dims).all(|c| is_sample(&samples, sample_dims, c)));
    }

    // k == sample_cnt: every sample once, nothing left to gain
    let centers = kmean.init_kmeanplusplus(sample_cnt, &KMeansConfig::build().seed(5).build()).unwrap();
    assert_eq!(kmean.cost(&centers, None, &KMeansConfig::default()).unwrap(), 0.0);
}

#[test]
fn seeding_is_reproducible() {
    init_logger();
    let (sample_cnt, sample_dims, k) = (5000, 3, 12);
    let samples = random_samples(2, sample_cnt, sample_dims);
    let kmean = KMeans::new(&samples, sample_cnt, sample_dims, EuclideanDistance).unwrap();

    let seeded = |n_threads| kmean.init_kmeanplusplus(k, &KMeansConfig::build().random_seed(99).n_threads(n_threads).build()).unwrap();
    let reference = seeded(1);
    for n_threads in [2, 4, 7] {
        assert_eq!(seeded(n_threads), reference);
    }

    // a negative seed draws from system entropy, but still yields valid centers
    let centers = kmean.init_kmeanplusplus(k, &KMeansConfig::build().random_seed(-1).build()).unwrap();
    assert!(centers.chunks_exact(sample_dims).all(|c| is_sample(&samples, sample_dims, c)));
}

#[test]
fn refinement_cost_is_non_increasing() {
    init_logger();
    let (sample_cnt, sample_dims, k, max_iter) = (4000, 5, 10, 30);
    let samples = random_samples(3, sample_cnt, sample_dims);
    let kmean = KMeans::new(&samples, sample_cnt, sample_dims, EuclideanDistance).unwrap();

    let costs = RefCell::new(Vec::new());
    let record = |s: &KMeansState<f64>, nr: usize, new_distsum: f64| {
        costs.borrow_mut().push((nr, s.distsum, new_distsum));
        Signal::Continue
    };
    let conf = KMeansConfig::build().seed(4).n_threads(4).iteration_done(&record).build();
    let res = kmean.kmeans(k, max_iter, &conf).unwrap();

    assert!(res.iterations <= max_iter);
    assert_ne!(res.status, Status::Running);
    if res.status == Status::MaxIterReached {
        assert_eq!(res.iterations, max_iter);
    }
    for (i, &(nr, prev, new)) in costs.borrow().iter().enumerate() {
        assert_eq!(nr, i + 1);
        assert!(new <= prev + 1e-9, "iteration {}: {} -> {}", nr, prev, new);
    }
    let final_cost = kmean.cost(&res.centroids, Some(&res.assignments), &conf).unwrap();
    assert!((final_cost - res.distsum).abs() < 1e-9);
}

#[test]
fn assignments_point_to_nearest_center() {
    init_logger();
    let (sample_cnt, sample_dims, k) = (1000, 3, 7);
    let samples = random_samples(5, sample_cnt, sample_dims);
    let metric = PeriodicEuclideanDistance::cubic(10.0, sample_dims).unwrap();
    let kmean = KMeans::new(&samples, sample_cnt, sample_dims, metric.clone()).unwrap();
    let conf = KMeansConfig::build().seed(6).n_threads(3).build();

    let centers = kmean.init_kmeanplusplus(k, &conf).unwrap();
    let assignment = kmean.assign(&centers, &conf).unwrap();
    assert_eq!(assignment.assignments.len(), sample_cnt);
    for (i, s) in samples.chunks_exact(sample_dims).enumerate() {
        let ci = assignment.assignments[i];
        assert!(ci < k);
        let own = metric.squared_distance(s, &centers[ci * sample_dims..(ci + 1) * sample_dims]);
        assert!((own - assignment.centroid_distances[i]).abs() < 1e-9);
        for c in centers.chunks_exact(sample_dims) {
            assert!(own <= metric.squared_distance(s, c) + 1e-9);
        }
    }
    let cost = kmean.cost(&centers, None, &conf).unwrap();
    assert!((cost - assignment.distsum()).abs() < 1e-9);
}

#[test]
fn empty_cluster_keeps_its_center() {
    init_logger();
    let samples = vec![0.0f64, 0.0, 0.5, 0.0, 1.0, 0.0, 1.5, 0.0];
    let kmean = KMeans::new(&samples, 4, 2, EuclideanDistance).unwrap();
    let res = kmean.kmeans_lloyd(vec![0.0, 0.0, 1.5, 0.0, 500.0, 500.0], 20, &KMeansConfig::default()).unwrap();

    assert_eq!(res.centroid(2), &[500.0, 500.0]);
    assert_eq!(res.centroid_frequency[2], 0);
    assert!(res.centroids.iter().all(|v| v.is_finite()));
    assert!(res.distsum.is_finite());
}

#[test]
fn cancellation() {
    init_logger();
    let (sample_cnt, sample_dims) = (800, 2);
    let samples = random_samples(7, sample_cnt, sample_dims);
    let kmean = KMeans::new(&samples, sample_cnt, sample_dims, EuclideanDistance).unwrap();

    let seen = Cell::new(0);
    let stop_seeding = |idx: usize, _: usize| {
        seen.set(seen.get() + 1);
        if idx == 4 { Signal::Cancel } else { Signal::Continue }
    };
    let conf = KMeansConfig::build().seed(1).center_chosen(&stop_seeding).build();
    match kmean.init_kmeanplusplus(10, &conf) {
        Err(KMeansError::Cancelled { centers_chosen }) => assert_eq!(centers_chosen, 5),
        other => panic!("unexpected result: {:?}", other),
    }
    assert_eq!(seen.get(), 5);

    let stop_refinement = |_: &KMeansState<f64>, _: usize, _: f64| Signal::Cancel;
    let conf = KMeansConfig::build().seed(1).tolerance(0.0).iteration_done(&stop_refinement).build();
    let res = kmean.kmeans(10, 100, &conf).unwrap();
    assert_eq!(res.status, Status::Cancelled);
    assert_eq!(res.iterations, 1);
}

#[test]
fn invalid_arguments() {
    init_logger();
    let samples = vec![0.0f64, 1.0, 2.0, 3.0, 4.0, 5.0];
    let kmean = KMeans::new(&samples, 3, 2, EuclideanDistance).unwrap();
    let conf = KMeansConfig::default();

    assert!(matches!(kmean.init_kmeanplusplus(4, &conf), Err(KMeansError::InvalidArgument(_))));
    assert!(matches!(kmean.init_kmeanplusplus(0, &conf), Err(KMeansError::InvalidArgument(_))));
    assert!(matches!(kmean.kmeans_lloyd(vec![0.0; 5], 10, &conf), Err(KMeansError::InvalidArgument(_))));
    assert!(matches!(kmean.cost(&[0.0, 0.0], Some(&[0, 0][..]), &conf), Err(KMeansError::InvalidArgument(_))));
    assert!(matches!(KMeans::new(&samples, 4, 2, EuclideanDistance), Err(KMeansError::InvalidArgument(_))));

    let metric = PeriodicEuclideanDistance::new(vec![1.0, 1.0, 1.0]).unwrap();
    assert!(matches!(KMeans::new(&samples, 3, 2, metric), Err(KMeansError::DimensionMismatch { .. })));
    assert!(PeriodicEuclideanDistance::new(vec![1.0f64, -2.0]).is_err());
}

#[test]
fn distance_matrix() {
    init_logger();
    let query = vec![0.0f64, 0.0, 3.0, 4.0];
    let reference = vec![0.0f64, 0.0, 6.0, 8.0, 3.0, 0.0];
    let (qv, rv) = (SampleView::from_rows(&query, 2).unwrap(), SampleView::from_rows(&reference, 2).unwrap());

    let dists = compute_distances(qv, rv, None, None, &EuclideanDistance, false, 2).unwrap();
    assert_eq!((dists.n_rows(), dists.n_cols()), (2, 3));
    assert_eq!(dists.row(0), &[0.0, 10.0, 3.0]);
    assert_eq!(dists.row(1), &[5.0, 5.0, 4.0]);

    let squared = compute_distances(qv, rv, None, None, &EuclideanDistance, true, 1).unwrap();
    assert_eq!(squared.get(1, 2), 16.0);
}
