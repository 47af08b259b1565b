use kcluster::*;

fn main() -> Result<()> {
    env_logger::init();
    let (sample_cnt, sample_dims, k, max_iter) = (20000, 200, 4, 2500);

    // Generate some random data
    let mut samples = vec![0.0f64;sample_cnt * sample_dims];
    samples.iter_mut().for_each(|v| *v = rand::random());

    let conf = KMeansConfig::<f64>::build()
        .seed(42)
        .n_threads(4)
        .center_chosen(&|idx, k| {
            println!("Center {}/{} chosen", idx + 1, k);
            Signal::Continue
        })
        .iteration_done(&|s, nr, new_distsum| {
            println!("Iteration {} - Error: {:.2} -> {:.2} | Improvement: {:.2}",
                nr, s.distsum, new_distsum, s.distsum - new_distsum);
            // stop early, once an iteration gains less than 0.1%
            if s.distsum - new_distsum < s.distsum * 1e-3 { Signal::Cancel } else { Signal::Continue }
        })
        .build();

    let kmean = KMeans::new(&samples, sample_cnt, sample_dims, EuclideanDistance)?;
    let result = kmean.kmeans(k, max_iter, &conf)?;

    println!("Centroids: {:?}", result.centroids);
    println!("Cluster-Assignments: {:?}", result.assignments);
    println!("Error: {}", result.distsum);
    println!("Status: {:?} after {} iterations", result.status, result.iterations);
    Ok(())
}
