use kcluster::*;

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let (sample_cnt, sample_dims, k, max_iter) = (20000, 200, 4, 100);

    // Generate some random data
    let mut samples = vec![0.0f64;sample_cnt * sample_dims];
    samples.iter_mut().for_each(|v| *v = rand::random());

    // Seed with greedy k-means++, then refine with Lloyd iterations
    let kmean = KMeans::new(&samples, sample_cnt, sample_dims, EuclideanDistance)?;
    let centroids = kmean.init_kmeanplusplus(k, &KMeansConfig::default())?;
    let result = kmean.kmeans_lloyd(centroids, max_iter, &KMeansConfig::default())?;

    println!("Centroids: {:?}", result.centroids);
    println!("Cluster-Assignments: {:?}", result.assignments);
    println!("Error: {}", result.distsum);
    println!("Status: {:?} after {} iterations", result.status, result.iterations);
    Ok(())
}
