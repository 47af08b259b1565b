use kcluster::*;
use rand::prelude::*;

/// Clusters particle positions inside a periodic box, where a cluster may wrap around the box boundary.
fn main() -> Result<()> {
    env_logger::init();
    let (box_length, per_cluster, k) = (10.0f64, 500, 3);
    let mut rnd = StdRng::seed_from_u64(7);

    // Three blobs, the first one straddling the boundary at 0 / 10
    let blob_centers = [[0.0, 5.0, 5.0], [3.5, 2.0, 8.0], [7.0, 7.5, 1.0]];
    let mut samples = Vec::with_capacity(blob_centers.len() * per_cluster * 3);
    for center in blob_centers.iter() {
        for _ in 0..per_cluster {
            for &c in center.iter() {
                let v: f64 = c + rnd.gen_range(-0.8..0.8);
                samples.push(v.rem_euclid(box_length));
            }
        }
    }

    let metric = PeriodicEuclideanDistance::cubic(box_length, 3)?;
    let kmean = KMeans::new(&samples, samples.len() / 3, 3, metric)?;
    let conf = KMeansConfig::build().seed(1).build();
    let result = kmean.kmeans(k, 100, &conf)?;

    // The arithmetic mean of a wrapped blob is not its periodic center; the assignment still is
    println!("Centroids: {:?}", result.centroids);
    println!("Cluster sizes: {:?}", result.centroid_frequency);
    println!("Error: {} ({:?} after {} iterations)", result.distsum, result.status, result.iterations);
    Ok(())
}
