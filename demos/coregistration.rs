//! Example: Filtering keypoint matches between two scans
//!
//! Builds a synthetic scan pair related by a similarity transform, corrupts a
//! share of the matches, and lets RANSAC separate inliers from outliers.

use coreg_ransac::{
    register_correspondences, Correspondence, CorrespondenceSet, Point, PointCloud, RansacParams,
    SimilarityTransform, Transform,
};
use nalgebra::{Translation3, UnitQuaternion};
use rand::seq::SliceRandom;
use rand::Rng;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    println!("=== Surface Co-Registration Example ===\n");

    let n_points = 200;
    let n_matches = 120;
    let n_bad_matches = 45;

    let mut rng = rand::thread_rng();

    let truth = SimilarityTransform::new(
        UnitQuaternion::from_euler_angles(0.2, -0.1, 0.6),
        Translation3::new(25.0, -3.0, 4.0),
        1.25,
    );
    println!("True scale: {:.3}", truth.scale);
    println!("True rotation (deg): {:.2}", truth.rotation.angle().to_degrees());
    println!("True translation: {:?}\n", truth.translation.vector.as_slice());

    // Source scan: points on a gently curved surface.
    let source: Vec<Point> = (0..n_points)
        .map(|_| {
            let x: f64 = rng.gen_range(-20.0..20.0);
            let y: f64 = rng.gen_range(-20.0..20.0);
            Point::new(x, y, 0.02 * (x * x - y * y) + rng.gen_range(-0.5..0.5))
        })
        .collect();
    let target: Vec<Point> = source.iter().map(|p| truth.transform_point(p)).collect();

    // Keypoint matches: mostly correct, some pointing at the wrong target.
    let mut keypoints: Vec<usize> = (0..n_points).collect();
    keypoints.shuffle(&mut rng);
    let mut pairs: Vec<Correspondence> = keypoints[..n_matches]
        .iter()
        .map(|&i| Correspondence::new(i, i))
        .collect();
    for pair in pairs.iter_mut().take(n_bad_matches) {
        pair.target = rng.gen_range(0..n_points);
    }
    pairs.shuffle(&mut rng);

    println!(
        "Generated {} points and {} matches ({} corrupted)\n",
        n_points, n_matches, n_bad_matches
    );

    let source = PointCloud::new(source);
    let target = PointCloud::new(target);
    let correspondences = CorrespondenceSet::new(pairs);

    let params = RansacParams {
        confidence: 0.999,
        ..RansacParams::default()
    };
    let result =
        register_correspondences(&source, &target, &correspondences, &params, &mut rng)?;

    println!("RANSAC Results:");
    println!(
        "  Found {} inliers out of {} matches",
        result.support,
        correspondences.len()
    );
    println!(
        "  Inlier ratio: {:.2}%",
        100.0 * result.support as f64 / correspondences.len() as f64
    );
    println!("  Iterations: {}", result.iterations);
    println!("  Stopped because: {:?}", result.stop_reason);

    if let Some(estimated) = &result.transform {
        println!("\nEstimated scale: {:.4}", estimated.scale);
        println!(
            "  Rotation error (deg): {:.6}",
            estimated.rotation.angle_to(&truth.rotation).to_degrees()
        );
        println!(
            "  Translation error: {:.6}",
            (estimated.translation.vector - truth.translation.vector).norm()
        );
    }

    let correct = result
        .inliers
        .iter()
        .filter_map(|&p| correspondences.get(p))
        .filter(|c| c.source == c.target)
        .count();
    println!(
        "\nCorrectly kept {} matches; {} kept matches were corrupted",
        correct,
        result.support - correct
    );

    Ok(())
}
