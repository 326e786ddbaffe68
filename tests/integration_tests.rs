//! Integration tests for correspondence filtering.
//!
//! Synthetic scenes: random source points, a known similarity transform to
//! produce the target, and correspondences where a chosen fraction is
//! deliberately mismatched.

use std::cell::Cell;

use coreg_ransac::*;
use nalgebra::{DMatrix, Translation3, UnitQuaternion};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

struct Scene {
    source: PointCloud,
    target: PointCloud,
    correspondences: CorrespondenceSet,
    truth: SimilarityTransform,
    n_inliers: usize,
}

fn truth() -> SimilarityTransform {
    SimilarityTransform::new(
        UnitQuaternion::from_euler_angles(0.4, -0.3, 1.2),
        Translation3::new(12.0, -4.0, 7.5),
        1.8,
    )
}

/// `n` correspondences, the first `n - round(n * outlier_fraction)` of which
/// are correct; the rest pair source `i` with some other target point.
fn scene(n: usize, outlier_fraction: f64, noise: f64, seed: u64) -> Scene {
    let mut rng = StdRng::seed_from_u64(seed);
    let source: Vec<Point> = (0..n)
        .map(|_| {
            Point::new(
                rng.gen_range(-10.0..10.0),
                rng.gen_range(-10.0..10.0),
                rng.gen_range(-10.0..10.0),
            )
        })
        .collect();
    let truth = truth();
    let target: Vec<Point> = source
        .iter()
        .map(|p| {
            let q = truth.transform_point(p);
            if noise > 0.0 {
                Point::new(
                    q.x + rng.gen_range(-noise..noise),
                    q.y + rng.gen_range(-noise..noise),
                    q.z + rng.gen_range(-noise..noise),
                )
            } else {
                q
            }
        })
        .collect();

    let n_outliers = (n as f64 * outlier_fraction).round() as usize;
    let n_inliers = n - n_outliers;
    let pairs = (0..n)
        .map(|i| {
            if i < n_inliers {
                Correspondence::new(i, i)
            } else {
                let shift = rng.gen_range(1..n);
                Correspondence::new(i, (i + shift) % n)
            }
        })
        .collect();

    Scene {
        source: PointCloud::new(source),
        target: PointCloud::new(target),
        correspondences: CorrespondenceSet::new(pairs),
        truth,
        n_inliers,
    }
}

/// Wraps the bundled estimator and counts how often it is asked for a model.
struct CountingEstimator {
    inner: SimilarityEstimator,
    calls: Cell<usize>,
}

impl CountingEstimator {
    fn new() -> Self {
        Self {
            inner: SimilarityEstimator::new(),
            calls: Cell::new(0),
        }
    }
}

impl TransformEstimator for CountingEstimator {
    type Model = SimilarityTransform;

    fn sample_size(&self) -> usize {
        self.inner.sample_size()
    }

    fn estimate(
        &self,
        source: &[Point],
        target: &[Point],
    ) -> Result<SimilarityTransform, RegistrationError> {
        self.calls.set(self.calls.get() + 1);
        self.inner.estimate(source, target)
    }
}

fn assert_close_to_truth(estimated: &SimilarityTransform, truth: &SimilarityTransform, tol: f64) {
    assert!(
        (estimated.scale - truth.scale).abs() < tol,
        "scale {} vs {}",
        estimated.scale,
        truth.scale
    );
    assert!(estimated.rotation.angle_to(&truth.rotation) < tol);
    assert!((estimated.translation.vector - truth.translation.vector).norm() < tol * 10.0);
}

#[test]
fn test_fully_consistent_correspondences_stop_early() {
    let scene = scene(40, 0.0, 0.0, 11);
    let params = RansacParams {
        max_iterations: 500,
        refine: false,
        ..RansacParams::default()
    };
    let scoring = NeighborConsistencyScoring::new(KdTreeNeighborQuery::new(), None);
    let mut ransac = RegistrationRansac::with_defaults(params, CountingEstimator::new(), scoring);
    let mut rng = StdRng::seed_from_u64(1);

    let out = ransac
        .run(&scene.correspondences, &scene.source, &scene.target, &mut rng)
        .unwrap();

    assert_eq!(out.support, 40);
    assert_eq!(out.inliers, (0..40).collect::<Vec<_>>());
    assert_eq!(out.stop_reason, StopReason::PerfectSupport);
    assert!(out.iterations < 500);
    // The loop stops on the very iteration that reached full support.
    assert_eq!(ransac.estimator.calls.get(), out.iterations);
    assert_close_to_truth(&out.model.unwrap(), &scene.truth, 1e-6);
}

#[test]
fn test_known_outlier_fraction_is_recovered() {
    let n = 60;
    let outlier_fraction = 0.3;
    let tolerance = 0.05;
    let params = RansacParams {
        max_iterations: 5000,
        confidence: 0.999,
        ..RansacParams::default()
    };

    for seed in 0..5 {
        let scene = scene(n, outlier_fraction, 0.0, 100 + seed);
        let mut rng = StdRng::seed_from_u64(seed);
        let result = register_correspondences(
            &scene.source,
            &scene.target,
            &scene.correspondences,
            &params,
            &mut rng,
        )
        .unwrap();

        let expected = n as f64 * (1.0 - outlier_fraction);
        assert!(
            (result.support as f64 - expected).abs() <= tolerance * n as f64,
            "seed {seed}: support {} vs expected {expected}",
            result.support
        );
        assert!(result.inliers.iter().all(|&p| p < scene.n_inliers));
        assert!(result.iterations <= params.max_iterations);
        assert_close_to_truth(&result.transform.unwrap(), &scene.truth, 1e-6);
    }
}

#[test]
fn test_result_invariants_hold_across_seeds() {
    let scene = scene(30, 0.5, 0.0, 7);
    let params = RansacParams {
        max_iterations: 300,
        ..RansacParams::default()
    };
    for seed in 0..10 {
        let mut rng = StdRng::seed_from_u64(seed);
        let result = register_correspondences(
            &scene.source,
            &scene.target,
            &scene.correspondences,
            &params,
            &mut rng,
        )
        .unwrap();

        assert!(result.support <= scene.correspondences.len());
        assert_eq!(result.inliers.len(), result.support);
        assert!(result.inliers.windows(2).all(|w| w[0] < w[1]));
        assert!(result.iterations <= params.max_iterations);
    }
}

#[test]
fn test_same_seed_gives_identical_results() {
    let scene = scene(50, 0.4, 0.0, 21);
    let params = RansacParams::default();

    let run = |seed: u64| {
        let mut rng = StdRng::seed_from_u64(seed);
        register_correspondences(
            &scene.source,
            &scene.target,
            &scene.correspondences,
            &params,
            &mut rng,
        )
        .unwrap()
    };

    let a = run(5);
    let b = run(5);
    assert_eq!(a.inliers, b.inliers);
    assert_eq!(a.support, b.support);
    assert_eq!(a.iterations, b.iterations);
    assert_eq!(a.stop_reason, b.stop_reason);
}

#[test]
fn test_minimal_correspondence_set() {
    // Exactly as many correspondences as the sample size.
    let scene = scene(6, 0.0, 0.0, 3);
    let exact = CorrespondenceSet::new(vec![
        Correspondence::new(0, 0),
        Correspondence::new(1, 1),
        Correspondence::new(2, 2),
    ]);
    let params = RansacParams {
        max_iterations: 50,
        ..RansacParams::default()
    };
    let mut rng = StdRng::seed_from_u64(0);
    let result =
        register_correspondences(&scene.source, &scene.target, &exact, &params, &mut rng).unwrap();
    assert_eq!(result.support, 3);
    assert_eq!(result.stop_reason, StopReason::PerfectSupport);

    // Same size, one wrong match: every sample is the whole set.
    let mixed = CorrespondenceSet::new(vec![
        Correspondence::new(0, 0),
        Correspondence::new(1, 1),
        Correspondence::new(2, 5),
    ]);
    let result =
        register_correspondences(&scene.source, &scene.target, &mixed, &params, &mut rng).unwrap();
    assert!(result.iterations <= 50);
    assert!(result.support <= 3);
    assert_eq!(result.inliers.len(), result.support);
}

#[test]
fn test_all_degenerate_samples_return_empty_result() {
    // Collinear source: no sample determines a unique transform.
    let source =
        PointCloud::new((0..10).map(|i| Point::new(i as f64, 2.0 * i as f64, 0.0)).collect());
    let target = source.transformed(&truth());
    let correspondences =
        CorrespondenceSet::new((0..10).map(|i| Correspondence::new(i, i)).collect());
    let params = RansacParams {
        max_iterations: 40,
        ..RansacParams::default()
    };
    let mut rng = StdRng::seed_from_u64(9);

    let result =
        register_correspondences(&source, &target, &correspondences, &params, &mut rng).unwrap();

    assert!(result.inliers.is_empty());
    assert_eq!(result.support, 0);
    assert!(result.transform.is_none());
    assert_eq!(result.iterations, 40);
    assert_eq!(result.stop_reason, StopReason::BudgetExhausted);
}

#[test]
fn test_invalid_parameters_are_reported() {
    let scene = scene(10, 0.0, 0.0, 1);
    let mut rng = StdRng::seed_from_u64(0);
    let mut run = |params: RansacParams| {
        register_correspondences(
            &scene.source,
            &scene.target,
            &scene.correspondences,
            &params,
            &mut rng,
        )
    };

    let cases = [
        RansacParams {
            sample_size: 11,
            ..RansacParams::default()
        },
        RansacParams {
            max_iterations: 0,
            ..RansacParams::default()
        },
        RansacParams {
            confidence: 0.0,
            ..RansacParams::default()
        },
        RansacParams {
            confidence: 1.0,
            ..RansacParams::default()
        },
        RansacParams {
            confidence: -0.2,
            ..RansacParams::default()
        },
    ];
    for params in cases {
        assert!(matches!(
            run(params),
            Err(RegistrationError::InvalidParameters(_))
        ));
    }
}

#[test]
fn test_noisy_scene_with_distance_threshold() {
    let scene = scene(80, 0.25, 0.005, 55);
    let params = RansacParams {
        inlier_threshold: Some(0.5),
        confidence: 0.999,
        max_iterations: 5000,
        ..RansacParams::default()
    };
    let mut rng = StdRng::seed_from_u64(17);
    let result = register_correspondences(
        &scene.source,
        &scene.target,
        &scene.correspondences,
        &params,
        &mut rng,
    )
    .unwrap();

    assert!(result.support <= scene.n_inliers);
    assert!(result.support as f64 >= 0.85 * scene.n_inliers as f64);
    assert_close_to_truth(&result.transform.unwrap(), &scene.truth, 1e-2);
}

#[test]
fn test_custom_rigid_pipeline_with_brute_force_neighbors() {
    let mut rng = StdRng::seed_from_u64(4);
    let source: Vec<Point> = (0..25)
        .map(|_| {
            Point::new(
                rng.gen_range(-5.0..5.0),
                rng.gen_range(-5.0..5.0),
                rng.gen_range(-5.0..5.0),
            )
        })
        .collect();
    let rigid = SimilarityTransform::rigid(
        UnitQuaternion::from_euler_angles(0.1, 0.2, -0.3),
        Translation3::new(-1.0, 0.5, 2.0),
    );
    let source = PointCloud::new(source);
    let target = source.transformed(&rigid);
    let mut pairs: Vec<Correspondence> = (0..20).map(|i| Correspondence::new(i, i)).collect();
    pairs.extend((20..25).map(|i| Correspondence::new(i, i - 20)));
    let correspondences = CorrespondenceSet::new(pairs);

    let scoring = NeighborConsistencyScoring::new(BruteForceNeighborQuery::new(), None);
    let mut ransac = RegistrationRansac::with_defaults(
        RansacParams::default(),
        SimilarityEstimator::rigid(),
        scoring,
    );
    let out = ransac.run(&correspondences, &source, &target, &mut rng).unwrap();

    assert_eq!(out.support, 20);
    assert_eq!(out.inliers, (0..20).collect::<Vec<_>>());
    let model = out.model.unwrap();
    assert_eq!(model.scale, 1.0);
    assert_close_to_truth(&model, &rigid, 1e-6);
}

#[test]
fn test_find_inliers_from_matrices() {
    let scene = scene(30, 0.2, 0.0, 8);
    let to_matrix = |cloud: &PointCloud| {
        DMatrix::from_fn(cloud.len(), 3, |r, c| cloud.points()[r][c])
    };
    let source_indices: Vec<usize> = scene.correspondences.iter().map(|c| c.source).collect();
    let target_indices: Vec<usize> = scene.correspondences.iter().map(|c| c.target).collect();

    let (inliers, support) = find_inliers(
        &to_matrix(&scene.source),
        &to_matrix(&scene.target),
        &source_indices,
        &target_indices,
        &RansacParams::default(),
        Some(2024),
    )
    .unwrap();

    assert_eq!(support, scene.n_inliers);
    assert_eq!(inliers, (0..scene.n_inliers).collect::<Vec<_>>());
}
