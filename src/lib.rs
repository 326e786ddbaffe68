//! # coreg-ransac - RANSAC correspondence filtering for 3D co-registration
//!
//! Given two 3D point clouds and a noisy list of candidate point
//! correspondences (typically keypoint matches), `coreg-ransac` estimates a
//! similarity transform with RANSAC and splits the correspondences into
//! inliers and outliers.
//!
//! A correspondence supports a hypothesis when moving the source cloud with
//! it makes the correspondence's own source point the nearest neighbor of its
//! target point. The iteration budget shrinks adaptively as the best inlier
//! ratio grows, and the run stops outright once every correspondence agrees.
//!
//! ## Quick Start
//!
//! ```rust
//! use coreg_ransac::{find_inliers, RansacParams};
//! use nalgebra::DMatrix;
//!
//! let source = DMatrix::from_row_slice(4, 3, &[
//!     0.0, 0.0, 0.0,
//!     4.0, 0.0, 0.0,
//!     0.0, 3.0, 0.0,
//!     0.0, 0.0, 5.0,
//! ]);
//! // Target is the source shifted by (1, 2, 3).
//! let target = source.map_with_location(|_, c, v| v + [1.0, 2.0, 3.0][c]);
//!
//! let (inliers, support) = find_inliers(
//!     &source,
//!     &target,
//!     &[0, 1, 2, 3],
//!     &[0, 1, 2, 3],
//!     &RansacParams::default(),
//!     Some(42),
//! )
//! .unwrap();
//! assert_eq!(support, 4);
//! assert_eq!(inliers, vec![0, 1, 2, 3]);
//! ```
//!
//! ## Extending the Library
//!
//! The pipeline in [`core`] is generic over its collaborators:
//!
//! - **[`TransformEstimator`](core::TransformEstimator)**: fit a transform from paired points
//! - **[`NeighborQuery`](neighborhood::NeighborQuery)**: nearest-neighbor search used by scoring
//! - **[`Scoring<M>`](core::Scoring)**: decide which correspondences support a hypothesis
//! - **[`Sampler`](core::Sampler)**: draw minimal samples from an injected RNG
//! - **[`TerminationCriterion`](core::TerminationCriterion)**: shrink the iteration budget
//!
//! ## Modules
//!
//! - **[`api`]**: High-level entry points
//! - **[`core`]**: Traits, adaptive termination and the `RegistrationRansac` pipeline
//! - **[`estimators`]**: Bundled transform estimators
//! - **[`neighborhood`]**: Nearest-neighbor queries
//! - **[`scoring`]**: Support evaluation
//! - **[`samplers`]**: Sampling strategies
//! - **[`settings`]**: Run parameters
//! - **[`types`]** / **[`models`]**: Point clouds, correspondences, transforms

pub mod api;
pub mod core;
pub mod error;
pub mod estimators;
pub mod models;
pub mod neighborhood;
pub mod samplers;
pub mod scoring;
pub mod settings;
pub mod types;
pub mod utils;

pub use api::{find_inliers, register_correspondences, RegistrationResult};

pub use self::core::{
    next_budget, AdaptiveTermination, RansacOutput, RegistrationRansac, Sampler, Scoring,
    StopReason, TerminationCriterion, TransformEstimator,
};

pub use error::RegistrationError;
pub use estimators::SimilarityEstimator;
pub use models::{SimilarityTransform, Transform};
pub use neighborhood::{BruteForceNeighborQuery, KdTreeNeighborQuery, Neighbor, NeighborQuery};
pub use scoring::{NeighborConsistencyScoring, Score};
pub use settings::RansacParams;
pub use types::{Correspondence, CorrespondenceSet, Point, PointCloud};
