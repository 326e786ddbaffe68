//! Sampling strategies for drawing minimal correspondence subsets.

pub mod uniform;

pub use uniform::UniformRandomSampler;
