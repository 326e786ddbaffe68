//! Uniform random sampler drawing minimal samples without replacement.

use rand::Rng;

use crate::core::Sampler;
use crate::utils::gen_unique;

/// Uniform random sampler drawing minimal samples without replacement.
///
/// The sampler is stateless; all randomness comes from the generator handed
/// to [`Sampler::sample`], so a seeded generator makes runs reproducible.
#[derive(Debug, Default, Clone, Copy)]
pub struct UniformRandomSampler;

impl UniformRandomSampler {
    pub fn new() -> Self {
        Self
    }
}

impl Sampler for UniformRandomSampler {
    fn sample<R: Rng + ?Sized>(
        &mut self,
        rng: &mut R,
        population: usize,
        out_indices: &mut [usize],
    ) -> bool {
        let sample_size = out_indices.len();
        if sample_size == 0 || population == 0 || sample_size > population {
            return false;
        }

        gen_unique(rng, out_indices, 0, population - 1);
        true
    }
}
