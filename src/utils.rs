//! Miscellaneous utilities shared across the crate.

use rand::distributions::{Distribution, Uniform};
use rand::Rng;

/// Fill `out` with distinct integers drawn uniformly from `[min, max]`.
///
/// Uses rejection against the entries already written, which is cheap for
/// the minimal sample sizes RANSAC works with. The caller guarantees that
/// the range holds at least `out.len()` values.
pub fn gen_unique<R: Rng + ?Sized>(rng: &mut R, out: &mut [usize], min: usize, max: usize) {
    debug_assert!(max >= min && max - min + 1 >= out.len());
    let dist = Uniform::new_inclusive(min, max);
    for i in 0..out.len() {
        loop {
            let candidate = dist.sample(rng);
            if out[..i].iter().all(|&v| v != candidate) {
                out[i] = candidate;
                break;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::gen_unique;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn unique_samples_within_bounds() {
        let mut rng = StdRng::seed_from_u64(1234);
        let mut buf = [0usize; 5];
        gen_unique(&mut rng, &mut buf, 0, 10);

        assert!(buf.iter().all(|&v| v <= 10));
        for i in 0..buf.len() {
            for j in (i + 1)..buf.len() {
                assert_ne!(buf[i], buf[j]);
            }
        }
    }

    #[test]
    fn full_range_is_a_permutation() {
        let mut rng = StdRng::seed_from_u64(7);
        let mut buf = [0usize; 4];
        gen_unique(&mut rng, &mut buf, 0, 3);
        let mut sorted = buf;
        sorted.sort_unstable();
        assert_eq!(sorted, [0, 1, 2, 3]);
    }

    #[test]
    fn deterministic_with_same_seed() {
        let mut rng1 = StdRng::seed_from_u64(42);
        let mut rng2 = StdRng::seed_from_u64(42);
        let mut a1 = [0usize; 3];
        let mut a2 = [0usize; 3];
        gen_unique(&mut rng1, &mut a1, 0, 100);
        gen_unique(&mut rng2, &mut a2, 0, 100);
        assert_eq!(a1, a2);
    }
}
