use rand::{rngs::StdRng, Rng, SeedableRng};
use spectrum_core::{Result, Sampler};

/// Stand-in for real hardware: uniform random integers in `[1, upper]`.
#[derive(Debug)]
pub struct SyntheticSampler {
    upper: u32,
    rng: StdRng,
}

impl SyntheticSampler {
    /// Seed from the operating system.
    pub fn new(upper: u32) -> Self {
        Self {
            upper: upper.max(1),
            rng: StdRng::from_os_rng(),
        }
    }

    /// Reproducible sequence for a given seed.
    pub fn with_seed(upper: u32, seed: u64) -> Self {
        Self {
            upper: upper.max(1),
            rng: StdRng::seed_from_u64(seed),
        }
    }
}

impl Sampler for SyntheticSampler {
    fn name(&self) -> &str {
        "synthetic"
    }

    fn read(&mut self) -> Result<f64> {
        Ok(f64::from(self.rng.random_range(1..=self.upper)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn draws_stay_in_range() {
        let mut sampler = SyntheticSampler::with_seed(6, 1);
        for _ in 0..500 {
            let v = sampler.read().unwrap();
            assert!((1.0..=6.0).contains(&v));
            assert_eq!(v.fract(), 0.0);
        }
    }

    #[test]
    fn same_seed_same_sequence() {
        let mut a = SyntheticSampler::with_seed(100, 42);
        let mut b = SyntheticSampler::with_seed(100, 42);
        for _ in 0..20 {
            assert_eq!(a.read().unwrap(), b.read().unwrap());
        }
    }

    #[test]
    fn zero_upper_bound_is_clamped() {
        let mut sampler = SyntheticSampler::with_seed(0, 3);
        assert_eq!(sampler.read().unwrap(), 1.0);
    }
}
