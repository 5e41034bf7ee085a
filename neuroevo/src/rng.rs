use rand::{Rng, RngCore};

// Operators are trait objects, so the run's generator travels
// as `&mut dyn RngCore`; `Rng` is blanket-implemented for it.

/// Returns `true` with probability `chance`.
pub(crate) fn gen_chance(rng: &mut dyn RngCore, chance: f64) -> bool {
    rng.gen::<f64>() < chance
}

/// Uniform sample from `[-bound, bound]`. Non-positive
/// bounds always yield `0.0`.
pub(crate) fn gen_symmetric(rng: &mut dyn RngCore, bound: f64) -> f64 {
    if bound > 0.0 {
        rng.gen_range(-bound..=bound)
    } else {
        0.0
    }
}

/// Uniformly chosen index into a collection of length `len`.
/// `len` must be non-zero.
pub(crate) fn gen_index(rng: &mut dyn RngCore, len: usize) -> usize {
    rng.gen_range(0..len)
}
