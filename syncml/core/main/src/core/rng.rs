//! Thread-local random generator used by every random constructor.
//!
//! Seeding it with [`manual_seed`] makes weight initialization and dropout
//! masks reproducible on the current thread.

use rand::rngs::StdRng;
use rand::SeedableRng;
use std::cell::RefCell;

thread_local! {
    static RNG: RefCell<StdRng> = RefCell::new(StdRng::from_entropy());
}

/// Reseed the generator of the calling thread.
pub fn manual_seed(seed: u64) {
    RNG.with(|rng| *rng.borrow_mut() = StdRng::seed_from_u64(seed));
}

/// Run `f` with exclusive access to the thread-local generator.
pub fn with_rng<F, R>(f: F) -> R
where
    F: FnOnce(&mut StdRng) -> R,
{
    RNG.with(|rng| f(&mut rng.borrow_mut()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::Rng;

    #[test]
    fn test_manual_seed_reproducible() {
        manual_seed(7);
        let a: Vec<f32> = with_rng(|rng| (0..4).map(|_| rng.r#gen()).collect());
        manual_seed(7);
        let b: Vec<f32> = with_rng(|rng| (0..4).map(|_| rng.r#gen()).collect());
        assert_eq!(a, b);
    }
}
