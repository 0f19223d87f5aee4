use std::time::{SystemTime, UNIX_EPOCH};

use rand::{SeedableRng, rngs::StdRng};
use tracing::{info, warn};

/// Clock seeds are folded below this bound; explicit seeds may reach it.
pub const SEED_MODULUS: u64 = 4_294_967_295;

/// Microseconds since the epoch folded into the seed range.
pub fn clock_seed() -> Option<u64> {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .ok()
        .map(|d| (d.as_micros() % SEED_MODULUS as u128) as u64)
}

/// Random source together with the seed that produced it.
///
/// `seed` is `None` when the generator was drawn from OS entropy, in which
/// case the run cannot be replayed.
pub struct Seeded {
    pub rng: StdRng,
    pub seed: Option<u64>,
}

impl Seeded {
    /// Seed from `requested`, or from the clock when absent.
    pub fn new(requested: Option<u64>) -> Self {
        let candidate = requested.or_else(clock_seed);

        let seed = match candidate {
            Some(seed) if seed <= SEED_MODULUS => Some(seed),
            Some(seed) => {
                warn!(seed, "seed out of range, falling back to an unseeded generator");
                None
            }
            None => {
                warn!("system clock unavailable, falling back to an unseeded generator");
                None
            }
        };

        let rng = match seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };

        info!(?seed, "seed used for random values");

        Self { rng, seed }
    }
}
