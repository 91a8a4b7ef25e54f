use rand::{rngs::StdRng, Rng, SeedableRng};
use serde::{Deserialize, Serialize};

/// Purely visual randomisation attached to a hit. Renderers may ignore it;
/// it never feeds back into judgment or scoring.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Cosmetic {
    /// Hue in degrees.
    pub hue: f32,
    /// Rotation in radians.
    pub rotation: f32,
}

pub trait CosmeticSource {
    fn roll(&mut self) -> Cosmetic;
}

#[derive(Debug)]
pub struct RandomCosmetics {
    rng: StdRng,
}

impl RandomCosmetics {
    /// A fixed seed gives a reproducible sequence; `None` seeds from the OS.
    pub fn new(seed: Option<u64>) -> Self {
        let rng = match seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_os_rng(),
        };
        Self { rng }
    }
}

impl CosmeticSource for RandomCosmetics {
    fn roll(&mut self) -> Cosmetic {
        Cosmetic {
            hue: self.rng.random_range(0.0..360.0),
            rotation: self.rng.random_range(0.0..std::f32::consts::TAU),
        }
    }
}
