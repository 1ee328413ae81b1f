use crate::types::GridPos;

/// Seedable mulberry32 stream. Frightened ghosts draw their wander targets
/// from here so a fixed seed replays a session exactly.
#[derive(Clone, Debug)]
pub struct Rng {
    seed: u32,
}

impl Rng {
    pub fn new(seed: u32) -> Self {
        Self { seed }
    }

    /// Seed drawn from OS entropy, used when the config leaves the seed open.
    pub fn entropy_seed() -> u32 {
        rand::random::<u32>()
    }

    pub fn next_f32(&mut self) -> f32 {
        self.seed = self.seed.wrapping_add(0x6d2b79f5);
        let mut t = self.seed;
        t = (t ^ (t >> 15)).wrapping_mul(t | 1);
        t ^= t.wrapping_add((t ^ (t >> 7)).wrapping_mul(t | 61));
        let out = t ^ (t >> 14);
        (out as f64 / 4_294_967_296.0) as f32
    }

    /// Uniform integer in `[0, upper)`.
    pub fn below(&mut self, upper: i32) -> i32 {
        if upper <= 1 {
            return 0;
        }
        ((self.next_f32() * upper as f32).floor() as i32).min(upper - 1)
    }

    pub fn tile_within(&mut self, width: i32, height: i32) -> GridPos {
        GridPos::new(self.below(width), self.below(height))
    }
}
