// Minimal PRNG for layout jiggle and initial placement noise.
//
// Not cryptographically secure. Fixed seed, so two layouts of the same snapshot agree.

#[derive(Debug, Clone)]
pub struct Prng {
    state: u64,
}

impl Prng {
    pub fn new(seed: u64) -> Self {
        let seed = if seed == 0 { 0x9E3779B97F4A7C15 } else { seed };
        Self { state: seed }
    }

    #[inline]
    fn next_u64(&mut self) -> u64 {
        // xorshift64*
        let mut x = self.state;
        x ^= x >> 12;
        x ^= x << 25;
        x ^= x >> 27;
        self.state = x;
        x.wrapping_mul(0x2545F4914F6CDD1D)
    }

    /// Uniform in [0, 1).
    #[inline]
    pub fn next_f64_01(&mut self) -> f64 {
        (self.next_u64() >> 11) as f64 / (1u64 << 53) as f64
    }

    /// A tiny non-zero offset used to separate coincident nodes.
    #[inline]
    pub fn jiggle(&mut self) -> f64 {
        (self.next_f64_01() - 0.5) * 1e-6
    }
}
