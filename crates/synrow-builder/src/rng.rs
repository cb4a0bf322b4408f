//! Marsaglia KISS random number generator
//!
//! Generation must be reproducible bit-for-bit between the host and cores
//! generating their own matrices, so the generator is fixed rather than
//! whatever `rand` currently prefers.

use rand_core::{impls, Error, RngCore, SeedableRng};

/// 32-bit output KISS generator with 64-bit multiply-with-carry-free state
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MarsKiss64 {
    x: u32,
    y: u32,
    z: u32,
    w: u32,
    c: u32,
}

impl MarsKiss64 {
    /// Default state words `[x, y, z, w]`
    pub const DEFAULT_STATE: [u32; 4] = [123_456_789, 234_567_891, 345_678_912, 456_789_123];

    /// Generator in its default state
    pub fn new() -> Self {
        Self::from_state(Self::DEFAULT_STATE)
    }

    /// Generator from state words `[x, y, z, w]`
    ///
    /// `y` must be non-zero for the xorshift component; zero is replaced by
    /// its default.
    pub fn from_state(state: [u32; 4]) -> Self {
        let [x, y, z, w] = state;
        let y = if y == 0 { Self::DEFAULT_STATE[1] } else { y };
        Self { x, y, z, w, c: 0 }
    }

    /// Next 32-bit output
    #[inline]
    pub fn next(&mut self) -> u32 {
        self.y ^= self.y << 5;
        self.y ^= self.y >> 7;
        self.y ^= self.y << 22;

        let t = self.z.wrapping_add(self.w).wrapping_add(self.c) as i32;
        self.z = self.w;
        self.c = (t < 0) as u32;
        self.w = (t as u32) & 0x7FFF_FFFF;

        self.x = self.x.wrapping_add(1_411_392_427);
        self.x.wrapping_add(self.y).wrapping_add(self.w)
    }
}

impl Default for MarsKiss64 {
    fn default() -> Self {
        Self::new()
    }
}

impl RngCore for MarsKiss64 {
    fn next_u32(&mut self) -> u32 {
        self.next()
    }

    fn next_u64(&mut self) -> u64 {
        impls::next_u64_via_u32(self)
    }

    fn fill_bytes(&mut self, dest: &mut [u8]) {
        impls::fill_bytes_via_next(self, dest)
    }

    fn try_fill_bytes(&mut self, dest: &mut [u8]) -> Result<(), Error> {
        self.fill_bytes(dest);
        Ok(())
    }
}

impl SeedableRng for MarsKiss64 {
    /// Four little-endian state words
    type Seed = [u8; 16];

    fn from_seed(seed: Self::Seed) -> Self {
        let mut state = [0u32; 4];
        for (word, bytes) in state.iter_mut().zip(seed.chunks_exact(4)) {
            *word = u32::from_le_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]);
        }
        Self::from_state(state)
    }
}
