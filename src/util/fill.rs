//! Fill block generation
//!
//! Each test file is built by writing the same fixed-size pseudo-random block
//! over and over. The block is generated once by the coordinator and shared
//! read-only across all workers; random content keeps trivially compressible
//! data out of the write path.

use rand::{RngCore, SeedableRng};
use rand_xoshiro::Xoshiro256PlusPlus;

/// Generate one buffer-sized block of pseudo-random bytes
pub fn generate_block(size: usize) -> Vec<u8> {
    let mut rng = Xoshiro256PlusPlus::from_entropy();
    let mut block = vec![0u8; size];
    rng.fill_bytes(&mut block);
    block
}
