//! Seeded Perlin noise and the xorshift RNG that drives worldgen.
#![forbid(unsafe_code)]

mod perlin;
mod rng;

pub use perlin::PerlinNoise;
pub use rng::FastRandom;

/// Hashes a seed string to a 32-bit value the same way `java.lang.String`
/// does, so a given seed string keeps producing the same worlds.
pub fn seed_hash(seed: &str) -> i32 {
    let mut h: i32 = 0;
    for c in seed.encode_utf16() {
        h = h.wrapping_mul(31).wrapping_add(c as i32);
    }
    h
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn seed_hash_matches_java_string_hash() {
        assert_eq!(seed_hash(""), 0);
        assert_eq!(seed_hash("a"), 97);
        // "abc" -> 97*31^2 + 98*31 + 99
        assert_eq!(seed_hash("abc"), 96354);
    }
}
