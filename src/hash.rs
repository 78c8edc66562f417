use crate::geo::LatLng;

/// Grid used to quantize coordinates before hashing (~11m at the equator)
const COORD_QUANTUM: f64 = 1e-4;

/// Fast 3-value hash with xorshift
#[inline(always)]
pub fn hash3(a: u64, b: u64, c: u64) -> u64 {
    let mut seed = a
        .wrapping_mul(2654435761)
        .wrapping_add(b.wrapping_mul(2246822519))
        .wrapping_add(c);
    seed ^= seed << 13;
    seed ^= seed >> 7;
    seed ^= seed << 17;
    seed
}

/// Stable hash of a coordinate, so nearby clicks in the same cell agree
#[inline]
pub fn hash_coord(at: LatLng, salt: u64) -> u64 {
    let lat = (at.lat / COORD_QUANTUM).round() as i64 as u64;
    let lng = (at.lng / COORD_QUANTUM).round() as i64 as u64;
    hash3(lat, lng, salt)
}

/// Deterministic value in [0, 1) using splitmix64
#[inline(always)]
pub fn unit_float(seed: u64) -> f64 {
    let mut x = seed.wrapping_mul(0x9e3779b97f4a7c15);
    x ^= x >> 30;
    x = x.wrapping_mul(0xbf58476d1ce4e5b9);
    x ^= x >> 27;
    x = x.wrapping_mul(0x94d049bb133111eb);
    x ^= x >> 31;
    (x >> 11) as f64 / 9007199254740992.0
}

/// Integer in [low, low + span) drawn from the seed
#[inline]
pub fn pick_range(seed: u64, low: u32, span: u32) -> u32 {
    low + (unit_float(seed) * span as f64) as u32
}
