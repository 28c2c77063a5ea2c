//! Exploration waypoints.

use blockwright_types::Position;
use rand::Rng;

/// `count` waypoints on the Chebyshev ring of `radius` around `origin`.
///
/// The caller supplies the RNG so a seeded generator reproduces a route.
pub fn waypoints<R: Rng + ?Sized>(rng: &mut R, origin: Position, radius: u32, count: u32) -> Vec<Position> {
    let r = i32::try_from(radius.max(1)).unwrap_or(i32::MAX);
    (0..count)
        .map(|_| {
            let along = rng.random_range(r.saturating_neg()..=r);
            let (dx, dz) = match rng.random_range(0..4_u8) {
                0 => (along, r.saturating_neg()),
                1 => (along, r),
                2 => (r.saturating_neg(), along),
                _ => (r, along),
            };
            origin.offset(dx, 0, dz)
        })
        .collect()
}
