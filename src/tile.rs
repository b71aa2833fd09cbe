//! Numbered tiles and the merge cap policy.

use rand::Rng;

/// Largest tile the default cap lets a merge produce.
pub const DEFAULT_TILE_CAP: u32 = 2048;

/// Number of distinct colour slots (2, 4, ... 2048).
pub const TILE_COLOR_SLOTS: usize = 11;

/// Rows top-to-bottom, columns left-to-right; `None` is an empty slot.
pub type TileMatrix = Vec<Vec<Option<Tile>>>;

/// A single numbered cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Tile {
    number: u32,
}

impl Tile {
    pub const fn new(number: u32) -> Self {
        Self { number }
    }

    /// A fresh tile for a newly generated piece: 2 or 4 with equal odds.
    pub fn random(rng: &mut impl Rng) -> Self {
        Self::new(if rng.gen_bool(0.5) { 2 } else { 4 })
    }

    #[inline]
    pub fn number(&self) -> u32 {
        self.number
    }

    /// Merge `other` into `self` if the numbers match and the cap allows it.
    /// Returns the new (doubled) number on success.
    pub fn merge(&mut self, other: &Tile, cap: TileCap) -> Option<u32> {
        if self.number != other.number || !cap.allows(self.number) {
            return None;
        }
        self.number = self.number.saturating_mul(2);
        Some(self.number)
    }

    /// Colour slot 0..TILE_COLOR_SLOTS: 2 → 0, 4 → 1, ... 2048 and above → 10.
    pub fn color_index(&self) -> usize {
        let exp = self.number.max(2).ilog2() as usize;
        (exp - 1).min(TILE_COLOR_SLOTS - 1)
    }
}

/// Whether (and where) tile growth stops.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TileCap {
    /// Tiles whose number is already `>= limit` never merge.
    Capped(u32),
    Uncapped,
}

impl TileCap {
    #[inline]
    pub fn allows(&self, number: u32) -> bool {
        match self {
            Self::Capped(limit) => number < *limit,
            Self::Uncapped => true,
        }
    }
}

impl Default for TileCap {
    fn default() -> Self {
        Self::Capped(DEFAULT_TILE_CAP)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    #[test]
    fn test_merge_equal_doubles() {
        let mut low = Tile::new(8);
        assert_eq!(low.merge(&Tile::new(8), TileCap::default()), Some(16));
        assert_eq!(low.number(), 16);
    }

    #[test]
    fn test_merge_unequal_is_noop() {
        let mut low = Tile::new(2);
        assert_eq!(low.merge(&Tile::new(4), TileCap::default()), None);
        assert_eq!(low.number(), 2);
    }

    #[test]
    fn test_cap_stops_at_2048() {
        let mut low = Tile::new(2048);
        assert_eq!(low.merge(&Tile::new(2048), TileCap::default()), None);
        let mut low = Tile::new(1024);
        assert_eq!(low.merge(&Tile::new(1024), TileCap::default()), Some(2048));
    }

    #[test]
    fn test_uncapped_keeps_growing() {
        let mut low = Tile::new(2048);
        assert_eq!(low.merge(&Tile::new(2048), TileCap::Uncapped), Some(4096));
    }

    #[test]
    fn test_color_index_clamps() {
        assert_eq!(Tile::new(2).color_index(), 0);
        assert_eq!(Tile::new(64).color_index(), 5);
        assert_eq!(Tile::new(2048).color_index(), 10);
        assert_eq!(Tile::new(8192).color_index(), 10);
    }

    #[test]
    fn test_random_is_two_or_four() {
        let mut rng = StdRng::seed_from_u64(7);
        for _ in 0..100 {
            let n = Tile::random(&mut rng).number();
            assert!(n == 2 || n == 4);
        }
    }
}
