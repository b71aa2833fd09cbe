//! Falling pieces: shape catalog, movement, rotation, collision and generation.

use crate::grid::{Grid, Position};
use crate::tile::{Tile, TileMatrix};
use clap::ValueEnum;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

/// Tetromino kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PieceKind {
    I,
    O,
    Z,
    S,
    T,
    J,
    L,
}

impl PieceKind {
    pub const CLASSIC: [Self; 3] = [Self::I, Self::O, Self::Z];
    pub const ALL: [Self; 7] = [Self::I, Self::O, Self::Z, Self::S, Self::T, Self::J, Self::L];

    /// Side length of the square matrix the piece rotates in.
    pub fn size(&self) -> usize {
        match self {
            Self::I => 4,
            Self::O => 2,
            _ => 3,
        }
    }

    /// Occupied (row, col) slots of the spawn layout; row 0 is the top of the box.
    pub fn cells(&self) -> &'static [(usize, usize); 4] {
        match self {
            Self::I => &[(1, 0), (1, 1), (1, 2), (1, 3)],
            Self::O => &[(0, 0), (0, 1), (1, 0), (1, 1)],
            Self::Z => &[(0, 0), (0, 1), (1, 1), (1, 2)],
            Self::S => &[(0, 1), (0, 2), (1, 0), (1, 1)],
            Self::T => &[(0, 1), (1, 0), (1, 1), (1, 2)],
            Self::J => &[(0, 0), (1, 0), (1, 1), (1, 2)],
            Self::L => &[(0, 2), (1, 0), (1, 1), (1, 2)],
        }
    }
}

/// Which kinds the generator draws from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum PieceSet {
    /// I, O and Z only.
    #[default]
    Classic,
    /// All seven tetrominoes.
    Full,
}

impl PieceSet {
    pub fn kinds(&self) -> &'static [PieceKind] {
        match self {
            Self::Classic => &PieceKind::CLASSIC,
            Self::Full => &PieceKind::ALL,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Left,
    Right,
    Down,
}

impl Direction {
    fn delta(self) -> (i32, i32) {
        match self {
            Self::Left => (-1, 0),
            Self::Right => (1, 0),
            Self::Down => (0, -1),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Rotation {
    Cw,
    Ccw,
}

/// Source of piece kinds and tile numbers.
pub trait PiecePolicy {
    fn next_kind(&mut self) -> PieceKind;
    fn next_tile(&mut self) -> Tile;
}

/// Uniform choice over a piece set; tiles are 2 or 4 with equal odds.
#[derive(Debug, Clone)]
pub struct RandomPolicy {
    kinds: &'static [PieceKind],
    rng: StdRng,
}

impl RandomPolicy {
    pub fn new(set: PieceSet, seed: Option<u64>) -> Self {
        let rng = seed.map_or_else(StdRng::from_entropy, StdRng::seed_from_u64);
        Self {
            kinds: set.kinds(),
            rng,
        }
    }
}

impl PiecePolicy for RandomPolicy {
    fn next_kind(&mut self) -> PieceKind {
        self.kinds[self.rng.gen_range(0..self.kinds.len())]
    }

    fn next_tile(&mut self) -> Tile {
        Tile::random(&mut self.rng)
    }
}

/// Cycles through fixed kinds and numbers.
#[derive(Debug, Clone)]
pub struct SequencePolicy {
    kinds: Vec<PieceKind>,
    numbers: Vec<u32>,
    kind_index: usize,
    number_index: usize,
}

impl SequencePolicy {
    /// Empty inputs fall back to a single O piece / the number 2.
    pub fn new(kinds: Vec<PieceKind>, numbers: Vec<u32>) -> Self {
        let kinds = if kinds.is_empty() { vec![PieceKind::O] } else { kinds };
        let numbers = if numbers.is_empty() { vec![2] } else { numbers };
        Self {
            kinds,
            numbers,
            kind_index: 0,
            number_index: 0,
        }
    }
}

impl PiecePolicy for SequencePolicy {
    fn next_kind(&mut self) -> PieceKind {
        let kind = self.kinds[self.kind_index % self.kinds.len()];
        self.kind_index += 1;
        kind
    }

    fn next_tile(&mut self) -> Tile {
        let n = self.numbers[self.number_index % self.numbers.len()];
        self.number_index += 1;
        Tile::new(n)
    }
}

/// The active piece: a square tile matrix anchored at its bottom-left cell.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Piece {
    kind: PieceKind,
    tiles: TileMatrix,
    anchor: Position,
    orientation: u8,
}

impl Piece {
    pub fn new(kind: PieceKind, anchor: Position, mut next_tile: impl FnMut() -> Tile) -> Self {
        let n = kind.size();
        let mut tiles = vec![vec![None; n]; n];
        for &(r, c) in kind.cells() {
            tiles[r][c] = Some(next_tile());
        }
        Self {
            kind,
            tiles,
            anchor,
            orientation: 0,
        }
    }

    /// Horizontally centred, lowest tile one row above the top of the grid.
    pub fn spawn(
        kind: PieceKind,
        grid_width: usize,
        grid_height: usize,
        next_tile: impl FnMut() -> Tile,
    ) -> Self {
        let n = kind.size() as i32;
        let lowest_row = kind.cells().iter().map(|&(r, _)| r as i32).max().unwrap_or(n - 1);
        let x = ((grid_width as i32 - n) / 2).max(0);
        let y = grid_height as i32 - (n - 1 - lowest_row);
        Self::new(kind, Position::new(x, y), next_tile)
    }

    /// Draw a kind and its tiles from `policy` and spawn it above `grid`.
    pub fn generate(policy: &mut dyn PiecePolicy, grid: &Grid) -> Self {
        let kind = policy.next_kind();
        Self::spawn(kind, grid.width(), grid.height(), || policy.next_tile())
    }

    #[inline]
    pub fn kind(&self) -> PieceKind {
        self.kind
    }

    #[inline]
    pub fn anchor(&self) -> Position {
        self.anchor
    }

    #[inline]
    pub fn orientation(&self) -> u8 {
        self.orientation
    }

    /// Absolute grid position and tile of every occupied slot.
    pub fn cells(&self) -> impl Iterator<Item = (Position, Tile)> + '_ {
        cells_at(&self.tiles, self.anchor)
    }

    pub fn can_move(&self, direction: Direction, grid: &Grid) -> bool {
        let (dx, dy) = direction.delta();
        fits(&self.tiles, self.anchor.offset(dx, dy), grid)
    }

    /// Move one cell if nothing blocks it; otherwise leave the piece alone.
    pub fn try_move(&mut self, direction: Direction, grid: &Grid) -> bool {
        if !self.can_move(direction, grid) {
            return false;
        }
        let (dx, dy) = direction.delta();
        self.anchor = self.anchor.offset(dx, dy);
        true
    }

    /// Rotate 90° inside the piece's box. No-op when the result would collide
    /// or leave the side walls.
    pub fn rotate(&mut self, rotation: Rotation, grid: &Grid) -> bool {
        let rotated = rotate_matrix(&self.tiles, rotation);
        if !fits(&rotated, self.anchor, grid) {
            return false;
        }
        self.tiles = rotated;
        self.orientation = match rotation {
            Rotation::Cw => (self.orientation + 1) % 4,
            Rotation::Ccw => (self.orientation + 3) % 4,
        };
        true
    }

    /// True when any tile sits on an occupied grid cell.
    pub fn overlaps(&self, grid: &Grid) -> bool {
        self.cells().any(|(pos, _)| grid.is_occupied(pos.y, pos.x))
    }

    /// Soft-drop until blocked. Returns the number of rows fallen.
    pub fn hard_drop(&mut self, grid: &Grid) -> u32 {
        let mut fallen = 0;
        while self.try_move(Direction::Down, grid) {
            fallen += 1;
        }
        fallen
    }

    /// Where `hard_drop` would leave the anchor, without moving the piece.
    pub fn simulate_hard_drop(&self, grid: &Grid) -> Position {
        let mut anchor = self.anchor;
        while fits(&self.tiles, anchor.offset(0, -1), grid) {
            anchor = anchor.offset(0, -1);
        }
        anchor
    }

    /// Cells the piece would occupy after a hard drop (ghost).
    pub fn ghost_cells(&self, grid: &Grid) -> impl Iterator<Item = (Position, Tile)> + '_ {
        cells_at(&self.tiles, self.simulate_hard_drop(grid))
    }

    /// Tile matrix trimmed of empty border rows/columns, with the anchor of the
    /// trimmed box. Locking this reproduces the piece's current cells.
    pub fn bounding_tiles(&self) -> (TileMatrix, Position) {
        let n = self.tiles.len();
        let occupied = |r: usize, c: usize| self.tiles[r][c].is_some();
        let rows: Vec<usize> = (0..n).filter(|&r| (0..n).any(|c| occupied(r, c))).collect();
        let cols: Vec<usize> = (0..n).filter(|&c| (0..n).any(|r| occupied(r, c))).collect();
        let (Some(&top), Some(&bottom), Some(&left), Some(&right)) =
            (rows.first(), rows.last(), cols.first(), cols.last())
        else {
            return (Vec::new(), self.anchor);
        };
        let matrix = self.tiles[top..=bottom]
            .iter()
            .map(|row| row[left..=right].to_vec())
            .collect();
        let anchor = self.anchor.offset(left as i32, (n - 1 - bottom) as i32);
        (matrix, anchor)
    }
}

fn cells_at(
    tiles: &[Vec<Option<Tile>>],
    anchor: Position,
) -> impl Iterator<Item = (Position, Tile)> + '_ {
    let n = tiles.len() as i32;
    tiles.iter().enumerate().flat_map(move |(r, row)| {
        row.iter().enumerate().filter_map(move |(c, slot)| {
            slot.as_ref()
                .map(|&t| (anchor.offset(c as i32, n - 1 - r as i32), t))
        })
    })
}

/// A slot is free when it is between the side walls, not below the floor, and
/// either above the board or on an empty cell.
fn cell_free(grid: &Grid, pos: Position) -> bool {
    pos.x >= 0
        && (pos.x as usize) < grid.width()
        && pos.y >= 0
        && (pos.y as usize >= grid.height() || !grid.is_occupied(pos.y, pos.x))
}

fn fits(tiles: &[Vec<Option<Tile>>], anchor: Position, grid: &Grid) -> bool {
    cells_at(tiles, anchor).all(|(pos, _)| cell_free(grid, pos))
}

fn rotate_matrix(m: &[Vec<Option<Tile>>], rotation: Rotation) -> TileMatrix {
    let n = m.len();
    (0..n)
        .map(|r| {
            (0..n)
                .map(|c| match rotation {
                    Rotation::Cw => m[n - 1 - c][r],
                    Rotation::Ccw => m[c][n - 1 - r],
                })
                .collect()
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::grid::GridRules;

    fn grid(width: usize, height: usize) -> Grid {
        Grid::new(width, height, GridRules::default()).unwrap()
    }

    fn twos() -> impl FnMut() -> Tile {
        || Tile::new(2)
    }

    fn positions(piece: &Piece) -> Vec<(i32, i32)> {
        let mut v: Vec<_> = piece.cells().map(|(p, _)| (p.x, p.y)).collect();
        v.sort_unstable();
        v
    }

    #[test]
    fn test_spawn_sits_just_above_grid() {
        let g = grid(10, 20);
        for kind in PieceKind::ALL {
            let p = Piece::spawn(kind, g.width(), g.height(), twos());
            let lowest = p.cells().map(|(pos, _)| pos.y).min().unwrap();
            assert_eq!(lowest, 20, "{kind:?}");
            assert!(p.cells().all(|(pos, _)| pos.x >= 0 && pos.x < 10));
        }
    }

    #[test]
    fn test_left_wall_blocks() {
        let g = grid(8, 16);
        let mut p = Piece::new(PieceKind::O, Position::new(0, 4), twos());
        assert!(!p.try_move(Direction::Left, &g));
        assert_eq!(p.anchor(), Position::new(0, 4));
    }

    #[test]
    fn test_right_wall_blocks() {
        let g = grid(8, 16);
        let mut p = Piece::new(PieceKind::O, Position::new(6, 4), twos());
        assert!(!p.try_move(Direction::Right, &g));
        assert_eq!(p.anchor(), Position::new(6, 4));
        assert!(p.try_move(Direction::Left, &g));
        assert_eq!(p.anchor(), Position::new(5, 4));
    }

    #[test]
    fn test_floor_blocks() {
        let g = grid(8, 16);
        let mut p = Piece::new(PieceKind::O, Position::new(3, 0), twos());
        assert!(!p.can_move(Direction::Down, &g));
        assert!(!p.try_move(Direction::Down, &g));
    }

    #[test]
    fn test_above_grid_is_free() {
        let g = grid(8, 16);
        let mut p = Piece::new(PieceKind::O, Position::new(3, 30), twos());
        assert!(p.try_move(Direction::Down, &g));
        assert!(p.try_move(Direction::Left, &g));
    }

    #[test]
    fn test_occupied_cell_blocks_down() {
        let mut g = grid(8, 16);
        g.lock(&[vec![Some(Tile::new(4))]], Position::new(3, 2));
        let mut p = Piece::new(PieceKind::O, Position::new(3, 3), twos());
        assert!(!p.try_move(Direction::Down, &g));
        assert!(p.try_move(Direction::Right, &g));
        assert!(p.try_move(Direction::Right, &g));
        assert!(p.try_move(Direction::Down, &g));
    }

    #[test]
    fn test_rotate_cw_then_ccw_restores() {
        let g = grid(10, 20);
        let mut p = Piece::new(PieceKind::Z, Position::new(4, 8), twos());
        let before = positions(&p);
        assert!(p.rotate(Rotation::Cw, &g));
        assert_eq!(p.orientation(), 1);
        assert_ne!(positions(&p), before);
        assert!(p.rotate(Rotation::Ccw, &g));
        assert_eq!(p.orientation(), 0);
        assert_eq!(positions(&p), before);
    }

    #[test]
    fn test_four_rotations_is_identity() {
        let g = grid(10, 20);
        for kind in PieceKind::ALL {
            let mut p = Piece::new(kind, Position::new(3, 8), twos());
            let before = positions(&p);
            for _ in 0..4 {
                assert!(p.rotate(Rotation::Cw, &g));
            }
            assert_eq!(positions(&p), before, "{kind:?}");
        }
    }

    #[test]
    fn test_rotation_keeps_tile_numbers() {
        let g = grid(10, 20);
        let mut n = 0;
        let mut p = Piece::new(PieceKind::I, Position::new(3, 8), || {
            n += 2;
            Tile::new(n)
        });
        let mut before: Vec<u32> = p.cells().map(|(_, t)| t.number()).collect();
        p.rotate(Rotation::Cw, &g);
        let mut after: Vec<u32> = p.cells().map(|(_, t)| t.number()).collect();
        before.sort_unstable();
        after.sort_unstable();
        assert_eq!(before, after);
    }

    #[test]
    fn test_rotation_blocked_by_wall() {
        let g = grid(8, 16);
        // Vertical I hugging the left wall: box column 2 at x = 0 means anchor -2.
        let mut p = Piece::new(PieceKind::I, Position::new(0, 4), twos());
        assert!(p.rotate(Rotation::Cw, &g));
        while p.try_move(Direction::Left, &g) {}
        let anchor = p.anchor();
        assert!(!p.rotate(Rotation::Ccw, &g));
        assert_eq!(p.anchor(), anchor);
        assert_eq!(p.orientation(), 1);
    }

    #[test]
    fn test_hard_drop_matches_simulation() {
        let mut g = grid(8, 16);
        g.lock(&[vec![Some(Tile::new(4))]], Position::new(4, 5));
        let mut p = Piece::new(PieceKind::Z, Position::new(3, 12), twos());
        let landing = p.simulate_hard_drop(&g);
        assert_eq!(p.anchor(), Position::new(3, 12));
        let fallen = p.hard_drop(&g);
        assert_eq!(p.anchor(), landing);
        assert_eq!(fallen as i32, 12 - landing.y);
    }

    #[test]
    fn test_bounding_tiles_trims_and_reanchors() {
        let p = Piece::new(PieceKind::I, Position::new(2, 5), twos());
        let (m, anchor) = p.bounding_tiles();
        assert_eq!(m.len(), 1);
        assert_eq!(m[0].len(), 4);
        // Row 1 of a 4-box sits two rows above the box's bottom.
        assert_eq!(anchor, Position::new(2, 7));

        let mut g = grid(10, 20);
        g.lock(&m, anchor);
        for (pos, _) in p.cells() {
            assert!(g.is_occupied(pos.y, pos.x));
        }
        assert_eq!(g.tile_count(), 4);
    }

    #[test]
    fn test_sequence_policy_cycles() {
        let mut policy = SequencePolicy::new(vec![PieceKind::I, PieceKind::Z], vec![2, 4, 8]);
        assert_eq!(policy.next_kind(), PieceKind::I);
        assert_eq!(policy.next_kind(), PieceKind::Z);
        assert_eq!(policy.next_kind(), PieceKind::I);
        let numbers: Vec<u32> = (0..4).map(|_| policy.next_tile().number()).collect();
        assert_eq!(numbers, vec![2, 4, 8, 2]);
    }

    #[test]
    fn test_random_policy_respects_set() {
        let mut policy = RandomPolicy::new(PieceSet::Classic, Some(42));
        for _ in 0..200 {
            assert!(PieceKind::CLASSIC.contains(&policy.next_kind()));
        }
    }

    #[test]
    fn test_seeded_policy_is_reproducible() {
        let mut a = RandomPolicy::new(PieceSet::Full, Some(9));
        let mut b = RandomPolicy::new(PieceSet::Full, Some(9));
        for _ in 0..50 {
            assert_eq!(a.next_kind(), b.next_kind());
            assert_eq!(a.next_tile(), b.next_tile());
        }
    }
}
