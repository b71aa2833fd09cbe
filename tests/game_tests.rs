use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tetris_2048::piece::{Direction, Rotation};
use tetris_2048::{
    Action, GameConfig, GameState, Grid, GridRules, PieceKind, PieceSet, Position, RandomPolicy,
    SequencePolicy, Tile,
};

fn config(width: u16, height: u16) -> GameConfig {
    GameConfig {
        width,
        height,
        ..GameConfig::default()
    }
}

fn seeded_game(seed: u64, pieces: PieceSet) -> GameState {
    let config = GameConfig {
        pieces,
        seed: Some(seed),
        ..config(10, 16)
    };
    let policy = Box::new(RandomPolicy::new(pieces, Some(seed)));
    GameState::new(&config, policy, 0).unwrap()
}

/// One optional move/rotate while the piece is entering, then a hard drop.
fn play_piece(game: &mut GameState, rng: &mut StdRng) -> Vec<u32> {
    const OPENERS: [Option<Action>; 5] = [
        None,
        Some(Action::MoveLeft),
        Some(Action::MoveRight),
        Some(Action::RotateCw),
        Some(Action::RotateCcw),
    ];
    let mut scores = Vec::new();
    game.frame(OPENERS[rng.gen_range(0..OPENERS.len())]);
    scores.push(game.score());
    game.frame(Some(Action::HardDrop));
    scores.push(game.score());
    scores
}

/// Plays until the game ends; the cap only guards against a runaway loop.
fn play_out(game: &mut GameState, rng: &mut StdRng) -> Vec<u32> {
    let mut scores = Vec::new();
    for _ in 0..5_000 {
        if game.is_over() {
            break;
        }
        scores.extend(play_piece(game, rng));
    }
    scores
}

fn snapshot(grid: &Grid) -> Vec<Option<u32>> {
    (0..grid.height())
        .flat_map(|r| (0..grid.width()).map(move |c| (r, c)))
        .map(|(r, c)| grid.tile(r, c).map(|t| t.number()))
        .collect()
}

fn put(grid: &mut Grid, row: i32, col: i32, n: u32) {
    grid.lock(&[vec![Some(Tile::new(n))]], Position::new(col, row));
}

mod invariants {
    use super::*;

    #[test]
    fn test_dimensions_and_occupancy_hold_through_play() {
        for seed in 0..8 {
            let mut game = seeded_game(seed, PieceSet::Full);
            let mut rng = StdRng::seed_from_u64(seed);
            for _ in 0..200 {
                if game.is_over() {
                    break;
                }
                play_piece(&mut game, &mut rng);
                let grid = game.grid();
                assert_eq!((grid.width(), grid.height()), (10, 16));
                let counted = snapshot(grid).iter().filter(|c| c.is_some()).count();
                assert_eq!(counted, grid.tile_count());
                assert!(!game.current().overlaps(grid));
            }
        }
    }

    #[test]
    fn test_score_never_decreases() {
        for seed in 0..8 {
            let mut game = seeded_game(seed, PieceSet::Classic);
            let mut rng = StdRng::seed_from_u64(seed + 100);
            let mut last = 0;
            for score in play_out(&mut game, &mut rng) {
                assert!(score >= last, "seed {seed}: {score} < {last}");
                last = score;
            }
        }
    }

    #[test]
    fn test_tiles_stay_powers_of_two() {
        let mut game = seeded_game(42, PieceSet::Full);
        let mut rng = StdRng::seed_from_u64(42);
        play_out(&mut game, &mut rng);
        for n in snapshot(game.grid()).into_iter().flatten() {
            assert!(n >= 2 && n.is_power_of_two() && n <= 2048, "{n}");
        }
    }
}

mod grid_rules {
    use super::*;

    #[test]
    fn test_pair_merges_into_bottom() {
        let mut g = Grid::new(1, 4, GridRules::default()).unwrap();
        put(&mut g, 0, 0, 2);
        put(&mut g, 1, 0, 2);
        assert_eq!(g.merge_and_collapse(), 4);
        assert_eq!(g.tile(0, 0), Some(Tile::new(4)));
        assert_eq!(g.tile(1, 0), None);
        assert_eq!(g.score(), 4);
    }

    #[test]
    fn test_isolated_tile_settles_on_floor() {
        let mut g = Grid::new(4, 8, GridRules::default()).unwrap();
        put(&mut g, 6, 2, 8);
        for expected_row in (0..6).rev() {
            g.merge_and_collapse();
            assert_eq!(g.tile(expected_row, 2), Some(Tile::new(8)));
        }
        g.merge_and_collapse();
        assert_eq!(g.tile(0, 2), Some(Tile::new(8)));
        assert_eq!(g.tile_count(), 1);
    }

    #[test]
    fn test_full_row_clears_for_its_sum() {
        let mut g = Grid::new(3, 5, GridRules::default()).unwrap();
        for (col, n) in [2, 8, 32].into_iter().enumerate() {
            put(&mut g, 0, col as i32, n);
        }
        put(&mut g, 1, 0, 4);
        assert_eq!(g.clear_full_rows(), 1);
        assert_eq!(g.score(), 42);
        assert_eq!(g.height(), 5);
        assert_eq!(g.tile(0, 0), Some(Tile::new(4)));
        assert_eq!(g.tile_count(), 1);
    }
}

mod collision {
    use super::*;
    use tetris_2048::Piece;

    fn scattered_grid(seed: u64) -> Grid {
        let mut rng = StdRng::seed_from_u64(seed);
        let mut g = Grid::new(10, 20, GridRules::default()).unwrap();
        for col in 0..10 {
            let height = rng.gen_range(0..8);
            for row in 0..height {
                put(&mut g, row, col, 2u32 << rng.gen_range(0..6u32));
            }
        }
        g
    }

    #[test]
    fn test_hard_drop_equals_repeated_soft_drop() {
        for seed in 0..20 {
            let g = scattered_grid(seed);
            for kind in PieceKind::ALL {
                let spawned = Piece::spawn(kind, g.width(), g.height(), || Tile::new(2));
                let mut hard = spawned.clone();
                let mut soft = spawned.clone();
                let fallen = hard.hard_drop(&g);
                let mut steps = 0;
                while soft.try_move(Direction::Down, &g) {
                    steps += 1;
                }
                assert_eq!(hard.anchor(), soft.anchor(), "{kind:?} seed {seed}");
                assert_eq!(fallen, steps);
                assert_eq!(spawned.simulate_hard_drop(&g), hard.anchor());
            }
        }
    }

    #[test]
    fn test_walls_reject_moves() {
        let g = Grid::new(8, 16, GridRules::default()).unwrap();
        for kind in PieceKind::ALL {
            let mut p = Piece::spawn(kind, g.width(), g.height(), || Tile::new(2));
            while p.try_move(Direction::Left, &g) {}
            let left = p.anchor();
            assert!(p.cells().any(|(pos, _)| pos.x == 0));
            assert!(!p.try_move(Direction::Left, &g));
            assert_eq!(p.anchor(), left);

            while p.try_move(Direction::Right, &g) {}
            let right = p.anchor();
            assert!(p.cells().any(|(pos, _)| pos.x == 7));
            assert!(!p.try_move(Direction::Right, &g));
            assert_eq!(p.anchor(), right);
        }
    }

    #[test]
    fn test_failed_rotation_is_noop() {
        let mut g = Grid::new(8, 16, GridRules::default()).unwrap();
        // Tiles in column 3 under the horizontal I; vertical fits in column 2.
        for row in 0..2 {
            put(&mut g, row, 3, 2u32 << (row % 2));
        }
        let mut p = Piece::new(PieceKind::I, Position::new(0, 0), || Tile::new(2));
        assert!(p.rotate(Rotation::Cw, &g));
        let cells: Vec<_> = p.cells().map(|(pos, _)| pos).collect();
        assert!(!p.rotate(Rotation::Cw, &g));
        assert_eq!(p.cells().map(|(pos, _)| pos).collect::<Vec<_>>(), cells);
        assert_eq!(p.orientation(), 1);
    }
}

mod controller {
    use super::*;

    fn play_until_over(seed: u64) -> (u32, Vec<Option<u32>>, u32) {
        let mut game = seeded_game(seed, PieceSet::Classic);
        let mut rng = StdRng::seed_from_u64(seed);
        play_out(&mut game, &mut rng);
        (game.score(), snapshot(game.grid()), game.pieces_locked())
    }

    #[test]
    fn test_same_seed_same_game() {
        assert_eq!(play_until_over(5), play_until_over(5));
    }

    #[test]
    fn test_game_over_is_idempotent() {
        let mut game = seeded_game(9, PieceSet::Classic);
        let mut rng = StdRng::seed_from_u64(9);
        play_out(&mut game, &mut rng);
        assert!(game.grid().is_game_over());
        let before = (game.score(), snapshot(game.grid()), game.pieces_locked());
        for action in [None, Some(Action::HardDrop), Some(Action::MoveLeft), Some(Action::Pause)] {
            let report = game.frame(action);
            assert!(report.game_over);
            assert!(!report.locked);
            assert_eq!(report.merge_points, 0);
        }
        assert_eq!(
            (game.score(), snapshot(game.grid()), game.pieces_locked()),
            before
        );
    }

    #[test]
    fn test_paused_game_does_not_change() {
        let mut game = seeded_game(3, PieceSet::Full);
        let mut rng = StdRng::seed_from_u64(3);
        for _ in 0..4 {
            play_piece(&mut game, &mut rng);
        }
        assert!(!game.is_over());
        game.frame(None);
        game.toggle_pause();
        let anchor = game.current().anchor();
        let grid = snapshot(game.grid());
        let score = game.score();
        for action in [
            None,
            Some(Action::HardDrop),
            Some(Action::MoveRight),
            Some(Action::RotateCw),
            Some(Action::SoftDrop),
        ] {
            let report = game.frame(action);
            assert!(!report.locked);
        }
        assert_eq!(game.current().anchor(), anchor);
        assert_eq!(snapshot(game.grid()), grid);
        assert_eq!(game.score(), score);
        assert!(game.is_paused());
    }

    #[test]
    fn test_one_input_per_frame() {
        let policy = Box::new(SequencePolicy::new(vec![PieceKind::O], vec![2]));
        let mut game = GameState::new(&config(10, 20), policy, 0).unwrap();
        let start = game.current().anchor();
        game.frame(Some(Action::MoveLeft));
        game.frame(Some(Action::MoveLeft));
        assert_eq!(game.current().anchor(), Position::new(start.x - 2, start.y - 2));
    }
}
