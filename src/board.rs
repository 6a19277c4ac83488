//! One competitor's N×N grid: hidden targets, attack resolution, revival placement.
//!
//! A board is exclusively owned by one [Player](crate::player::Player) and is only
//! mutated under that player's lock; nothing in this module synchronizes. Out-of-range
//! coordinates and exhausted scans are contract violations and abort rather than
//! return errors.

use serde::Serialize;

use crate::rng::Rng;

/// Grid position. `NONE` (both axes at the maximum index) means "no coordinate
/// available" and is what a dead or fully-attacked board hands back.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Coord {
    pub row: usize,
    pub col: usize,
}

impl Coord {
    pub const NONE: Coord = Coord {
        row: usize::MAX,
        col: usize::MAX,
    };

    #[inline]
    pub fn is_none(self) -> bool {
        self.row == usize::MAX || self.col == usize::MAX
    }
}

/// Per-cell state. Encoded glyphs match the board rendering: `_ . O *`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Cell {
    /// Never attacked, no target.
    Open,
    /// Attacked, was empty.
    Attacked,
    /// Live target.
    Target,
    /// Attacked, was a target.
    Hit,
}

impl Cell {
    pub fn glyph(self) -> char {
        match self {
            Cell::Open => '_',
            Cell::Attacked => '.',
            Cell::Target => 'O',
            Cell::Hit => '*',
        }
    }
}

/// Classification of a single attack. The first attack on a cell is "initial"
/// and changes state; every later attack on that cell is "secondary" and is a
/// no-op on the grid.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum AttackOutcome {
    InitialHit,
    InitialMiss,
    SecondaryHit,
    SecondaryMiss,
}

impl AttackOutcome {
    pub fn is_initial(self) -> bool {
        matches!(self, AttackOutcome::InitialHit | AttackOutcome::InitialMiss)
    }
}

/// N×N grid with target bookkeeping.
///
/// Counter invariants, maintained by every mutation:
/// - `targets_available` == number of cells currently in [Cell::Target]
/// - `unattacked_remaining` == number of cells never attacked
/// - `targets_available <= total_targets <= size * size`
#[derive(Debug, Clone)]
pub struct Board {
    size: usize,
    total_targets: usize,
    targets_available: usize,
    unattacked_remaining: usize,
    cells: Vec<Cell>,
    /// Set once per cell on its first attack; survives revival, so a target
    /// revived onto a previously-attacked cell never re-enters the
    /// unattacked pool.
    attacked: Vec<bool>,
    /// Snapshot of the grid as seeded, for the end-of-run report.
    initial: Vec<Cell>,
}

impl Board {
    /// Seed a board with `total_targets` randomly placed targets.
    ///
    /// # Panics
    /// If `total_targets > size * size` or `size == 0`.
    pub fn new(size: usize, total_targets: usize, rng: &mut Rng) -> Self {
        assert!(size > 0, "board size must be positive");
        assert!(
            total_targets <= size * size,
            "cannot place {total_targets} targets on a {size}x{size} board"
        );

        let mut board = Self {
            size,
            total_targets,
            targets_available: 0,
            unattacked_remaining: size * size,
            cells: vec![Cell::Open; size * size],
            attacked: vec![false; size * size],
            initial: vec![Cell::Open; size * size],
        };
        for _ in 0..total_targets {
            let idx = board
                .scan_for(rng, |cell| cell == Cell::Open)
                .expect("open cell must exist while placing targets");
            board.cells[idx] = Cell::Target;
            board.targets_available += 1;
        }
        board.initial.copy_from_slice(&board.cells);
        board
    }

    pub fn size(&self) -> usize {
        self.size
    }

    pub fn total_targets(&self) -> usize {
        self.total_targets
    }

    pub fn remaining_targets(&self) -> usize {
        self.targets_available
    }

    pub fn unattacked_remaining(&self) -> usize {
        self.unattacked_remaining
    }

    pub fn is_alive(&self) -> bool {
        self.targets_available > 0
    }

    /// Resolve one attack against `coord`.
    ///
    /// # Panics
    /// If `coord` is the sentinel or out of range; callers must only pass
    /// coordinates produced by [Board::available_target].
    pub fn attack_location(&mut self, coord: Coord) -> AttackOutcome {
        assert!(
            coord.row < self.size && coord.col < self.size,
            "attack coordinate ({}, {}) outside {}x{} board",
            coord.row,
            coord.col,
            self.size,
            self.size,
        );
        let idx = coord.row * self.size + coord.col;
        let outcome = match self.cells[idx] {
            Cell::Open => {
                self.cells[idx] = Cell::Attacked;
                AttackOutcome::InitialMiss
            }
            Cell::Target => {
                self.cells[idx] = Cell::Hit;
                self.targets_available -= 1;
                AttackOutcome::InitialHit
            }
            Cell::Attacked => AttackOutcome::SecondaryMiss,
            Cell::Hit => AttackOutcome::SecondaryHit,
        };
        if outcome.is_initial() && !self.attacked[idx] {
            self.attacked[idx] = true;
            self.unattacked_remaining -= 1;
        }
        outcome
    }

    /// Pick a random never-attacked cell, or `Coord::NONE` when every cell has
    /// been attacked. Starts at a uniformly random cell and scans row-major
    /// with wraparound.
    ///
    /// # Panics
    /// If the bookkeeping claims an unattacked cell exists but the full scan
    /// finds none (broken counter invariant).
    pub fn available_target(&self, rng: &mut Rng) -> Coord {
        if self.unattacked_remaining == 0 {
            return Coord::NONE;
        }
        let area = self.size * self.size;
        let start = rng.next_below(area);
        for probe in 0..area {
            let idx = (start + probe) % area;
            if !self.attacked[idx] {
                return Coord {
                    row: idx / self.size,
                    col: idx % self.size,
                };
            }
        }
        panic!(
            "board scan found no unattacked cell with {} still recorded",
            self.unattacked_remaining
        );
    }

    /// Convert up to `count` non-target cells into live targets.
    ///
    /// A revived target may land on a previously-attacked cell; that target
    /// counts toward `targets_available` (and `total_targets`) but the cell
    /// stays out of the unattacked pool. Stops early if the grid runs out of
    /// non-target cells.
    pub fn revive(&mut self, count: usize, rng: &mut Rng) {
        for _ in 0..count {
            let Some(idx) = self.scan_for(rng, |cell| cell != Cell::Target) else {
                break;
            };
            self.cells[idx] = Cell::Target;
            self.targets_available += 1;
            self.total_targets += 1;
        }
    }

    /// Random-start wrapping scan for the first cell matching `pred`.
    fn scan_for(&self, rng: &mut Rng, pred: impl Fn(Cell) -> bool) -> Option<usize> {
        let area = self.size * self.size;
        let start = rng.next_below(area);
        (0..area)
            .map(|probe| (start + probe) % area)
            .find(|&idx| pred(self.cells[idx]))
    }

    /// Render the current grid, one glyph per cell, one row per line.
    pub fn render(&self) -> String {
        Self::render_grid(&self.cells, self.size)
    }

    /// Render the grid as it was seeded.
    pub fn render_initial(&self) -> String {
        Self::render_grid(&self.initial, self.size)
    }

    fn render_grid(cells: &[Cell], size: usize) -> String {
        let mut out = String::with_capacity(size * (size + 1));
        for row in 0..size {
            for col in 0..size {
                out.push(cells[row * size + col].glyph());
            }
            out.push('\n');
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rng() -> Rng {
        Rng::new(0xb0a7)
    }

    #[test]
    fn seeding_places_exact_target_count() {
        let mut r = rng();
        let board = Board::new(5, 7, &mut r);
        let rendered = board.render();
        assert_eq!(rendered.matches('O').count(), 7);
        assert_eq!(board.remaining_targets(), 7);
        assert_eq!(board.unattacked_remaining(), 25);
        assert!(board.is_alive());
    }

    #[test]
    fn full_board_seeding_is_all_targets() {
        let mut r = rng();
        let board = Board::new(3, 9, &mut r);
        assert_eq!(board.render(), "OOO\nOOO\nOOO\n");
    }

    #[test]
    #[should_panic(expected = "cannot place")]
    fn over_full_seeding_panics() {
        let mut r = rng();
        let _ = Board::new(3, 10, &mut r);
    }

    #[test]
    fn attack_classification_is_initial_then_secondary() {
        let mut r = rng();
        let mut board = Board::new(1, 1, &mut r);
        let coord = Coord { row: 0, col: 0 };
        assert_eq!(board.attack_location(coord), AttackOutcome::InitialHit);
        assert_eq!(board.attack_location(coord), AttackOutcome::SecondaryHit);
        assert_eq!(board.attack_location(coord), AttackOutcome::SecondaryHit);
        assert_eq!(board.remaining_targets(), 0);
        assert!(!board.is_alive());
    }

    #[test]
    fn miss_then_secondary_miss() {
        let mut r = rng();
        let mut board = Board::new(2, 0, &mut r);
        let coord = Coord { row: 1, col: 1 };
        assert_eq!(board.attack_location(coord), AttackOutcome::InitialMiss);
        assert_eq!(board.attack_location(coord), AttackOutcome::SecondaryMiss);
        assert_eq!(board.unattacked_remaining(), 3);
    }

    #[test]
    #[should_panic(expected = "outside")]
    fn out_of_range_attack_panics() {
        let mut r = rng();
        let mut board = Board::new(2, 1, &mut r);
        board.attack_location(Coord { row: 2, col: 0 });
    }

    #[test]
    fn available_target_returns_sentinel_when_exhausted() {
        let mut r = rng();
        let mut board = Board::new(2, 1, &mut r);
        for row in 0..2 {
            for col in 0..2 {
                let coord = Coord { row, col };
                assert!(!board.available_target(&mut r).is_none());
                board.attack_location(coord);
            }
        }
        assert_eq!(board.unattacked_remaining(), 0);
        assert!(board.available_target(&mut r).is_none());
    }

    #[test]
    fn available_target_never_returns_attacked_cell() {
        let mut r = rng();
        let mut board = Board::new(4, 6, &mut r);
        for _ in 0..16 {
            let coord = board.available_target(&mut r);
            assert!(!coord.is_none());
            let outcome = board.attack_location(coord);
            assert!(outcome.is_initial(), "scan handed out an attacked cell");
        }
        assert!(board.available_target(&mut r).is_none());
    }

    #[test]
    fn revive_grows_counts_and_can_reuse_attacked_cells() {
        let mut r = rng();
        let mut board = Board::new(2, 1, &mut r);
        // Kill the board outright.
        while board.is_alive() {
            let coord = board.available_target(&mut r);
            board.attack_location(coord);
        }
        let unattacked_before = board.unattacked_remaining();
        board.revive(2, &mut r);
        assert_eq!(board.remaining_targets(), 2);
        assert_eq!(board.total_targets(), 3);
        assert!(board.is_alive());
        // Revival never returns cells to the unattacked pool.
        assert!(board.unattacked_remaining() <= unattacked_before);
    }

    #[test]
    fn revive_stops_when_no_non_target_cells_remain() {
        let mut r = rng();
        let mut board = Board::new(1, 0, &mut r);
        board.revive(2, &mut r);
        assert_eq!(board.remaining_targets(), 1);
        assert_eq!(board.total_targets(), 1);
    }

    #[test]
    fn initial_render_is_stable_across_attacks() {
        let mut r = rng();
        let mut board = Board::new(3, 4, &mut r);
        let before = board.render_initial();
        let coord = board.available_target(&mut r);
        board.attack_location(coord);
        assert_eq!(board.render_initial(), before);
        assert_ne!(board.render(), before);
    }

    #[test]
    fn counters_respect_bounds_under_random_play() {
        let mut r = rng();
        let mut board = Board::new(6, 10, &mut r);
        for _ in 0..200 {
            let area = board.size() * board.size();
            assert!(board.remaining_targets() <= board.total_targets());
            assert!(board.total_targets() <= area);
            assert_eq!(board.is_alive(), board.remaining_targets() > 0);
            let coord = Coord {
                row: r.next_below(6),
                col: r.next_below(6),
            };
            board.attack_location(coord);
        }
    }
}
