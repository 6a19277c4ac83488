//! Attack and revival bookkeeping for one competitor.
//!
//! A `Player` is the sole synchronization boundary around its [Board]: every
//! mutation happens under the player's mutex. When an attack needs two players
//! locked at once, the lower player number is always locked first, so two
//! players attacking each other cannot deadlock. A lock-free aliveness cache
//! lets coordinator scans check liveness without nesting player locks under
//! the global lock.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Mutex, MutexGuard};

use serde::Serialize;

use crate::board::{AttackOutcome, Board, Coord};
use crate::rng::Rng;

/// Read-only copy of one player's counters, taken under the player's lock.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct PlayerSnapshot {
    pub player: usize,
    pub remaining_targets: usize,
    pub total_targets: usize,
    pub times_revived: usize,
    pub attacks_received: usize,
    pub initial_hits: usize,
    pub initial_misses: usize,
    pub secondary_hits: usize,
    pub secondary_misses: usize,
}

impl PlayerSnapshot {
    /// Total attacks this player launched, across all four outcomes.
    pub fn attacks_launched(&self) -> usize {
        self.initial_hits + self.initial_misses + self.secondary_hits + self.secondary_misses
    }
}

struct PlayerInner {
    board: Board,
    times_revived: usize,
    attacks_received: usize,
    initial_hits: usize,
    initial_misses: usize,
    secondary_hits: usize,
    secondary_misses: usize,
}

/// One competitor: identity, locked board + counters, cached aliveness.
pub struct Player {
    number: usize,
    /// Mirrors `board.is_alive()`; written under the lock at every death and
    /// revival, read lock-free by coordinator scans.
    alive: AtomicBool,
    inner: Mutex<PlayerInner>,
}

impl Player {
    pub fn new(number: usize, board_size: usize, targets: usize, rng: &mut Rng) -> Self {
        let board = Board::new(board_size, targets, rng);
        Self {
            number,
            alive: AtomicBool::new(board.is_alive()),
            inner: Mutex::new(PlayerInner {
                board,
                times_revived: 0,
                attacks_received: 0,
                initial_hits: 0,
                initial_misses: 0,
                secondary_hits: 0,
                secondary_misses: 0,
            }),
        }
    }

    pub fn number(&self) -> usize {
        self.number
    }

    /// Lock-free aliveness read. May lag the locked state by one transition;
    /// scans that act on it re-check under the proper locks.
    #[inline]
    pub fn is_alive_cached(&self) -> bool {
        self.alive.load(Ordering::Acquire)
    }

    /// Authoritative aliveness, under the player's lock.
    pub fn is_alive(&self) -> bool {
        let inner = self.lock();
        let alive = inner.board.is_alive();
        self.alive.store(alive, Ordering::Release);
        alive
    }

    /// Pick a coordinate on this player's own board for an opponent to attack.
    /// Dead players hand out no coordinates.
    pub fn target_coordinates(&self, rng: &mut Rng) -> Coord {
        let inner = self.lock();
        if !inner.board.is_alive() {
            return Coord::NONE;
        }
        inner.board.available_target(rng)
    }

    /// Attack `target`'s board at `coord`, recording the outcome on both sides.
    ///
    /// Locks both players, lowest player number first.
    ///
    /// # Panics
    /// If `coord` is the sentinel or `target` is this player.
    pub fn launch_attack(&self, target: &Player, coord: Coord) -> AttackOutcome {
        assert!(!coord.is_none(), "cannot attack the sentinel coordinate");
        assert_ne!(self.number, target.number, "player cannot attack itself");

        let (mut attacker, mut defender) = if self.number < target.number {
            let attacker = self.lock();
            let defender = target.lock();
            (attacker, defender)
        } else {
            let defender = target.lock();
            let attacker = self.lock();
            (attacker, defender)
        };

        let outcome = defender.board.attack_location(coord);
        defender.attacks_received += 1;
        target
            .alive
            .store(defender.board.is_alive(), Ordering::Release);

        match outcome {
            AttackOutcome::InitialHit => attacker.initial_hits += 1,
            AttackOutcome::InitialMiss => attacker.initial_misses += 1,
            AttackOutcome::SecondaryHit => attacker.secondary_hits += 1,
            AttackOutcome::SecondaryMiss => attacker.secondary_misses += 1,
        }
        outcome
    }

    /// Add [REVIVE_BATCH] fresh targets to this player's board and mark it alive.
    pub fn revive(&self, rng: &mut Rng) {
        let mut inner = self.lock();
        inner.board.revive(REVIVE_BATCH, rng);
        inner.times_revived += 1;
        self.alive.store(inner.board.is_alive(), Ordering::Release);
    }

    pub fn remaining_targets(&self) -> usize {
        self.lock().board.remaining_targets()
    }

    pub fn snapshot(&self) -> PlayerSnapshot {
        let inner = self.lock();
        PlayerSnapshot {
            player: self.number,
            remaining_targets: inner.board.remaining_targets(),
            total_targets: inner.board.total_targets(),
            times_revived: inner.times_revived,
            attacks_received: inner.attacks_received,
            initial_hits: inner.initial_hits,
            initial_misses: inner.initial_misses,
            secondary_hits: inner.secondary_hits,
            secondary_misses: inner.secondary_misses,
        }
    }

    /// Render the seeded and current grids, under the lock.
    pub fn render_boards(&self) -> (String, String) {
        let inner = self.lock();
        (inner.board.render_initial(), inner.board.render())
    }

    fn lock(&self) -> MutexGuard<'_, PlayerInner> {
        // Poisoning means a panic inside a critical section; the simulation's
        // invariants are gone, so propagate the abort.
        self.inner.lock().expect("player lock poisoned")
    }
}

/// Targets added per revival.
pub const REVIVE_BATCH: usize = 2;
