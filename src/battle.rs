//! The coordinator: barrier-synchronized worker loop, targeting and revival
//! policy, termination and winner detection.
//!
//! One worker thread per player. All workers block on a start barrier, then
//! loop: check own aliveness, park while dead, otherwise pick a live opponent
//! at a random starting index, occasionally revive a dead player, and launch
//! one attack. The last worker that can find no live opponent ends the run
//! and records itself as winner.
//!
//! Locking discipline (two tiers):
//! - Player locks come first and are never acquired while the global lock is
//!   held; cross-player scans under the global lock read each player's
//!   lock-free aliveness cache instead.
//! - The global lock serializes alive counts, the termination decision, and
//!   the write-once winner. It is held only for O(P) scans, never across a
//!   wait.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Barrier, Condvar, Mutex, MutexGuard};
use std::thread;
use std::time::Instant;

use crate::config::{BattleConfig, ConfigError};
use crate::player::Player;
use crate::report::{BattleReport, BoardRender, PhaseTimings};
use crate::rng::Rng;

/// A revival roll succeeds one time in ten.
const REVIVAL_ODDS: usize = 10;

/// Runs one battle to completion and produces the final report.
pub struct Coordinator {
    config: BattleConfig,
    verbose: bool,
}

impl Coordinator {
    /// Rejects invalid parameters before any player exists.
    pub fn new(config: BattleConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self {
            config,
            verbose: false,
        })
    }

    /// Emit per-thread progress lines on stdout during both phases.
    pub fn verbose(mut self, on: bool) -> Self {
        self.verbose = on;
        self
    }

    /// Initialize all players (one thread each), run the battle to its
    /// natural termination, and aggregate the report.
    pub fn run(&self) -> BattleReport {
        let base_seed = self
            .config
            .seed
            .unwrap_or_else(|| Rng::from_entropy().next_u64());
        let players_count = self.config.players;

        // Initialization phase: board seeding is per-player independent, so
        // each player gets its own init thread, as in the battle phase.
        let init_start = Instant::now();
        if self.verbose {
            println!("Initializing players:");
        }
        let players: Vec<Player> = thread::scope(|scope| {
            let handles: Vec<_> = (0..players_count)
                .map(|number| {
                    let config = self.config;
                    let verbose = self.verbose;
                    scope.spawn(move || {
                        let mut rng = Rng::split(base_seed, number as u64);
                        let player =
                            Player::new(number, config.board_size, config.targets, &mut rng);
                        if verbose {
                            println!("Player {number} has been initialized.");
                        }
                        player
                    })
                })
                .collect();
            handles
                .into_iter()
                .map(|handle| handle.join().expect("init worker panicked"))
                .collect()
        });
        let init_elapsed = init_start.elapsed();

        // Battle phase.
        let shared = Shared::new(players);
        let battle_start = Instant::now();
        thread::scope(|scope| {
            for number in 0..players_count {
                let shared = &shared;
                let verbose = self.verbose;
                // Worker streams must not collide with the init streams.
                let rng = Rng::split(base_seed, (players_count + number) as u64);
                scope.spawn(move || shared.battle_loop(number, rng, verbose));
            }
        });
        let battle_elapsed = battle_start.elapsed();

        let winner = shared
            .global
            .lock()
            .expect("global lock poisoned")
            .winner
            .expect("battle ended without a winner");
        if self.verbose {
            println!("Completed simulation.");
        }

        let snapshots = shared.players.iter().map(Player::snapshot).collect();
        let boards = shared
            .players
            .iter()
            .map(|player| {
                let (initial, current) = player.render_boards();
                BoardRender {
                    player: player.number(),
                    initial,
                    current,
                }
            })
            .collect();
        BattleReport::new(
            self.config,
            base_seed,
            winner,
            snapshots,
            boards,
            PhaseTimings {
                init_seconds: init_elapsed.as_secs_f64(),
                battle_seconds: battle_elapsed.as_secs_f64(),
            },
        )
    }
}

/// Park/wake primitive for one player's worker while that player is dead.
#[derive(Default)]
struct WaitCell {
    lock: Mutex<()>,
    cond: Condvar,
}

impl WaitCell {
    /// Notify under the cell lock so a wake cannot slip between a parked
    /// worker's predicate check and its wait.
    fn notify(&self) {
        let _guard = self.lock.lock().expect("wait cell lock poisoned");
        self.cond.notify_all();
    }
}

struct GlobalState {
    /// Write-once, only under the global lock, only by the worker that
    /// flips `done`.
    winner: Option<usize>,
}

/// State shared by all battle workers for the duration of one run.
struct Shared {
    players: Vec<Player>,
    start: Barrier,
    done: AtomicBool,
    global: Mutex<GlobalState>,
    cells: Vec<WaitCell>,
}

impl Shared {
    fn new(players: Vec<Player>) -> Self {
        let count = players.len();
        Self {
            players,
            start: Barrier::new(count),
            done: AtomicBool::new(false),
            global: Mutex::new(GlobalState { winner: None }),
            cells: (0..count).map(|_| WaitCell::default()).collect(),
        }
    }

    #[inline]
    fn done(&self) -> bool {
        self.done.load(Ordering::Acquire)
    }

    fn lock_global(&self) -> MutexGuard<'_, GlobalState> {
        self.global.lock().expect("global lock poisoned")
    }

    fn alive_count(&self) -> usize {
        self.players
            .iter()
            .filter(|player| player.is_alive_cached())
            .count()
    }

    /// Worker body for player `me`. Returns once `done` is observed.
    fn battle_loop(&self, me: usize, mut rng: Rng, verbose: bool) {
        self.start.wait();
        if verbose {
            println!("Starting player {me}.");
        }

        loop {
            if self.done() {
                return;
            }

            if !self.players[me].is_alive() {
                if self.finish_if_no_survivors(me) {
                    return;
                }
                self.park(me);
                continue;
            }

            let Some(opponent) = self.scan_live_opponent(&mut rng, me) else {
                match self.try_finish(me) {
                    FinishAttempt::Finished => {
                        if verbose {
                            println!("Player {me} is the last one standing.");
                        }
                        return;
                    }
                    FinishAttempt::Retry => continue,
                }
            };

            self.maybe_revive(&mut rng, me);

            // The coordinate comes off the opponent's board; if another
            // attacker exhausts it first we just skip this turn.
            let target = &self.players[opponent];
            let coord = target.target_coordinates(&mut rng);
            if !coord.is_none() {
                self.players[me].launch_attack(target, coord);
            }
        }
    }

    /// Random-start wrapping scan for a live opponent, under the global lock.
    fn scan_live_opponent(&self, rng: &mut Rng, me: usize) -> Option<usize> {
        let count = self.players.len();
        let start = rng.next_below(count);
        let _global = self.lock_global();
        (0..count)
            .map(|probe| (start + probe) % count)
            .find(|&idx| idx != me && self.players[idx].is_alive_cached())
    }

    /// Revival policy: only in the mid-game (more than two but fewer than
    /// P/2 players alive), with 1-in-10 odds, reviving a randomly located
    /// dead player and waking its parked worker.
    fn maybe_revive(&self, rng: &mut Rng, me: usize) {
        let count = self.players.len();
        let candidate = {
            let _global = self.lock_global();
            let alive = self.alive_count();
            if !(alive > 2 && alive < count / 2) {
                return;
            }
            if !rng.one_in(REVIVAL_ODDS) {
                return;
            }
            let start = rng.next_below(count);
            (0..count)
                .map(|probe| (start + probe) % count)
                .find(|&idx| idx != me && !self.players[idx].is_alive_cached())
        };
        // The player lock is taken outside the global lock; losing the race
        // to a concurrent revival just tops up the same board again.
        if let Some(candidate) = candidate {
            self.players[candidate].revive(rng);
            self.cells[candidate].notify();
        }
    }

    /// No opponent was found: either the race is over, or a concurrent state
    /// change slipped between scans and the loop should retry.
    fn try_finish(&self, me: usize) -> FinishAttempt {
        let mut global = self.lock_global();
        let alive = self.alive_count();
        if alive > 1 {
            eprintln!(
                "player {me}: opponent scan found no one but {alive} players alive; retrying"
            );
            return FinishAttempt::Retry;
        }
        self.finish_locked(&mut global, me);
        FinishAttempt::Finished
    }

    /// A dead worker about to park must first check for the mutual-kill
    /// ending where no player is left alive; parking there would strand
    /// every worker. Returns true if this worker ended the battle.
    fn finish_if_no_survivors(&self, me: usize) -> bool {
        let mut global = self.lock_global();
        if self.alive_count() > 0 {
            return false;
        }
        self.finish_locked(&mut global, me);
        true
    }

    /// Flip `done`, record the winner once, and release every parked worker.
    /// Caller holds the global lock.
    fn finish_locked(&self, global: &mut GlobalState, me: usize) {
        if !self.done.swap(true, Ordering::AcqRel) {
            global.winner = Some(me);
        }
        for cell in &self.cells {
            cell.notify();
        }
    }

    /// Park until this player is revived or the battle ends.
    fn park(&self, me: usize) {
        let cell = &self.cells[me];
        let mut guard = cell.lock.lock().expect("wait cell lock poisoned");
        while !self.done() && !self.players[me].is_alive_cached() {
            guard = cell.cond.wait(guard).expect("wait cell lock poisoned");
        }
    }
}

enum FinishAttempt {
    Finished,
    Retry,
}
