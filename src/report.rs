//! Final report assembly: per-player fragments, aggregate totals, winner,
//! and phase timings, rendered as text (the console layout) or JSON.
//!
//! Built once, after every worker has joined, so nothing here synchronizes.

use std::fmt::Write as _;

use serde::Serialize;

use crate::config::BattleConfig;
use crate::player::PlayerSnapshot;

/// Elapsed wall-clock time per phase.
#[derive(Debug, Clone, Copy, Serialize)]
pub struct PhaseTimings {
    pub init_seconds: f64,
    pub battle_seconds: f64,
}

/// Rendered grids for one player, captured after termination.
#[derive(Debug, Clone, Serialize)]
pub struct BoardRender {
    pub player: usize,
    pub initial: String,
    pub current: String,
}

/// Counter sums across all players.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Totals {
    pub remaining_targets: usize,
    pub times_revived: usize,
    pub attacks_received: usize,
    pub attacks_launched: usize,
    pub initial_hits: usize,
    pub initial_misses: usize,
    pub secondary_hits: usize,
    pub secondary_misses: usize,
}

impl Totals {
    fn from_snapshots(snapshots: &[PlayerSnapshot]) -> Self {
        let mut totals = Totals {
            remaining_targets: 0,
            times_revived: 0,
            attacks_received: 0,
            attacks_launched: 0,
            initial_hits: 0,
            initial_misses: 0,
            secondary_hits: 0,
            secondary_misses: 0,
        };
        for snap in snapshots {
            totals.remaining_targets += snap.remaining_targets;
            totals.times_revived += snap.times_revived;
            totals.attacks_received += snap.attacks_received;
            totals.attacks_launched += snap.attacks_launched();
            totals.initial_hits += snap.initial_hits;
            totals.initial_misses += snap.initial_misses;
            totals.secondary_hits += snap.secondary_hits;
            totals.secondary_misses += snap.secondary_misses;
        }
        totals
    }
}

/// Everything a consumer needs from one completed battle.
#[derive(Debug, Clone, Serialize)]
pub struct BattleReport {
    pub config: BattleConfig,
    /// The seed actually used (resolved from entropy when the config had none).
    pub seed: u64,
    pub winner: usize,
    pub player_reports: Vec<PlayerSnapshot>,
    pub totals: Totals,
    pub timings: PhaseTimings,
    pub boards: Vec<BoardRender>,
}

impl BattleReport {
    pub fn new(
        config: BattleConfig,
        seed: u64,
        winner: usize,
        player_reports: Vec<PlayerSnapshot>,
        boards: Vec<BoardRender>,
        timings: PhaseTimings,
    ) -> Self {
        let totals = Totals::from_snapshots(&player_reports);
        Self {
            config,
            seed,
            winner,
            player_reports,
            totals,
            timings,
            boards,
        }
    }

    /// Console layout. Boards are only worth reading for a two-player game on
    /// a modest grid, so they are included when P == 2 and N <= 40.
    pub fn render_text(&self) -> String {
        let mut out = String::new();
        if self.config.players == 2 && self.config.board_size <= 40 {
            out.push_str("Initial Boards:\n");
            for board in &self.boards {
                let _ = writeln!(out, "Player {} (Initial Board):", board.player);
                out.push_str(&board.initial);
                out.push('\n');
            }
            out.push_str("Current Boards:\n");
            for board in &self.boards {
                let _ = writeln!(out, "Player {} (Current Board):", board.player);
                out.push_str(&board.current);
                out.push('\n');
            }
        }
        for snap in &self.player_reports {
            push_player_fragment(&mut out, snap);
        }
        let _ = writeln!(out, "Winner: Player {}\n", self.winner);
        self.push_totals(&mut out);
        self.push_timings(&mut out);
        out
    }

    /// Log-file layout: every player's initial board, then the full report.
    pub fn render_log(&self) -> String {
        let mut out = String::new();
        out.push_str("Initial Boards:\n");
        for board in &self.boards {
            let _ = writeln!(out, "Player {} (Initial Board):", board.player);
            out.push_str(&board.initial);
            out.push('\n');
        }
        for snap in &self.player_reports {
            push_player_fragment(&mut out, snap);
        }
        let _ = writeln!(out, "Winner: Player {}\n", self.winner);
        self.push_totals(&mut out);
        self.push_timings(&mut out);
        out
    }

    fn push_totals(&self, out: &mut String) {
        let totals = &self.totals;
        out.push_str("Aggregate Totals:\n");
        let _ = writeln!(out, "  Targets Remaining: {}", totals.remaining_targets);
        let _ = writeln!(out, "  Times Revived:     {}", totals.times_revived);
        let _ = writeln!(out, "  Attacks Received:  {}", totals.attacks_received);
        let _ = writeln!(out, "  Attacks Launched:  {}", totals.attacks_launched);
        out.push('\n');
    }

    fn push_timings(&self, out: &mut String) {
        out.push_str("Time Statistics:\n");
        let _ = writeln!(
            out,
            "  Initial Phase took {} seconds.",
            self.timings.init_seconds
        );
        let _ = writeln!(
            out,
            "  Battle Phase took {} seconds.",
            self.timings.battle_seconds
        );
    }
}

fn push_player_fragment(out: &mut String, snap: &PlayerSnapshot) {
    let _ = writeln!(out, "Player {} Report:", snap.player);
    let _ = writeln!(out, "  Targets Remaining: {}", snap.remaining_targets);
    let _ = writeln!(out, "  Times Revived:     {}", snap.times_revived);
    let _ = writeln!(out, "  Attacks Received:  {}", snap.attacks_received);
    let _ = writeln!(out, "  Attacks Launched:  {}", snap.attacks_launched());
    out.push_str("  Attacks Launched Details:\n");
    let _ = writeln!(out, "    Initial Hits:     {}", snap.initial_hits);
    let _ = writeln!(out, "    Initial Misses:   {}", snap.initial_misses);
    let _ = writeln!(out, "    Secondary Hits:   {}", snap.secondary_hits);
    let _ = writeln!(out, "    Secondary Misses: {}", snap.secondary_misses);
    out.push('\n');
}

#[cfg(test)]
mod tests {
    use super::*;

    fn snapshot(player: usize) -> PlayerSnapshot {
        PlayerSnapshot {
            player,
            remaining_targets: 3,
            total_targets: 5,
            times_revived: 1,
            attacks_received: 7,
            initial_hits: 2,
            initial_misses: 3,
            secondary_hits: 1,
            secondary_misses: 4,
        }
    }

    fn report(players: usize, board_size: usize) -> BattleReport {
        let snapshots: Vec<_> = (0..players).map(snapshot).collect();
        let boards = (0..players)
            .map(|player| BoardRender {
                player,
                initial: "O_\n__\n".to_string(),
                current: "*.\n..\n".to_string(),
            })
            .collect();
        BattleReport::new(
            BattleConfig::new(players, board_size, 1),
            42,
            0,
            snapshots,
            boards,
            PhaseTimings {
                init_seconds: 0.25,
                battle_seconds: 1.5,
            },
        )
    }

    #[test]
    fn totals_sum_across_players() {
        let report = report(3, 2);
        assert_eq!(report.totals.attacks_launched, 30);
        assert_eq!(report.totals.attacks_received, 21);
        assert_eq!(report.totals.remaining_targets, 9);
        assert_eq!(report.totals.times_revived, 3);
    }

    #[test]
    fn text_report_contains_fragments_winner_and_timings() {
        let text = report(3, 2).render_text();
        assert!(text.contains("Player 0 Report:"));
        assert!(text.contains("Player 2 Report:"));
        assert!(text.contains("Winner: Player 0"));
        assert!(text.contains("Initial Phase took 0.25 seconds."));
        assert!(text.contains("Battle Phase took 1.5 seconds."));
        // Three players: boards stay out of the console report.
        assert!(!text.contains("Initial Boards:"));
    }

    #[test]
    fn two_player_small_board_report_shows_grids() {
        let text = report(2, 2).render_text();
        assert!(text.contains("Initial Boards:"));
        assert!(text.contains("Player 1 (Current Board):"));
        assert!(text.contains("O_\n__\n"));
    }

    #[test]
    fn log_report_always_shows_initial_grids() {
        let text = report(5, 2).render_log();
        assert!(text.contains("Player 4 (Initial Board):"));
        assert!(!text.contains("Current Board"));
    }

    #[test]
    fn report_serializes_to_json() {
        let json = serde_json::to_value(report(2, 2)).expect("report serializes");
        assert_eq!(json["winner"], 0);
        assert_eq!(json["totals"]["attacks_launched"], 20);
        assert_eq!(json["player_reports"][1]["attacks_received"], 7);
    }
}
