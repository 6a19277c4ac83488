//! Command-line dispatch: `battle` (one simulation) and `batch` (many in
//! parallel), plus help/version. Exit codes: 0 success, 1 runtime failure,
//! 2 usage or validation error.

use std::fs;
use std::path::PathBuf;

use crate::battle::Coordinator;
use crate::config::BattleConfig;
use crate::parallel::{run_battle_batches, write_batch_csv, WorkerPool};
use crate::report::BattleReport;

const USAGE: &str = "usage: broadside <battle P N M | batch P N M RUNS> [options] | --help | --version";

pub fn run_with_args(args: &[String]) -> i32 {
    match args.get(1).map(String::as_str) {
        Some("battle") => handle_battle(&args[2..]),
        Some("batch") => handle_batch(&args[2..]),
        Some("--help") | Some("-h") => {
            print_help();
            0
        }
        Some("--version") | Some("-v") => {
            print_version();
            0
        }
        _ => {
            eprintln!("{USAGE}");
            2
        }
    }
}

fn handle_battle(args: &[String]) -> i32 {
    let (positionals, options) = match split_options(args) {
        Ok(parsed) => parsed,
        Err(message) => return validation_failure(&message),
    };
    let [players, board_size, targets] = match required_numbers::<3>(&positionals) {
        Ok(values) => values,
        Err(code) => return code,
    };

    let mut config = BattleConfig::new(players, board_size, targets);
    if let Some(seed) = options.seed {
        config = config.with_seed(seed);
    }
    let coordinator = match Coordinator::new(config) {
        Ok(coordinator) => coordinator,
        Err(err) => return validation_failure(&err.to_string()),
    };

    let report = coordinator.verbose(!options.quiet && !options.json).run();

    if options.json {
        match serde_json::to_string_pretty(&report) {
            Ok(payload) => println!("{payload}"),
            Err(err) => {
                eprintln!("failed to serialize battle report: {err}");
                return 1;
            }
        }
    } else {
        print!("{}", report.render_text());
    }

    if !options.no_log {
        write_log(&options.log_dir, &report);
    }
    0
}

fn handle_batch(args: &[String]) -> i32 {
    let (positionals, options) = match split_options(args) {
        Ok(parsed) => parsed,
        Err(message) => return validation_failure(&message),
    };
    let [players, board_size, targets, runs] = match required_numbers::<4>(&positionals) {
        Ok(values) => values,
        Err(code) => return code,
    };

    let mut config = BattleConfig::new(players, board_size, targets);
    if let Some(seed) = options.seed {
        config = config.with_seed(seed);
    }
    let pool = WorkerPool::with_workers(options.workers);

    let summary = match run_battle_batches(&config, runs, &pool) {
        Ok(summary) => summary,
        Err(err) => return validation_failure(&err.to_string()),
    };

    if options.json {
        match serde_json::to_string_pretty(&summary) {
            Ok(payload) => println!("{payload}"),
            Err(err) => {
                eprintln!("failed to serialize batch summary: {err}");
                return 1;
            }
        }
    } else {
        println!(
            "Ran {} battles (P={}, N={}, M={})",
            summary.runs, players, board_size, targets
        );
        for (player, wins) in summary.wins_by_player.iter().enumerate() {
            let share = 100.0 * *wins as f64 / summary.runs.max(1) as f64;
            println!("  Player {player} won {wins} ({share:.1}%)");
        }
        println!("  Mean init phase:   {:.6} s", summary.mean_init_seconds);
        println!("  Mean battle phase: {:.6} s", summary.mean_battle_seconds);
    }

    if let Some(path) = &options.csv {
        match write_batch_csv(path, &summary) {
            Ok(()) => println!("Wrote CSV: {}", path.display()),
            Err(err) => {
                eprintln!("failed to write CSV: {err}");
                return 1;
            }
        }
    }
    0
}

#[derive(Debug)]
struct Options {
    seed: Option<u64>,
    json: bool,
    quiet: bool,
    no_log: bool,
    log_dir: String,
    workers: usize,
    csv: Option<PathBuf>,
}

/// Separate positional arguments from `--flag [value]` options. Unknown
/// options, missing option values, and unparseable option values are all
/// errors; nothing falls back to a default silently.
fn split_options(args: &[String]) -> Result<(Vec<String>, Options), String> {
    let mut positionals = Vec::new();
    let mut options = Options {
        seed: None,
        json: false,
        quiet: false,
        no_log: false,
        log_dir: "logs".to_string(),
        workers: 0,
        csv: None,
    };
    let mut iter = args.iter();
    while let Some(arg) = iter.next() {
        match arg.as_str() {
            "--json" => options.json = true,
            "--quiet" => options.quiet = true,
            "--no-log" => options.no_log = true,
            "--seed" => {
                options.seed = Some(parse_option_value(arg, iter.next())?);
            }
            "--workers" => {
                options.workers = parse_option_value(arg, iter.next())?;
            }
            "--log-dir" => {
                options.log_dir = require_option_value(arg, iter.next())?.clone();
            }
            "--csv" => {
                options.csv = Some(PathBuf::from(require_option_value(arg, iter.next())?));
            }
            other if other.starts_with("--") => {
                return Err(format!("unknown option '{other}'"));
            }
            other => positionals.push(other.to_string()),
        }
    }
    Ok((positionals, options))
}

fn require_option_value<'a>(flag: &str, value: Option<&'a String>) -> Result<&'a String, String> {
    value.ok_or_else(|| format!("{flag} requires a value"))
}

fn parse_option_value<T: std::str::FromStr>(
    flag: &str,
    value: Option<&String>,
) -> Result<T, String> {
    let raw = require_option_value(flag, value)?;
    raw.parse::<T>()
        .map_err(|_| format!("{flag} requires a non-negative number (got '{raw}')"))
}

/// Parse exactly `COUNT` leading positional numbers (P, N, M, [RUNS]).
fn required_numbers<const COUNT: usize>(positionals: &[String]) -> Result<[usize; COUNT], i32> {
    const NAMES: [&str; 4] = ["P", "N", "M", "RUNS"];
    let mut values = [0_usize; COUNT];
    for (idx, slot) in values.iter_mut().enumerate() {
        let Some(raw) = positionals.get(idx) else {
            eprintln!("{USAGE}");
            return Err(2);
        };
        match raw.parse::<usize>() {
            Ok(value) => *slot = value,
            Err(_) => {
                return Err(validation_failure(&format!(
                    "{} must be a non-negative number (got '{raw}')",
                    NAMES[idx]
                )));
            }
        }
    }
    Ok(values)
}

fn validation_failure(message: &str) -> i32 {
    eprintln!("ERROR: Failed input validation. {message}");
    eprintln!("       For help, broadside --help");
    2
}

fn write_log(dir: &str, report: &BattleReport) {
    if let Err(err) = fs::create_dir_all(dir) {
        eprintln!("Warning: unable to create {dir} directory: {err}");
        return;
    }
    let stamp = chrono::Utc::now().timestamp();
    let path = format!("{dir}/debug-{stamp}.log");
    match fs::write(&path, report.render_log()) {
        Ok(()) => println!("Created log file: {path}"),
        Err(err) => eprintln!("Warning: unable to create log file: {err}"),
    }
}

fn print_version() {
    println!("broadside (v{})", env!("CARGO_PKG_VERSION"));
}

fn print_help() {
    println!(
        "\
BROADSIDE(1)                      broadside Manual                     BROADSIDE(1)

NAME
    broadside - threaded last-one-standing battleship simulation

SYNOPSIS
    broadside --help
    broadside --version
    broadside battle P N M [--seed S] [--json] [--quiet] [--log-dir DIR] [--no-log]
    broadside batch P N M RUNS [--seed S] [--workers W] [--csv PATH] [--json]

DESCRIPTION
    P player threads each own an NxN board seeded with M hidden targets and
    attack random opponents until one player is left standing. `battle` runs a
    single simulation and prints the report; `batch` runs RUNS independent
    simulations in parallel and prints the winner tally.

INPUT PARAMETERS
    P       Number of players / worker threads (P >= 2)
    N       Board edge length (N > 0)
    M       Targets per board (0 < M <= N*N)
    RUNS    Battles to run in batch mode

OPTIONS
    --seed S       Base seed for board placement and draws
    --json         Emit the report/summary as JSON instead of text
    --quiet        Suppress per-thread progress lines
    --log-dir DIR  Directory for the debug log (default: logs)
    --no-log       Skip writing the debug log
    --workers W    Concurrent battles in batch mode (default: all cores)
    --csv PATH     Write one CSV row per batch run

NOTES
    The number of targets M must be less than or equal to N*N."
    );
}
