use std::{path::PathBuf, process::ExitCode, time::Duration};

use clap::Parser;
use tron_referee::prelude::*;

/// Referees one game of Tron between two bot programs.
///
/// Bot commands are split on whitespace. Limits not given here are read from
/// TRON_MOVE_TIMEOUT_MS, TRON_TURN_DELAY_MS, TRON_RAM_PER_BOT and TRON_CPU_LIST.
#[derive(Parser, Debug)]
#[command(name = "tron", version, about)]
struct Cli {
    /// Map file
    map: PathBuf,
    /// Command starting player one, e.g. "python3 MyTronBot.py"
    player_one: String,
    /// Command starting player two
    player_two: String,
    /// Seconds to wait before each turn [default: 1]
    #[arg(value_parser = parse_seconds)]
    delay_between_turns: Option<Duration>,
    /// Seconds each bot has to answer a map [default: 3]
    #[arg(value_parser = parse_seconds)]
    max_move_time: Option<Duration>,
}

fn parse_seconds(s: &str) -> Result<Duration, String> {
    let seconds = s
        .parse::<f64>()
        .map_err(|e| format!("'{s}' is not a number of seconds: {e}"))?;
    Duration::try_from_secs_f64(seconds).map_err(|e| format!("invalid duration '{s}': {e}"))
}

fn run(cli: Cli) -> anyhow::Result<MatchReport> {
    let mut limits = BotLimitsBuilder::from_env();
    if let Some(delay) = cli.delay_between_turns {
        limits = limits.with_turn_delay(delay);
    }
    if let Some(timeout) = cli.max_move_time {
        limits = limits.with_move_timeout(timeout);
    }

    let referee = Referee::new(Configuration::from_env(), limits.build()?)?;
    referee.run(&cli.map, &cli.player_one, &cli.player_two)
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    match run(cli) {
        Ok(_) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("FATAL ERROR: {e:#}");
            ExitCode::FAILURE
        }
    }
}
