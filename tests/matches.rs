#![cfg(unix)]

use std::{
    io::Write,
    path::PathBuf,
    process::{Command, Output},
    time::{Duration, Instant},
};

use tracing::Level;
use tron_referee::prelude::*;

fn init_debug_logger() {
    let _ = tracing_subscriber::fmt()
        .with_test_writer()
        .with_max_level(Level::DEBUG)
        .with_target(false)
        .try_init();
}

fn fixture(path: &str) -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("tests")
        .join(path)
}

fn bot(script: &str, args: &str) -> String {
    format!("sh {} {args}", fixture("bots").join(script).display())
}

fn referee(move_timeout: Duration) -> Referee {
    let limits = BotLimitsBuilder::new()
        .with_move_timeout(move_timeout)
        .with_turn_delay(Duration::ZERO)
        .build()
        .unwrap();
    let config = Configuration::new()
        .with_verbose(false)
        .with_forward_bot_stderr(false);
    Referee::new(config, limits).unwrap()
}

fn run(map: &str, one: &str, two: &str) -> MatchReport {
    referee(Duration::from_secs(5))
        .run(fixture("maps").join(map), one, two)
        .unwrap()
}

#[test]
fn double_crash() {
    init_debug_logger();
    let report = run("boxed.txt", &bot("moves.sh", "1"), &bot("moves.sh", "3"));
    assert_eq!(report.outcome, MatchOutcome::BothCrashed);
    assert_eq!(report.turns, 1);
}

#[test]
fn head_on_collision() {
    let report = run("corridor.txt", &bot("moves.sh", "2"), &bot("moves.sh", "4"));
    assert_eq!(report.outcome, MatchOutcome::Collision);
    assert_eq!(report.turns, 2);
    assert_eq!(
        report.final_grid.head(Player::One),
        report.final_grid.head(Player::Two)
    );
}

#[test]
fn second_mover_hits_fresh_trail() {
    let report = run("trail.txt", &bot("moves.sh", "1"), &bot("moves.sh", "4"));
    assert_eq!(report.outcome, MatchOutcome::Winner(Player::One));
    assert_eq!(report.turns, 1);
}

#[test]
fn silent_bot_times_out() {
    let timeout = Duration::from_millis(300);
    let start = Instant::now();
    let report = referee(timeout)
        .run(
            fixture("maps/room.txt"),
            &bot("silent.sh", ""),
            &bot("moves.sh", "1"),
        )
        .unwrap();
    assert_eq!(report.outcome, MatchOutcome::Winner(Player::Two));
    assert_eq!(report.turns, 1);
    assert!(start.elapsed() >= timeout);
}

#[test]
fn invalid_digit_loses() {
    let report = run("room.txt", &bot("moves.sh", "2"), &bot("garbage.sh", ""));
    assert_eq!(report.outcome, MatchOutcome::Winner(Player::One));
}

#[test]
fn moves_persist_over_turns() {
    // player one walks east along row 1, player two goes north twice then west into it
    let report = run(
        "room.txt",
        &bot("moves.sh", "2 2 2 2 2"),
        &bot("moves.sh", "1 1 4"),
    );
    assert_eq!(report.outcome, MatchOutcome::Collision);
    assert_eq!(report.turns, 3);
    assert!(report.final_grid.wall_count() > 20);
}

#[test]
fn unreadable_map_fails_before_spawning() {
    let mut map = tempfile::NamedTempFile::new().unwrap();
    write!(map, "3 1\n1 3\n").unwrap();
    let err = referee(Duration::from_secs(1))
        .run(map.path(), "/nonexistent/bot", "/nonexistent/bot")
        .unwrap_err();
    assert!(format!("{err:#}").contains("invalid map file"), "{err:#}");
}

#[test]
fn missing_program_fails() {
    let err = referee(Duration::from_secs(1))
        .run(
            fixture("maps/room.txt"),
            &bot("silent.sh", ""),
            "/nonexistent/tron-bot",
        )
        .unwrap_err();
    assert!(
        format!("{err:#}").contains("problem while starting program 2"),
        "{err:#}"
    );
}

fn tron_command(args: &[&str]) -> Command {
    let mut command = Command::new(env!("CARGO_BIN_EXE_tron"));
    command
        .args(args)
        .env("TRON_VERBOSE", "true")
        .env("TRON_FORWARD_BOT_STDERR", "false")
        .env_remove("TRON_LOG");
    command
}

fn tron(args: &[&str]) -> Output {
    tron_command(args).output().unwrap()
}

#[test]
fn binary_prints_maps_and_result() {
    let map = fixture("maps/corridor.txt");
    let output = tron(&[
        map.to_str().unwrap(),
        bot("moves.sh", "2").as_str(),
        bot("moves.sh", "4").as_str(),
        "0",
        "5",
    ]);
    assert!(output.status.success());
    let stdout = String::from_utf8(output.stdout).unwrap();
    assert_eq!(stdout, "5 1\n1   2\n5 1\n#1 2#\nPlayers collided. Draw!\n");
}

#[test]
fn bot_stderr_reaches_referee_stderr() {
    let map = fixture("maps/room.txt");
    let output = tron_command(&[
        map.to_str().unwrap(),
        bot("moves.sh", "2").as_str(),
        bot("garbage.sh", "").as_str(),
        "0",
        "1",
    ])
    .env("TRON_FORWARD_BOT_STDERR", "true")
    .output()
    .unwrap();
    assert!(output.status.success());
    let stderr = String::from_utf8(output.stderr).unwrap();
    assert!(stderr.contains("garbage bot: no idea"), "{stderr}");
    let stdout = String::from_utf8(output.stdout).unwrap();
    assert!(stdout.ends_with("Player One Wins!\n"), "{stdout}");
}

#[test]
fn sample_bots_finish_a_match() {
    let map = fixture("maps/room.txt");
    let output = tron(&[
        map.to_str().unwrap(),
        env!("CARGO_BIN_EXE_randbot"),
        env!("CARGO_BIN_EXE_wallbot"),
        "0",
        "5",
    ]);
    assert!(output.status.success());
    let stdout = String::from_utf8(output.stdout).unwrap();
    let last = stdout.lines().last().unwrap();
    assert!(
        [
            "Players collided. Draw!",
            "Both players crashed. Draw!",
            "Player One Wins!",
            "Player Two Wins!"
        ]
        .contains(&last),
        "{stdout}"
    );
}

#[test]
fn binary_setup_errors_are_fatal() {
    let output = tron(&["/nonexistent/map.txt", "./a", "./b", "0"]);
    assert!(!output.status.success());
    let stderr = String::from_utf8(output.stderr).unwrap();
    assert!(stderr.starts_with("FATAL ERROR"), "{stderr}");

    let map = fixture("maps/room.txt");
    let output = tron(&[map.to_str().unwrap(), "/nonexistent/tron-bot", "./b", "0"]);
    assert!(!output.status.success());
    let stderr = String::from_utf8(output.stderr).unwrap();
    assert!(stderr.contains("problem while starting program 1"), "{stderr}");

    assert!(!tron(&["only-a-map.txt"]).status.success());
    assert!(!tron(&[map.to_str().unwrap(), "./a", "./b", "-1"])
        .status
        .success());
}
