//! Per-bot limits: thinking time, pacing, and optional resource containment.
//!
//! The main entry point is [`BotLimitsBuilder`]. Timing limits always apply. Memory and CPU
//! limits are only enforced on Linux with cgroups v2; when they cannot be enforced the
//! referee either refuses to start or runs the bots uncontained, depending on
//! [`Configuration`](crate::configuration::Configuration).
//!
//! # Example
//!
//! ```
//! use std::time::Duration;
//! use tron_referee::limits::BotLimitsBuilder;
//!
//! let limits = BotLimitsBuilder::new()
//!     .with_move_timeout(Duration::from_millis(500))
//!     .with_turn_delay(Duration::ZERO)
//!     .build()
//!     .unwrap();
//! assert_eq!(limits.move_timeout(), Duration::from_millis(500));
//! ```

use std::{collections::BTreeSet, env, time::Duration};

use anyhow::{bail, Context};
use tracing::warn;

/// Default time a bot has to answer one map.
pub const DEFAULT_MOVE_TIMEOUT: Duration = Duration::from_secs(3);
/// Default pause before each turn.
pub const DEFAULT_TURN_DELAY: Duration = Duration::from_secs(1);

/// Builder for [`BotLimits`]. Chainable; unset values take their defaults.
#[derive(Debug, Default, Clone)]
pub struct BotLimitsBuilder {
    move_timeout: Option<Duration>,
    turn_delay: Option<Duration>,
    ram_per_bot: Option<usize>,
    cpu_list: Option<String>,
}

impl BotLimitsBuilder {
    /// Three seconds per move, one second between turns, no containment.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Reads the limits from environment variables. Unset or unparsable values are ignored.
    ///
    /// - `TRON_MOVE_TIMEOUT_MS` (u64): time per move in milliseconds
    /// - `TRON_TURN_DELAY_MS` (u64): pause before each turn in milliseconds
    /// - `TRON_RAM_PER_BOT` (usize): memory cap per bot in MB
    /// - `TRON_CPU_LIST` (string): CPUs the bots may run on, e.g. "0-3,6"
    #[must_use]
    pub fn from_env() -> Self {
        fn parse_usize(var: &str) -> Option<usize> {
            env::var(var).ok()?.parse().ok()
        }

        fn parse_duration_millis(var: &str) -> Option<Duration> {
            env::var(var)
                .ok()?
                .parse::<u64>()
                .ok()
                .map(Duration::from_millis)
        }

        BotLimitsBuilder {
            move_timeout: parse_duration_millis("TRON_MOVE_TIMEOUT_MS"),
            turn_delay: parse_duration_millis("TRON_TURN_DELAY_MS"),
            ram_per_bot: parse_usize("TRON_RAM_PER_BOT"),
            cpu_list: env::var("TRON_CPU_LIST").ok(),
        }
    }

    /// Time a bot has to answer each map.
    #[must_use]
    pub fn with_move_timeout(self, duration: Duration) -> Self {
        Self {
            move_timeout: Some(duration),
            ..self
        }
    }

    /// Pause before each turn, for human-watchable matches. May be zero.
    #[must_use]
    pub fn with_turn_delay(self, duration: Duration) -> Self {
        Self {
            turn_delay: Some(duration),
            ..self
        }
    }

    /// Memory cap per bot (in MB). Requires cgroups v2.
    #[must_use]
    pub fn with_ram_per_bot(self, max: usize) -> Self {
        Self {
            ram_per_bot: Some(max),
            ..self
        }
    }

    /// CPUs the bots may run on. Format: `"0-3,6,8"` (inclusive ranges and single ids).
    #[must_use]
    pub fn with_cpu_list(self, cpus: &str) -> Self {
        Self {
            cpu_list: Some(cpus.to_string()),
            ..self
        }
    }

    /// Validates and builds the limits.
    ///
    /// # Errors
    ///
    /// When the memory cap exceeds the memory currently available, or the CPU list is
    /// malformed or names a CPU this machine does not have.
    pub fn build(self) -> anyhow::Result<BotLimits> {
        let ram_per_bot = match self.ram_per_bot {
            Some(0) => bail!("RAM per bot must be positive"),
            Some(megabytes) => {
                let mut sys = sysinfo::System::new();
                sys.refresh_memory();
                let available = sys.available_memory() as usize;
                let requested = megabytes.checked_mul(1_000_000).with_context(|| {
                    format!("RAM per bot ({megabytes}MB) does not fit in memory sizes")
                })?;
                if requested > available {
                    bail!(
                        "RAM per bot ({megabytes}MB) is greater than available RAM ({}MB)",
                        available / 1_000_000
                    );
                }
                Some(requested)
            }
            None => None,
        };

        let cpus = match self.cpu_list {
            Some(list) => {
                let cpus = cpu_list_to_set(&list).context("error parsing cpu list")?;
                let count = num_cpus::get();
                if let Some(&max) = cpus.iter().next_back() {
                    if usize::from(max) >= count {
                        bail!("cpu {max} does not exist, this machine has {count} logical cpus");
                    }
                }
                Some(cpus)
            }
            None => None,
        };

        let move_timeout = self.move_timeout.unwrap_or(DEFAULT_MOVE_TIMEOUT);
        if move_timeout.is_zero() {
            warn!("a zero move timeout makes every bot time out");
        }

        Ok(BotLimits {
            move_timeout,
            turn_delay: self.turn_delay.unwrap_or(DEFAULT_TURN_DELAY),
            ram_per_bot,
            cpus,
        })
    }
}

fn cpu_list_to_set(s: &str) -> anyhow::Result<BTreeSet<u8>> {
    if s.is_empty() {
        bail!("Empty string");
    }
    let mut set = BTreeSet::new();
    for item in s.split(',') {
        let bounds = item
            .split('-')
            .map(|value| {
                value
                    .trim()
                    .parse::<u8>()
                    .with_context(|| format!("could not parse {value}"))
            })
            .collect::<anyhow::Result<Vec<_>>>()?;
        match bounds[..] {
            [cpu] => {
                set.insert(cpu);
            }
            [start, end] => set.extend(start.min(end)..=start.max(end)),
            _ => bail!(
                "each comma-separated item must be a number or a range (e.g. '0-3'), got '{item}'"
            ),
        }
    }
    Ok(set)
}

/// Obtained using [`BotLimitsBuilder`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct BotLimits {
    move_timeout: Duration,
    turn_delay: Duration,
    ram_per_bot: Option<usize>,
    cpus: Option<BTreeSet<u8>>,
}

impl BotLimits {
    /// Time a bot has to answer one map.
    pub fn move_timeout(&self) -> Duration {
        self.move_timeout
    }

    /// Pause before each turn.
    pub fn turn_delay(&self) -> Duration {
        self.turn_delay
    }

    /// Memory cap per bot in bytes, if any.
    pub fn ram_per_bot(&self) -> Option<usize> {
        self.ram_per_bot
    }

    /// True when bots should be spawned in a cgroup.
    pub fn wants_containment(&self) -> bool {
        self.ram_per_bot.is_some() || self.cpus.is_some()
    }

    /// CPU list in cgroup syntax (`"0,2,3"`), empty when unrestricted.
    pub fn cpus_arg(&self) -> String {
        self.cpus
            .iter()
            .flatten()
            .map(u8::to_string)
            .collect::<Vec<_>>()
            .join(",")
    }
}

impl Default for BotLimits {
    fn default() -> Self {
        BotLimits {
            move_timeout: DEFAULT_MOVE_TIMEOUT,
            turn_delay: DEFAULT_TURN_DELAY,
            ram_per_bot: None,
            cpus: None,
        }
    }
}
