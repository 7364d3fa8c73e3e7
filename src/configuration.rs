//! Config for the referee behaviors
//!
//! Configuration can be created programmatically using [`Configuration::new()`] or by reading
//! environment variables using [`Configuration::from_env()`].
//!
//! # Environment Variables
//!
//! All values are optional and case-insensitive. Set the value to `"true"` to enable a flag;
//! any other value disables it.
//!
//! - `TRON_VERBOSE` — Print the map before the first turn and after every turn (default: `true`)
//! - `TRON_LOG` — Write a trace of the match to a log file (default: `false`)
//! - `TRON_FORWARD_BOT_STDERR` — Copy bot stderr to the referee's stderr (default: `true`)
//! - `TRON_ALLOW_UNCONTAINED` — Run bots without cgroup limits when those cannot be set up
//!   (default: `true`)

/// Configuration for referee behaviors.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Configuration {
    pub(crate) verbose: bool,
    pub(crate) log: bool,
    pub(crate) forward_bot_stderr: bool,
    pub(crate) allow_uncontained: bool,
}

impl Configuration {
    /// Create a new configuration with default parameters.
    ///
    /// By default:
    /// - The referee prints the map after every turn.
    /// - Logging to file is disabled.
    /// - Bot stderr is forwarded to the referee's stderr.
    /// - Bots run uncontained if the requested limits cannot be enforced.
    pub fn new() -> Self {
        Self {
            verbose: true,
            log: false,
            forward_bot_stderr: true,
            allow_uncontained: true,
        }
    }

    /// Create configuration from environment variables.
    ///
    /// See the [module documentation](self) for the recognized variables. Unset variables
    /// keep their default value.
    pub fn from_env() -> Self {
        fn get_env_flag(var: &str, default: bool) -> bool {
            match std::env::var(var) {
                Ok(val) => val.eq_ignore_ascii_case("true"),
                Err(_) => default,
            }
        }

        Self {
            verbose: get_env_flag("TRON_VERBOSE", true),
            log: get_env_flag("TRON_LOG", false),
            forward_bot_stderr: get_env_flag("TRON_FORWARD_BOT_STDERR", true),
            allow_uncontained: get_env_flag("TRON_ALLOW_UNCONTAINED", true),
        }
    }

    /// Enable or disable the per-turn map dump. The result is always printed.
    pub fn with_verbose(mut self, value: bool) -> Self {
        self.verbose = value;
        self
    }

    /// Enable or disable logging to file.
    pub fn with_log(mut self, value: bool) -> Self {
        self.log = value;
        self
    }

    /// Enable or disable forwarding of bot stderr.
    ///
    /// When disabled, bot stderr is still drained so a chatty bot never blocks.
    pub fn with_forward_bot_stderr(mut self, value: bool) -> Self {
        self.forward_bot_stderr = value;
        self
    }

    /// Allow or forbid falling back to uncontained bots.
    pub fn with_allow_uncontained(mut self, value: bool) -> Self {
        self.allow_uncontained = value;
        self
    }
}

impl Default for Configuration {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builder_overrides_defaults() {
        let config = Configuration::new()
            .with_verbose(false)
            .with_log(true)
            .with_forward_bot_stderr(false)
            .with_allow_uncontained(false);
        assert!(!config.verbose);
        assert!(config.log);
        assert!(!config.forward_bot_stderr);
        assert!(!config.allow_uncontained);
        assert_eq!(Configuration::default(), Configuration::new());
    }
}
