use std::{process::Child, time::Duration};

use anyhow::{self, bail};
use tracing::debug;

use super::{create_process, reap};

/// A bot process with piped stdio. Containment is only available on Linux.
#[derive(Debug)]
pub struct LimitedProcess {
    /// The spawned process. Its stdio handles are taken by the arbiter.
    pub child: Child,
    cleaned_up: bool,
}

impl LimitedProcess {
    /// Always fails: cgroups only exist on Linux.
    pub fn launch(
        _command: &str,
        _args: &[String],
        _max_memory: i64,
        _cpus: &str,
    ) -> anyhow::Result<LimitedProcess> {
        bail!("cgroups only available on linux")
    }

    /// Spawns `command` without any resource limit.
    pub fn launch_without_container(
        command: &str,
        args: &[String],
    ) -> anyhow::Result<LimitedProcess> {
        let child = create_process(command, args)?;

        Ok(LimitedProcess {
            child,
            cleaned_up: false,
        })
    }

    /// Never contained on this platform.
    pub fn is_contained(&self) -> bool {
        false
    }

    /// Kills the process and reaps it.
    pub fn try_kill(&mut self, max_duration: Duration) -> anyhow::Result<()> {
        if self.cleaned_up {
            return Ok(());
        }
        let _ = self.child.kill();
        if !reap(&mut self.child, max_duration)? {
            bail!("process {} did not exit after kill", self.child.id());
        }
        self.cleaned_up = true;
        Ok(())
    }
}

impl Drop for LimitedProcess {
    fn drop(&mut self) {
        const CLEANUP_DURATION: Duration = Duration::from_millis(100);
        if !self.cleaned_up {
            if let Err(e) = self.try_kill(CLEANUP_DURATION) {
                debug!("could not clean up process {} on drop: {e:#}", self.child.id());
            }
        }
    }
}
