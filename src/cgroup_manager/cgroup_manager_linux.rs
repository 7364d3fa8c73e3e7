use std::{
    process::Child,
    sync::atomic::{AtomicU32, Ordering},
    time::{Duration, Instant},
};

use anyhow::{self, Context};
use cgroups_rs::Cgroup;
use tracing::{debug, warn};

use super::{create_process, reap};

fn get_current_user_id() -> anyhow::Result<String> {
    let output = std::process::Command::new("id")
        .arg("-u")
        .output()
        .context("Could not launch 'id -u'")?;
    let stdout = output.stdout;
    let untrimed_id = std::str::from_utf8(&stdout).context("id is not a valid string")?;
    Ok(untrimed_id.trim().to_string())
}

fn get_cgroup_path(user_id: &str, group_name: &str) -> String {
    format!("user.slice/user-{user_id}.slice/user@{user_id}.service/{group_name}")
}

/// Create a cgroup at `path`.
///
/// * `max_memory` - Maximum available memory in Bytes. Non-positive means no restriction.
/// * `max_pids` - Maximum number of PIDS inside the cgroup at any time. Non-positive means no restriction.
/// * `cpus` - which cpus the members can run one ("1-5,7", "1,3,4", ...). Empty string means no restriction.
fn create_cgroup(path: &str, max_memory: i64, max_pids: i64, cpus: &str) -> anyhow::Result<Cgroup> {
    let mut builder = cgroups_rs::cgroup_builder::CgroupBuilder::new(path);
    if max_memory > 0 {
        builder = builder.memory().memory_hard_limit(max_memory).done();
    }
    if max_pids > 0 {
        builder = builder
            .pid()
            .maximum_number_of_processes(cgroups_rs::MaxValue::Value(max_pids))
            .done();
    }
    if !cpus.is_empty() {
        builder = builder.cpu().cpus(cpus.to_string()).done();
    }
    builder
        .build(cgroups_rs::hierarchies::auto())
        .context("could not create cgroup")
}

fn wait_for_process_cleanup(cgroup: &Cgroup, pid: u64, max_duration: Duration) -> anyhow::Result<()> {
    let deadline = Instant::now() + max_duration;
    while cgroup.tasks().iter().any(|cpid| cpid.pid == pid) {
        if Instant::now() > deadline {
            anyhow::bail!("process {pid} still in its cgroup after {max_duration:?}");
        }
        std::thread::sleep(std::cmp::min(Duration::from_millis(10), max_duration / 10));
    }
    Ok(())
}

/// A bot process with piped stdio, possibly confined to its own cgroup.
///
/// The process (and its cgroup) are cleaned up on drop if [`LimitedProcess::try_kill`] was
/// not called.
#[derive(Debug)]
pub struct LimitedProcess {
    /// The spawned process. Its stdio handles are taken by the arbiter.
    pub child: Child,
    cgroup: Option<Cgroup>,
    cleaned_up: bool,
}

impl LimitedProcess {
    /// Spawns `command` inside a new cgroup.
    ///
    /// `max_memory` is in bytes (non-positive: unlimited), `cpus` a cpu list (empty: any).
    pub fn launch(
        command: &str,
        args: &[String],
        max_memory: i64,
        cpus: &str,
    ) -> anyhow::Result<LimitedProcess> {
        static COUNTER: AtomicU32 = AtomicU32::new(1);
        let user_id = get_current_user_id().context("could not get user id")?;
        // one cgroup per bot, unique within this process
        let group_name = format!(
            "TRON_BOT_{}_{}",
            std::process::id(),
            COUNTER.fetch_add(1, Ordering::Relaxed)
        );
        let path = get_cgroup_path(&user_id, &group_name);
        let group = create_cgroup(&path, max_memory, 100, cpus)?;

        let mut child = match create_process(command, args) {
            Ok(child) => child,
            Err(e) => {
                let _ = group.delete();
                return Err(e);
            }
        };

        let pid = child.id() as u64;
        if let Err(e) = group.add_task_by_tgid(cgroups_rs::CgroupPid { pid }) {
            let _ = child.kill();
            let _ = child.wait();
            let _ = group.delete();
            return Err(e).context("could not add process to cgroup");
        }
        debug!(pid, cgroup = %path, "bot placed in cgroup");

        Ok(LimitedProcess {
            child,
            cgroup: Some(group),
            cleaned_up: false,
        })
    }

    /// Spawns `command` without any resource limit.
    pub fn launch_without_container(
        command: &str,
        args: &[String],
    ) -> anyhow::Result<LimitedProcess> {
        let child = create_process(command, args)?;

        Ok(LimitedProcess {
            child,
            cgroup: None,
            cleaned_up: false,
        })
    }

    /// True when the process runs inside its own cgroup.
    pub fn is_contained(&self) -> bool {
        self.cgroup.is_some()
    }

    /// Kills the process (the whole cgroup when contained) and reaps it.
    pub fn try_kill(&mut self, max_duration: Duration) -> anyhow::Result<()> {
        if self.cleaned_up {
            return Ok(());
        }
        match &mut self.cgroup {
            Some(cgroup) => {
                cgroup.kill().context("could not kill process")?;
                wait_for_process_cleanup(cgroup, self.child.id() as u64, max_duration)
                    .context("process cleanup timed out")?;
                let _ = reap(&mut self.child, max_duration);
                // the process is gone at this point, a leftover cgroup is only clutter
                self.cleaned_up = true;
                if let Err(e) = cgroup.delete() {
                    warn!("Failed to remove cgroup. If this happens a lot, it may slow down the computer. {e}");
                }
                Ok(())
            }
            None => {
                // already exited is fine
                let _ = self.child.kill();
                if !reap(&mut self.child, max_duration)? {
                    anyhow::bail!("process {} did not exit after kill", self.child.id());
                }
                self.cleaned_up = true;
                Ok(())
            }
        }
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
