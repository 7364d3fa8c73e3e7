//! Spawning bot processes, optionally inside a cgroup.
//!
//! Every bot gets three pipes (stdin, stdout, stderr). On Linux the process can also be
//! placed in a fresh cgroup v2 with a memory cap and a CPU list; elsewhere only the plain
//! launch is available.

#[cfg(target_os = "linux")]
mod cgroup_manager_linux;

#[cfg(target_os = "linux")]
pub use cgroup_manager_linux::*;

#[cfg(not(target_os = "linux"))]
mod cgroup_manager_stub;

use std::process::{Child, Stdio};

use anyhow::Context;
#[cfg(not(target_os = "linux"))]
pub use cgroup_manager_stub::*;

fn create_process(command: &str, args: &[String]) -> anyhow::Result<Child> {
    std::process::Command::new(command)
        .args(args)
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()
        .with_context(|| format!("could not start '{command}'"))
}

/// Reaps `child` if it exits within `max_duration`. Returns whether it did.
fn reap(child: &mut Child, max_duration: std::time::Duration) -> anyhow::Result<bool> {
    use wait_timeout::ChildExt;

    let status = child
        .wait_timeout(max_duration)
        .context("could not wait for process")?;
    Ok(status.is_some())
}
