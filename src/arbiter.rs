//! The referee's side of one bot process.
//!
//! An [`Arbiter`] owns the child and its three pipes. Two reader threads move the child's
//! stdout and stderr into channels, so asking for a move is a bounded polling loop that
//! never blocks on the bot.

use std::{
    collections::VecDeque,
    io::{self, Read, Write},
    process::ChildStdin,
    sync::mpsc::{self, Receiver, Sender, TryRecvError},
    thread,
    time::{Duration, Instant},
};

use anyhow::{bail, Context};
use tracing::{debug, info, instrument, trace, warn};

use crate::{
    cgroup_manager::LimitedProcess,
    configuration::Configuration,
    game_interface::Contestant,
    grid::Direction,
    limits::BotLimits,
    protocol,
};

/// A running bot.
///
/// The child is terminated on [`Arbiter::destroy`] or on drop, whichever comes first.
#[derive(Debug)]
pub struct Arbiter {
    name: String,
    process: LimitedProcess,
    stdin: Option<ChildStdin>,
    stdout: Receiver<Vec<u8>>,
    stderr: Receiver<Vec<u8>>,
    pending: VecDeque<u8>,
    stdout_closed: bool,
    forward_stderr: bool,
    destroyed: bool,
}

impl Arbiter {
    const POLL_INTERVAL: Duration = Duration::from_millis(1);
    const KILL_TIMEOUT: Duration = Duration::from_secs(1);
    const CHUNK_SIZE: usize = 4096;

    /// Spawns `command`, split on whitespace into program and arguments.
    ///
    /// With containment requested in `limits` the bot gets its own cgroup. If that fails,
    /// `config` decides between running it uncontained and giving up.
    #[instrument(skip(limits, config))]
    pub fn start(
        name: &str,
        command: &str,
        limits: &BotLimits,
        config: Configuration,
    ) -> anyhow::Result<Arbiter> {
        let mut words = command.split_whitespace().map(str::to_string);
        let Some(program) = words.next() else {
            bail!("empty command");
        };
        let args = words.collect::<Vec<_>>();

        let mut process = if limits.wants_containment() {
            let max_memory = limits
                .ram_per_bot()
                .map_or(0, |bytes| i64::try_from(bytes).unwrap_or(i64::MAX));
            match LimitedProcess::launch(&program, &args, max_memory, &limits.cpus_arg()) {
                Ok(process) => process,
                Err(e) if config.allow_uncontained => {
                    warn!("could not contain {name}, running it without limits: {e:#}");
                    LimitedProcess::launch_without_container(&program, &args)?
                }
                Err(e) => return Err(e).context("could not start bot with resource limits"),
            }
        } else {
            LimitedProcess::launch_without_container(&program, &args)?
        };

        let stdin = process.child.stdin.take().context("stdin was not piped")?;
        let stdout = process.child.stdout.take().context("stdout was not piped")?;
        let stderr = process.child.stderr.take().context("stderr was not piped")?;

        let (stdout_sender, stdout_receiver) = mpsc::channel();
        let (stderr_sender, stderr_receiver) = mpsc::channel();
        pump(stdout, stdout_sender);
        pump(stderr, stderr_sender);

        info!(
            pid = process.child.id(),
            contained = process.is_contained(),
            "{name} started"
        );

        Ok(Arbiter {
            name: name.to_string(),
            process,
            stdin: Some(stdin),
            stdout: stdout_receiver,
            stderr: stderr_receiver,
            pending: VecDeque::new(),
            stdout_closed: false,
            forward_stderr: config.forward_bot_stderr,
            destroyed: false,
        })
    }

    /// Label used in logs.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Sends `map` and waits up to `timeout` for a digit between 1 and 4.
    ///
    /// Bytes before the digit are discarded, bytes after it stay buffered for the next call.
    /// `None` when the map cannot be written, the time runs out, or the bot closed its
    /// stdout with nothing usable left.
    pub fn get_move(&mut self, map: &str, timeout: Duration) -> Option<Direction> {
        if let Err(e) = self.send(map.as_bytes()) {
            warn!("{}: could not send map: {e:#}", self.name);
            return None;
        }

        let start = Instant::now();
        loop {
            self.drain_stderr();
            if let Some(direction) = self.take_move() {
                trace!("{} answered {direction} after {:?}", self.name, start.elapsed());
                return Some(direction);
            }
            let elapsed = start.elapsed();
            if elapsed >= timeout {
                warn!("{} gave no valid move within {timeout:?}", self.name);
                return None;
            }
            if self.stdout_closed {
                warn!("{} closed its stdout", self.name);
                return None;
            }
            thread::sleep(Self::POLL_INTERVAL.min(timeout - elapsed));
        }
    }

    /// Closes the pipes and terminates the child. Repeated calls do nothing.
    pub fn destroy(&mut self) {
        if self.destroyed {
            return;
        }
        self.destroyed = true;
        drop(self.stdin.take());
        if let Err(e) = self.process.try_kill(Self::KILL_TIMEOUT) {
            debug!("{}: {e:#}", self.name);
        }
        self.drain_stderr();
        debug!("{} destroyed", self.name);
    }

    fn send(&mut self, bytes: &[u8]) -> anyhow::Result<()> {
        let stdin = self.stdin.as_mut().context("stdin already closed")?;
        stdin.write_all(bytes).context("write failed")?;
        stdin.flush().context("flush failed")
    }

    /// Moves everything the reader thread has collected into `pending`, then scans it.
    fn take_move(&mut self) -> Option<Direction> {
        loop {
            match self.stdout.try_recv() {
                Ok(chunk) => self.pending.extend(chunk),
                Err(TryRecvError::Empty) => break,
                Err(TryRecvError::Disconnected) => {
                    self.stdout_closed = true;
                    break;
                }
            }
        }
        while let Some(byte) = self.pending.pop_front() {
            if let Some(direction) = protocol::decode_move(byte) {
                return Some(direction);
            }
        }
        None
    }

    fn drain_stderr(&mut self) {
        let mut stderr = io::stderr();
        while let Ok(chunk) = self.stderr.try_recv() {
            if self.forward_stderr {
                let _ = stderr.write_all(&chunk);
            }
        }
        let _ = stderr.flush();
    }
}

impl Contestant for Arbiter {
    fn get_move(&mut self, map: &str, timeout: Duration) -> Option<Direction> {
        Arbiter::get_move(self, map, timeout)
    }

    fn destroy(&mut self) {
        Arbiter::destroy(self);
    }
}

impl Drop for Arbiter {
    fn drop(&mut self) {
        self.destroy();
    }
}

/// Copies `stream` into `sender` chunk by chunk until end of file or until nobody listens.
fn pump<R: Read + Send + 'static>(mut stream: R, sender: Sender<Vec<u8>>) {
    thread::spawn(move || {
        let mut buffer = [0u8; Arbiter::CHUNK_SIZE];
        loop {
            match stream.read(&mut buffer) {
                Ok(0) => break,
                Ok(n) => {
                    if sender.send(buffer[..n].to_vec()).is_err() {
                        break;
                    }
                }
                Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
                Err(_) => break,
            }
        }
    });
}
