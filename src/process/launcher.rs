//! Launching batches of external shell commands.
//!
//! Model runs are shell pipelines (`eve 1 4 | modelpy > /dev/null`), so each
//! command is handed to `sh -c` and the pid recorded is the shell's.

use std::process::{Child, Command, ExitStatus};

use crate::error::{ModelbenchError, Result};

/// A batch of shell commands fired together and waited on together.
pub struct CommandRun {
    commands: Vec<String>,
    children: Vec<Child>,
    fired: bool,
}

impl CommandRun {
    pub fn new<I, S>(commands: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            commands: commands.into_iter().map(Into::into).collect(),
            children: Vec::new(),
            fired: false,
        }
    }

    pub fn commands(&self) -> &[String] {
        &self.commands
    }

    /// Spawns every command without waiting on any of them.
    ///
    /// # Errors
    ///
    /// Returns `AlreadyFired` on a second call, or `CommandFailed` if a shell
    /// cannot be spawned. Children spawned before the failure are killed.
    pub fn fire(&mut self) -> Result<()> {
        if self.fired {
            return Err(ModelbenchError::AlreadyFired);
        }
        self.fired = true;

        for index in 0..self.commands.len() {
            let spawned = Command::new("sh")
                .arg("-c")
                .arg(&self.commands[index])
                .spawn();

            match spawned {
                Ok(child) => {
                    log::debug!("spawned pid {} for `{}`", child.id(), self.commands[index]);
                    self.children.push(child);
                }
                Err(e) => {
                    let message = format!("failed to spawn `{}`: {}", self.commands[index], e);
                    self.kill();
                    return Err(ModelbenchError::CommandFailed(message));
                }
            }
        }

        Ok(())
    }

    /// Process ids of the spawned shells, in command order. Empty before `fire`.
    pub fn pids(&self) -> Vec<u32> {
        self.children.iter().map(Child::id).collect()
    }

    /// Blocks until every spawned command has exited.
    ///
    /// A non-zero exit status is returned, not treated as an error:
    /// a failing model run still has a memory profile worth reporting.
    pub fn wait(&mut self) -> Result<Vec<ExitStatus>> {
        let mut statuses = Vec::with_capacity(self.children.len());

        for (child, command) in self.children.iter_mut().zip(&self.commands) {
            let status = child.wait()?;
            if !status.success() {
                log::debug!("`{}` exited with {}", command, status);
            }
            statuses.push(status);
        }

        Ok(statuses)
    }

    /// Kills every spawned command that is still running and reaps it.
    ///
    /// Used for long-lived helpers such as the data server, which never exit
    /// on their own.
    pub fn kill(&mut self) {
        for child in &mut self.children {
            if let Ok(None) = child.try_wait() {
                if let Err(e) = child.kill() {
                    log::warn!("failed to kill pid {}: {}", child.id(), e);
                }
                let _ = child.wait();
            }
        }
    }
}

/// Builds one `eve | modelpy` pipeline per partition.
///
/// # Example
///
/// ```
/// use modelbench::process::eve_commands;
///
/// let commands = eve_commands(2, "--ignore-file-type z csv");
/// assert_eq!(commands[0], "eve 1 2 | modelpy --ignore-file-type z csv > /dev/null");
/// assert_eq!(commands[1], "eve 2 2 | modelpy --ignore-file-type z csv > /dev/null");
/// ```
pub fn eve_commands(total_partitions: u32, modelpy_args: &str) -> Vec<String> {
    (1..=total_partitions)
        .map(|partition| {
            let modelpy = if modelpy_args.is_empty() {
                "modelpy".to_string()
            } else {
                format!("modelpy {}", modelpy_args)
            };
            format!("eve {} {} | {} > /dev/null", partition, total_partitions, modelpy)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pids_empty_before_fire() {
        let run = CommandRun::new(["true"]);
        assert!(run.pids().is_empty());
    }

    #[test]
    fn test_fire_and_wait_collects_statuses() {
        let mut run = CommandRun::new(["true", "exit 3"]);
        run.fire().unwrap();

        assert_eq!(run.pids().len(), 2);

        let statuses = run.wait().unwrap();
        assert!(statuses[0].success());
        assert_eq!(statuses[1].code(), Some(3));
    }

    #[test]
    fn test_fire_twice_is_rejected() {
        let mut run = CommandRun::new(["true"]);
        run.fire().unwrap();

        assert!(matches!(run.fire(), Err(ModelbenchError::AlreadyFired)));
        run.wait().unwrap();
    }

    #[test]
    fn test_kill_stops_long_running_command() {
        let mut run = CommandRun::new(["sleep 30"]);
        run.fire().unwrap();
        run.kill();

        let statuses = run.wait().unwrap();
        assert!(!statuses[0].success());
    }

    #[test]
    fn test_eve_commands_partitions() {
        let commands = eve_commands(4, "");
        assert_eq!(commands.len(), 4);
        assert_eq!(commands[0], "eve 1 4 | modelpy > /dev/null");
        assert_eq!(commands[3], "eve 4 4 | modelpy > /dev/null");
    }

    #[test]
    fn test_eve_commands_zero_partitions() {
        assert!(eve_commands(0, "--data-server").is_empty());
    }
}
