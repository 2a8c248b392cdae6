//! Resident-memory lookup for observed processes using sysinfo.
//!
//! The sampler never owns the processes it watches, so every lookup has to
//! cope with the process having exited since the previous pass.

use sysinfo::{Pid, ProcessRefreshKind, ProcessStatus, ProcessesToUpdate, System};

/// Looks up the current resident memory of a process.
///
/// Implementations return `None` when the process no longer exists. The
/// sampler treats that as "skip this target for this pass", never as an error.
pub trait MemoryProbe: Send {
    /// Returns resident memory in bytes, or `None` if there is no such process.
    fn resident_bytes(&mut self, pid: u32) -> Option<u64>;
}

/// Reads resident memory through `sysinfo::System`.
///
/// Only the requested pid is refreshed on each call, with a memory-only
/// refresh kind, so a pass over a handful of targets stays cheap.
pub struct SysinfoProbe {
    system: System,
}

impl SysinfoProbe {
    pub fn new() -> Self {
        Self {
            system: System::new(),
        }
    }
}

impl Default for SysinfoProbe {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryProbe for SysinfoProbe {
    fn resident_bytes(&mut self, pid: u32) -> Option<u64> {
        let pid = Pid::from_u32(pid);

        // Dead entries are dropped so an exited target reports None
        self.system.refresh_processes_specifics(
            ProcessesToUpdate::Some(&[pid]),
            true,
            ProcessRefreshKind::nothing().with_memory(),
        );

        // An exited child stays listed as a zombie with zero memory until it is reaped
        self.system
            .process(pid)
            .filter(|process| !is_exited(process.status()))
            .map(|process| process.memory())
    }
}

fn is_exited(status: ProcessStatus) -> bool {
    matches!(status, ProcessStatus::Zombie | ProcessStatus::Dead)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_exited_statuses() {
        assert!(is_exited(ProcessStatus::Zombie));
        assert!(is_exited(ProcessStatus::Dead));
        assert!(!is_exited(ProcessStatus::Run));
        assert!(!is_exited(ProcessStatus::Sleep));
    }

    #[test]
    fn test_sysinfo_probe_nonexistent_process() {
        // Use an extremely unlikely PID that shouldn't exist
        let mut probe = SysinfoProbe::new();

        assert!(probe.resident_bytes(u32::MAX - 1).is_none());
    }

    #[test]
    fn test_sysinfo_probe_current_process() {
        let mut probe = SysinfoProbe::new();
        let bytes = probe.resident_bytes(std::process::id());

        assert!(bytes.is_some());
        assert!(bytes.unwrap() > 0);
    }

    #[test]
    fn test_sysinfo_probe_repeated_reads() {
        let pid = std::process::id();
        let mut probe = SysinfoProbe::new();

        let first = probe.resident_bytes(pid);
        let second = probe.resident_bytes(pid);

        assert!(first.unwrap() > 0);
        assert!(second.unwrap() > 0);
    }

    #[test]
    fn test_unreaped_child_reports_none() {
        let mut child = std::process::Command::new("true").spawn().unwrap();
        let pid = child.id();
        // Let it exit without reaping it
        std::thread::sleep(std::time::Duration::from_millis(200));

        let mut probe = SysinfoProbe::new();
        let bytes = probe.resident_bytes(pid);
        child.wait().unwrap();

        assert!(bytes.is_none());
    }

    #[test]
    fn test_sysinfo_probe_reaped_child_reports_none() {
        let mut child = std::process::Command::new("true").spawn().unwrap();
        let pid = child.id();
        child.wait().unwrap();

        let mut probe = SysinfoProbe::new();
        assert!(probe.resident_bytes(pid).is_none());
    }
}
