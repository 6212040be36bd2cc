//! CPU and memory sampling of the server process.

use std::sync::{Mutex, PoisonError};

use sysinfo::{Pid, ProcessRefreshKind, ProcessesToUpdate, System};

/// One resource sample.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ProcessUsage {
    /// Percent of one core, may exceed 100 on multi-core hosts
    pub cpu_percent: f32,
    pub memory_bytes: u64,
}

impl ProcessUsage {
    pub const fn memory_mb(&self) -> u64 {
        self.memory_bytes / (1024 * 1024)
    }
}

/// Keeps a `System` between samples; CPU usage is a delta between refreshes,
/// so the first sample of a process reports 0%.
pub struct UsageSampler {
    system: Mutex<System>,
}

impl Default for UsageSampler {
    fn default() -> Self {
        Self::new()
    }
}

impl UsageSampler {
    pub fn new() -> Self {
        Self {
            system: Mutex::new(System::new()),
        }
    }

    /// Sample `pid`. `None` when the process no longer exists.
    pub fn sample(&self, pid: u32) -> Option<ProcessUsage> {
        let pid = Pid::from_u32(pid);
        let mut system = self.system.lock().unwrap_or_else(PoisonError::into_inner);
        system.refresh_processes_specifics(
            ProcessesToUpdate::Some(&[pid]),
            true,
            ProcessRefreshKind::nothing().with_cpu().with_memory(),
        );
        system.process(pid).map(|p| ProcessUsage {
            cpu_percent: p.cpu_usage(),
            memory_bytes: p.memory(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn samples_current_process() {
        let sampler = UsageSampler::new();
        let usage = sampler.sample(std::process::id()).unwrap();
        assert!(usage.memory_bytes > 0);
        assert!(usage.cpu_percent >= 0.0);
    }

    #[test]
    fn unknown_pid_yields_none() {
        let sampler = UsageSampler::new();
        assert!(sampler.sample(u32::MAX - 1).is_none());
    }
}
