//! Host application restart trigger.
//!
//! The actual process relaunch is an OS concern; the pipeline only needs a
//! fire-and-forget handle it can invoke after a successful update.

use std::process::Command;
use std::sync::atomic::{AtomicUsize, Ordering};
use tracing::{error, info};

/// Schedules a restart of the host process. No result: by the time the
/// restart happens there is nobody left to report to.
pub trait RestartHandle: Send + Sync {
    fn schedule_restart(&self);
}

/// Relaunches the current executable from a detached child, then exits so
/// the relaunch finds the process gone.
pub struct ProcessRestart;

impl RestartHandle for ProcessRestart {
    fn schedule_restart(&self) {
        let exe = match std::env::current_exe() {
            Ok(exe) => exe,
            Err(e) => {
                error!("Cannot determine current executable: {}", e);
                return;
            }
        };
        let args: Vec<String> = std::env::args().skip(1).collect();

        info!("Scheduling restart of {}", exe.display());

        // Short delay so the current process can exit cleanly first
        let spawned = Command::new("sh")
            .arg("-c")
            .arg(r#"sleep 1; exec "$0" "$@""#)
            .arg(&exe)
            .args(&args)
            .spawn();

        match spawned {
            Ok(_) => std::process::exit(0),
            Err(e) => error!("Failed to schedule restart: {}", e),
        }
    }
}

/// Records invocations instead of touching the process. Test double.
#[derive(Default)]
pub struct FakeRestart {
    invocations: AtomicUsize,
}

impl FakeRestart {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn invocations(&self) -> usize {
        self.invocations.load(Ordering::SeqCst)
    }
}

impl RestartHandle for FakeRestart {
    fn schedule_restart(&self) {
        self.invocations.fetch_add(1, Ordering::SeqCst);
    }
}

// Lets callers hold on to a shared fake while the updater owns a handle.
impl<T: RestartHandle> RestartHandle for std::sync::Arc<T> {
    fn schedule_restart(&self) {
        (**self).schedule_restart();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fake_counts_invocations() {
        let fake = FakeRestart::new();
        assert_eq!(fake.invocations(), 0);
        fake.schedule_restart();
        fake.schedule_restart();
        assert_eq!(fake.invocations(), 2);
    }
}
