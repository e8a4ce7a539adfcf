//! # Logging subscriber for task signals.
//!
//! [`LogWriter`] connects to the three signals of a [`TaskHandle`] and turns
//! every emission into a `tracing` event on the controlling thread.
//!
//! ## Output format
//! ```text
//! INFO  [running] task=copy running=true
//! DEBUG [progress] task=copy step=2 message="copying b.txt"
//! WARN  [error] task=copy error="disk full"
//! INFO  [running] task=copy running=false
//! ```
//!
//! ## Example
//! ```no_run
//! # use taskboss::{Dispatcher, LogWriter, TaskContext, TaskFn, TaskHandle};
//! let dispatcher = Dispatcher::default();
//! let task = TaskHandle::new(TaskFn::arc("copy", |_ctx: &TaskContext| Ok(())), dispatcher.handle());
//!
//! let log = LogWriter::new();
//! log.attach(&task);
//! // ... later
//! log.detach(&task);
//! ```

use std::sync::Arc;

use tracing::{debug, info, warn};

use crate::signals::OwnerId;
use crate::tasks::{Progress, TaskHandle};

/// Writes task progress, errors and running changes through `tracing`.
///
/// All slots are connected under one [`OwnerId`], so [`LogWriter::detach`]
/// removes exactly the slots this writer added.
#[derive(Debug, Default)]
pub struct LogWriter {
    owner: OwnerId,
}

impl LogWriter {
    /// Creates a writer with a fresh owner identity.
    pub fn new() -> Self {
        Self::default()
    }

    /// Owner identity of the slots connected by this writer.
    pub fn owner(&self) -> OwnerId {
        self.owner
    }

    /// Connects logging slots to the signals of `task`.
    pub fn attach(&self, task: &TaskHandle) {
        let name: Arc<str> = Arc::from(task.name());

        let n = Arc::clone(&name);
        task.progress_signal()
            .connect_owned(self.owner, move |p: &Progress| {
                debug!(task = %n, step = p.step, message = %p.message, "[progress]");
            });

        let n = Arc::clone(&name);
        task.error_signal()
            .connect_owned(self.owner, move |e: &String| {
                warn!(task = %n, error = %e, "[error]");
            });

        task.running_signal()
            .connect_owned(self.owner, move |r: &bool| {
                info!(task = %name, running = *r, "[running]");
            });
    }

    /// Disconnects every slot this writer connected to `task`.
    ///
    /// Returns the number of removed slots.
    pub fn detach(&self, task: &TaskHandle) -> usize {
        task.progress_signal().disconnect_owner(self.owner)
            + task.error_signal().disconnect_owner(self.owner)
            + task.running_signal().disconnect_owner(self.owner)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::signals::Dispatcher;
    use crate::tasks::{TaskContext, TaskFn};

    #[test]
    fn test_attach_and_detach_touch_only_own_slots() {
        let d = Dispatcher::default();
        let task = TaskHandle::new(TaskFn::arc("logged", |_ctx: &TaskContext| Ok(())), d.handle());
        let before = task.running_signal().len();

        let log = LogWriter::new();
        log.attach(&task);
        assert_eq!(task.running_signal().len(), before + 1);

        let other = LogWriter::new();
        assert_eq!(other.detach(&task), 0);
        assert_eq!(log.detach(&task), 3);
        assert_eq!(task.running_signal().len(), before);
        assert_eq!(task.progress_signal().len(), before);
    }
}
