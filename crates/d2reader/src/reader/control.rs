use std::sync::{Arc, Condvar, Mutex, MutexGuard};
use std::time::Duration;

use serde::Serialize;
use strum::Display;

/// Why a [`DataReader::run`](crate::DataReader::run) loop stopped
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Display)]
pub enum StopReason {
    /// Process signal (Ctrl+C from the terminal)
    Interrupted,
    /// Quit key in an interactive front end
    UserQuit,
    /// Programmatic stop from another thread
    Requested,
}

#[derive(Debug, Default)]
struct Commands {
    stop: Option<StopReason>,
    poll_now: bool,
}

/// Handle for steering a running poll loop from other threads.
///
/// Clones share one loop. The loop sleeps in [`ReaderControl::sleep`], which
/// returns early on a stop or on a [`poll_now`](ReaderControl::poll_now)
/// request, so neither waits out the polling interval.
#[derive(Debug, Clone, Default)]
pub struct ReaderControl {
    inner: Arc<(Mutex<Commands>, Condvar)>,
}

impl ReaderControl {
    pub fn new() -> Self {
        Self::default()
    }

    /// Ask the loop to stop. The first reason sticks.
    pub fn stop(&self, reason: StopReason) {
        let mut commands = self.commands();
        commands.stop.get_or_insert(reason);
        drop(commands);
        self.inner.1.notify_all();
    }

    pub fn stop_reason(&self) -> Option<StopReason> {
        self.commands().stop
    }

    /// Cut the current sleep short and tick right away, e.g. after a
    /// [`LayoutSwitch`](crate::LayoutSwitch) request
    pub fn poll_now(&self) {
        self.commands().poll_now = true;
        self.inner.1.notify_all();
    }

    /// Sleep up to `duration`. Returns the stop reason if one is set.
    pub(crate) fn sleep(&self, duration: Duration) -> Option<StopReason> {
        let (lock, wake) = &*self.inner;
        let guard = lock.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
        let mut commands = match wake.wait_timeout_while(guard, duration, |c| {
            c.stop.is_none() && !c.poll_now
        }) {
            Ok((commands, _)) => commands,
            Err(poisoned) => poisoned.into_inner().0,
        };
        commands.poll_now = false;
        commands.stop
    }

    fn commands(&self) -> MutexGuard<'_, Commands> {
        self.inner
            .0
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}
