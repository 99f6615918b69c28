//! One wait algorithm for two schedulers.
//!
//! [`Waitable`] guards a piece of state with a `parking_lot` mutex and lets
//! callers wait for a condition on that state either by parking the thread
//! (`wait_blocking`) or by suspending the task (`wait_async`). Both styles
//! run the same `attempt` closure under the same mutex, so a thread and a
//! task competing for the same state see each other's effects immediately.
//!
//! Wakeups go to both sides on every state change. Waiters additionally
//! re-check every [`WAIT_POLL_INTERVAL`] so a wakeup consumed by a waiter
//! that then lost the race cannot strand the others.

use parking_lot::{Condvar, Mutex, MutexGuard};
use rampart_core::WAIT_POLL_INTERVAL;
use std::time::Duration;
use tokio::sync::Notify;

#[derive(Debug, Default)]
pub struct Waitable<S> {
    state: Mutex<S>,
    condvar: Condvar,
    notify: Notify,
}

impl<S> Waitable<S> {
    pub fn new(state: S) -> Self {
        Self {
            state: Mutex::new(state),
            condvar: Condvar::new(),
            notify: Notify::new(),
        }
    }

    /// Lock the state for a short, non-waiting critical section
    pub fn lock(&self) -> MutexGuard<'_, S> {
        self.state.lock()
    }

    /// Park the current thread until `attempt` yields a value or `timeout`
    /// elapses. `None`, or a timeout too large to form a deadline, waits
    /// indefinitely.
    pub fn wait_blocking<T, F>(&self, timeout: Option<Duration>, mut attempt: F) -> Option<T>
    where
        F: FnMut(&mut S) -> Option<T>,
    {
        let deadline = timeout.and_then(|t| std::time::Instant::now().checked_add(t));
        let mut state = self.state.lock();
        loop {
            if let Some(value) = attempt(&mut state) {
                return Some(value);
            }
            let now = std::time::Instant::now();
            let wake_at = match deadline {
                Some(deadline) if deadline <= now => return None,
                Some(deadline) => deadline.min(now + WAIT_POLL_INTERVAL),
                None => now + WAIT_POLL_INTERVAL,
            };
            self.condvar.wait_until(&mut state, wake_at);
        }
    }

    /// Suspend the current task until `attempt` yields a value or `timeout`
    /// elapses. The thread is never blocked; the mutex is only held while
    /// `attempt` runs.
    ///
    /// Dropping the returned future leaves the state exactly as the last
    /// `attempt` left it.
    pub async fn wait_async<T, F>(&self, timeout: Option<Duration>, mut attempt: F) -> Option<T>
    where
        F: FnMut(&mut S) -> Option<T>,
    {
        let deadline = timeout.and_then(|t| tokio::time::Instant::now().checked_add(t));
        loop {
            // Register interest before checking so a release between the check
            // and the await is not lost.
            let notified = self.notify.notified();
            tokio::pin!(notified);
            notified.as_mut().enable();

            let ready = {
                let mut state = self.state.lock();
                attempt(&mut state)
            };
            if let Some(value) = ready {
                return Some(value);
            }

            let now = tokio::time::Instant::now();
            let wake_at = match deadline {
                Some(deadline) if deadline <= now => return None,
                Some(deadline) => deadline.min(now + WAIT_POLL_INTERVAL),
                None => now + WAIT_POLL_INTERVAL,
            };
            let _ = tokio::time::timeout_at(wake_at, notified).await;
        }
    }

    /// Wake one blocking waiter and one async waiter
    pub fn notify_one(&self) {
        self.condvar.notify_one();
        self.notify.notify_one();
    }

    /// Wake every waiter of both styles
    pub fn notify_all(&self) {
        self.condvar.notify_all();
        self.notify.notify_waiters();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    #[test]
    fn test_blocking_wait_times_out() {
        let cell = Waitable::new(false);
        let start = std::time::Instant::now();
        let got = cell.wait_blocking(Some(Duration::from_millis(30)), |ready| ready.then_some(()));
        assert!(got.is_none());
        assert!(start.elapsed() >= Duration::from_millis(30));
    }

    #[test]
    fn test_blocking_waiter_sees_change_from_thread() {
        let cell = Arc::new(Waitable::new(0u32));
        let setter = Arc::clone(&cell);
        let handle = std::thread::spawn(move || {
            std::thread::sleep(Duration::from_millis(20));
            *setter.lock() = 7;
            setter.notify_one();
        });
        let got = cell.wait_blocking(Some(Duration::from_secs(5)), |v| (*v == 7).then_some(*v));
        handle.join().unwrap();
        assert_eq!(got, Some(7));
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn test_async_waiter_sees_change_from_thread() {
        let cell = Arc::new(Waitable::new(false));
        let setter = Arc::clone(&cell);
        let handle = std::thread::spawn(move || {
            std::thread::sleep(Duration::from_millis(20));
            *setter.lock() = true;
            setter.notify_all();
        });
        let got = cell
            .wait_async(Some(Duration::from_secs(5)), |ready| ready.then_some("ready"))
            .await;
        handle.join().unwrap();
        assert_eq!(got, Some("ready"));
    }

    #[tokio::test(start_paused = true)]
    async fn test_async_wait_times_out_on_virtual_clock() {
        let cell = Waitable::new(false);
        let got = cell
            .wait_async(Some(Duration::from_secs(10)), |ready| ready.then_some(()))
            .await;
        assert!(got.is_none());
    }

    #[test]
    fn test_blocking_wait_with_unbounded_timeout() {
        let cell = Waitable::new(true);
        let got = cell.wait_blocking(Some(Duration::MAX), |ready| ready.then_some(1));
        assert_eq!(got, Some(1));
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn test_async_wait_with_unbounded_timeout_still_wakes() {
        let cell = Arc::new(Waitable::new(false));
        let setter = Arc::clone(&cell);
        let handle = std::thread::spawn(move || {
            std::thread::sleep(Duration::from_millis(20));
            *setter.lock() = true;
            setter.notify_all();
        });
        let got = cell
            .wait_async(Some(Duration::MAX), |ready| ready.then_some(()))
            .await;
        handle.join().unwrap();
        assert_eq!(got, Some(()));
    }
}
