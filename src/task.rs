//! Cancellable background tasks for the real-time driver.
//!
//! A [`Task`] is a thread paired with a cancellation channel. Dropping the
//! task disconnects the channel, which wakes the thread immediately, and
//! then joins it: once `drop` returns, the task will never run its callback
//! again. Timers, delayed navigations and clip playback are all built on
//! this, so releasing a screen's resources is just dropping them.

use std::sync::mpsc::{self, Receiver, RecvTimeoutError, Sender};
use std::thread::{self, JoinHandle};
use std::time::Duration;

/// Handed to a task's body; reports cancellation.
pub struct CancelToken(Receiver<()>);

impl CancelToken {
    /// Sleep for `duration` or until cancelled. Returns true if cancelled.
    pub fn sleep(&self, duration: Duration) -> bool {
        match self.0.recv_timeout(duration) {
            Err(RecvTimeoutError::Timeout) => false,
            // Disconnected (owner dropped) or an explicit signal
            _ => true,
        }
    }
}

/// A background thread that is cancelled and joined on drop.
pub struct Task {
    cancel: Option<Sender<()>>,
    handle: Option<JoinHandle<()>>,
}

impl Task {
    /// Run `body` on its own thread.
    pub fn spawn<F>(body: F) -> Task
    where
        F: FnOnce(CancelToken) + Send + 'static,
    {
        let (cancel_tx, cancel_rx) = mpsc::channel();
        let handle = thread::spawn(move || body(CancelToken(cancel_rx)));
        Task {
            cancel: Some(cancel_tx),
            handle: Some(handle),
        }
    }

    /// Call `on_tick` every `period` until cancelled or until it returns false.
    pub fn every<F>(period: Duration, mut on_tick: F) -> Task
    where
        F: FnMut() -> bool + Send + 'static,
    {
        Task::spawn(move |cancel| {
            while !cancel.sleep(period) {
                if !on_tick() {
                    break;
                }
            }
        })
    }

    /// Call `on_fire` once after `delay`, unless cancelled first.
    pub fn after<F>(delay: Duration, on_fire: F) -> Task
    where
        F: FnOnce() + Send + 'static,
    {
        Task::spawn(move |cancel| {
            if !cancel.sleep(delay) {
                on_fire();
            }
        })
    }
}

impl Drop for Task {
    fn drop(&mut self) {
        // Disconnect first so the thread wakes, then wait for it
        self.cancel.take();
        if let Some(handle) = self.handle.take() {
            let _ = handle.join();
        }
    }
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Instant;

    #[test]
    fn after_fires_once() {
        let (tx, rx) = mpsc::channel();
        let _task = Task::after(Duration::from_millis(5), move || {
            tx.send("fired").unwrap();
        });
        assert_eq!(rx.recv_timeout(Duration::from_secs(5)), Ok("fired"));
        // Sender moved into the task is gone after firing
        assert!(rx.recv_timeout(Duration::from_secs(5)).is_err());
    }

    #[test]
    fn dropped_after_never_fires() {
        let (tx, rx) = mpsc::channel::<()>();
        let task = Task::after(Duration::from_secs(30), move || {
            let _ = tx.send(());
        });
        drop(task);
        // Thread exited without firing: the only sender is gone
        assert_eq!(rx.try_recv(), Err(mpsc::TryRecvError::Disconnected));
    }

    #[test]
    fn drop_returns_promptly_for_long_delays() {
        let task = Task::after(Duration::from_secs(60), || {});
        let started = Instant::now();
        drop(task);
        assert!(started.elapsed() < Duration::from_secs(5));
    }

    #[test]
    fn every_ticks_repeatedly_until_dropped() {
        let (tx, rx) = mpsc::channel();
        let task = Task::every(Duration::from_millis(2), move || tx.send(()).is_ok());
        for _ in 0..3 {
            rx.recv_timeout(Duration::from_secs(5)).unwrap();
        }
        drop(task);
        // Drain whatever was queued before the drop, then the channel is closed
        while rx.try_recv().is_ok() {}
        assert_eq!(rx.try_recv(), Err(mpsc::TryRecvError::Disconnected));
    }

    #[test]
    fn every_stops_when_callback_declines() {
        let (tx, rx) = mpsc::channel();
        let mut count = 0;
        let _task = Task::every(Duration::from_millis(1), move || {
            count += 1;
            tx.send(count).unwrap();
            count < 3
        });
        let received: Vec<i32> = rx.iter().collect();
        assert_eq!(received, vec![1, 2, 3]);
    }
}
