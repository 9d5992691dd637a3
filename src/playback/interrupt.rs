//! Cooperative interrupt sources polled once per playback tick.

use std::io::{self, BufRead};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread;

/// Something that can ask the current playback to stop.
pub trait Interrupt {
    /// True if playback should stop now. Sources that latch an event clear
    /// it when reporting it.
    fn poll(&mut self) -> bool;
}

/// Never interrupts.
#[derive(Debug, Clone, Copy, Default)]
pub struct Never;

impl Interrupt for Never {
    fn poll(&mut self) -> bool {
        false
    }
}

impl Interrupt for &AtomicBool {
    fn poll(&mut self) -> bool {
        self.swap(false, Ordering::AcqRel)
    }
}

impl Interrupt for Arc<AtomicBool> {
    fn poll(&mut self) -> bool {
        self.swap(false, Ordering::AcqRel)
    }
}

/// Interrupt backed by a closure, see [`poll_fn`].
#[derive(Debug, Clone, Copy)]
pub struct PollFn<F>(F);

/// Wrap a closure as an [`Interrupt`].
pub fn poll_fn<F: FnMut() -> bool>(f: F) -> PollFn<F> {
    PollFn(f)
}

impl<F: FnMut() -> bool> Interrupt for PollFn<F> {
    fn poll(&mut self) -> bool {
        (self.0)()
    }
}

/// Raise the returned flag whenever a line arrives on stdin.
///
/// The watcher thread runs until stdin closes.
pub fn spawn_stdin_watcher() -> Arc<AtomicBool> {
    let flag = Arc::new(AtomicBool::new(false));
    let raised = Arc::clone(&flag);
    thread::spawn(move || {
        for line in io::stdin().lock().lines() {
            if line.is_err() {
                break;
            }
            log::debug!("Key pressed, interrupting playback");
            raised.store(true, Ordering::Release);
        }
    });
    flag
}
