//! Lock-guarded event ring buffer and its suspend-synthesis dispatch rule.

use core::cell::RefCell;
use core::sync::atomic::{AtomicBool, Ordering};

use embassy_sync::blocking_mutex::raw::NoopRawMutex;
use embassy_sync::blocking_mutex::Mutex;
use embassy_sync::signal::Signal;
use heapless::Vec;

/// Capacity of the event ring buffer.
pub const CAPACITY: usize = 8;

/// The lifecycle state machine's event alphabet.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Event {
    Resume,
    Suspend,
    ScriptSuccess,
    ScriptFailed,
    CmuxConnected,
    Dlci1Opened,
    Dlci2Opened,
    Timeout,
}

/// Single-producer/many-producer ring buffer draining to one worker.
///
/// `delegate` may be called from any context; the worker calls
/// `wait_and_drain` in a loop. The suspend flag lives outside the ring so a
/// suspend request is never lost to a full buffer: it is re-synthesised as
/// an ordinary `Suspend` event at the end of every drain pass for as long
/// as it is set.
pub struct EventQueue {
    ring: Mutex<NoopRawMutex, RefCell<Vec<Event, CAPACITY>>>,
    suspend_requested: AtomicBool,
    signal: Signal<NoopRawMutex, ()>,
}

impl EventQueue {
    pub const fn new() -> Self {
        Self {
            ring: Mutex::new(RefCell::new(Vec::new())),
            suspend_requested: AtomicBool::new(false),
            signal: Signal::new(),
        }
    }

    /// Appends an event and wakes the worker. On overflow the oldest event
    /// is dropped to make room, so the producer never blocks.
    pub fn delegate(&self, event: Event) {
        self.ring.lock(|ring| {
            let mut ring = ring.borrow_mut();
            if ring.is_full() {
                ring.remove(0);
            }
            let _ = ring.push(event);
        });
        self.signal.signal(());
    }

    pub fn request_suspend(&self) {
        self.suspend_requested.store(true, Ordering::SeqCst);
        self.signal.signal(());
    }

    pub fn clear_suspend(&self) {
        self.suspend_requested.store(false, Ordering::SeqCst);
    }

    pub fn is_suspend_requested(&self) -> bool {
        self.suspend_requested.load(Ordering::SeqCst)
    }

    /// Blocks until woken, then drains the ring in FIFO order, appending a
    /// synthetic `Suspend` if the flag is set. Never returns an empty
    /// batch: the wake that unblocks this call always corresponds to
    /// either a delegated event or a fresh suspend request.
    pub async fn wait_and_drain(&self) -> Vec<Event, { CAPACITY + 1 }> {
        self.signal.wait().await;

        let mut out: Vec<Event, { CAPACITY + 1 }> = Vec::new();
        self.ring.lock(|ring| {
            let mut ring = ring.borrow_mut();
            while !ring.is_empty() {
                let event = ring.remove(0);
                let _ = out.push(event);
            }
        });

        if self.suspend_requested.load(Ordering::SeqCst) {
            let _ = out.push(Event::Suspend);
        }

        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn drains_in_fifo_order() {
        embassy_futures::block_on(async {
            let queue = EventQueue::new();
            queue.delegate(Event::Resume);
            queue.delegate(Event::Timeout);
            let drained = queue.wait_and_drain().await;
            assert_eq!(drained.len(), 2);
            assert_eq!(drained[0], Event::Resume);
            assert_eq!(drained[1], Event::Timeout);
        });
    }

    #[test]
    fn overflow_drops_oldest() {
        embassy_futures::block_on(async {
            let queue = EventQueue::new();
            for _ in 0..CAPACITY {
                queue.delegate(Event::Timeout);
            }
            queue.delegate(Event::Resume); // would overflow; drops the oldest Timeout
            let drained = queue.wait_and_drain().await;
            assert_eq!(drained.len(), CAPACITY);
            assert_eq!(drained[CAPACITY - 1], Event::Resume);
        });
    }

    #[test]
    fn suspend_is_synthesised_after_drain() {
        embassy_futures::block_on(async {
            let queue = EventQueue::new();
            queue.delegate(Event::Timeout);
            queue.request_suspend();
            let drained = queue.wait_and_drain().await;
            assert_eq!(drained.last(), Some(&Event::Suspend));
        });
    }
}
