//! Bounded multi-producer/multi-consumer queues (C7).
//!
//! Wraps `crossbeam-channel`'s bounded channel with explicit producer-count
//! tracking: a consumer's `recv` blocks until either an item arrives or the
//! last producer drops, so downstream stages see end-of-stream without a
//! dedicated sentinel value threading through every item type.

use crate::sync::{Arc, AtomicUsize, Ordering};
use crossbeam_channel::{Receiver, RecvError, SendError, Sender};

/// The producer side of a bounded queue. Cloning increments the live
/// producer count; dropping decrements it.
pub struct Producer<T> {
    tx: Sender<T>,
    count: Arc<AtomicUsize>,
}

impl<T> Producer<T> {
    /// Sends an item, blocking if the queue is at capacity.
    ///
    /// # Errors
    ///
    /// Returns the item back if every consumer has been dropped.
    pub fn send(&self, item: T) -> Result<(), SendError<T>> {
        self.tx.send(item)
    }
}

impl<T> Clone for Producer<T> {
    fn clone(&self) -> Self {
        self.count.fetch_add(1, Ordering::SeqCst);
        Self { tx: self.tx.clone(), count: Arc::clone(&self.count) }
    }
}

impl<T> Drop for Producer<T> {
    fn drop(&mut self) {
        self.count.fetch_sub(1, Ordering::SeqCst);
    }
}

/// The consumer side of a bounded queue.
#[derive(Clone)]
pub struct Consumer<T> {
    rx: Receiver<T>,
}

impl<T> Consumer<T> {
    /// Receives the next item, or `Err` once every producer has dropped and
    /// the queue has drained (end-of-stream).
    pub fn recv(&self) -> Result<T, RecvError> {
        self.rx.recv()
    }

    /// Non-blocking receive, for cooperating with a cancellation check
    /// between attempts.
    #[must_use]
    pub fn try_recv(&self) -> Option<T> {
        self.rx.try_recv().ok()
    }
}

/// Creates a bounded queue with one initial producer handle.
#[must_use]
pub fn bounded<T>(capacity: usize) -> (Producer<T>, Consumer<T>) {
    let (tx, rx) = crossbeam_channel::bounded(capacity);
    let count = Arc::new(AtomicUsize::new(1));
    (Producer { tx, count }, Consumer { rx })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread;

    #[test]
    fn send_and_receive_round_trips() {
        let (tx, rx) = bounded::<u32>(4);
        tx.send(7).unwrap();
        assert_eq!(rx.recv().unwrap(), 7);
    }

    #[test]
    fn recv_errors_after_last_producer_drops() {
        let (tx, rx) = bounded::<u32>(4);
        drop(tx);
        assert!(rx.recv().is_err());
    }

    #[test]
    fn cloned_producer_keeps_queue_open_until_all_drop() {
        let (tx, rx) = bounded::<u32>(4);
        let tx2 = tx.clone();
        drop(tx);
        tx2.send(1).unwrap();
        assert_eq!(rx.recv().unwrap(), 1);
        drop(tx2);
        assert!(rx.recv().is_err());
    }

    #[test]
    fn many_producers_feed_one_consumer() {
        let (tx, rx) = bounded::<u32>(16);
        let mut handles = vec![];
        for i in 0..4u32 {
            let tx = tx.clone();
            handles.push(thread::spawn(move || tx.send(i).unwrap()));
        }
        drop(tx);
        for h in handles {
            h.join().unwrap();
        }
        let mut received: Vec<u32> = std::iter::from_fn(|| rx.recv().ok()).collect();
        received.sort_unstable();
        assert_eq!(received, vec![0, 1, 2, 3]);
    }
}
