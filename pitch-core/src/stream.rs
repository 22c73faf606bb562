//! # Block Hand-Off Module
//!
//! Bounded, non-blocking hand-off between a realtime capture callback and
//! the lower-frequency analysis tick. The capture side only enqueues and
//! never blocks; the analysis side drains everything queued and keeps just
//! the newest samples needed to refill a fixed-length rolling buffer.
//! Under backpressure data is dropped, never waited for, so latency
//! stays bounded.

use crossbeam_channel::{bounded, Receiver, Sender};

/// Fixed-length rolling window over the most recent samples.
#[derive(Debug, Clone)]
pub struct RollingBuffer {
    samples: Vec<f32>,
}

impl RollingBuffer {
    /// A zero-filled buffer of the given length.
    pub fn new(len: usize) -> Self {
        RollingBuffer {
            samples: vec![0.0; len],
        }
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    /// The buffered samples, oldest first.
    pub fn samples(&self) -> &[f32] {
        &self.samples
    }

    /// Shifts the window left and appends the block at the tail. A block
    /// at least as long as the buffer replaces the content entirely with
    /// its newest samples.
    pub fn push_block(&mut self, block: &[f32]) {
        let len = self.samples.len();
        if len == 0 {
            return;
        }
        if block.len() >= len {
            self.samples.copy_from_slice(&block[block.len() - len..]);
            return;
        }
        self.samples.copy_within(block.len().., 0);
        self.samples[len - block.len()..].copy_from_slice(block);
    }
}

/// Capture-side handle; enqueues without ever blocking.
#[derive(Debug, Clone)]
pub struct BlockSender {
    tx: Sender<Vec<f32>>,
}

impl BlockSender {
    /// Enqueues one block. Returns `false` when the queue is full or
    /// disconnected and the block was dropped.
    pub fn push(&self, block: Vec<f32>) -> bool {
        self.tx.try_send(block).is_ok()
    }
}

/// Analysis-side handle; drains whatever has accumulated since last tick.
#[derive(Debug)]
pub struct BlockReceiver {
    rx: Receiver<Vec<f32>>,
}

impl BlockReceiver {
    /// Drains all queued blocks into the rolling buffer and returns the
    /// number of samples actually written. Only the newest samples that
    /// still fit the buffer are copied; older queued blocks are discarded
    /// unprocessed.
    pub fn drain_into(&self, buffer: &mut RollingBuffer) -> usize {
        let blocks: Vec<Vec<f32>> = self.rx.try_iter().collect();

        let capacity = buffer.len();
        let mut kept = 0;
        let mut first = blocks.len();
        for (i, block) in blocks.iter().enumerate().rev() {
            if kept >= capacity {
                break;
            }
            kept += block.len();
            first = i;
        }

        let mut written = 0;
        for block in &blocks[first..] {
            buffer.push_block(block);
            written += block.len();
        }
        written
    }
}

/// Creates the bounded hand-off queue with room for `capacity` blocks.
pub fn block_channel(capacity: usize) -> (BlockSender, BlockReceiver) {
    let (tx, rx) = bounded(capacity);
    (BlockSender { tx }, BlockReceiver { rx })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rolling_buffer_keeps_newest_samples() {
        let mut buffer = RollingBuffer::new(4);
        buffer.push_block(&[1.0, 2.0]);
        assert_eq!(buffer.samples(), &[0.0, 0.0, 1.0, 2.0]);
        buffer.push_block(&[3.0, 4.0, 5.0]);
        assert_eq!(buffer.samples(), &[2.0, 3.0, 4.0, 5.0]);
    }

    #[test]
    fn oversized_block_replaces_content() {
        let mut buffer = RollingBuffer::new(3);
        buffer.push_block(&[1.0, 2.0, 3.0, 4.0, 5.0]);
        assert_eq!(buffer.samples(), &[3.0, 4.0, 5.0]);
    }

    #[test]
    fn full_queue_drops_instead_of_blocking() {
        let (tx, _rx) = block_channel(2);
        assert!(tx.push(vec![0.0; 8]));
        assert!(tx.push(vec![0.0; 8]));
        assert!(!tx.push(vec![0.0; 8]));
    }

    #[test]
    fn drain_discards_older_blocks_under_backpressure() {
        let (tx, rx) = block_channel(8);
        // Four 4-sample blocks queued against a 4-sample window: only the
        // newest block can survive, the rest must be skipped unprocessed.
        for start in [0.0_f32, 10.0, 20.0, 30.0] {
            tx.push((0..4).map(|i| start + i as f32).collect());
        }
        let mut buffer = RollingBuffer::new(4);
        let written = rx.drain_into(&mut buffer);
        assert_eq!(written, 4);
        assert_eq!(buffer.samples(), &[30.0, 31.0, 32.0, 33.0]);
    }

    #[test]
    fn drain_accumulates_partial_blocks() {
        let (tx, rx) = block_channel(8);
        tx.push(vec![1.0, 2.0]);
        tx.push(vec![3.0, 4.0]);
        let mut buffer = RollingBuffer::new(4);
        assert_eq!(rx.drain_into(&mut buffer), 4);
        assert_eq!(buffer.samples(), &[1.0, 2.0, 3.0, 4.0]);
    }
}
