//! # Frame Queue and Producer/Consumer Handoff
//!
//! ```text
//! Simulation thread                         Render thread
//!   FrameCollector                            FrameQueue ──► PlaybackClock
//!        │ finish()                               ▲
//!        ▼                                        │ drain_into()
//!   FrameSender ════ crossbeam channel ════► FrameReceiver
//! ```
//!
//! The channel is the only structure both threads touch. Neither end is
//! `Clone`, so there is exactly one producer and one consumer. A send
//! happens-before the receive that observes it, which publishes the frame's
//! snapshots to the render thread without further synchronization.
//!
//! The consumer moves everything already sent into its private
//! [`FrameQueue`] before each draw, so the clock sees every frame the
//! simulation finalized up to that point, in finalization order.

use std::collections::VecDeque;

use crossbeam_channel::{Receiver, Sender};

use crate::frame::Frame;

/// FIFO of finalized frames awaiting playback, oldest first.
#[derive(Debug)]
pub struct FrameQueue<T> {
    frames: VecDeque<Frame<T>>,
}

impl<T> Default for FrameQueue<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> FrameQueue<T> {
    /// Creates an empty queue.
    #[must_use]
    pub fn new() -> Self {
        Self {
            frames: VecDeque::new(),
        }
    }

    /// Appends a frame at the tail.
    pub fn push_back(&mut self, frame: Frame<T>) {
        self.frames.push_back(frame);
    }

    /// The oldest frame, without removing it.
    #[inline]
    #[must_use]
    pub fn peek_front(&self) -> Option<&Frame<T>> {
        self.frames.front()
    }

    /// Removes and returns the oldest frame.
    pub fn pop_front(&mut self) -> Option<Frame<T>> {
        self.frames.pop_front()
    }

    /// Number of queued frames.
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.frames.len()
    }

    /// Whether no frames are queued.
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }
}

/// Creates the single-producer/single-consumer frame channel.
#[must_use]
pub fn frame_channel<T>() -> (FrameSender<T>, FrameReceiver<T>) {
    let (sender, receiver) = crossbeam_channel::unbounded();
    (FrameSender { sender }, FrameReceiver { receiver })
}

/// Producer end of the frame channel.
#[derive(Debug)]
pub struct FrameSender<T> {
    sender: Sender<Frame<T>>,
}

impl<T> FrameSender<T> {
    /// Publishes a finalized frame. Never blocks.
    ///
    /// # Errors
    ///
    /// Hands the frame back if the receiver has been dropped.
    pub fn send(&self, frame: Frame<T>) -> Result<(), Frame<T>> {
        self.sender.send(frame).map_err(|e| e.into_inner())
    }
}

/// Consumer end of the frame channel.
#[derive(Debug)]
pub struct FrameReceiver<T> {
    receiver: Receiver<Frame<T>>,
}

impl<T> FrameReceiver<T> {
    /// Moves every frame sent so far onto the tail of `queue`, in send order.
    ///
    /// Returns how many frames were moved. Never blocks.
    pub fn drain_into(&self, queue: &mut FrameQueue<T>) -> usize {
        let mut moved = 0;
        for frame in self.receiver.try_iter() {
            queue.push_back(frame);
            moved += 1;
        }
        moved
    }

    /// Frames sent but not yet drained.
    #[inline]
    #[must_use]
    pub fn in_flight(&self) -> usize {
        self.receiver.len()
    }
}
