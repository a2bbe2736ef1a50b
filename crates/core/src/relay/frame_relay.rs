use std::time::Duration;

use crossbeam_channel::{Receiver, RecvTimeoutError, Sender, TrySendError};

use crate::shared::constants::RELAY_CAPACITY;
use crate::shared::dispatch_error::DispatchError;
use crate::shared::frame::Frame;

/// Bounded hand-off from a capture thread to a processing loop.
///
/// When full, `push` discards the oldest buffered frame instead of
/// blocking, so the capture side always runs at device rate and the
/// consumer only ever sees the freshest frames. Clones share one buffer.
#[derive(Clone)]
pub struct FrameRelay {
    tx: Sender<Frame>,
    rx: Receiver<Frame>,
}

impl FrameRelay {
    pub fn new() -> Self {
        Self::with_capacity(RELAY_CAPACITY)
    }

    pub fn with_capacity(capacity: usize) -> Self {
        let (tx, rx) = crossbeam_channel::bounded(capacity.max(1));
        Self { tx, rx }
    }

    /// Never blocks. Returns how many stale frames were dropped to make room.
    pub fn push(&self, frame: Frame) -> Result<usize, DispatchError> {
        let mut pending = frame;
        let mut dropped = 0;
        loop {
            match self.tx.try_send(pending) {
                Ok(()) => return Ok(dropped),
                Err(TrySendError::Full(frame)) => {
                    // The consumer may win the race for the oldest frame; either way
                    // a slot frees up.
                    if self.rx.try_recv().is_ok() {
                        dropped += 1;
                    }
                    pending = frame;
                }
                Err(TrySendError::Disconnected(_)) => return Err(DispatchError::RelayClosed),
            }
        }
    }

    /// Blocks until a frame is available.
    pub fn pop(&self) -> Result<Frame, DispatchError> {
        self.rx.recv().map_err(|_| DispatchError::RelayClosed)
    }

    /// Like [`pop`](Self::pop), giving up after `timeout` so callers can
    /// check for cancellation.
    pub fn pop_timeout(&self, timeout: Duration) -> Result<Option<Frame>, DispatchError> {
        match self.rx.recv_timeout(timeout) {
            Ok(frame) => Ok(Some(frame)),
            Err(RecvTimeoutError::Timeout) => Ok(None),
            Err(RecvTimeoutError::Disconnected) => Err(DispatchError::RelayClosed),
        }
    }

    pub fn len(&self) -> usize {
        self.rx.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rx.is_empty()
    }
}

impl Default for FrameRelay {
    fn default() -> Self {
        Self::new()
    }
}
