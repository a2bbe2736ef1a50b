use std::thread::{self, JoinHandle};

use crate::capture::domain::frame_source::FrameSource;
use crate::relay::frame_relay::FrameRelay;
use crate::shared::cancellation::CancellationToken;

/// Why a capture thread stopped.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CaptureEnd {
    Cancelled,
    Exhausted,
    Failed,
}

/// Spawns the producer thread for one capture device.
///
/// Frames go into `relay` as fast as the source yields them. When the
/// source runs dry or fails, `cancel` is tripped so the session winds down.
pub fn spawn_capture(
    mut source: Box<dyn FrameSource>,
    relay: FrameRelay,
    cancel: CancellationToken,
) -> JoinHandle<CaptureEnd> {
    thread::spawn(move || {
        let mut captured = 0usize;
        let end = loop {
            if cancel.is_cancelled() {
                break CaptureEnd::Cancelled;
            }
            match source.next_frame() {
                Ok(Some(frame)) => {
                    captured += 1;
                    if let Err(e) = relay.push(frame) {
                        log::error!("Capture stopped: {e}");
                        break CaptureEnd::Failed;
                    }
                }
                Ok(None) => break CaptureEnd::Exhausted,
                Err(e) => {
                    log::error!("Capture failed: {e}");
                    break CaptureEnd::Failed;
                }
            }
        };
        log::info!("Capture ended after {captured} frames ({end:?})");
        if end != CaptureEnd::Cancelled {
            cancel.cancel();
        }
        end
    })
}
