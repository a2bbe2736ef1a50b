use crate::shared::frame::Frame;

/// Pull-based frame producer: a camera, a file, a test double.
pub trait FrameSource: Send {
    /// Next captured frame, or `None` once the source is exhausted.
    ///
    /// Returned frames are owned copies; they never alias a device buffer.
    fn next_frame(&mut self) -> Result<Option<Frame>, Box<dyn std::error::Error + Send + Sync>>;
}
