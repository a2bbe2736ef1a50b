use crate::shared::bounding_box::BoundingBox;
use crate::shared::frame::Frame;

/// Face detection backend run by a detect worker.
///
/// Implementations may be stateful, hence `&mut self`.
pub trait FaceDetector: Send {
    fn detect(
        &mut self,
        frame: &Frame,
    ) -> Result<Vec<BoundingBox>, Box<dyn std::error::Error + Send + Sync>>;
}
