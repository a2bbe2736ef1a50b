use crate::scheduling::tracked_object::TrackedObject;
use crate::shared::bounding_box::BoundingBox;
use crate::shared::frame::Frame;

/// Follows faces across frames, turning per-frame boxes into tracked objects.
///
/// Implementations may be stateful, hence `&mut self` on `update`.
pub trait FaceTracker: Send {
    /// Associates `boxes` with the current objects, creating and dropping
    /// objects as faces appear and leave.
    fn update(&mut self, boxes: &[BoundingBox]);

    fn objects(&self) -> &[TrackedObject];

    fn objects_mut(&mut self) -> &mut [TrackedObject];

    /// Ids of objects dropped since the last call.
    fn take_removed(&mut self) -> Vec<String>;

    /// Fixed-size face image for `object`, or `None` if its box lies
    /// outside `frame`.
    fn crop_face(&self, frame: &Frame, object: &TrackedObject) -> Option<Frame>;
}
