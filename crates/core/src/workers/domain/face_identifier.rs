use crate::shared::frame::Frame;

/// Embedding and matching backend run by an identify worker.
pub trait FaceIdentifier: Send {
    fn embed(&mut self, face: &Frame) -> Result<Vec<f32>, Box<dyn std::error::Error + Send + Sync>>;

    /// Person id of the best reference match, `None` when nothing matches.
    fn identify(
        &mut self,
        face: &Frame,
    ) -> Result<Option<i64>, Box<dyn std::error::Error + Send + Sync>>;
}
