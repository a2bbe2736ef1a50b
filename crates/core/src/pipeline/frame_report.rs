/// What happened to one frame in the client pipeline.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct FrameReport {
    /// No detection reply arrived; tracking was not updated.
    pub skipped: bool,
    pub faces: usize,
    /// Mailbox replies consumed this frame.
    pub replies: usize,
    /// Objects that gained an identity this frame.
    pub resolved: usize,
    /// Identify requests queued this frame.
    pub dispatched: usize,
    /// Unresolved objects that still have attempts left.
    pub pending: usize,
}

impl FrameReport {
    pub fn skipped() -> Self {
        Self {
            skipped: true,
            ..Self::default()
        }
    }
}
