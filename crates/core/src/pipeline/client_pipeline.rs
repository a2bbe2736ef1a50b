use std::time::Instant;

use crate::pipeline::frame_report::FrameReport;
use crate::pipeline::session_logger::SessionLogger;
use crate::scheduling::retry_scheduler::{ReplyOutcome, RetryScheduler};
use crate::session::client_session::ClientSession;
use crate::shared::constants::RELAY_POLL_TIMEOUT;
use crate::shared::dispatch_error::DispatchError;
use crate::shared::frame::Frame;
use crate::shared::request_mode::RequestMode;
use crate::tracking::domain::face_tracker::FaceTracker;

/// Drives a registered [`ClientSession`]: frames from the relay go to the
/// detect worker, boxes feed the tracker, and tracked objects are sent
/// for identification on the retry schedule.
pub struct ClientPipeline {
    session: ClientSession,
    tracker: Box<dyn FaceTracker>,
    scheduler: RetryScheduler,
    logger: Box<dyn SessionLogger>,
    mode: RequestMode,
    frames: usize,
}

fn elapsed_ms(since: Instant) -> f64 {
    since.elapsed().as_secs_f64() * 1000.0
}

impl ClientPipeline {
    pub fn new(
        session: ClientSession,
        tracker: Box<dyn FaceTracker>,
        logger: Box<dyn SessionLogger>,
    ) -> Self {
        let scheduler = RetryScheduler::from_config(session.config());
        let mode = session.config().mode;
        Self {
            session,
            tracker,
            scheduler,
            logger,
            mode,
            frames: 0,
        }
    }

    pub fn session(&self) -> &ClientSession {
        &self.session
    }

    pub fn tracker(&self) -> &dyn FaceTracker {
        self.tracker.as_ref()
    }

    pub fn frames_processed(&self) -> usize {
        self.frames
    }

    /// Runs one frame through detection, tracking, reply intake and
    /// identify dispatch.
    ///
    /// A missing or malformed detection reply skips the frame. Failures of
    /// a single identify request are logged. Broker errors and
    /// cancellation are returned.
    pub fn process_frame(&mut self, frame: &Frame, now: Instant) -> Result<FrameReport, DispatchError> {
        let started = Instant::now();
        self.session.send_detect(frame)?;
        let boxes = match self.session.poll_detect() {
            Ok(boxes) => boxes,
            Err(e @ (DispatchError::WorkerTimeout(_) | DispatchError::MalformedPayload(_))) => {
                log::warn!("Skipping frame: {e}");
                return Ok(FrameReport::skipped());
            }
            Err(e) => return Err(e),
        };
        self.logger.timing("detect", elapsed_ms(started));

        self.tracker.update(&boxes);
        for tracker_id in self.tracker.take_removed() {
            self.session.discard_mailbox(&tracker_id)?;
        }
        let mut report = FrameReport {
            faces: boxes.len(),
            ..FrameReport::default()
        };

        let started = Instant::now();
        self.drain_mailboxes(&mut report)?;
        self.logger.timing("mailbox", elapsed_ms(started));

        let started = Instant::now();
        self.dispatch_due(frame, now, &mut report)?;
        self.logger.timing("identify_dispatch", elapsed_ms(started));

        report.pending = self
            .tracker
            .objects()
            .iter()
            .filter(|o| !o.is_resolved() && !self.scheduler.is_exhausted(o))
            .count();
        Ok(report)
    }

    fn drain_mailboxes(&mut self, report: &mut FrameReport) -> Result<(), DispatchError> {
        for object in self.tracker.objects_mut() {
            loop {
                let reply = match self.session.poll_identify_reply(object.id()) {
                    Ok(Some(reply)) => reply,
                    Ok(None) => break,
                    Err(e @ (DispatchError::MalformedPayload(_) | DispatchError::IdentityLookup { .. })) => {
                        log::warn!("Dropping reply for {}: {e}", object.id());
                        continue;
                    }
                    Err(e) => return Err(e),
                };
                report.replies += 1;
                if self.scheduler.apply_reply(object, reply) == ReplyOutcome::Resolved {
                    report.resolved += 1;
                    if let Some(person) = object.identity() {
                        log::info!("{} identified as {}", object.id(), person.name);
                    }
                }
            }
        }
        Ok(())
    }

    fn dispatch_due(
        &mut self,
        frame: &Frame,
        now: Instant,
        report: &mut FrameReport,
    ) -> Result<(), DispatchError> {
        // Crop first: the tracker cannot lend out an object mutably while cropping.
        let due: Vec<(usize, Frame)> = self
            .tracker
            .objects()
            .iter()
            .enumerate()
            .filter(|(_, object)| self.scheduler.is_due(object, now))
            .filter_map(|(i, object)| self.tracker.crop_face(frame, object).map(|crop| (i, crop)))
            .collect();

        let session = &self.session;
        let mode = self.mode;
        for (index, crop) in due {
            let object = &mut self.tracker.objects_mut()[index];
            let sent = self.scheduler.try_dispatch(object, now, |object| {
                session.send_identify(object.id(), &crop, mode)
            });
            match sent {
                Ok(true) => report.dispatched += 1,
                Ok(false) => {}
                Err(e @ (DispatchError::InvalidShape { .. } | DispatchError::MalformedPayload(_))) => {
                    log::warn!("Identify request for {} not sent: {e}", object.id());
                }
                Err(e) => return Err(e),
            }
        }
        Ok(())
    }

    /// Processes relay frames until the session is stopped. Returns the
    /// number of frames processed.
    pub fn run(&mut self) -> Result<usize, DispatchError> {
        let cancel = self.session.cancellation();
        let relay = self.session.relay().clone();
        self.logger.info(&format!("Session {} processing frames", self.session.id()));

        while !cancel.is_cancelled() {
            let Some(frame) = relay.pop_timeout(RELAY_POLL_TIMEOUT)? else {
                continue;
            };
            match self.process_frame(&frame, Instant::now()) {
                Ok(report) => self.logger.frame(&report),
                Err(DispatchError::Cancelled) => break,
                Err(e) => {
                    self.logger.summary();
                    return Err(e);
                }
            }
            self.frames += 1;
        }

        self.logger.summary();
        Ok(self.frames)
    }

    /// Stops the session; see [`ClientSession::stop`].
    pub fn stop(&mut self) -> Result<(), DispatchError> {
        self.session.stop()
    }
}
