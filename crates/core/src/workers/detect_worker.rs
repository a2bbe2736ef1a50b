use std::sync::Arc;
use std::thread;
use std::time::Duration;

use crate::broker::domain::broker::Broker;
use crate::codec::assignment_codec::Assignment;
use crate::codec::boxes_codec::encode_boxes;
use crate::codec::frame_codec::decode_frame;
use crate::shared::cancellation::CancellationToken;
use crate::shared::constants::WORKER_IDLE_INTERVAL;
use crate::shared::dispatch_error::DispatchError;
use crate::workers::domain::face_detector::FaceDetector;

/// Serves detection requests for the one client admitted to its slot.
///
/// The input key only ever holds the client's newest frame; the reply goes
/// under the output key, where the client polls for it.
pub struct DetectWorker {
    broker: Arc<dyn Broker>,
    assignment: Assignment,
    detector: Box<dyn FaceDetector>,
    idle_interval: Duration,
}

impl DetectWorker {
    pub fn new(
        broker: Arc<dyn Broker>,
        assignment: Assignment,
        detector: Box<dyn FaceDetector>,
    ) -> Self {
        Self {
            broker,
            assignment,
            detector,
            idle_interval: WORKER_IDLE_INTERVAL,
        }
    }

    pub fn with_idle_interval(mut self, idle_interval: Duration) -> Self {
        self.idle_interval = idle_interval;
        self
    }

    /// Handles the pending request, if any. Returns whether there was one.
    ///
    /// A detector failure is answered with an empty reply so the client
    /// is not left waiting for its deadline.
    pub fn step(&mut self) -> Result<bool, DispatchError> {
        let Some(request) = self.broker.list_pop(&self.assignment.input_key)? else {
            return Ok(false);
        };
        let frame = decode_frame(&request)?;
        let boxes = self.detector.detect(&frame).unwrap_or_else(|e| {
            log::warn!("Detection failed on {}: {e}", self.assignment.input_key);
            Vec::new()
        });
        self.broker
            .put(&self.assignment.output_key, &encode_boxes(&boxes))?;
        Ok(true)
    }

    /// Serves requests until `cancel` trips. Returns the number handled.
    pub fn run(&mut self, cancel: &CancellationToken) -> Result<usize, DispatchError> {
        log::info!(
            "Detect worker serving {} -> {}",
            self.assignment.input_key,
            self.assignment.output_key
        );
        let mut handled = 0;
        while !cancel.is_cancelled() {
            match self.step() {
                Ok(true) => handled += 1,
                Ok(false) => thread::sleep(self.idle_interval),
                Err(DispatchError::MalformedPayload(e)) => {
                    log::warn!("Dropping detect request: {e}");
                }
                Err(e) => return Err(e),
            }
        }
        Ok(handled)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::broker::infrastructure::in_memory_broker::InMemoryBroker;
    use crate::codec::boxes_codec::decode_boxes;
    use crate::codec::frame_codec::encode_frame;
    use crate::shared::bounding_box::BoundingBox;
    use crate::shared::frame::Frame;

    /// Reports one box per frame whose width equals the frame's first byte.
    struct MarkerDetector;

    impl FaceDetector for MarkerDetector {
        fn detect(
            &mut self,
            frame: &Frame,
        ) -> Result<Vec<BoundingBox>, Box<dyn std::error::Error + Send + Sync>> {
            Ok(vec![BoundingBox::new(0, 0, frame.data()[0] as u16, 1)])
        }
    }

    struct FailingDetector;

    impl FaceDetector for FailingDetector {
        fn detect(
            &mut self,
            _frame: &Frame,
        ) -> Result<Vec<BoundingBox>, Box<dyn std::error::Error + Send + Sync>> {
            Err("model not loaded".into())
        }
    }

    fn assignment() -> Assignment {
        Assignment {
            input_key: "in1".into(),
            output_key: "out1".into(),
            channel: "chan1".into(),
        }
    }

    #[test]
    fn test_idle_step_without_request() {
        let broker = Arc::new(InMemoryBroker::new());
        let mut worker = DetectWorker::new(broker.clone(), assignment(), Box::new(MarkerDetector));
        assert!(!worker.step().unwrap());
        assert!(!broker.exists("out1").unwrap());
    }

    #[test]
    fn test_step_writes_boxes_reply() {
        let broker = Arc::new(InMemoryBroker::new());
        broker
            .list_push("in1", &encode_frame(&Frame::new(vec![9; 3], 1, 1, 3)))
            .unwrap();
        let mut worker = DetectWorker::new(broker.clone(), assignment(), Box::new(MarkerDetector));

        assert!(worker.step().unwrap());

        let reply = broker.get("out1").unwrap().unwrap();
        assert_eq!(decode_boxes(&reply).unwrap(), vec![BoundingBox::new(0, 0, 9, 1)]);
    }

    #[test]
    fn test_detector_failure_replies_empty() {
        let broker = Arc::new(InMemoryBroker::new());
        broker
            .list_push("in1", &encode_frame(&Frame::zeroed(1, 1, 3)))
            .unwrap();
        let mut worker = DetectWorker::new(broker.clone(), assignment(), Box::new(FailingDetector));

        assert!(worker.step().unwrap());
        assert_eq!(broker.get("out1").unwrap(), Some(Vec::new()));
    }

    #[test]
    fn test_malformed_request_is_reported() {
        let broker = Arc::new(InMemoryBroker::new());
        broker.list_push("in1", &[1, 2]).unwrap();
        let mut worker = DetectWorker::new(broker.clone(), assignment(), Box::new(MarkerDetector));
        assert!(matches!(
            worker.step(),
            Err(DispatchError::MalformedPayload(_))
        ));
    }

    #[test]
    fn test_run_stops_when_cancelled() {
        let broker = Arc::new(InMemoryBroker::new());
        let cancel = CancellationToken::new();
        let mut worker = DetectWorker::new(broker.clone(), assignment(), Box::new(MarkerDetector))
            .with_idle_interval(Duration::from_millis(1));
        let handle = {
            let cancel = cancel.clone();
            thread::spawn(move || worker.run(&cancel))
        };
        broker.list_push("in1", &[0xff]).unwrap();
        thread::sleep(Duration::from_millis(20));
        cancel.cancel();
        assert_eq!(handle.join().unwrap().unwrap(), 0);
    }
}
