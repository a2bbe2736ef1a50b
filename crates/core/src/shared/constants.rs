use std::time::Duration;

/// List the coordinator pops client ids from.
pub const REGISTER_LIST_KEY: &str = "service:register-client";
/// List clients push their id onto when they give up or leave a slot.
pub const RELEASE_LIST_KEY: &str = "service:release-client";
/// Shared work queue every identify worker consumes.
pub const IDENTIFY_QUEUE_KEY: &str = "service:identify-queue";
/// Admission reply meaning the worker pool has no free slot.
pub const BUSY_SENTINEL: &[u8] = b"NONE";

/// Identify requests carry a fixed `160 x 160 x 3` face crop.
pub const FACE_CROP_SIZE: u16 = 160;
pub const FACE_CROP_CHANNELS: u16 = 3;

/// Person id a worker replies with when no reference matches.
pub const UNKNOWN_PERSON_ID: i64 = -1;

pub const DEFAULT_EMBEDDING_DIM: usize = 512;

pub const DEFAULT_MAX_ATTEMPTS: u32 = 5;
pub const DEFAULT_MIN_RETRY_DELAY: Duration = Duration::from_millis(1000);

pub const RELAY_CAPACITY: usize = 2;

pub const REGISTRATION_POLL_INTERVAL: Duration = Duration::from_millis(100);
pub const REGISTRATION_DEADLINE: Duration = Duration::from_secs(10);

pub const DETECTION_POLL_INTERVAL: Duration = Duration::from_millis(1);
pub const DETECTION_POLL_MAX_INTERVAL: Duration = Duration::from_millis(8);
pub const DETECTION_DEADLINE: Duration = Duration::from_secs(2);

/// Idle sleep for worker and coordinator loops when their queue is empty.
pub const WORKER_IDLE_INTERVAL: Duration = Duration::from_millis(5);

/// Max updates an object can go unmatched before the tracker drops it.
pub const TRACKER_MAX_LOST: usize = 30;

pub const IMAGE_EXTENSIONS: &[&str] = &["jpg", "jpeg", "png", "bmp", "tiff", "tif", "webp"];

/// How long the processing loop waits on the relay before rechecking
/// cancellation.
pub const RELAY_POLL_TIMEOUT: Duration = Duration::from_millis(50);
