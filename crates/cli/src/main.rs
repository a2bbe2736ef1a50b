use std::path::PathBuf;
use std::process;
use std::sync::Arc;
use std::thread;

use clap::Parser;

use face_dispatch_core::broker::domain::broker::Broker;
use face_dispatch_core::broker::infrastructure::redis_broker::RedisBroker;
use face_dispatch_core::capture::capture_worker::spawn_capture;
use face_dispatch_core::capture::infrastructure::image_sequence_source::ImageSequenceSource;
use face_dispatch_core::coordinator::coordinator::Coordinator;
use face_dispatch_core::identity::infrastructure::in_memory_identity_store::InMemoryIdentityStore;
use face_dispatch_core::pipeline::client_pipeline::ClientPipeline;
use face_dispatch_core::pipeline::session_logger::StdoutSessionLogger;
use face_dispatch_core::session::client_config::ClientConfig;
use face_dispatch_core::session::client_session::ClientSession;
use face_dispatch_core::shared::cancellation::CancellationToken;
use face_dispatch_core::shared::constants::TRACKER_MAX_LOST;
use face_dispatch_core::tracking::infrastructure::iou_tracker::IouTracker;

/// Face recognition dispatch over a shared broker.
#[derive(Parser)]
#[command(name = "face-dispatch")]
struct Cli {
    /// Run the registration coordinator.
    #[arg(long)]
    master: bool,

    /// Run a client session.
    #[arg(long)]
    client: bool,

    /// Broker URL.
    #[arg(long, default_value = "redis://127.0.0.1:6379/")]
    redis_url: String,

    /// Number of detect worker slots the coordinator hands out.
    #[arg(long, default_value = "4")]
    pool_size: usize,

    /// Client config file (JSON). Defaults to the per-user config.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Directory of images replayed as the capture device.
    #[arg(long)]
    frames: Option<PathBuf>,

    /// Restart the image sequence when it ends.
    #[arg(long)]
    loop_frames: bool,

    /// Known people as a JSON array of {"id", "name"} records.
    #[arg(long)]
    identities: Option<PathBuf>,
}

fn main() {
    env_logger::init();

    if let Err(e) = run() {
        eprintln!("Error: {e}");
        process::exit(1);
    }
}

fn run() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    validate(&cli)?;

    if !cli.master && !cli.client {
        log::info!("No role selected; pass --master and/or --client");
        return Ok(());
    }

    let broker: Arc<dyn Broker> = Arc::new(RedisBroker::connect(&cli.redis_url)?);

    if !cli.client {
        let mut coordinator = Coordinator::new(broker, cli.pool_size);
        coordinator.run(&CancellationToken::new())?;
        return Ok(());
    }

    let master_cancel = CancellationToken::new();
    let master = cli.master.then(|| {
        let mut coordinator = Coordinator::new(broker.clone(), cli.pool_size);
        let cancel = master_cancel.clone();
        thread::spawn(move || coordinator.run(&cancel))
    });

    let result = run_client(&cli, broker);

    master_cancel.cancel();
    if let Some(handle) = master {
        handle
            .join()
            .map_err(|_| "coordinator thread panicked")??;
    }
    result
}

fn validate(cli: &Cli) -> Result<(), Box<dyn std::error::Error>> {
    if cli.master && cli.pool_size == 0 {
        return Err("--pool-size must be at least 1".into());
    }
    if cli.client && cli.frames.is_none() {
        return Err("--client needs --frames <dir>".into());
    }
    Ok(())
}

fn run_client(cli: &Cli, broker: Arc<dyn Broker>) -> Result<(), Box<dyn std::error::Error>> {
    let config = match &cli.config {
        Some(path) => ClientConfig::load(path)
            .map_err(|e| format!("failed to load config {}: {e}", path.display()))?,
        None => ClientConfig::load_or_default(),
    };
    let identities = match &cli.identities {
        Some(path) => InMemoryIdentityStore::load(path)
            .map_err(|e| format!("failed to load identities {}: {e}", path.display()))?,
        None => InMemoryIdentityStore::default(),
    };
    let frames_dir = cli.frames.as_deref().ok_or("--client needs --frames <dir>")?;
    let source = ImageSequenceSource::open(frames_dir, cli.loop_frames)
        .map_err(|e| format!("failed to open {}: {e}", frames_dir.display()))?;

    let mut session = ClientSession::new(broker, Arc::new(identities), config);
    session.register()?;

    let capture = spawn_capture(
        Box::new(source),
        session.relay().clone(),
        session.cancellation(),
    );
    let tracker = IouTracker::new(session.id().to_string(), TRACKER_MAX_LOST);
    let mut pipeline = ClientPipeline::new(
        session,
        Box::new(tracker),
        Box::new(StdoutSessionLogger::default()),
    );

    let result = pipeline.run();
    pipeline.stop()?;
    let end = capture.join().map_err(|_| "capture thread panicked")?;
    let frames = result?;
    log::info!("Processed {frames} frames (capture {end:?})");
    Ok(())
}
