use anyhow::{anyhow, Context, Result};
use net::{ImageSender, StreamBus};
use pantilt::{
    configure, CaptureSource, CommandQueue, Detector, FrameGeometry, LoggingDriver, Mechanism,
    RunLoop, SharedMechanism, StrategyKind,
};
use sensor::{ChannelCapture, FileCapture};
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;
use tracing::{error, info};
use vision::{ColourDetector, FaceDetector};

use crate::cli::Args;
use crate::server::{router, AppState};

/// Browser frames waiting to be decoded.
const FRAME_BACKLOG: usize = 4;

/// Wire the mount, camera and console together and track until ctrl-c or the
/// loop ends on its own.
pub async fn run(args: Args, bus: Arc<StreamBus>) -> Result<()> {
    let config = args.tracking_config();

    let mechanism = Mechanism::new(Arc::new(LoggingDriver))
        .with_calibration(args.pan_servo, args.tilt_servo);
    let mechanism = SharedMechanism::new(mechanism);
    mechanism
        .initialize()
        .await
        .context("failed to centre the mechanism")?;

    let mut frames_tx = None;
    let capture: Option<Box<dyn CaptureSource>> = if config.strategy.needs_camera() {
        match &args.frames {
            Some(pattern) => {
                let files = FileCapture::new(pattern, args.fps)?.looping(args.loop_frames);
                info!(%pattern, frames = files.len(), "replaying frames from disk");
                Some(Box::new(files))
            }
            None => {
                let geometry = FrameGeometry::new(args.width, args.height);
                let (tx, source) = ChannelCapture::channel(FRAME_BACKLOG, geometry);
                frames_tx = Some(tx);
                info!(%geometry, "waiting for browser frames on /frames");
                Some(Box::new(source))
            }
        }
    } else {
        None
    };
    let geometry = capture
        .as_ref()
        .map(|c| c.geometry())
        .unwrap_or_else(FrameGeometry::unknown);

    let session = configure(config, geometry)?;
    for warning in &session.warnings {
        bus.toast(warning.clone());
    }

    let detector: Option<Arc<dyn Detector>> = match session.config.strategy {
        StrategyKind::Colour => Some(Arc::new(ColourDetector::new(
            args.colour_settings(session.config.roi),
        ))),
        StrategyKind::Face => {
            let path = args
                .face_model
                .as_ref()
                .ok_or_else(|| anyhow!("face mode needs --face-model"))?;
            Some(Arc::new(FaceDetector::from_file(path)?))
        }
        StrategyKind::Manual => None,
    };

    let images = Arc::new(ImageSender::new(bus.clone()));
    images.set_period(Duration::from_millis(args.image_period_ms));

    let policy = session.config.on_actuator_failure;
    let timer_period = session.config.timer_period();
    let frame_timeout = session.config.frame_timeout();
    let controller = session
        .into_controller(mechanism.clone())
        .with_sink(bus.clone())
        .with_sink(images.clone())
        .keep_frames(true);

    let (commands, queue) = CommandQueue::channel();
    let run_loop = match (capture, detector) {
        (Some(capture), Some(detector)) => {
            RunLoop::frames(controller, capture, detector).with_frame_timeout(frame_timeout)
        }
        _ => RunLoop::timer(controller, timer_period, queue),
    }
    .with_policy(policy);

    let running = run_loop.start()?;
    let state = AppState {
        bus: bus.clone(),
        commands,
        frames: frames_tx,
        outcomes: running.outcome_handle(),
        images,
    };

    let listener = TcpListener::bind(&args.addr)
        .await
        .with_context(|| format!("failed to bind {}", args.addr))?;
    info!(addr = %args.addr, "console listening");
    let server = tokio::spawn(async move {
        if let Err(e) = axum::serve(listener, router(state)).await {
            error!(error = %e, "console server failed");
        }
    });

    let stop = running.stop_handle();
    let finished = running.join();
    tokio::pin!(finished);
    let summary = tokio::select! {
        _ = tokio::signal::ctrl_c() => {
            info!("interrupted, stopping run loop");
            stop.stop();
            (&mut finished).await?
        }
        summary = &mut finished => summary?,
    };
    server.abort();

    let commands = mechanism.commands_issued().await;
    info!(
        reason = ?summary.reason,
        cycles = summary.cycles,
        moves = summary.moves,
        errors = summary.errors,
        position = %summary.final_position,
        commands,
        "tracking finished"
    );
    Ok(())
}
