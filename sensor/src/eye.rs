use async_trait::async_trait;
use glob::glob;
use pantilt::{CaptureError, CaptureSource, Frame, FrameGeometry};
use std::path::PathBuf;
use tokio::{
    fs,
    time::{self, Duration, Interval, MissedTickBehavior},
};
use tracing::{debug, info, warn};

use crate::{decode_frame, fit_frame};

/// Replays image files from disk as simulated camera frames.
pub struct FileCapture {
    paths: Vec<PathBuf>,
    index: usize,
    interval: Duration,
    ticker: Option<Interval>,
    looping: bool,
    geometry: FrameGeometry,
}

impl FileCapture {
    /// Create a source cycling files matching `pattern` at `fps` frames per
    /// second. Files are played in path order. Geometry comes from the first
    /// file and later files of another size are scaled to it.
    pub fn new(pattern: &str, fps: u32) -> Result<Self, CaptureError> {
        if fps == 0 {
            return Err(CaptureError::Device("frame rate must be positive".into()));
        }
        let mut paths: Vec<PathBuf> = glob(pattern)
            .map_err(|e| CaptureError::Device(e.msg.to_string()))?
            .filter_map(Result::ok)
            .collect();
        paths.sort();
        let geometry = match paths.first() {
            Some(first) => {
                let (w, h) = image::image_dimensions(first)
                    .map_err(|e| CaptureError::Decode(format!("{}: {e}", first.display())))?;
                FrameGeometry::new(w, h)
            }
            None => FrameGeometry::unknown(),
        };
        info!(pattern, files = paths.len(), %geometry, fps, "file capture opened");
        Ok(Self {
            paths,
            index: 0,
            interval: Duration::from_secs_f64(1.0 / fps as f64),
            ticker: None,
            looping: false,
            geometry,
        })
    }

    /// Start again from the first file instead of ending the stream.
    pub fn looping(mut self, looping: bool) -> Self {
        self.looping = looping;
        self
    }

    pub fn len(&self) -> usize {
        self.paths.len()
    }

    pub fn is_empty(&self) -> bool {
        self.paths.is_empty()
    }
}

#[async_trait]
impl CaptureSource for FileCapture {
    fn geometry(&self) -> FrameGeometry {
        self.geometry
    }

    async fn next_frame(&mut self) -> Result<Option<Frame>, CaptureError> {
        if self.paths.is_empty() {
            return Ok(None);
        }
        if self.index >= self.paths.len() {
            if !self.looping {
                return Ok(None);
            }
            self.index = 0;
        }
        let interval = self.interval;
        let ticker = self.ticker.get_or_insert_with(|| {
            let mut ticker = time::interval(interval);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            ticker
        });
        ticker.tick().await;

        let path = self.paths[self.index].clone();
        self.index += 1;
        let bytes = fs::read(&path).await?;
        let frame = decode_frame(&bytes)?;
        debug!(path = %path.display(), "frame read");
        if frame.geometry != self.geometry {
            warn!(
                path = %path.display(),
                size = %frame.geometry,
                session = %self.geometry,
                "rescaling frame to session size"
            );
        }
        Ok(Some(fit_frame(frame, self.geometry)))
    }
}
