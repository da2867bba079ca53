use image::imageops;
use pantilt::{DetectError, Detector, Frame, Point};
use rustface::{create_detector_with_model, read_model, ImageData};
use std::io::Cursor;
use std::path::Path;
use tracing::{debug, info};

/// Face detector built on a SeetaFace frontal model.
///
/// The model is parsed per call since the underlying detector is neither
/// `Send` nor `Sync`.
pub struct FaceDetector {
    model: Vec<u8>,
    min_face_size: u32,
    score_thresh: f64,
}

impl FaceDetector {
    /// Load a model file such as `seeta_fd_frontal_v1.0.bin`.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, DetectError> {
        let path = path.as_ref();
        let bytes = std::fs::read(path)
            .map_err(|e| DetectError::Model(format!("{}: {e}", path.display())))?;
        let detector = Self::from_bytes(bytes)?;
        info!(path = %path.display(), "face model loaded");
        Ok(detector)
    }

    pub fn from_bytes(model: Vec<u8>) -> Result<Self, DetectError> {
        read_model(Cursor::new(&model[..])).map_err(|e| DetectError::Model(e.to_string()))?;
        Ok(Self {
            model,
            min_face_size: 20,
            score_thresh: 2.0,
        })
    }

    pub fn with_min_face_size(mut self, size: u32) -> Self {
        self.min_face_size = size;
        self
    }

    pub fn with_score_thresh(mut self, thresh: f64) -> Self {
        self.score_thresh = thresh;
        self
    }
}

impl Detector for FaceDetector {
    fn name(&self) -> &str {
        "face"
    }

    fn detect(&self, frame: &Frame) -> Result<Option<Point>, DetectError> {
        let model =
            read_model(Cursor::new(&self.model[..])).map_err(|e| DetectError::Model(e.to_string()))?;
        let mut det = create_detector_with_model(model);
        det.set_min_face_size(self.min_face_size);
        det.set_score_thresh(self.score_thresh);
        det.set_pyramid_scale_factor(0.8);
        det.set_slide_window_step(4, 4);

        let gray = imageops::grayscale(frame.image.as_ref());
        let (w, h) = gray.dimensions();
        let mut image = ImageData::new(&gray, w, h);
        let faces = det.detect(&mut image);
        debug!(faces = faces.len(), "faces detected");

        let largest = faces
            .iter()
            .map(|f| f.bbox())
            .max_by_key(|b| b.width() as u64 * b.height() as u64);
        Ok(largest.map(|b| {
            Point::new(
                b.x() + (b.width() / 2) as i32,
                b.y() + (b.height() / 2) as i32,
            )
        }))
    }
}
