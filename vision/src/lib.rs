//! Target detectors for the tracking loop.
//!
//! [`ColourDetector`] finds the centroid of pixels inside a colour range and
//! [`FaceDetector`] finds the largest face using a SeetaFace model.

pub mod colour;
pub mod face;

pub use colour::{parse_rgb, ColourDetector, ColourSettings};
pub use face::FaceDetector;
