//! Telemetry plumbing between the tracking core and remote viewers.
//!
//! The core only produces [`pantilt::TrackingOutcome`]s and console lines.
//! This crate turns them into serializable [`StreamEvent`]s on a broadcast
//! [`StreamBus`] so a web console can mirror the screen and camera.

pub mod image_sender;
pub mod stream_bus;

pub use image_sender::ImageSender;
pub use stream_bus::{OutcomeReport, StreamBus, StreamEvent};
