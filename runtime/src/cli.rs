use clap::Parser;
use pantilt::{FailurePolicy, Orientation, Region, ServoCalibration, StrategyKind, TrackingConfig};
use std::path::PathBuf;
use vision::{parse_rgb, ColourSettings};

/// Keep a target centred with a pan/tilt mount.
#[derive(Parser, Debug, Clone)]
#[command(author, version, about)]
pub struct Args {
    /// Tracking mode: colour, face or manual
    #[arg(short, long, env = "PANTILT_MODE", default_value = "colour")]
    pub mode: StrategyKind,

    /// Proportional gain applied to the target offset
    #[arg(long, env = "PANTILT_GAIN", default_value_t = 1.0)]
    pub gain: f64,

    /// Largest change per cycle, in percent of travel
    #[arg(long, env = "PANTILT_MAX_STEP", default_value_t = 5.0)]
    pub max_step: f64,

    /// Pixel distance from centre treated as centred
    #[arg(long, env = "PANTILT_DEADBAND", default_value_t = 0)]
    pub deadband: u32,

    /// Detection window as x,y,width,height
    #[arg(long, env = "PANTILT_ROI")]
    pub roi: Option<Region>,

    /// Direction of pan travel for targets right of centre (1 or -1)
    #[arg(long, default_value_t = 1.0, allow_hyphen_values = true)]
    pub pan_sign: f64,

    /// Direction of tilt travel for targets below centre (1 or -1)
    #[arg(long, default_value_t = -1.0, allow_hyphen_values = true)]
    pub tilt_sign: f64,

    /// Manual mode: period between command checks in milliseconds
    #[arg(long, default_value_t = 100)]
    pub timer_period_ms: u64,

    /// Longest wait for a camera frame in milliseconds
    #[arg(long, default_value_t = 2000)]
    pub frame_timeout_ms: u64,

    /// Keep tracking after an actuator write fails
    #[arg(long)]
    pub continue_on_actuator_failure: bool,

    /// Glob of image files to replay instead of browser frames
    #[arg(long, env = "PANTILT_FRAMES")]
    pub frames: Option<String>,

    /// Replay rate for --frames
    #[arg(long, default_value_t = 10)]
    pub fps: u32,

    /// Start --frames over when the last file has been played
    #[arg(long)]
    pub loop_frames: bool,

    /// Frame width for browser frames
    #[arg(long, default_value_t = 128)]
    pub width: u32,

    /// Frame height for browser frames
    #[arg(long, default_value_t = 96)]
    pub height: u32,

    /// Lowest RGB value tracked in colour mode
    #[arg(long, default_value = "150,0,0", value_parser = parse_rgb)]
    pub colour_low: [u8; 3],

    /// Highest RGB value tracked in colour mode
    #[arg(long, default_value = "255,90,90", value_parser = parse_rgb)]
    pub colour_high: [u8; 3],

    /// Fewest matching pixels that count as a colour detection
    #[arg(long, default_value_t = 20)]
    pub min_pixels: u32,

    /// SeetaFace model used in face mode
    #[arg(long, env = "PANTILT_FACE_MODEL")]
    pub face_model: Option<PathBuf>,

    /// Pan servo pulse range as min,max
    #[arg(long, default_value = "150,600", value_parser = parse_servo)]
    pub pan_servo: ServoCalibration,

    /// Tilt servo pulse range as min,max
    #[arg(long, default_value = "150,600", value_parser = parse_servo)]
    pub tilt_servo: ServoCalibration,

    /// Minimum gap between images streamed to the console, in milliseconds
    #[arg(long, default_value_t = 600)]
    pub image_period_ms: u64,

    /// Address to bind the HTTP console
    #[arg(long, env = "PANTILT_ADDR", default_value = "127.0.0.1:3000")]
    pub addr: String,
}

/// Parse `min,max` servo pulses.
pub fn parse_servo(s: &str) -> Result<ServoCalibration, String> {
    let (min, max) = s
        .split_once(',')
        .ok_or_else(|| format!("servo range {s:?} must be min,max"))?;
    let parse = |v: &str| {
        v.trim()
            .parse::<u16>()
            .map_err(|e| format!("invalid pulse {v:?}: {e}"))
    };
    Ok(ServoCalibration::new(parse(min)?, parse(max)?))
}

impl Args {
    pub fn tracking_config(&self) -> TrackingConfig {
        TrackingConfig {
            strategy: self.mode,
            gain: self.gain,
            max_step: self.max_step,
            deadband: self.deadband,
            roi: self.roi.unwrap_or(Region::EMPTY),
            orientation: Orientation::new(self.pan_sign, self.tilt_sign),
            timer_period_ms: self.timer_period_ms,
            frame_timeout_ms: self.frame_timeout_ms,
            on_actuator_failure: if self.continue_on_actuator_failure {
                FailurePolicy::Continue
            } else {
                FailurePolicy::Stop
            },
        }
    }

    /// Colour settings using the already validated region of interest.
    pub fn colour_settings(&self, roi: Region) -> ColourSettings {
        ColourSettings {
            low: self.colour_low,
            high: self.colour_high,
            roi,
            min_pixels: self.min_pixels,
        }
    }
}
