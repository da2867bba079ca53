use image::RgbImage;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;

/// Pixel coordinate inside a frame.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Point {
    pub x: i32,
    pub y: i32,
}

impl Point {
    pub fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }
}

impl fmt::Display for Point {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.x, self.y)
    }
}

/// Dimensions of the frames produced by a capture session.
///
/// A zero width or height means the geometry is unknown.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FrameGeometry {
    pub width: u32,
    pub height: u32,
}

impl FrameGeometry {
    pub fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    /// Geometry used when no camera is attached.
    pub fn unknown() -> Self {
        Self::default()
    }

    pub fn is_known(&self) -> bool {
        self.width != 0 && self.height != 0
    }

    /// Centre pixel, or `None` when the geometry is unknown.
    pub fn centre(&self) -> Option<Point> {
        self.is_known()
            .then(|| Point::new((self.width / 2) as i32, (self.height / 2) as i32))
    }
}

impl fmt::Display for FrameGeometry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}x{}", self.width, self.height)
    }
}

/// Rectangular detection window. An empty region means the full frame.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Region {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
}

impl Region {
    pub const EMPTY: Self = Self {
        x: 0,
        y: 0,
        width: 0,
        height: 0,
    };

    pub fn new(x: u32, y: u32, width: u32, height: u32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0
    }

    /// Right edge, exclusive.
    pub fn right(&self) -> u64 {
        self.x as u64 + self.width as u64
    }

    /// Bottom edge, exclusive.
    pub fn bottom(&self) -> u64 {
        self.y as u64 + self.height as u64
    }

    /// The window to scan inside a frame: the region itself, or the whole
    /// frame when the region is empty.
    pub fn within(&self, geometry: FrameGeometry) -> Region {
        if self.is_empty() {
            Region::new(0, 0, geometry.width, geometry.height)
        } else {
            *self
        }
    }
}

impl fmt::Display for Region {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_empty() {
            f.write_str("full frame")
        } else {
            write!(f, "{}x{}@({}, {})", self.width, self.height, self.x, self.y)
        }
    }
}

impl std::str::FromStr for Region {
    type Err = String;

    /// Parse `x,y,width,height`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let parts = s
            .split(',')
            .map(|p| p.trim().parse::<u32>())
            .collect::<Result<Vec<_>, _>>()
            .map_err(|e| format!("invalid region {s:?}: {e}"))?;
        match parts.as_slice() {
            [x, y, w, h] => Ok(Region::new(*x, *y, *w, *h)),
            _ => Err(format!("region {s:?} must be x,y,width,height")),
        }
    }
}

/// A captured image together with its geometry.
#[derive(Clone, Debug)]
pub struct Frame {
    pub geometry: FrameGeometry,
    pub image: Arc<RgbImage>,
}

impl Frame {
    pub fn new(image: RgbImage) -> Self {
        let (width, height) = image.dimensions();
        Self {
            geometry: FrameGeometry::new(width, height),
            image: Arc::new(image),
        }
    }
}
