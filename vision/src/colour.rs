use pantilt::{DetectError, Detector, Frame, Point, Region};
use serde::{Deserialize, Serialize};
use tracing::trace;

/// Inclusive RGB range and search window for colour tracking.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ColourSettings {
    pub low: [u8; 3],
    pub high: [u8; 3],
    /// Empty means the whole frame.
    pub roi: Region,
    /// Fewest matching pixels that count as a detection.
    pub min_pixels: u32,
}

impl Default for ColourSettings {
    fn default() -> Self {
        Self {
            low: [150, 0, 0],
            high: [255, 90, 90],
            roi: Region::EMPTY,
            min_pixels: 20,
        }
    }
}

impl ColourSettings {
    fn matches(&self, px: [u8; 3]) -> bool {
        (0..3).all(|c| self.low[c] <= px[c] && px[c] <= self.high[c])
    }
}

/// Parse `r,g,b`.
pub fn parse_rgb(s: &str) -> Result<[u8; 3], String> {
    let parts = s
        .split(',')
        .map(|p| p.trim().parse::<u8>())
        .collect::<Result<Vec<_>, _>>()
        .map_err(|e| format!("invalid colour {s:?}: {e}"))?;
    match parts.as_slice() {
        [r, g, b] => Ok([*r, *g, *b]),
        _ => Err(format!("colour {s:?} must be r,g,b")),
    }
}

/// Centroid of the pixels falling inside a colour range.
#[derive(Clone, Debug, Default)]
pub struct ColourDetector {
    settings: ColourSettings,
}

impl ColourDetector {
    pub fn new(settings: ColourSettings) -> Self {
        Self { settings }
    }

    pub fn settings(&self) -> &ColourSettings {
        &self.settings
    }
}

impl Detector for ColourDetector {
    fn name(&self) -> &str {
        "colour"
    }

    fn detect(&self, frame: &Frame) -> Result<Option<Point>, DetectError> {
        let window = self.settings.roi.within(frame.geometry);
        let (width, height) = frame.image.dimensions();
        let x_end = (window.right() as u32).min(width);
        let y_end = (window.bottom() as u32).min(height);

        let (mut sum_x, mut sum_y, mut count) = (0u64, 0u64, 0u64);
        for y in window.y..y_end {
            for x in window.x..x_end {
                if self.settings.matches(frame.image.get_pixel(x, y).0) {
                    sum_x += x as u64;
                    sum_y += y as u64;
                    count += 1;
                }
            }
        }
        trace!(count, %window, "colour pixels matched");
        if count == 0 || count < self.settings.min_pixels as u64 {
            return Ok(None);
        }
        Ok(Some(Point::new((sum_x / count) as i32, (sum_y / count) as i32)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_rgb() {
        assert_eq!(parse_rgb("1, 2,3"), Ok([1, 2, 3]));
        assert!(parse_rgb("1,2").is_err());
        assert!(parse_rgb("1,2,300").is_err());
    }

    #[test]
    fn range_is_inclusive() {
        let s = ColourSettings::default();
        assert!(s.matches([150, 0, 0]));
        assert!(s.matches([255, 90, 90]));
        assert!(!s.matches([149, 0, 0]));
    }
}
