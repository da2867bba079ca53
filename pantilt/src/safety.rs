use tracing::warn;

use crate::geometry::{FrameGeometry, Region};

/// Result of checking a region of interest against the real frame.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RoiCheck {
    /// Region to use: the original, or empty (full frame) after a correction.
    pub region: Region,
    pub warning: Option<String>,
}

/// Make sure a configured detection window fits inside the frame.
///
/// A region reaching past the right or bottom edge is dropped in favour of
/// the full frame with a warning. Unknown geometry leaves the region alone.
pub fn validate_roi(region: Region, geometry: FrameGeometry) -> RoiCheck {
    if region.is_empty() || !geometry.is_known() {
        return RoiCheck {
            region,
            warning: None,
        };
    }
    let too_wide = region.right() > geometry.width as u64;
    let too_tall = region.bottom() > geometry.height as u64;
    if too_wide || too_tall {
        let warning = format!("ROI {region} does not fit a {geometry} frame, ignoring it");
        warn!(%region, %geometry, "ROI is too big, using full frame");
        return RoiCheck {
            region: Region::EMPTY,
            warning: Some(warning),
        };
    }
    RoiCheck {
        region,
        warning: None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn region_touching_the_edge_fits() {
        let check = validate_roi(Region::new(600, 440, 40, 40), FrameGeometry::new(640, 480));
        assert_eq!(check.region, Region::new(600, 440, 40, 40));
        assert!(check.warning.is_none());
    }

    #[test]
    fn unknown_geometry_keeps_region() {
        let roi = Region::new(700, 100, 50, 50);
        assert_eq!(validate_roi(roi, FrameGeometry::unknown()).region, roi);
    }
}
