use pantilt::{configure, validate_roi, ConfigError, FrameGeometry, Region, StrategyKind, TrackingConfig};

#[test]
fn region_inside_frame_is_unchanged() {
    let roi = Region::new(100, 100, 50, 50);
    let check = validate_roi(roi, FrameGeometry::new(640, 480));
    assert_eq!(check.region, roi);
    assert!(check.warning.is_none());
}

#[test]
fn region_past_the_edge_is_reset() {
    let check = validate_roi(Region::new(700, 100, 50, 50), FrameGeometry::new(640, 480));
    assert_eq!(check.region, Region::EMPTY);
    assert!(check.warning.unwrap().contains("640x480"));
}

#[test]
fn region_larger_than_frame_is_reset() {
    let check = validate_roi(Region::new(0, 0, 200, 50), FrameGeometry::new(128, 96));
    assert!(check.region.is_empty());
    assert!(check.warning.is_some());
}

#[test]
fn configure_corrects_roi_and_keeps_going() {
    let config = TrackingConfig {
        roi: Region::new(0, 0, 1000, 1000),
        ..TrackingConfig::default()
    };
    let session = configure(config, FrameGeometry::new(128, 96)).unwrap();
    assert!(session.config.roi.is_empty());
    assert_eq!(session.warnings.len(), 1);
    assert_eq!(session.strategy.name(), "colour");
}

#[test]
fn configure_builds_manual_strategy() {
    let config = TrackingConfig {
        strategy: StrategyKind::Manual,
        ..TrackingConfig::default()
    };
    let session = configure(config, FrameGeometry::unknown()).unwrap();
    assert_eq!(session.strategy.name(), "manual");
    assert!(session.warnings.is_empty());
}

#[test]
fn configure_rejects_bad_numbers() {
    let geometry = FrameGeometry::new(128, 96);
    let bad_gain = TrackingConfig {
        gain: f64::NAN,
        ..TrackingConfig::default()
    };
    assert!(matches!(configure(bad_gain, geometry), Err(ConfigError::InvalidGain(_))));

    let bad_step = TrackingConfig {
        max_step: 150.0,
        ..TrackingConfig::default()
    };
    assert_eq!(
        configure(bad_step, geometry).err(),
        Some(ConfigError::InvalidMaxStep(150.0))
    );

    let bad_period = TrackingConfig {
        timer_period_ms: 0,
        ..TrackingConfig::default()
    };
    assert_eq!(
        configure(bad_period, geometry).err(),
        Some(ConfigError::ZeroPeriod("timer period"))
    );
}
