use async_trait::async_trait;
use pantilt::{
    ActuatorDriver, Axis, ConfirmedPosition, DriverError, Mechanism, MechanismError, PanTiltSetting,
    ServoCalibration,
};
use std::sync::{Arc, Mutex};

#[derive(Default)]
struct RecordingDriver {
    writes: Mutex<Vec<(Axis, u16)>>,
    fail_on: Mutex<Option<Axis>>,
}

#[async_trait]
impl ActuatorDriver for RecordingDriver {
    async fn set_pulse(&self, axis: Axis, pulse: u16) -> Result<(), DriverError> {
        if *self.fail_on.lock().unwrap() == Some(axis) {
            return Err(DriverError::Write {
                axis,
                pulse,
                reason: "i2c nack".into(),
            });
        }
        self.writes.lock().unwrap().push((axis, pulse));
        Ok(())
    }
}

fn mechanism() -> (Arc<RecordingDriver>, Mechanism) {
    let driver = Arc::new(RecordingDriver::default());
    (driver.clone(), Mechanism::new(driver))
}

#[tokio::test]
async fn initialize_centres_both_axes() {
    let (driver, mut mech) = mechanism();
    mech.initialize().await.unwrap();
    assert_eq!(mech.current_position(), PanTiltSetting::new(50.0, 50.0));
    assert_eq!(
        *driver.writes.lock().unwrap(),
        vec![(Axis::Pan, 375), (Axis::Tilt, 375)]
    );
}

#[tokio::test]
async fn initialize_recentres_from_anywhere() {
    let (driver, mut mech) = mechanism();
    mech.move_to(PanTiltSetting::new(10.0, 90.0)).await.unwrap();
    mech.initialize().await.unwrap();
    assert_eq!(mech.current_position(), PanTiltSetting::CENTRE);
    assert_eq!(driver.writes.lock().unwrap().len(), 4);
}

#[tokio::test]
async fn same_position_is_not_written() {
    let (driver, mut mech) = mechanism();
    mech.initialize().await.unwrap();
    let moved = mech.move_to(PanTiltSetting::CENTRE).await.unwrap();
    assert!(!moved);
    assert_eq!(driver.writes.lock().unwrap().len(), 2);
    assert_eq!(mech.commands_issued(), 2);
}

#[tokio::test]
async fn only_changed_axis_is_written() {
    let (driver, mut mech) = mechanism();
    mech.initialize().await.unwrap();
    assert!(mech.move_to(PanTiltSetting::new(100.0, 50.0)).await.unwrap());
    let writes = driver.writes.lock().unwrap();
    assert_eq!(writes.len(), 3);
    assert_eq!(writes[2], (Axis::Pan, 600));
}

#[tokio::test]
async fn failed_write_keeps_confirmed_axes() {
    let (driver, mut mech) = mechanism();
    mech.initialize().await.unwrap();
    *driver.fail_on.lock().unwrap() = Some(Axis::Tilt);
    let err = mech
        .move_to(PanTiltSetting::new(60.0, 40.0))
        .await
        .unwrap_err();
    let MechanismError::Actuator { retained, .. } = err;
    assert_eq!(retained.setting(), Some(PanTiltSetting::new(60.0, 50.0)));
    assert_eq!(mech.current_position(), PanTiltSetting::new(60.0, 50.0));
}

#[tokio::test]
async fn failed_first_write_keeps_everything() {
    let (driver, mut mech) = mechanism();
    mech.initialize().await.unwrap();
    *driver.fail_on.lock().unwrap() = Some(Axis::Pan);
    assert!(mech.move_to(PanTiltSetting::new(70.0, 20.0)).await.is_err());
    assert_eq!(mech.current_position(), PanTiltSetting::CENTRE);
}

#[tokio::test]
async fn calibration_is_applied_per_axis() {
    let driver = Arc::new(RecordingDriver::default());
    let mut mech = Mechanism::new(driver.clone())
        .with_calibration(ServoCalibration::new(100, 200), ServoCalibration::new(400, 300));
    mech.initialize().await.unwrap();
    assert_eq!(
        *driver.writes.lock().unwrap(),
        vec![(Axis::Pan, 150), (Axis::Tilt, 350)]
    );
}

#[tokio::test]
async fn nothing_is_confirmed_before_the_first_write() {
    let (_driver, mech) = mechanism();
    assert_eq!(mech.confirmed(), ConfirmedPosition::default());
    assert_eq!(mech.confirmed().setting(), None);
}

#[tokio::test]
async fn failed_initialize_leaves_axis_unconfirmed() {
    let (driver, mut mech) = mechanism();
    *driver.fail_on.lock().unwrap() = Some(Axis::Tilt);
    let err = mech.initialize().await.unwrap_err();
    let MechanismError::Actuator { retained, .. } = &err;
    assert_eq!(retained.pan, Some(50.0));
    assert_eq!(retained.tilt, None);
    assert!(err.to_string().contains("Tilt=unconfirmed"));
    assert_eq!(mech.confirmed().setting(), None);

    *driver.fail_on.lock().unwrap() = None;
    assert!(mech.move_to(PanTiltSetting::CENTRE).await.unwrap());
    assert_eq!(driver.writes.lock().unwrap().last(), Some(&(Axis::Tilt, 375)));
    assert_eq!(mech.confirmed().setting(), Some(PanTiltSetting::CENTRE));
}
