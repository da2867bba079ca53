use serde::Serialize;
use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use thiserror::Error;
use tokio::sync::{Mutex, MutexGuard};
use tracing::{debug, info, warn};

use crate::driver::{ActuatorDriver, Axis, DriverError, ServoCalibration};
use crate::position::{PanTiltSetting, CENTRE_PERCENT};

#[derive(Debug, Error)]
pub enum MechanismError {
    #[error("actuator failed, holding last confirmed position {retained}")]
    Actuator {
        #[source]
        source: DriverError,
        retained: ConfirmedPosition,
    },
}

/// Per axis, the last percentage the driver acknowledged. An axis stays
/// `None` until its first successful write.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize)]
pub struct ConfirmedPosition {
    pub pan: Option<f64>,
    pub tilt: Option<f64>,
}

impl ConfirmedPosition {
    pub fn on(&self, axis: Axis) -> Option<f64> {
        match axis {
            Axis::Pan => self.pan,
            Axis::Tilt => self.tilt,
        }
    }

    /// The full setting, once both axes are confirmed.
    pub fn setting(&self) -> Option<PanTiltSetting> {
        Some(PanTiltSetting::new(self.pan?, self.tilt?))
    }

    fn with(self, axis: Axis, percent: f64) -> Self {
        match axis {
            Axis::Pan => Self {
                pan: Some(percent),
                ..self
            },
            Axis::Tilt => Self {
                tilt: Some(percent),
                ..self
            },
        }
    }
}

fn write_axis_percent(f: &mut fmt::Formatter<'_>, name: &str, value: Option<f64>) -> fmt::Result {
    match value {
        Some(v) => write!(f, "{name}={v:.1}%"),
        None => write!(f, "{name}=unconfirmed"),
    }
}

impl fmt::Display for ConfirmedPosition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write_axis_percent(f, "Pan", self.pan)?;
        f.write_str(", ")?;
        write_axis_percent(f, "Tilt", self.tilt)
    }
}

/// Sole owner of where the mount is pointing.
///
/// Every physical move goes through [`Mechanism::move_to`] or
/// [`Mechanism::initialize`].
pub struct Mechanism {
    driver: Arc<dyn ActuatorDriver>,
    pan_servo: ServoCalibration,
    tilt_servo: ServoCalibration,
    confirmed: ConfirmedPosition,
    commands: u64,
}

impl Mechanism {
    pub fn new(driver: Arc<dyn ActuatorDriver>) -> Self {
        Self {
            driver,
            pan_servo: ServoCalibration::default(),
            tilt_servo: ServoCalibration::default(),
            confirmed: ConfirmedPosition::default(),
            commands: 0,
        }
    }

    /// Use custom pulse ranges for the two servos.
    pub fn with_calibration(mut self, pan: ServoCalibration, tilt: ServoCalibration) -> Self {
        self.pan_servo = pan;
        self.tilt_servo = tilt;
        self
    }

    /// Drive both axes to the centre of travel.
    ///
    /// Both servos are written even if the mount is believed to be centred
    /// already, since its real position is unknown at startup.
    pub async fn initialize(&mut self) -> Result<(), MechanismError> {
        let centre = PanTiltSetting::CENTRE;
        info!(%centre, "centring mechanism");
        self.write_axis(Axis::Pan, centre).await?;
        self.write_axis(Axis::Tilt, centre).await?;
        Ok(())
    }

    /// Where the mount is pointing. An axis the driver has not confirmed yet
    /// reads as centre, the position [`Mechanism::initialize`] commands.
    pub fn current_position(&self) -> PanTiltSetting {
        PanTiltSetting::new(
            self.confirmed.pan.unwrap_or(CENTRE_PERCENT),
            self.confirmed.tilt.unwrap_or(CENTRE_PERCENT),
        )
    }

    pub fn confirmed(&self) -> ConfirmedPosition {
        self.confirmed
    }

    /// Number of servo writes issued so far.
    pub fn commands_issued(&self) -> u64 {
        self.commands
    }

    /// Move to `target`, writing only the axes that change.
    ///
    /// An axis the driver never confirmed is always written. Returns
    /// `Ok(false)` when no write was needed. On failure only the axes the
    /// driver confirmed are updated.
    pub async fn move_to(&mut self, target: PanTiltSetting) -> Result<bool, MechanismError> {
        let target = PanTiltSetting::new(target.pan(), target.tilt());
        let prior = self.confirmed;
        let pending: Vec<Axis> = [Axis::Pan, Axis::Tilt]
            .into_iter()
            .filter(|&axis| prior.on(axis) != Some(target.on(axis)))
            .collect();
        if pending.is_empty() {
            debug!(%target, "already in position");
            return Ok(false);
        }
        for axis in pending {
            self.write_axis(axis, target).await?;
        }
        info!(%prior, now = %self.confirmed, "mechanism moved");
        Ok(true)
    }

    async fn write_axis(&mut self, axis: Axis, target: PanTiltSetting) -> Result<(), MechanismError> {
        let percent = target.on(axis);
        let pulse = match axis {
            Axis::Pan => self.pan_servo.pulse_for(percent),
            Axis::Tilt => self.tilt_servo.pulse_for(percent),
        };
        self.commands += 1;
        if let Err(source) = self.driver.set_pulse(axis, pulse).await {
            warn!(%axis, pulse, error = %source, "actuator write failed");
            return Err(MechanismError::Actuator {
                source,
                retained: self.confirmed,
            });
        }
        self.confirmed = self.confirmed.with(axis, percent);
        Ok(())
    }
}

/// A [`Mechanism`] behind a single async mutex, shareable between a camera
/// loop, a manual command source and diagnostics.
#[derive(Clone)]
pub struct SharedMechanism {
    inner: Arc<Mutex<Mechanism>>,
    driven: Arc<AtomicBool>,
}

impl SharedMechanism {
    pub fn new(mechanism: Mechanism) -> Self {
        Self {
            inner: Arc::new(Mutex::new(mechanism)),
            driven: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Exclusive access for a read-modify-write cycle.
    pub async fn lock(&self) -> MutexGuard<'_, Mechanism> {
        self.inner.lock().await
    }

    pub async fn current_position(&self) -> PanTiltSetting {
        self.inner.lock().await.current_position()
    }

    pub async fn move_to(&self, target: PanTiltSetting) -> Result<bool, MechanismError> {
        self.inner.lock().await.move_to(target).await
    }

    pub async fn initialize(&self) -> Result<(), MechanismError> {
        self.inner.lock().await.initialize().await
    }

    pub async fn commands_issued(&self) -> u64 {
        self.inner.lock().await.commands_issued()
    }

    /// Reserve the mechanism for one run loop. Returns `None` while another
    /// loop holds it.
    pub fn claim(&self) -> Option<MechanismLease> {
        self.driven
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok()
            .map(|_| MechanismLease {
                driven: self.driven.clone(),
            })
    }

    pub fn is_driven(&self) -> bool {
        self.driven.load(Ordering::Acquire)
    }
}

/// Held by the run loop currently driving a [`SharedMechanism`].
#[derive(Debug)]
pub struct MechanismLease {
    driven: Arc<AtomicBool>,
}

impl Drop for MechanismLease {
    fn drop(&mut self) {
        self.driven.store(false, Ordering::Release);
    }
}
