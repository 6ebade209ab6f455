mod calibration;

pub use calibration::*;

use core::fmt::Debug;

/// One environmental sample. Pressure is `None` on boards without a barometer.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Measurement {
    /// Temperature (℃)
    pub temperature: f64,
    /// Relative humidity (%)
    pub humidity: f64,
    /// Air pressure (hPa)
    pub pressure: Option<f64>,
}

#[allow(async_fn_in_trait)]
pub trait EnvSensor {
    type Error: Debug;

    /// Whether the sensor answers on its bus
    async fn probe(&mut self) -> bool;

    async fn read(&mut self) -> Result<Measurement, Self::Error>;
}

#[allow(async_fn_in_trait)]
pub trait PressureSensor {
    type Error: Debug;

    async fn probe(&mut self) -> bool;

    /// Air pressure (hPa)
    async fn read_pressure(&mut self) -> Result<f64, Self::Error>;
}

/// A temperature/humidity sensor paired with an optional barometer on the same bus.
pub struct WithPressure<E, P> {
    primary: E,
    barometer: Option<P>,
}

impl<E: EnvSensor, P: PressureSensor> WithPressure<E, P> {
    pub fn new(primary: E, barometer: P) -> Self {
        Self {
            primary,
            barometer: Some(barometer),
        }
    }
}

impl<E: EnvSensor, P: PressureSensor> EnvSensor for WithPressure<E, P> {
    type Error = E::Error;

    async fn probe(&mut self) -> bool {
        if let Some(barometer) = self.barometer.as_mut() {
            if !barometer.probe().await {
                log::warn!("Barometer not detected, reporting without pressure");
                self.barometer = None;
            }
        }

        self.primary.probe().await
    }

    async fn read(&mut self) -> Result<Measurement, Self::Error> {
        let mut measurement = self.primary.read().await?;

        if let Some(barometer) = self.barometer.as_mut() {
            match barometer.read_pressure().await {
                Ok(pressure) => measurement.pressure = Some(pressure),
                Err(e) => log::warn!("Pressure read failed: {:?}", e),
            }
        }

        Ok(measurement)
    }
}
