use super::Measurement;

/// A potentiometer sampled as a 16-bit ADC value.
pub trait Knob {
    fn read_u16(&mut self) -> u16;
}

/// Per-site correction dialed in with two knobs.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Calibration {
    pub temp_range: f64,
    pub humid_range: f64,
}

impl Calibration {
    pub fn new(temp_range: f64, humid_range: f64) -> Self {
        Self {
            temp_range,
            humid_range,
        }
    }

    /// Knob at mid travel leaves the value untouched; the ends shift it by `-range` and `+range`.
    pub fn shift(raw: u16, range: f64) -> f64 {
        (raw as f64 / u16::MAX as f64 - 0.5) * 2.0 * range
    }

    pub fn apply(&self, measurement: Measurement, temp_knob: u16, humid_knob: u16) -> Measurement {
        Measurement {
            temperature: round2(measurement.temperature + Self::shift(temp_knob, self.temp_range)),
            humidity: round2(measurement.humidity + Self::shift(humid_knob, self.humid_range)),
            pressure: measurement.pressure.map(round2),
        }
    }
}

fn round2(value: f64) -> f64 {
    libm::round(value * 100.0) / 100.0
}
