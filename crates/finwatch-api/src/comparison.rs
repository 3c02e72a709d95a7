//! Manual measurement vs. sensor reading comparison.

use crate::{ManualMeasurement, SensorReading, WaterParameters};
use chrono::{DateTime, Duration, Utc};
use serde::Serialize;
use std::fmt;

/// A water-quality parameter reported by both sensors and manual kits.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Parameter {
    Temperature,
    Ph,
    Tds,
    DissolvedOxygen,
}

impl Parameter {
    pub const ALL: [Parameter; 4] = [
        Parameter::Temperature,
        Parameter::Ph,
        Parameter::Tds,
        Parameter::DissolvedOxygen,
    ];

    pub fn label(self) -> &'static str {
        match self {
            Parameter::Temperature => "Temperature",
            Parameter::Ph => "pH",
            Parameter::Tds => "TDS",
            Parameter::DissolvedOxygen => "Dissolved oxygen",
        }
    }

    pub fn unit(self) -> &'static str {
        match self {
            Parameter::Temperature => "°C",
            Parameter::Ph => "",
            Parameter::Tds => "ppm",
            Parameter::DissolvedOxygen => "mg/L",
        }
    }

    fn value(self, parameters: &WaterParameters) -> Option<f64> {
        match self {
            Parameter::Temperature => parameters.temperature,
            Parameter::Ph => parameters.ph,
            Parameter::Tds => parameters.tds,
            Parameter::DissolvedOxygen => parameters.dissolved_oxygen,
        }
    }
}

impl fmt::Display for Parameter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Difference for one parameter. `delta` is manual minus sensor.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ParameterDelta {
    pub parameter: Parameter,
    pub manual: f64,
    pub sensor: f64,
    pub delta: f64,
}

/// A manual measurement paired with the nearest sensor reading.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MeasurementComparison {
    pub measurement_id: String,
    pub device_id: String,
    pub measured_at: DateTime<Utc>,
    pub reading_at: DateTime<Utc>,
    /// Reading time minus measurement time, in seconds.
    pub offset_seconds: i64,
    /// Only parameters present on both sides.
    pub deltas: Vec<ParameterDelta>,
}

impl MeasurementComparison {
    pub fn delta(&self, parameter: Parameter) -> Option<&ParameterDelta> {
        self.deltas.iter().find(|d| d.parameter == parameter)
    }
}

/// Pair `manual` with the reading of the same device closest in time, at
/// most `window` away, and compute per-parameter deltas.
///
/// Returns `None` when no reading falls inside the window. On equal
/// distance the earlier reading wins.
pub fn compare_measurement(
    manual: &ManualMeasurement,
    readings: &[SensorReading],
    window: Duration,
) -> Option<MeasurementComparison> {
    let closest = readings
        .iter()
        .filter(|r| r.device_id == manual.device_id)
        .map(|r| ((r.recorded_at - manual.measured_at).abs(), r))
        .filter(|(distance, _)| *distance <= window)
        .min_by_key(|(distance, r)| (*distance, r.recorded_at))
        .map(|(_, r)| r)?;

    let deltas = Parameter::ALL
        .iter()
        .filter_map(|&parameter| {
            let manual_value = parameter.value(&manual.parameters)?;
            let sensor_value = parameter.value(&closest.parameters)?;
            Some(ParameterDelta {
                parameter,
                manual: manual_value,
                sensor: sensor_value,
                delta: manual_value - sensor_value,
            })
        })
        .collect();

    Some(MeasurementComparison {
        measurement_id: manual.id.clone(),
        device_id: manual.device_id.clone(),
        measured_at: manual.measured_at,
        reading_at: closest.recorded_at,
        offset_seconds: (closest.recorded_at - manual.measured_at).num_seconds(),
        deltas,
    })
}
