//! Dashboard resource types.

use chrono::{DateTime, Utc};
use finwatch_auth::deserialize_id;
use serde::{Deserialize, Serialize};

/// Water-quality parameters shared by sensor readings and manual measurements.
///
/// Every parameter is optional: not every sensor node measures all four.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct WaterParameters {
    /// Degrees Celsius
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ph: Option<f64>,
    /// Total dissolved solids, ppm
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tds: Option<f64>,
    /// Dissolved oxygen, mg/L
    #[serde(
        default,
        alias = "do",
        alias = "oxygen",
        skip_serializing_if = "Option::is_none"
    )]
    pub dissolved_oxygen: Option<f64>,
}

impl WaterParameters {
    pub fn is_empty(&self) -> bool {
        self.temperature.is_none()
            && self.ph.is_none()
            && self.tds.is_none()
            && self.dissolved_oxygen.is_none()
    }
}

/// A monitored tank or pond.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Device {
    #[serde(deserialize_with = "deserialize_id")]
    pub id: String,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
}

/// Body of `POST /devices`.
#[derive(Debug, Clone, Serialize)]
pub struct NewDevice {
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

/// Body of `PUT /devices/{id}`. Unset fields are left unchanged.
#[derive(Debug, Clone, Default, Serialize)]
pub struct DeviceUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
}

impl DeviceUpdate {
    pub fn is_empty(&self) -> bool {
        self.name.is_none()
            && self.location.is_none()
            && self.description.is_none()
            && self.status.is_none()
    }
}

/// One sample reported by a device's sensor node.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SensorReading {
    #[serde(deserialize_with = "deserialize_id")]
    pub device_id: String,
    #[serde(alias = "timestamp")]
    pub recorded_at: DateTime<Utc>,
    #[serde(flatten)]
    pub parameters: WaterParameters,
}

/// Filter for `GET /sensors/{device_id}/history`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct HistoryQuery {
    pub from: Option<DateTime<Utc>>,
    pub to: Option<DateTime<Utc>>,
    pub limit: Option<u32>,
}

impl HistoryQuery {
    /// Readings within `window` either side of `at`. A bound that would fall
    /// outside the representable date range is left open.
    pub fn around(at: DateTime<Utc>, window: chrono::Duration) -> Self {
        Self {
            from: at.checked_sub_signed(window),
            to: at.checked_add_signed(window),
            limit: None,
        }
    }
}

/// A measurement taken by hand with a test kit or handheld meter.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ManualMeasurement {
    #[serde(deserialize_with = "deserialize_id")]
    pub id: String,
    #[serde(deserialize_with = "deserialize_id")]
    pub device_id: String,
    #[serde(alias = "timestamp")]
    pub measured_at: DateTime<Utc>,
    #[serde(flatten)]
    pub parameters: WaterParameters,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}

/// Body of `POST /measurements`.
#[derive(Debug, Clone, Serialize)]
pub struct NewManualMeasurement {
    pub device_id: String,
    pub measured_at: DateTime<Utc>,
    #[serde(flatten)]
    pub parameters: WaterParameters,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeedingLog {
    #[serde(deserialize_with = "deserialize_id")]
    pub id: String,
    #[serde(deserialize_with = "deserialize_id")]
    pub device_id: String,
    pub fed_at: DateTime<Utc>,
    pub food_type: String,
    /// Grams
    pub quantity: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct NewFeedingLog {
    pub device_id: String,
    pub fed_at: DateTime<Utc>,
    pub food_type: String,
    pub quantity: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MortalityLog {
    #[serde(deserialize_with = "deserialize_id")]
    pub id: String,
    #[serde(deserialize_with = "deserialize_id")]
    pub device_id: String,
    pub recorded_at: DateTime<Utc>,
    pub count: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cause: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct NewMortalityLog {
    pub device_id: String,
    pub recorded_at: DateTime<Utc>,
    pub count: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cause: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WaterChangeLog {
    #[serde(deserialize_with = "deserialize_id")]
    pub id: String,
    #[serde(deserialize_with = "deserialize_id")]
    pub device_id: String,
    pub changed_at: DateTime<Utc>,
    /// Share of the tank volume replaced, 0-100
    pub volume_percent: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct NewWaterChangeLog {
    pub device_id: String,
    pub changed_at: DateTime<Utc>,
    pub volume_percent: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}
