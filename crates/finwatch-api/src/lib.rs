//! Typed client for the FinWatch dashboard resources.
//!
//! Every call goes through [`finwatch_auth::AuthGateway`], so requests carry
//! the stored bearer token and survive a token refresh transparently.
//!
//! Resources:
//! - Devices (tanks and ponds with a sensor node)
//! - Sensor history
//! - Manual measurements, and their comparison against sensor readings
//! - Feeding, mortality and water-change logs

mod client;
mod comparison;
mod error;
mod models;

pub use client::DashboardClient;
pub use comparison::{compare_measurement, MeasurementComparison, Parameter, ParameterDelta};
pub use error::{ApiError, ApiResult};
pub use models::{
    Device, DeviceUpdate, FeedingLog, HistoryQuery, ManualMeasurement, MortalityLog, NewDevice,
    NewFeedingLog, NewManualMeasurement, NewMortalityLog, NewWaterChangeLog, SensorReading,
    WaterChangeLog, WaterParameters,
};
