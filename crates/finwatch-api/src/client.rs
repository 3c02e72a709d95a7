//! Dashboard REST client.

use crate::comparison::{compare_measurement, MeasurementComparison};
use crate::error::{ApiError, ApiResult};
use crate::models::{
    Device, DeviceUpdate, FeedingLog, HistoryQuery, ManualMeasurement, MortalityLog, NewDevice,
    NewFeedingLog, NewManualMeasurement, NewMortalityLog, NewWaterChangeLog, SensorReading,
    WaterChangeLog,
};
use chrono::SecondsFormat;
use finwatch_auth::{error_message, ApiRequest, AuthGateway, Envelope};
use reqwest::Response;
use serde::de::DeserializeOwned;
use std::sync::Arc;
use tracing::{debug, error};

/// Client for the dashboard resources, on top of an [`AuthGateway`].
#[derive(Clone)]
pub struct DashboardClient {
    gateway: Arc<AuthGateway>,
}

impl DashboardClient {
    pub fn new(gateway: Arc<AuthGateway>) -> Self {
        Self { gateway }
    }

    pub fn gateway(&self) -> &AuthGateway {
        &self.gateway
    }

    /// Send `request` and decode the `data` envelope.
    async fn fetch<T: DeserializeOwned>(&self, request: ApiRequest) -> ApiResult<T> {
        let response = self.execute(request).await?;
        let envelope: Envelope<T> = response.json().await?;
        Ok(envelope.data)
    }

    /// Send `request`, mapping non-success statuses to [`ApiError::Status`].
    async fn execute(&self, request: ApiRequest) -> ApiResult<Response> {
        let method = request.method().clone();
        let path = request.path().to_string();
        let response = self.gateway.send(request).await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            let message = error_message(&body);
            error!(method = %method, path = %path, status = %status, "Dashboard request failed");
            return Err(ApiError::Status {
                status: status.as_u16(),
                message,
            });
        }

        debug!(method = %method, path = %path, status = %status, "Dashboard request succeeded");
        Ok(response)
    }

    // Devices

    pub async fn list_devices(&self) -> ApiResult<Vec<Device>> {
        self.fetch(ApiRequest::get("/devices")).await
    }

    pub async fn get_device(&self, id: &str) -> ApiResult<Device> {
        let path = format!("/devices/{}", path_segment(id)?);
        self.fetch(ApiRequest::get(path)).await
    }

    pub async fn create_device(&self, device: &NewDevice) -> ApiResult<Device> {
        if device.name.trim().is_empty() {
            return Err(ApiError::InvalidInput("device name is empty".to_string()));
        }
        self.fetch(ApiRequest::post("/devices").json(device)?).await
    }

    pub async fn update_device(&self, id: &str, update: &DeviceUpdate) -> ApiResult<Device> {
        if update.is_empty() {
            return Err(ApiError::InvalidInput("nothing to update".to_string()));
        }
        let path = format!("/devices/{}", path_segment(id)?);
        self.fetch(ApiRequest::put(path).json(update)?).await
    }

    pub async fn delete_device(&self, id: &str) -> ApiResult<()> {
        let path = format!("/devices/{}", path_segment(id)?);
        self.execute(ApiRequest::delete(path)).await?;
        Ok(())
    }

    // Sensor history

    pub async fn sensor_history(
        &self,
        device_id: &str,
        query: &HistoryQuery,
    ) -> ApiResult<Vec<SensorReading>> {
        if let (Some(from), Some(to)) = (query.from, query.to) {
            if from > to {
                return Err(ApiError::InvalidInput(format!(
                    "history range starts after it ends ({} > {})",
                    from, to
                )));
            }
        }

        let path = format!("/sensors/{}/history", path_segment(device_id)?);
        let request = ApiRequest::get(path)
            .query_opt("from", query.from.map(|t| t.to_rfc3339_opts(SecondsFormat::Secs, true)))
            .query_opt("to", query.to.map(|t| t.to_rfc3339_opts(SecondsFormat::Secs, true)))
            .query_opt("limit", query.limit);
        self.fetch(request).await
    }

    // Manual measurements

    pub async fn list_measurements(
        &self,
        device_id: Option<&str>,
    ) -> ApiResult<Vec<ManualMeasurement>> {
        self.fetch(ApiRequest::get("/measurements").query_opt("device_id", device_id))
            .await
    }

    pub async fn create_measurement(
        &self,
        measurement: &NewManualMeasurement,
    ) -> ApiResult<ManualMeasurement> {
        if measurement.parameters.is_empty() {
            return Err(ApiError::InvalidInput(
                "measurement has no parameter values".to_string(),
            ));
        }
        self.fetch(ApiRequest::post("/measurements").json(measurement)?)
            .await
    }

    /// Fetch sensor history around `measurement` and compare against the
    /// closest reading within `window`.
    pub async fn compare_with_sensors(
        &self,
        measurement: &ManualMeasurement,
        window: chrono::Duration,
    ) -> ApiResult<Option<MeasurementComparison>> {
        let query = HistoryQuery::around(measurement.measured_at, window);
        let readings = self.sensor_history(&measurement.device_id, &query).await?;
        debug!(
            measurement_id = %measurement.id,
            readings = readings.len(),
            "Comparing manual measurement against sensor history"
        );
        Ok(compare_measurement(measurement, &readings, window))
    }

    // Logs

    pub async fn list_feedings(&self, device_id: Option<&str>) -> ApiResult<Vec<FeedingLog>> {
        self.fetch(ApiRequest::get("/feedings").query_opt("device_id", device_id))
            .await
    }

    pub async fn create_feeding(&self, feeding: &NewFeedingLog) -> ApiResult<FeedingLog> {
        if feeding.quantity.is_nan() || feeding.quantity <= 0.0 {
            return Err(ApiError::InvalidInput(
                "feeding quantity must be positive".to_string(),
            ));
        }
        self.fetch(ApiRequest::post("/feedings").json(feeding)?).await
    }

    pub async fn list_mortalities(&self, device_id: Option<&str>) -> ApiResult<Vec<MortalityLog>> {
        self.fetch(ApiRequest::get("/mortalities").query_opt("device_id", device_id))
            .await
    }

    pub async fn create_mortality(&self, mortality: &NewMortalityLog) -> ApiResult<MortalityLog> {
        if mortality.count == 0 {
            return Err(ApiError::InvalidInput(
                "mortality count must be at least 1".to_string(),
            ));
        }
        self.fetch(ApiRequest::post("/mortalities").json(mortality)?)
            .await
    }

    pub async fn list_water_changes(
        &self,
        device_id: Option<&str>,
    ) -> ApiResult<Vec<WaterChangeLog>> {
        self.fetch(ApiRequest::get("/water-changes").query_opt("device_id", device_id))
            .await
    }

    pub async fn create_water_change(
        &self,
        change: &NewWaterChangeLog,
    ) -> ApiResult<WaterChangeLog> {
        if change.volume_percent.is_nan()
            || change.volume_percent <= 0.0
            || change.volume_percent > 100.0
        {
            return Err(ApiError::InvalidInput(format!(
                "water change volume must be within (0, 100], got {}",
                change.volume_percent
            )));
        }
        self.fetch(ApiRequest::post("/water-changes").json(change)?)
            .await
    }
}

/// Validate an identifier used as a single path segment. Dot segments and
/// anything URL normalisation could turn into one are refused, so an id can
/// never address a parent resource.
fn path_segment(id: &str) -> ApiResult<&str> {
    let id = id.trim();
    if id.is_empty() || id == "." || id == ".." || id.contains(['/', '\\', '?', '#', '%']) {
        return Err(ApiError::InvalidInput(format!("invalid identifier: {:?}", id)));
    }
    Ok(id)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_path_segment_validation() {
        assert_eq!(path_segment(" tank-1 ").unwrap(), "tank-1");
        assert!(matches!(path_segment(""), Err(ApiError::InvalidInput(_))));
        assert!(matches!(path_segment("a/b"), Err(ApiError::InvalidInput(_))));
        assert!(matches!(path_segment("a?x=1"), Err(ApiError::InvalidInput(_))));
        for dotted in [".", "..", " .. ", "%2e%2e", "a\\b"] {
            assert!(
                matches!(path_segment(dotted), Err(ApiError::InvalidInput(_))),
                "{:?} accepted",
                dotted
            );
        }
        assert_eq!(path_segment("...").unwrap(), "...");
    }
}
