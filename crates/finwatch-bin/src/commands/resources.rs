//! Dashboard resource commands.

use super::Context;
use crate::output::{self, cell, OutputFormat};
use anyhow::{Context as _, Result};
use chrono::{DateTime, Duration, Utc};
use finwatch_api::{
    DeviceUpdate, HistoryQuery, NewDevice, NewFeedingLog, NewManualMeasurement, NewMortalityLog,
    NewWaterChangeLog, WaterParameters,
};
use finwatch_auth::Role;

fn text_or<'a>(value: Option<&'a str>, fallback: &'a str) -> &'a str {
    value.unwrap_or(fallback)
}

// Devices

pub async fn devices_list(ctx: &Context) -> Result<()> {
    let devices = ctx.client.list_devices().await?;

    match ctx.format {
        OutputFormat::Text => {
            if devices.is_empty() {
                println!("No devices found");
                return Ok(());
            }
            println!("{:<12} {:<28} {:<20} {}", "ID", "Name", "Location", "Status");
            output::print_divider(80);
            for device in &devices {
                println!(
                    "{:<12} {:<28} {:<20} {}",
                    device.id,
                    device.name,
                    text_or(device.location.as_deref(), "-"),
                    text_or(device.status.as_deref(), "-"),
                );
            }
        }
        OutputFormat::Json => output::print_json(&devices)?,
    }

    Ok(())
}

pub async fn devices_show(ctx: &Context, id: &str) -> Result<()> {
    let device = ctx.client.get_device(id).await?;

    match ctx.format {
        OutputFormat::Text => {
            output::print_heading(&device.name);
            output::print_row("ID", &device.id);
            output::print_row("Location", text_or(device.location.as_deref(), "-"));
            output::print_row("Status", text_or(device.status.as_deref(), "-"));
            output::print_row("Description", text_or(device.description.as_deref(), "-"));
            if let Some(created_at) = device.created_at {
                output::print_row("Created", &created_at.to_rfc3339());
            }
        }
        OutputFormat::Json => output::print_json(&device)?,
    }

    Ok(())
}

/// Register a device. Requires the admin role.
pub async fn devices_add(ctx: &Context, device: NewDevice) -> Result<()> {
    ctx.gateway().require_role(Role::Admin)?;
    let created = ctx.client.create_device(&device).await?;

    match ctx.format {
        OutputFormat::Text => println!("Device {} created with ID {}", created.name, created.id),
        OutputFormat::Json => output::print_json(&created)?,
    }

    Ok(())
}

/// Update a device. Requires the admin role.
pub async fn devices_update(ctx: &Context, id: &str, update: DeviceUpdate) -> Result<()> {
    ctx.gateway().require_role(Role::Admin)?;
    let updated = ctx.client.update_device(id, &update).await?;

    match ctx.format {
        OutputFormat::Text => println!("Device {} updated", updated.id),
        OutputFormat::Json => output::print_json(&updated)?,
    }

    Ok(())
}

/// Delete a device. Requires the admin role.
pub async fn devices_remove(ctx: &Context, id: &str) -> Result<()> {
    ctx.gateway().require_role(Role::Admin)?;
    ctx.client.delete_device(id).await?;
    output::print_success(&format!("Device {} removed", id), &ctx.format);
    Ok(())
}

// Sensor history

pub async fn history(ctx: &Context, device_id: &str, query: HistoryQuery) -> Result<()> {
    let readings = ctx.client.sensor_history(device_id, &query).await?;

    match ctx.format {
        OutputFormat::Text => {
            if readings.is_empty() {
                println!("No sensor readings in range");
                return Ok(());
            }
            println!(
                "{:<26} {:>10} {:>8} {:>10} {:>10}",
                "Recorded", "Temp °C", "pH", "TDS ppm", "DO mg/L"
            );
            output::print_divider(68);
            for reading in &readings {
                let p = &reading.parameters;
                println!(
                    "{:<26} {:>10} {:>8} {:>10} {:>10}",
                    reading.recorded_at.to_rfc3339(),
                    cell(p.temperature),
                    cell(p.ph),
                    cell(p.tds),
                    cell(p.dissolved_oxygen),
                );
            }
        }
        OutputFormat::Json => output::print_json(&readings)?,
    }

    Ok(())
}

// Manual measurements

pub async fn measurements_list(ctx: &Context, device_id: Option<&str>) -> Result<()> {
    let measurements = ctx.client.list_measurements(device_id).await?;

    match ctx.format {
        OutputFormat::Text => {
            if measurements.is_empty() {
                println!("No measurements found");
                return Ok(());
            }
            println!(
                "{:<10} {:<10} {:<26} {:>8} {:>6} {:>8} {:>8}",
                "ID", "Device", "Measured", "Temp", "pH", "TDS", "DO"
            );
            output::print_divider(84);
            for m in &measurements {
                let p = &m.parameters;
                println!(
                    "{:<10} {:<10} {:<26} {:>8} {:>6} {:>8} {:>8}",
                    m.id,
                    m.device_id,
                    m.measured_at.to_rfc3339(),
                    cell(p.temperature),
                    cell(p.ph),
                    cell(p.tds),
                    cell(p.dissolved_oxygen),
                );
            }
        }
        OutputFormat::Json => output::print_json(&measurements)?,
    }

    Ok(())
}

pub async fn measurements_add(
    ctx: &Context,
    device_id: String,
    measured_at: Option<DateTime<Utc>>,
    parameters: WaterParameters,
    notes: Option<String>,
) -> Result<()> {
    let measurement = NewManualMeasurement {
        device_id,
        measured_at: measured_at.unwrap_or_else(Utc::now),
        parameters,
        notes,
    };
    let created = ctx.client.create_measurement(&measurement).await?;

    match ctx.format {
        OutputFormat::Text => println!("Measurement {} recorded", created.id),
        OutputFormat::Json => output::print_json(&created)?,
    }

    Ok(())
}

/// Compare a manual measurement with the closest sensor reading.
pub async fn compare(
    ctx: &Context,
    measurement_id: &str,
    device_id: Option<&str>,
    window_minutes: i64,
) -> Result<()> {
    let window = Duration::try_minutes(window_minutes)
        .filter(|w| *w > Duration::zero())
        .context("window must be a positive number of minutes")?;

    let measurement = ctx
        .client
        .list_measurements(device_id)
        .await?
        .into_iter()
        .find(|m| m.id == measurement_id)
        .with_context(|| format!("measurement {} not found", measurement_id))?;

    let comparison = ctx.client.compare_with_sensors(&measurement, window).await?;

    match (ctx.format, comparison) {
        (OutputFormat::Json, comparison) => output::print_json(&comparison)?,
        (OutputFormat::Text, None) => println!(
            "No sensor reading within {} minutes of {}",
            window_minutes,
            measurement.measured_at.to_rfc3339()
        ),
        (OutputFormat::Text, Some(comparison)) => {
            output::print_heading(&format!("Measurement {}", comparison.measurement_id));
            output::print_row("Device", &comparison.device_id);
            output::print_row("Measured", &comparison.measured_at.to_rfc3339());
            output::print_row(
                "Sensor reading",
                &format!(
                    "{} ({:+}s)",
                    comparison.reading_at.to_rfc3339(),
                    comparison.offset_seconds
                ),
            );
            println!();
            println!(
                "{:<18} {:>10} {:>10} {:>10}",
                "Parameter", "Manual", "Sensor", "Delta"
            );
            output::print_divider(52);
            for delta in &comparison.deltas {
                let label = match delta.parameter.unit() {
                    "" => delta.parameter.label().to_string(),
                    unit => format!("{} ({})", delta.parameter.label(), unit),
                };
                println!(
                    "{:<18} {:>10.2} {:>10.2} {:>+10.2}",
                    label, delta.manual, delta.sensor, delta.delta
                );
            }
            if comparison.deltas.is_empty() {
                println!("No parameters in common");
            }
        }
    }

    Ok(())
}

// Logs

pub async fn feedings_list(ctx: &Context, device_id: Option<&str>) -> Result<()> {
    let feedings = ctx.client.list_feedings(device_id).await?;

    match ctx.format {
        OutputFormat::Text => {
            if feedings.is_empty() {
                println!("No feedings found");
                return Ok(());
            }
            println!(
                "{:<10} {:<10} {:<26} {:<16} {:>10}",
                "ID", "Device", "Fed", "Food", "Grams"
            );
            output::print_divider(76);
            for f in &feedings {
                println!(
                    "{:<10} {:<10} {:<26} {:<16} {:>10.1}",
                    f.id,
                    f.device_id,
                    f.fed_at.to_rfc3339(),
                    f.food_type,
                    f.quantity
                );
            }
        }
        OutputFormat::Json => output::print_json(&feedings)?,
    }

    Ok(())
}

pub async fn feedings_add(ctx: &Context, feeding: NewFeedingLog) -> Result<()> {
    let created = ctx.client.create_feeding(&feeding).await?;

    match ctx.format {
        OutputFormat::Text => println!("Feeding {} recorded", created.id),
        OutputFormat::Json => output::print_json(&created)?,
    }

    Ok(())
}

pub async fn mortalities_list(ctx: &Context, device_id: Option<&str>) -> Result<()> {
    let mortalities = ctx.client.list_mortalities(device_id).await?;

    match ctx.format {
        OutputFormat::Text => {
            if mortalities.is_empty() {
                println!("No mortalities recorded");
                return Ok(());
            }
            println!(
                "{:<10} {:<10} {:<26} {:>6} {}",
                "ID", "Device", "Recorded", "Count", "Cause"
            );
            output::print_divider(76);
            for m in &mortalities {
                println!(
                    "{:<10} {:<10} {:<26} {:>6} {}",
                    m.id,
                    m.device_id,
                    m.recorded_at.to_rfc3339(),
                    m.count,
                    text_or(m.cause.as_deref(), "-")
                );
            }
        }
        OutputFormat::Json => output::print_json(&mortalities)?,
    }

    Ok(())
}

pub async fn mortalities_add(ctx: &Context, mortality: NewMortalityLog) -> Result<()> {
    let created = ctx.client.create_mortality(&mortality).await?;

    match ctx.format {
        OutputFormat::Text => println!("Mortality {} recorded", created.id),
        OutputFormat::Json => output::print_json(&created)?,
    }

    Ok(())
}

pub async fn water_changes_list(ctx: &Context, device_id: Option<&str>) -> Result<()> {
    let changes = ctx.client.list_water_changes(device_id).await?;

    match ctx.format {
        OutputFormat::Text => {
            if changes.is_empty() {
                println!("No water changes recorded");
                return Ok(());
            }
            println!(
                "{:<10} {:<10} {:<26} {:>8} {}",
                "ID", "Device", "Changed", "Volume", "Notes"
            );
            output::print_divider(76);
            for c in &changes {
                println!(
                    "{:<10} {:<10} {:<26} {:>7.0}% {}",
                    c.id,
                    c.device_id,
                    c.changed_at.to_rfc3339(),
                    c.volume_percent,
                    text_or(c.notes.as_deref(), "")
                );
            }
        }
        OutputFormat::Json => output::print_json(&changes)?,
    }

    Ok(())
}

pub async fn water_changes_add(ctx: &Context, change: NewWaterChangeLog) -> Result<()> {
    let created = ctx.client.create_water_change(&change).await?;

    match ctx.format {
        OutputFormat::Text => println!("Water change {} recorded", created.id),
        OutputFormat::Json => output::print_json(&created)?,
    }

    Ok(())
}
