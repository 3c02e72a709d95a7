//! FinWatch CLI - command-line client for the water-quality monitoring backend.

mod commands;
mod output;

use chrono::{DateTime, Utc};
use clap::{Parser, Subcommand};
use finwatch_api::{
    DeviceUpdate, HistoryQuery, NewDevice, NewFeedingLog, NewMortalityLog, NewWaterChangeLog,
    WaterParameters,
};
use finwatch_auth::Role;
use finwatch_config_and_utils::{init_logging, Config, Paths};
use std::path::PathBuf;
use tracing::debug;

/// FinWatch CLI - Manage devices and water-quality records.
#[derive(Parser)]
#[command(name = "finwatch")]
#[command(about = "FinWatch CLI for the water-quality monitoring dashboard")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Output format (text or json)
    #[arg(short, long, default_value = "text", global = true)]
    format: output::OutputFormat,

    /// Log level (trace, debug, info, warn, error); defaults to the configured level
    #[arg(long, global = true)]
    log_level: Option<String>,

    /// Base directory for configuration and credentials (default ~/.finwatch)
    #[arg(long, env = "FINWATCH_HOME", global = true)]
    base_dir: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// Login with email and password
    Login {
        /// Account email (prompted if omitted)
        #[arg(short, long)]
        email: Option<String>,
        /// Account password (prompted if omitted)
        #[arg(long, env = "FINWATCH_PASSWORD", hide_env_values = true)]
        password: Option<String>,
    },

    /// Logout and clear the local session
    Logout,

    /// Show the local session state
    Status,

    /// Fetch the current user profile
    Whoami {
        /// Fail unless the account holds at least this role (user, admin, superuser)
        #[arg(long)]
        require: Option<Role>,
    },

    /// Manage devices
    Devices {
        #[command(subcommand)]
        command: DeviceCommands,
    },

    /// Show sensor history for a device
    History {
        /// Device ID
        device_id: String,
        /// Start of the range (RFC 3339)
        #[arg(long)]
        from: Option<DateTime<Utc>>,
        /// End of the range (RFC 3339)
        #[arg(long)]
        to: Option<DateTime<Utc>>,
        /// Maximum number of readings
        #[arg(short, long)]
        limit: Option<u32>,
    },

    /// Manage manual measurements
    Measurements {
        #[command(subcommand)]
        command: MeasurementCommands,
    },

    /// Compare a manual measurement with the closest sensor reading
    Compare {
        /// Measurement ID
        measurement_id: String,
        /// Device the measurement belongs to
        #[arg(short, long)]
        device: Option<String>,
        /// Maximum distance to the sensor reading, in minutes
        #[arg(short, long, default_value = "30")]
        window: i64,
    },

    /// Manage feeding logs
    Feedings {
        #[command(subcommand)]
        command: FeedingCommands,
    },

    /// Manage mortality logs
    Mortalities {
        #[command(subcommand)]
        command: MortalityCommands,
    },

    /// Manage water-change logs
    WaterChanges {
        #[command(subcommand)]
        command: WaterChangeCommands,
    },
}

#[derive(Subcommand)]
enum DeviceCommands {
    /// List devices
    List,
    /// Show device details
    Show {
        /// Device ID
        id: String,
    },
    /// Register a device (admin)
    Add {
        /// Display name
        name: String,
        #[arg(short, long)]
        location: Option<String>,
        #[arg(short, long)]
        description: Option<String>,
    },
    /// Update a device (admin)
    Update {
        /// Device ID
        id: String,
        #[arg(short, long)]
        name: Option<String>,
        #[arg(short, long)]
        location: Option<String>,
        #[arg(short, long)]
        description: Option<String>,
        #[arg(short, long)]
        status: Option<String>,
    },
    /// Delete a device (admin)
    Remove {
        /// Device ID
        id: String,
    },
}

/// Water parameters given on the command line.
#[derive(clap::Args)]
struct ParameterArgs {
    /// Temperature in °C
    #[arg(long)]
    temperature: Option<f64>,
    #[arg(long)]
    ph: Option<f64>,
    /// Total dissolved solids in ppm
    #[arg(long)]
    tds: Option<f64>,
    /// Dissolved oxygen in mg/L
    #[arg(long = "do")]
    dissolved_oxygen: Option<f64>,
}

impl From<ParameterArgs> for WaterParameters {
    fn from(args: ParameterArgs) -> Self {
        Self {
            temperature: args.temperature,
            ph: args.ph,
            tds: args.tds,
            dissolved_oxygen: args.dissolved_oxygen,
        }
    }
}

#[derive(Subcommand)]
enum MeasurementCommands {
    /// List measurements
    List {
        #[arg(short, long)]
        device: Option<String>,
    },
    /// Record a manual measurement
    Add {
        /// Device ID
        device_id: String,
        #[command(flatten)]
        parameters: ParameterArgs,
        /// When the sample was taken (RFC 3339, default now)
        #[arg(long)]
        at: Option<DateTime<Utc>>,
        #[arg(long)]
        notes: Option<String>,
    },
}

#[derive(Subcommand)]
enum FeedingCommands {
    /// List feedings
    List {
        #[arg(short, long)]
        device: Option<String>,
    },
    /// Record a feeding
    Add {
        /// Device ID
        device_id: String,
        /// Food type
        food_type: String,
        /// Quantity in grams
        quantity: f64,
        #[arg(long)]
        at: Option<DateTime<Utc>>,
        #[arg(long)]
        notes: Option<String>,
    },
}

#[derive(Subcommand)]
enum MortalityCommands {
    /// List mortalities
    List {
        #[arg(short, long)]
        device: Option<String>,
    },
    /// Record deaths
    Add {
        /// Device ID
        device_id: String,
        /// Number of fish
        count: u32,
        #[arg(long)]
        cause: Option<String>,
        #[arg(long)]
        at: Option<DateTime<Utc>>,
        #[arg(long)]
        notes: Option<String>,
    },
}

#[derive(Subcommand)]
enum WaterChangeCommands {
    /// List water changes
    List {
        #[arg(short, long)]
        device: Option<String>,
    },
    /// Record a water change
    Add {
        /// Device ID
        device_id: String,
        /// Share of the volume replaced, in percent
        volume_percent: f64,
        #[arg(long)]
        at: Option<DateTime<Utc>>,
        #[arg(long)]
        notes: Option<String>,
    },
}

async fn run(cli: Cli, paths: Paths, config: Config) -> anyhow::Result<()> {
    let mut ctx = commands::Context::new(paths, config, cli.format)?;

    let result = match cli.command {
        Commands::Login { email, password } => commands::login(&ctx, email, password).await,
        Commands::Logout => commands::logout(&ctx).await,
        Commands::Status => commands::status(&ctx).await,
        Commands::Whoami { require } => commands::whoami(&ctx, require).await,
        Commands::Devices { command } => match command {
            DeviceCommands::List => commands::devices_list(&ctx).await,
            DeviceCommands::Show { id } => commands::devices_show(&ctx, &id).await,
            DeviceCommands::Add {
                name,
                location,
                description,
            } => {
                let device = NewDevice {
                    name,
                    location,
                    description,
                };
                commands::devices_add(&ctx, device).await
            }
            DeviceCommands::Update {
                id,
                name,
                location,
                description,
                status,
            } => {
                let update = DeviceUpdate {
                    name,
                    location,
                    description,
                    status,
                };
                commands::devices_update(&ctx, &id, update).await
            }
            DeviceCommands::Remove { id } => commands::devices_remove(&ctx, &id).await,
        },
        Commands::History {
            device_id,
            from,
            to,
            limit,
        } => {
            let query = HistoryQuery { from, to, limit };
            commands::history(&ctx, &device_id, query).await
        }
        Commands::Measurements { command } => match command {
            MeasurementCommands::List { device } => {
                commands::measurements_list(&ctx, device.as_deref()).await
            }
            MeasurementCommands::Add {
                device_id,
                parameters,
                at,
                notes,
            } => commands::measurements_add(&ctx, device_id, at, parameters.into(), notes).await,
        },
        Commands::Compare {
            measurement_id,
            device,
            window,
        } => commands::compare(&ctx, &measurement_id, device.as_deref(), window).await,
        Commands::Feedings { command } => match command {
            FeedingCommands::List { device } => {
                commands::feedings_list(&ctx, device.as_deref()).await
            }
            FeedingCommands::Add {
                device_id,
                food_type,
                quantity,
                at,
                notes,
            } => {
                let feeding = NewFeedingLog {
                    device_id,
                    fed_at: at.unwrap_or_else(Utc::now),
                    food_type,
                    quantity,
                    notes,
                };
                commands::feedings_add(&ctx, feeding).await
            }
        },
        Commands::Mortalities { command } => match command {
            MortalityCommands::List { device } => {
                commands::mortalities_list(&ctx, device.as_deref()).await
            }
            MortalityCommands::Add {
                device_id,
                count,
                cause,
                at,
                notes,
            } => {
                let mortality = NewMortalityLog {
                    device_id,
                    recorded_at: at.unwrap_or_else(Utc::now),
                    count,
                    cause,
                    notes,
                };
                commands::mortalities_add(&ctx, mortality).await
            }
        },
        Commands::WaterChanges { command } => match command {
            WaterChangeCommands::List { device } => {
                commands::water_changes_list(&ctx, device.as_deref()).await
            }
            WaterChangeCommands::Add {
                device_id,
                volume_percent,
                at,
                notes,
            } => {
                let change = NewWaterChangeLog {
                    device_id,
                    changed_at: at.unwrap_or_else(Utc::now),
                    volume_percent,
                    notes,
                };
                commands::water_changes_add(&ctx, change).await
            }
        },
    };

    ctx.report_session_events();
    result
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    let format = cli.format;

    let paths = match cli.base_dir.clone() {
        Some(dir) => Paths::with_base_dir(dir),
        None => match Paths::new() {
            Ok(paths) => paths,
            Err(e) => {
                output::print_error(&e.to_string(), &format);
                std::process::exit(1);
            }
        },
    };

    let config = match Config::load(&paths) {
        Ok(config) => config,
        Err(e) => {
            output::print_error(&format!("Failed to load configuration: {}", e), &format);
            std::process::exit(1);
        }
    };

    let log_level = cli.log_level.clone().unwrap_or_else(|| config.log_level.clone());
    init_logging(&log_level, Some(&paths));
    debug!(api_url = %config.api_url, base_dir = %paths.base_dir().display(), "Starting finwatch");

    if let Err(e) = run(cli, paths, config).await {
        output::print_error(&e.to_string(), &format);
        if let Some(hint) = commands::error_hint(&e) {
            if format == output::OutputFormat::Text {
                eprintln!("{}", hint);
            }
        }
        std::process::exit(1);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_measurement_add() {
        let cli = Cli::try_parse_from([
            "finwatch",
            "--format",
            "json",
            "measurements",
            "add",
            "tank-1",
            "--ph",
            "7.2",
            "--do",
            "6.1",
            "--at",
            "2026-03-01T08:00:00Z",
        ])
        .unwrap();

        assert_eq!(cli.format, output::OutputFormat::Json);
        match cli.command {
            Commands::Measurements {
                command:
                    MeasurementCommands::Add {
                        device_id,
                        parameters,
                        at,
                        ..
                    },
            } => {
                assert_eq!(device_id, "tank-1");
                let parameters = WaterParameters::from(parameters);
                assert_eq!(parameters.ph, Some(7.2));
                assert_eq!(parameters.dissolved_oxygen, Some(6.1));
                assert_eq!(parameters.temperature, None);
                assert_eq!(at.unwrap().to_rfc3339(), "2026-03-01T08:00:00+00:00");
            }
            _ => panic!("expected measurements add"),
        }
    }

    #[test]
    fn test_parse_whoami_role() {
        let cli = Cli::try_parse_from(["finwatch", "whoami", "--require", "admin"]).unwrap();
        assert!(matches!(
            cli.command,
            Commands::Whoami {
                require: Some(Role::Admin)
            }
        ));

        assert!(Cli::try_parse_from(["finwatch", "whoami", "--require", "owner"]).is_err());
    }

    #[test]
    fn test_parse_water_changes_subcommand_name() {
        let cli = Cli::try_parse_from(["finwatch", "water-changes", "list", "-d", "3"]).unwrap();
        assert!(matches!(
            cli.command,
            Commands::WaterChanges {
                command: WaterChangeCommands::List { device: Some(_) }
            }
        ));
    }
}
