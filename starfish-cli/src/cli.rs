use anyhow::Context;
use clap::{Parser, Subcommand};
use starfish_core::{Config, WeatherQuery, providers_from_config};
use tokio::net::TcpListener;

/// Top-level CLI struct.
#[derive(Debug, Parser)]
#[command(name = "starfish", version, about = "Postcode geocoding and hourly forecast service")]
pub struct Cli {
    /// Emit logs as JSON lines.
    #[arg(long, global = true)]
    pub json_logs: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Run the HTTP server.
    Serve {
        /// Address to bind, overriding the config file.
        #[arg(long)]
        bind: Option<String>,
    },

    /// Resolve a postcode to coordinates and print them as JSON.
    Coords {
        /// Postcode, e.g. "SW1A 1AA".
        postcode: String,
    },

    /// Fetch the hourly forecast for a location and print it as JSON.
    Weather {
        #[arg(long, allow_hyphen_values = true)]
        latitude: f64,

        #[arg(long, allow_hyphen_values = true)]
        longitude: f64,

        /// Number of forecast days.
        #[arg(long, default_value_t = 7)]
        days: u32,
    },

    /// Inspect or create the config file.
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(Debug, Subcommand)]
pub enum ConfigAction {
    /// Print the config file location.
    Path,
    /// Write a config file with default values.
    Init {
        /// Overwrite an existing file.
        #[arg(long)]
        force: bool,
    },
}

impl Cli {
    pub async fn run(self) -> anyhow::Result<()> {
        match self.command {
            Command::Serve { bind } => {
                let config = Config::load()?;
                let bind = bind.unwrap_or_else(|| config.server.bind.clone());
                let providers = providers_from_config(&config)?;

                let listener = TcpListener::bind(&bind)
                    .await
                    .with_context(|| format!("Failed to bind {bind}"))?;
                starfish_cli::serve(listener, providers).await?;
            }
            Command::Coords { postcode } => {
                let providers = providers_from_config(&Config::load()?)?;
                let coords = providers.coordinates.resolve(&postcode).await?;
                println!("{}", serde_json::to_string_pretty(&coords)?);
            }
            Command::Weather { latitude, longitude, days } => {
                let providers = providers_from_config(&Config::load()?)?;
                let query = WeatherQuery::new(latitude, longitude, days);
                let weather = providers.weather.fetch(&query).await?;
                println!("{}", serde_json::to_string_pretty(&weather)?);
            }
            Command::Config { action } => match action {
                ConfigAction::Path => {
                    println!("{}", Config::config_file_path()?.display());
                }
                ConfigAction::Init { force } => {
                    let path = Config::config_file_path()?;
                    if path.exists() && !force {
                        anyhow::bail!(
                            "Config file already exists: {}\n\
                             Hint: pass --force to overwrite it.",
                            path.display()
                        );
                    }
                    let path = Config::default().save()?;
                    println!("Wrote default configuration to {}", path.display());
                }
            },
        }

        Ok(())
    }
}
