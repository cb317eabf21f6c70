pub mod types;
pub mod error;
pub mod config;
pub mod data;
pub mod topology;
pub mod scale;
pub mod legend;
pub mod tooltip;
pub mod render;
pub mod server;

use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use tracing::{error, info};

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Fetch the datasets and write the choropleth page
    Generate {
        #[arg(short, long, value_name = "FILE", default_value = "config.toml")]
        config: PathBuf,
    },
    /// Serve the rendered map with county lookup endpoints
    Serve {
        #[arg(short, long, value_name = "FILE", default_value = "config.toml")]
        config: PathBuf,
    },
    /// Print the color scale thresholds
    Scale {
        #[arg(short, long, value_name = "FILE", default_value = "config.toml")]
        config: PathBuf,
    },
}

fn load_config(path: &Path) -> anyhow::Result<config::AppConfig> {
    if path.exists() {
        config::AppConfig::load_from_file(path)
    } else {
        info!("No config at {:?}, using defaults", path);
        Ok(config::AppConfig::default())
    }
}

async fn run(cli: Cli) -> anyhow::Result<()> {
    match &cli.command {
        Commands::Generate { config } => {
            info!("Generating map with config: {:?}", config);
            let app_config = load_config(config)?;

            let map_data = data::load_data(&app_config.input).await?;
            render::generate_page(&app_config, &map_data)?;

            info!("Generation complete!");
        }
        Commands::Serve { config } => {
            info!("Serving map with config: {:?}", config);
            let app_config = load_config(config)?;

            let map_data = data::load_data(&app_config.input).await?;
            server::start_server(app_config, map_data).await?;
        }
        Commands::Scale { config } => {
            let app_config = load_config(config)?;
            let map_data = data::load_data(&app_config.input).await?;
            let scale = &map_data.scale;

            println!("min {}  max {}", scale.min(), scale.max());
            let legend = legend::Legend::new(scale, &app_config.layout.legend);
            println!("{:>8}  {}", "below", scale.color(f64::NEG_INFINITY));
            for (tick, edge) in legend.ticks().iter().zip(scale.boundaries()) {
                println!("{:>8}  {}", format!(">= {}", tick.label), scale.color(*edge));
            }
        }
    }

    Ok(())
}

/// Logs a failed run once and maps it to the process exit status.
fn exit_status(result: &anyhow::Result<()>) -> u8 {
    match result {
        Ok(()) => 0,
        Err(e) => {
            // Load failures leave nothing rendered
            error!("An error occurred: {:#}", e);
            1
        }
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    tracing_subscriber::fmt::init();

    let cli = Cli::parse();

    ExitCode::from(exit_status(&run(cli).await))
}
