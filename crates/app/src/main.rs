//! Routediff binary.

use std::process::ExitCode;

use clap::Parser;
use routediff::Args;
use routediff_infrastructure::SettingsLoader;
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

async fn run(args: Args) -> Result<u8, Box<dyn std::error::Error>> {
    let settings = SettingsLoader::from_env().load()?;
    let scenario_file = args
        .scenario_file
        .unwrap_or_else(|| settings.scenario_file.clone());

    tracing::info!(
        "Starting routediff v{} with {}",
        env!("CARGO_PKG_VERSION"),
        scenario_file.display()
    );

    let report = routediff::run_scenario_file(&settings, &scenario_file).await?;
    println!("{}", routediff::render_report(&report, args.show_bodies));
    Ok(routediff::exit_code(&report))
}

#[tokio::main]
async fn main() -> ExitCode {
    let args = Args::parse();

    // Initialize tracing
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with(tracing_subscriber::fmt::layer())
        .init();

    match run(args).await {
        Ok(code) => ExitCode::from(code),
        Err(err) => {
            tracing::error!("{err}");
            ExitCode::from(routediff::STARTUP_FAILURE_EXIT)
        }
    }
}
