use clap::Parser;
use headline_scrape::batch::pivot;
use headline_scrape::config::ScraperConfig;
use headline_scrape::export::save_workbook;
use headline_scrape::renderers::{Extractor, RenderMode};
use headline_scrape::results::BatchEntry;
use headline_scrape::{Error, server};
use std::fs;
use std::path::Path;
use std::process::ExitCode;

mod args;
use args::{Args, Command};

/// Port used when neither --port nor $PORT is given
const DEFAULT_PORT: u16 = 4000;

#[tokio::main]
async fn main() -> ExitCode {
    // Initialize logging
    env_logger::init();

    let args = Args::parse();

    let config = match load_config(args.config.as_deref()) {
        Ok(config) => config,
        Err(e) => {
            ::log::error!("Failed to load configuration: {}", e);
            return ExitCode::FAILURE;
        }
    };

    let outcome = match args.command {
        Command::Scrape { url, mode } => scrape(&config, &url, mode.map(Into::into)).await,
        Command::Export { input, output } => export(&input, &output),
        Command::Serve { port } => {
            let port = port.or_else(env_port).unwrap_or(DEFAULT_PORT);
            match Extractor::from_config(&config) {
                Ok(extractor) => server::serve(port, extractor).await,
                Err(e) => Err(e),
            }
        }
    };

    match outcome {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            ::log::error!("{}", e);
            eprintln!("{}", serde_json::to_string(&e.to_body()).unwrap_or_else(|_| e.to_string()));
            ExitCode::FAILURE
        }
    }
}

/// Configuration from file (or defaults) with environment overrides applied
fn load_config(path: Option<&Path>) -> Result<ScraperConfig, Error> {
    let config = match path {
        Some(path) => ScraperConfig::from_file(path)?,
        None => ScraperConfig::default(),
    };
    Ok(config.with_env_overrides())
}

fn env_port() -> Option<u16> {
    std::env::var("PORT").ok().and_then(|p| p.parse().ok())
}

async fn scrape(
    config: &ScraperConfig,
    url: &str,
    mode: Option<RenderMode>,
) -> Result<(), Error> {
    let mut extractor = Extractor::from_config(config)?;
    if let Some(mode) = mode {
        extractor = extractor.with_mode(mode);
    }

    let record = extractor.extract(url).await?;
    let json = serde_json::to_string_pretty(&record).map_err(std::io::Error::from)?;
    println!("{}", json);
    Ok(())
}

fn export(input: &Path, output: &Path) -> Result<(), Error> {
    let contents = fs::read_to_string(input)?;
    let batch: Vec<BatchEntry> = serde_json::from_str(&contents)
        .map_err(|e| Error::Validation(format!("{} is not a record list: {}", input.display(), e)))?;

    let grid = pivot(&batch)?;
    save_workbook(&grid, output)?;

    println!("Exported {} records to {}", batch.len(), output.display());
    Ok(())
}
