//! Command-line extinction lookup for the Magellanic Clouds
//!
//! Queries the Zaritsky & Harris dust extinction maps and prints the mean Av and
//! its standard deviation for the stars around a position.
//!
//! ```text
//! get_extinction --galaxy LMC --ra 5.27 --dec -69.5 --radius 5 --teff cool
//! ```

use clap::Parser;
use mc_extinction::{ErrorKind, ExtinctionClient, LookupConfig};
use std::path::PathBuf;
use std::process::ExitCode;

#[derive(Parser, Debug)]
#[command(
    name = "get_extinction",
    about = "Query Harris & Zaritsky dust extinction maps for LMC/SMC. Returns Av and standard deviation.",
    long_about = None
)]
struct Args {
    /// Galaxy name: LMC or SMC
    #[arg(long)]
    galaxy: String,

    /// Right Ascension in hours
    #[arg(long, allow_hyphen_values = true)]
    ra: f64,

    /// Declination in degrees
    #[arg(long, allow_hyphen_values = true)]
    dec: f64,

    /// Search radius (max 12 arcminutes)
    #[arg(long)]
    radius: f64,

    /// Temperature selection: all, cool or hot
    #[arg(long, default_value = "all")]
    teff: String,

    /// Request timeout in seconds (overrides the config file)
    #[arg(long)]
    timeout: Option<u64>,

    /// JSON file with endpoint and timeout settings
    #[arg(long)]
    config: Option<PathBuf>,

    /// Allow coordinates outside the published map coverage
    #[arg(long)]
    no_footprint_check: bool,

    /// Print the result as JSON
    #[arg(long)]
    json: bool,
}

fn load_config(args: &Args) -> Result<LookupConfig, mc_extinction::ConfigError> {
    let mut config = match &args.config {
        Some(path) => LookupConfig::load_from_file(path)?,
        None => LookupConfig::default(),
    };
    if let Some(timeout) = args.timeout {
        config.timeout_secs = timeout;
    }
    if args.no_footprint_check {
        config.enforce_footprint = false;
    }
    Ok(config)
}

fn main() -> ExitCode {
    env_logger::init();
    let args = Args::parse();

    let outcome = load_config(&args)
        .map_err(mc_extinction::ExtinctionError::from)
        .and_then(ExtinctionClient::from_config)
        .and_then(|client| {
            client.get_extinction(&args.galaxy, args.ra, args.dec, args.radius, &args.teff)
        });

    match outcome {
        Ok(result) => {
            if args.json {
                match serde_json::to_string_pretty(&result) {
                    Ok(json) => println!("{json}"),
                    Err(e) => {
                        eprintln!("Failed to serialize result: {e}");
                        return ExitCode::FAILURE;
                    }
                }
            } else {
                println!("{result}");
            }
            ExitCode::SUCCESS
        }
        Err(e) => {
            eprintln!("{e}");
            match e.kind() {
                ErrorKind::InvalidInput => ExitCode::from(2),
                _ => ExitCode::FAILURE,
            }
        }
    }
}
