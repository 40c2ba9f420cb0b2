//! Config validation CLI tool
//!
//! Validates an rqd configuration file and reports any errors.

use rq_util::{default_config_path, format_duration};
use std::path::PathBuf;
use std::process::ExitCode;

fn main() -> ExitCode {
    let args: Vec<String> = std::env::args().collect();

    let config_path = match args.get(1) {
        Some(path) => PathBuf::from(path),
        None => {
            let default_path = default_config_path();
            eprintln!("Usage: validate-config [config-file]");
            eprintln!();
            eprintln!("Validates an rqd configuration file.");
            eprintln!();
            eprintln!("If no path is provided, uses: {}", default_path.display());
            return ExitCode::from(2);
        }
    };

    if !config_path.exists() {
        eprintln!("Error: Configuration file not found: {}", config_path.display());
        return ExitCode::from(1);
    }

    match rq_config::load_config(&config_path) {
        Ok(settings) => {
            let limits = &settings.limits;
            println!("✓ Configuration is valid");
            println!();
            println!("Summary:");
            println!("  Config version: {}", rq_config::CURRENT_CONFIG_VERSION);
            println!("  Data dir: {}", settings.service.data_dir.display());
            println!("  Admins: {}", settings.service.admins.len());
            println!("  Max booking: {}", format_duration(limits.max_booking));
            println!("  Warn before expiry: {}", format_duration(limits.notify_before));
            println!("  Check interval: {}s", limits.check_interval.as_secs());
            println!("  Queue size: {}", limits.max_queue_size);
            println!("  Resources: {}", limits.max_resources);
            println!("  History kept: {}", limits.max_history);

            if !settings.presets.is_empty() {
                println!();
                println!("Presets:");
                for preset in &settings.presets {
                    println!("  - {} ({})", preset.label, format_duration(preset.duration));
                }
            }

            ExitCode::SUCCESS
        }
        Err(e) => {
            eprintln!("✗ Configuration validation failed");
            eprintln!();
            match &e {
                rq_config::ConfigError::ReadError(io_err) => {
                    eprintln!("Failed to read file: {}", io_err);
                }
                rq_config::ConfigError::ParseError(parse_err) => {
                    eprintln!("TOML parse error:");
                    eprintln!("  {}", parse_err);
                }
                rq_config::ConfigError::ValidationFailed { errors } => {
                    eprintln!("Validation errors ({}):", errors.len());
                    for err in errors {
                        eprintln!("  - {}", err);
                    }
                }
                rq_config::ConfigError::UnsupportedVersion(ver) => {
                    eprintln!(
                        "Unsupported config version: {} (expected {})",
                        ver,
                        rq_config::CURRENT_CONFIG_VERSION
                    );
                }
            }
            ExitCode::from(1)
        }
    }
}
