use anyhow::Result;
use colored::Colorize;
use wallarm_config::{ProviderConfig, default_config_path};

use crate::cli::OutputFormat;
use crate::output::print_json;

pub fn show(cfg: &ProviderConfig, format: OutputFormat) -> Result<()> {
    let cfg = cfg.redacted();
    match format {
        OutputFormat::Json => print_json(&cfg)?,
        OutputFormat::Table => {
            let opt = |v: &Option<String>| v.as_deref().unwrap_or("(not set)").to_string();
            println!("{}: {}", "API host".cyan(), cfg.api_host);
            println!("{}: {}", "API token".cyan(), opt(&cfg.api_token));
            println!("{}: {}", "API UUID".cyan(), opt(&cfg.api_uuid));
            println!("{}: {}", "API secret".cyan(), opt(&cfg.api_secret));
            println!(
                "{}: {}",
                "Client id".cyan(),
                cfg.client_id
                    .map(|id| id.to_string())
                    .unwrap_or_else(|| "(from user)".to_string())
            );
            println!(
                "{}: {} (backoff {}s..{}s)",
                "Retries".cyan(),
                cfg.retries,
                cfg.min_backoff,
                cfg.max_backoff
            );
            println!("{}: {}", "Ignore existing".cyan(), cfg.ignore_existing);
        }
    }
    Ok(())
}

pub fn path(explicit: Option<&str>) {
    match explicit.map(std::path::PathBuf::from).or_else(default_config_path) {
        Some(p) if p.exists() => println!("{}", p.display()),
        Some(p) => println!("{} (not present)", p.display()),
        None => println!("(no home directory)"),
    }
}
