mod cli;
mod commands;
mod observability;
mod output;

use anyhow::{Context, Result};
use clap::Parser;

use cli::{Cli, Commands, ConditionsCommands, ConfigCommands, RulesCommands};
use output::print_error;
use wallarm_api::{RulesApi, WallarmClient};
use wallarm_config::ProviderConfig;
use wallarm_rules::RuleManager;

#[tokio::main]
async fn main() {
    // Load .env file if present
    if let Err(e) = dotenvy::dotenv() {
        if !matches!(e, dotenvy::Error::Io(ref io_err) if io_err.kind() == std::io::ErrorKind::NotFound) {
            print_error(&format!("Failed to load .env file: {e}"));
        }
    }

    if let Err(e) = run().await {
        print_error(&format!("{e:#}"));
        std::process::exit(1);
    }
}

async fn run() -> Result<()> {
    let cli = Cli::parse();
    observability::init_tracing_with_level(&observability::level_for(cli.verbose, false));
    let format = cli.format.unwrap_or_default();

    match &cli.command {
        Commands::Conditions(args) => match &args.command {
            ConditionsCommands::Normalize(normalize) => {
                commands::conditions::normalize(normalize.file.as_deref(), format)?;
            }
        },
        Commands::Config(args) => match &args.command {
            ConfigCommands::Show => {
                let cfg = load(&cli)?;
                commands::config::show(&cfg, format)?;
            }
            ConfigCommands::Path => commands::config::path(cli.config.as_deref()),
        },
        Commands::Whoami => {
            let cfg = load(&cli)?;
            let client = make_client(&cfg)?;
            commands::account::whoami(&client, format).await?;
        }
        Commands::Rules(args) => {
            let cfg = load(&cli)?;
            let client = make_client(&cfg)?;
            let client_id = resolve_client_id(&cfg, &client).await?;
            let ignore_existing = match &args.command {
                RulesCommands::Apply(apply) => apply.ignore_existing,
                _ => false,
            };
            let manager = RuleManager::new(client, Some(client_id))
                .ignore_existing(cfg.ignore_existing || ignore_existing);

            match &args.command {
                RulesCommands::List(list) => {
                    commands::rules::list(&manager, client_id, list.rule_type, format).await?;
                }
                RulesCommands::Apply(apply) => {
                    commands::rules::apply(&manager, &apply.file, apply.state.as_deref(), format)
                        .await?;
                }
                RulesCommands::Read(read) => {
                    commands::rules::read(&manager, &read.state, read.write, format).await?;
                }
                RulesCommands::Delete(delete) => match (&delete.id, &delete.state) {
                    (Some(id), _) => commands::rules::delete_id(&manager, id).await?,
                    (None, Some(state)) => commands::rules::delete_state(&manager, state).await?,
                    (None, None) => anyhow::bail!("Either a rule id or --state is required"),
                },
                RulesCommands::Import(import) => {
                    commands::rules::import(
                        &manager,
                        &import.id,
                        import.rule_type,
                        import.state.as_deref(),
                        format,
                    )
                    .await?;
                }
            }
        }
    }

    Ok(())
}

/// Configuration from file and environment with command-line overrides applied.
fn load(cli: &Cli) -> Result<ProviderConfig> {
    let mut cfg = wallarm_config::load_config(cli.config.as_deref())
        .context("Failed to load configuration")?;
    if let Some(host) = &cli.api_host {
        cfg.api_host = host.clone();
    }
    if cli.client_id.is_some() {
        cfg.client_id = cli.client_id;
    }
    cfg.validate()?;

    if cfg.api_client_logging {
        observability::apply_logging_level(&observability::level_for(cli.verbose, true));
    }
    Ok(cfg)
}

fn make_client(cfg: &ProviderConfig) -> Result<WallarmClient> {
    let client = WallarmClient::builder()
        .base_url(cfg.api_host.as_str())
        .credentials(cfg.credentials()?)
        .retry(cfg.retry_policy())
        .build()?;
    Ok(client)
}

/// Configured client id, otherwise the one of the authenticated user.
async fn resolve_client_id<A: RulesApi>(cfg: &ProviderConfig, api: &A) -> Result<i64> {
    if let Some(id) = cfg.client_id {
        return Ok(id);
    }
    let user = api
        .user_details()
        .await
        .context("Failed to look up the client id of the current user")?;
    tracing::debug!(client_id = user.clientid, "using client id of current user");
    Ok(user.clientid)
}
