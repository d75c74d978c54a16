use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};
use wallarm_core::RuleType;

#[derive(Parser)]
#[command(name = "wallarm")]
#[command(about = "Wallarm CLI: reconcile declared rules with your account")]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Config file (defaults to ~/.wallarm/config.toml when present)
    #[arg(short, long, global = true, env = "WALLARM_CONFIG")]
    pub config: Option<String>,

    /// API host (overrides config and WALLARM_API_HOST)
    #[arg(long, global = true)]
    pub api_host: Option<String>,

    /// Client id (overrides config and WALLARM_API_CLIENT_ID)
    #[arg(long, global = true)]
    pub client_id: Option<i64>,

    /// Output format
    #[arg(short, long, global = true)]
    pub format: Option<OutputFormat>,

    /// More log output (-v info, -vv debug)
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    pub verbose: u8,
}

#[derive(Clone, Copy, ValueEnum, Default)]
pub enum OutputFormat {
    #[default]
    Json,
    Table,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Show the account behind the configured credentials
    Whoami,
    /// Create, reconcile, delete and import rules
    Rules(RulesArgs),
    /// Work with action conditions offline
    Conditions(ConditionsArgs),
    /// Inspect CLI configuration
    Config(ConfigArgs),
}

#[derive(clap::Args)]
pub struct RulesArgs {
    #[command(subcommand)]
    pub command: RulesCommands,
}

#[derive(Subcommand)]
pub enum RulesCommands {
    /// List rules of the client
    List(ListArgs),
    /// Create the rules declared in a JSON file
    Apply(ApplyArgs),
    /// Reconcile a state file with the account
    Read(ReadArgs),
    /// Delete a rule by id or every rule of a state file
    Delete(DeleteArgs),
    /// Import an existing rule into a state entry
    Import(ImportArgs),
}

#[derive(clap::Args)]
pub struct ListArgs {
    /// Only rules of this type (e.g. vpatch, wallarm_mode)
    #[arg(long = "type", value_parser = parse_rule_type)]
    pub rule_type: Option<RuleType>,
}

#[derive(clap::Args)]
pub struct ApplyArgs {
    /// JSON file with one rule or a list of rules
    pub file: PathBuf,
    /// Write the resulting state to this file
    #[arg(long)]
    pub state: Option<PathBuf>,
    /// Adopt matching existing rules instead of failing
    #[arg(long)]
    pub ignore_existing: bool,
}

#[derive(clap::Args)]
pub struct ReadArgs {
    /// State file written by `apply` or `import`
    pub state: PathBuf,
    /// Rewrite the state file with the reconciled result
    #[arg(long)]
    pub write: bool,
}

#[derive(clap::Args)]
pub struct DeleteArgs {
    /// Rule id as clientID/actionID/ruleID
    #[arg(required_unless_present = "state", conflicts_with = "state")]
    pub id: Option<String>,
    /// Delete every rule recorded in a state file
    #[arg(long)]
    pub state: Option<PathBuf>,
}

#[derive(clap::Args)]
pub struct ImportArgs {
    /// Rule id as clientID/actionID/ruleID
    pub id: String,
    /// Rule type the id is expected to have
    #[arg(long = "type", value_parser = parse_rule_type)]
    pub rule_type: RuleType,
    /// Append the imported state to this file
    #[arg(long)]
    pub state: Option<PathBuf>,
}

#[derive(clap::Args)]
pub struct ConditionsArgs {
    #[command(subcommand)]
    pub command: ConditionsCommands,
}

#[derive(Subcommand)]
pub enum ConditionsCommands {
    /// Print the canonical form of a list of conditions
    Normalize(NormalizeArgs),
}

#[derive(clap::Args)]
pub struct NormalizeArgs {
    /// Path to JSON file (reads from stdin if omitted)
    pub file: Option<PathBuf>,
}

#[derive(clap::Args)]
pub struct ConfigArgs {
    #[command(subcommand)]
    pub command: ConfigCommands,
}

#[derive(Subcommand)]
pub enum ConfigCommands {
    /// Show the effective configuration with secrets masked
    Show,
    /// Print the config file path in use
    Path,
}

fn parse_rule_type(raw: &str) -> Result<RuleType, String> {
    raw.parse().map_err(|e: wallarm_core::CoreError| e.to_string())
}
