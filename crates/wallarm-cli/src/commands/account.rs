use anyhow::Result;
use colored::Colorize;
use wallarm_api::RulesApi;

use crate::cli::OutputFormat;
use crate::output::print_json;

pub async fn whoami<A: RulesApi>(api: &A, format: OutputFormat) -> Result<()> {
    let user = api.user_details().await?;
    match format {
        OutputFormat::Json => print_json(&user)?,
        OutputFormat::Table => {
            let field = |v: &Option<String>| v.clone().unwrap_or_else(|| "-".to_string());
            println!("{}: {}", "Client".cyan(), user.clientid);
            println!("{}: {}", "User".cyan(), field(&user.username));
            println!("{}: {}", "Email".cyan(), field(&user.email));
            if !user.permissions.is_empty() {
                println!("{}: {}", "Permissions".cyan(), user.permissions.join(", "));
            }
        }
    }
    Ok(())
}
