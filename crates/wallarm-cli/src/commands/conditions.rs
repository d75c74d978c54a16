use std::path::Path;

use anyhow::{Context, Result};
use wallarm_core::{ConditionSpec, normalize_conditions};

use crate::cli::OutputFormat;
use crate::output::print_conditions;

pub fn normalize(file: Option<&Path>, format: OutputFormat) -> Result<()> {
    let specs: Vec<ConditionSpec> = super::read_list(file)?;
    let conditions = normalize_conditions(&specs).context("Invalid conditions")?;
    print_conditions(&conditions, format)
}
