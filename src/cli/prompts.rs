//! Interactive prompts using dialoguer

use std::path::Path;

use anyhow::Result;
use dialoguer::Confirm;

/// Prompt user to confirm proceeding with an action
pub fn confirm_step(message: &str) -> Result<bool> {
    let confirmed = Confirm::new()
        .with_prompt(message)
        .default(false)
        .interact()?;
    Ok(confirmed)
}

/// Ask before replacing artifacts from an earlier run
pub fn confirm_overwrite(existing: &[&Path]) -> Result<bool> {
    let names: Vec<String> = existing
        .iter()
        .map(|p| {
            p.file_name()
                .map_or_else(|| p.display().to_string(), |n| n.to_string_lossy().to_string())
        })
        .collect();
    let message = format!("Overwrite existing artifacts ({})?", names.join(", "));
    confirm_step(&message)
}
