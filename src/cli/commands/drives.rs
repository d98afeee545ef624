//! Remote drive inspection commands.

use console::style;

use crate::config::Config;
use crate::drive::{DriveClient, HttpDriveClient};

/// List configured drives and their state.
pub fn cmd_drives_list(config: &Config) -> anyhow::Result<()> {
    if config.drives.is_empty() {
        println!("No drives configured.");
        return Ok(());
    }
    for drive in &config.drives {
        let state = if drive.enabled {
            style("enabled").green()
        } else {
            style("disabled").dim()
        };
        let scope = drive.root_folder_id.as_deref().unwrap_or("(drive root)");
        println!("  {} [{}] scope: {}", drive.name, state, scope);
    }
    Ok(())
}

/// Verify one drive's stored credentials against the API.
pub async fn cmd_drives_test(config: &Config, name: &str) -> anyhow::Result<()> {
    let source = config
        .drives
        .iter()
        .find(|d| d.name == name)
        .ok_or_else(|| anyhow::anyhow!("no drive named '{}' in configuration", name))?;

    let credentials = source
        .credentials_file
        .as_ref()
        .ok_or_else(|| anyhow::anyhow!("drive '{}' has no credentials_file", name))?;
    let expanded = shellexpand::full(credentials)
        .map(|s| s.into_owned())
        .unwrap_or_else(|_| credentials.clone());

    let client = HttpDriveClient::from_credentials_file(name, std::path::Path::new(&expanded))?;
    if client.authenticate().await? {
        println!("{} Drive '{}' is reachable", style("✓").green(), name);
    } else {
        println!(
            "{} Drive '{}' rejected the stored token; refresh your credentials",
            style("✗").red(),
            name
        );
    }
    Ok(())
}
