//! Initialize command.

use console::style;

use crate::config::starter_config_yaml;

const CONFIG_FILENAME: &str = "dossierhelper.yaml";

/// Write a starter configuration file into the working directory.
pub fn cmd_init() -> anyhow::Result<()> {
    let path = std::env::current_dir()?.join(CONFIG_FILENAME);
    if path.exists() {
        println!(
            "{} {} already exists, leaving it untouched",
            style("!").yellow(),
            path.display()
        );
        return Ok(());
    }

    std::fs::write(&path, starter_config_yaml())?;
    println!("{} Wrote {}", style("✓").green(), path.display());
    println!("  Edit search_roots, then run: dossier run");
    Ok(())
}
