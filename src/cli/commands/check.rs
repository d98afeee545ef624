//! External tool availability check.

use console::style;

/// Report which external tools the pipeline can find.
pub fn cmd_check() -> anyhow::Result<()> {
    println!("External tools:");
    let mut tools = crate::extract::check_tools();
    tools.extend(crate::metadata::check_tools());

    let mut missing = 0;
    for (name, found) in &tools {
        if *found {
            println!("  {} {}", style("✓").green(), name);
        } else {
            missing += 1;
            println!("  {} {} (not found in PATH)", style("✗").red(), name);
        }
    }

    if missing > 0 {
        println!();
        println!(
            "{} {} tool(s) missing; affected documents degrade gracefully \
             (empty text, no metadata, or no tags)",
            style("!").yellow(),
            missing
        );
    }
    Ok(())
}
