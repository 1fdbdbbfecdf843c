//! Environments command - lists the selectable deployment targets.

use colored::Colorize;

use crate::config::AppConfig;

/// Prints every environment name with its gateway URL.
pub fn list_environments(config: &AppConfig) {
    let registry = config.registry();
    println!("{}", "Known environments".bold());
    println!("─────────────────────");
    for (name, url) in registry.iter() {
        let marker = if config.environments.contains_key(name) {
            " (configured)".dimmed().to_string()
        } else {
            String::new()
        };
        println!("  {:<12} {}{}", name.cyan(), url, marker);
    }
}
