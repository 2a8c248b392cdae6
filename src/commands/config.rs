//! Config command handler.
//!
//! Displays the effective configuration and writes default config files.

use crate::config::{
    get_effective_config, global_config_path, local_config_path, save_global_config,
    save_local_config, Config,
};
use crate::error::{ModelbenchError, Result};
use crate::output::{BOLD, CYAN, GRAY, RESET, YELLOW};

/// Display the configuration commands run with and the file it came from.
pub fn config_display_command() -> Result<()> {
    let local = local_config_path();
    let source = if local.exists() {
        local
    } else {
        global_config_path()?
    };
    let existed = source.exists();

    let config = get_effective_config()?;

    println!("{BOLD}# Effective config{RESET}");
    println!("{GRAY}# {}{RESET}", source.display());
    if !existed {
        println!("{YELLOW}# (created with defaults){RESET}");
    }
    println!();
    print_config_as_toml(&config)
}

/// Write a commented default config file.
///
/// With `local` the file goes to `./modelbench.toml`, otherwise to the
/// global config path. An existing file is only replaced with `force`.
pub fn config_init_command(local: bool, force: bool) -> Result<()> {
    let path = if local {
        local_config_path()
    } else {
        global_config_path()?
    };

    if path.exists() && !force {
        return Err(ModelbenchError::Config(format!(
            "{} already exists. Use --force to overwrite it",
            path.display()
        )));
    }

    let config = Config::default();
    if local {
        save_local_config(&config)?;
    } else {
        save_global_config(&config)?;
    }
    println!("{CYAN}Wrote default config to{RESET} {}", path.display());
    Ok(())
}

fn print_config_as_toml(config: &Config) -> Result<()> {
    for line in config_to_toml_string(config)?.lines() {
        match line.split_once(" = ") {
            Some((key, value)) => println!("{CYAN}{}{RESET} = {}", key, value),
            None => println!("{}", line),
        }
    }
    Ok(())
}

/// Serialize a Config as TOML.
pub fn config_to_toml_string(config: &Config) -> Result<String> {
    toml::to_string(config)
        .map_err(|e| ModelbenchError::Config(format!("Failed to serialize config: {}", e)))
}
