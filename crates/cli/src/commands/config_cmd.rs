//! `groomdesk config` — Configuration management commands.

use groomdesk_config::AppConfig;

use super::backend::{CliResult, load_config};

pub fn show() -> CliResult {
    let config = load_config()?;
    println!("# {}", AppConfig::config_dir().join("config.toml").display());
    println!("# database: {}", config.database_path().display());
    println!();
    print!("{}", toml_of(&config)?);
    Ok(())
}

fn toml_of(config: &AppConfig) -> CliResult<String> {
    Ok(toml::to_string_pretty(config)?)
}

pub fn init(force: bool) -> CliResult {
    let dir = AppConfig::config_dir();
    let path = dir.join("config.toml");
    if path.exists() && !force {
        println!("❌ {} already exists (use --force to overwrite)", path.display());
        return Ok(());
    }

    std::fs::create_dir_all(&dir)?;
    std::fs::write(&path, AppConfig::default_toml())?;
    println!("✅ Wrote default configuration to {}", path.display());
    Ok(())
}

pub fn path() -> CliResult {
    println!("{}", AppConfig::config_dir().join("config.toml").display());
    Ok(())
}
