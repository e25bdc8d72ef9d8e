use std::path::PathBuf;

use anyhow::{Context, Result};

use super::Environment;

pub fn path(config: Option<PathBuf>) -> Result<u8> {
    let env = Environment::resolve(config)?;
    println!("{}", env.config_service.path().display());
    Ok(0)
}

pub fn show(config: Option<PathBuf>) -> Result<u8> {
    let env = Environment::resolve(config)?;
    let loaded = env.load_config()?;

    println!("# {}", env.config_service.path().display());
    println!("# sessions: {}", env.paths.sessions_dir(&loaded).display());
    println!("# history:  {}", env.paths.history_file(&loaded).display());
    print!(
        "{}",
        toml::to_string_pretty(&loaded).context("Failed to render configuration")?
    );
    Ok(0)
}

pub fn init(config: Option<PathBuf>, force: bool) -> Result<u8> {
    let env = Environment::resolve(config)?;
    let path = env.config_service.path();

    match env.config_service.write_default(force) {
        Ok(()) => {
            println!("✓ Wrote default configuration to {}", path.display());
            Ok(0)
        }
        Err(e) if e.is_validation() => {
            eprintln!("{e} Use --force to overwrite.");
            Ok(1)
        }
        Err(e) => Err(e).with_context(|| format!("Failed to write {}", path.display())),
    }
}
