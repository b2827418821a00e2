use anyhow::{Context, Result};
use std::{env, path::PathBuf};
use tracing::info;
use wrapgen_core::{WrapgenConfig, config::CONFIG_FILE_NAME};

pub fn init_command(cwd: Option<&str>, force: bool) -> Result<()> {
    let project_root = match cwd {
        Some(cwd) => PathBuf::from(cwd),
        None => env::current_dir().context("Failed to get current directory")?,
    };
    let project_root = project_root
        .canonicalize()
        .context("Failed to canonicalize project root")?;

    let config_path = project_root.join(CONFIG_FILE_NAME);
    if config_path.exists() && !force {
        println!("❌ Config already exists at: {}", config_path.display());
        println!("   Use --force to overwrite");
        return Ok(());
    }

    let config = WrapgenConfig {
        catalog: Some(PathBuf::from("catalog.json")),
        ..Default::default()
    };
    config
        .save_to_file(&config_path)
        .with_context(|| format!("Failed to write {}", config_path.display()))?;
    info!("Initialized configuration in {}", project_root.display());

    println!("✅ Created config: {}", config_path.display());
    println!("   Catalog: catalog.json, layer: {}, strict: {}", config.layer, config.strict);
    Ok(())
}
