//! The `init` command: write a starter configuration file.

use anyhow::bail;
use std::path::Path;

use crate::config::STARTER_CONFIG;

pub const CONFIG_FILE: &str = "reductor.toml";

pub fn run(force: bool) -> anyhow::Result<()> {
    let path = Path::new(CONFIG_FILE);
    if path.exists() && !force {
        bail!("{CONFIG_FILE} already exists (use --force to overwrite)");
    }
    std::fs::write(path, STARTER_CONFIG)?;
    eprintln!("Wrote {CONFIG_FILE}");
    Ok(())
}
