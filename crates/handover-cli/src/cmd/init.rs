use anyhow::Context;
use handover_core::{config::Config, io, paths};
use std::path::Path;

const GITIGNORE: &str = "orchestrations.redb\n";

pub fn run(root: &Path, bot: Option<&str>) -> anyhow::Result<()> {
    let bot_name = bot
        .map(str::to_owned)
        .or_else(|| root.file_name().map(|n| n.to_string_lossy().into_owned()))
        .unwrap_or_else(|| "primary".to_string());

    println!("Initializing handover in: {}", root.display());

    let dir = paths::handover_dir(root);
    io::ensure_dir(&dir).with_context(|| format!("failed to create {}", dir.display()))?;

    let config_path = paths::config_path(root);
    if !config_path.exists() {
        Config::new(&bot_name)
            .save(root)
            .context("failed to write config.yaml")?;
        println!("  created: {}", paths::CONFIG_FILE);
    } else {
        println!("  exists:  {}", paths::CONFIG_FILE);
    }

    let gitignore = dir.join(".gitignore");
    if io::write_if_missing(&gitignore, GITIGNORE.as_bytes())
        .context("failed to write .gitignore")?
    {
        println!("  created: {}/.gitignore", paths::HANDOVER_DIR);
    }

    println!("\nNext: list start intents and eligible bots in {}", paths::CONFIG_FILE);
    Ok(())
}
