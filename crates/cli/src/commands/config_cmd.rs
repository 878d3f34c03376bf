//! `stanblocks config` — Configuration management commands.

use std::path::Path;

use stanblocks_config::{CONFIG_FILE, GeneratorConfig};

pub fn validate(explicit: Option<&Path>) -> Result<(), Box<dyn std::error::Error>> {
    println!("🔍 Validating configuration...");

    match GeneratorConfig::load(explicit) {
        Ok(config) => {
            println!("   ✅ Config parsed successfully");

            let warnings = config.warnings();

            if warnings.is_empty() {
                println!("   ✅ All checks passed");
            } else {
                println!();
                for w in &warnings {
                    println!("   ⚠️  {w}");
                }
            }

            println!();
            println!("   Fragments:    <model>_<role>_block.{}", config.fragment_extension);
            println!("   Baseline:     <model>.{}", config.output_extension);
            println!(
                "   Sensitivity:  <model>{}.{}",
                config.sensitivity_suffix, config.output_extension
            );
        }
        Err(e) => {
            println!("   ❌ Config error: {e}");
            return Err(e.into());
        }
    }

    Ok(())
}

pub fn show(explicit: Option<&Path>) -> Result<(), Box<dyn std::error::Error>> {
    let config =
        GeneratorConfig::load(explicit).map_err(|e| format!("Failed to load config: {e}"))?;
    let toml_str = toml::to_string_pretty(&config)?;
    println!("{toml_str}");
    Ok(())
}

pub fn path(explicit: Option<&Path>) -> Result<(), Box<dyn std::error::Error>> {
    let config_path = explicit
        .map(Path::to_path_buf)
        .unwrap_or_else(GeneratorConfig::default_path);
    let note = if config_path.exists() { "" } else { " (not present, defaults apply)" };
    println!("{}{note}", config_path.display());
    Ok(())
}

pub fn init(force: bool) -> Result<(), Box<dyn std::error::Error>> {
    write_default(Path::new(CONFIG_FILE), force)
}

fn write_default(config_path: &Path, force: bool) -> Result<(), Box<dyn std::error::Error>> {
    if config_path.exists() && !force {
        println!("⚠️  Config already exists at: {}", config_path.display());
        println!("   Edit it manually or re-run with --force.");
        return Ok(());
    }

    std::fs::write(config_path, GeneratorConfig::default_toml())?;
    println!("✅ Created {}", config_path.display());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_path_is_config_file() {
        let path = GeneratorConfig::default_path();
        assert_eq!(path.to_str().unwrap(), CONFIG_FILE);
    }

    #[test]
    fn write_default_respects_existing_file() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join(CONFIG_FILE);
        std::fs::write(&path, "output_extension = \"stanfile\"\n").unwrap();

        write_default(&path, false).unwrap();
        assert!(std::fs::read_to_string(&path).unwrap().contains("stanfile"));

        write_default(&path, true).unwrap();
        let config = GeneratorConfig::load_from(&path).unwrap();
        assert_eq!(config, GeneratorConfig::default());
    }
}
