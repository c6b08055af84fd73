use anyhow::Context;
use assist_core::{config::Config, io, paths};
use std::path::Path;

pub fn run(root: &Path) -> anyhow::Result<()> {
    let project_name = root
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| "project".to_string());

    println!("Initializing assist in: {}", root.display());

    // 1. Write config.yaml if missing
    let config_path = paths::config_path(root);
    let config = if config_path.exists() {
        println!("  exists:  {}", paths::CONFIG_FILE);
        Config::load(root).context("failed to load config")?
    } else {
        let cfg = Config::default();
        cfg.save(root).context("failed to write config.yaml")?;
        println!("  created: {}", paths::CONFIG_FILE);
        cfg
    };

    // 2. Write the context skeleton where the config points
    let context_path = config.context_path(root);
    let skeleton = context_skeleton(&project_name);
    let created = io::write_if_missing(&context_path, skeleton.as_bytes())
        .with_context(|| format!("failed to write {}", context_path.display()))?;
    let label = if created { "created:" } else { "exists: " };
    println!("  {label} {}", config.context_file.display());

    println!("\nNext: fill in the answers, then run `assist analyze`.");
    Ok(())
}

/// One question per rule-relevant topic, answers left empty.
fn context_skeleton(project_name: &str) -> String {
    format!(
        "# Projet : {project_name}

## Phase : Analyse des Besoins
### Quelles sont les contraintes techniques ou organisationnelles?

## Phase : Conception
### Quelle architecture logicielle adopter pour le projet?

### Quelles technologies et frameworks utiliser?

## Phase : Développement
### Comment garantir la sécurité de l'application?

## Phase : Tests
### Quels outils de test utiliser?
"
    )
}
