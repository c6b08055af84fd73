use crate::output::print_json;
use anyhow::Context;
use assist_agent::{dispatch, generate_stream, Callbacks, GeneratorOptions, ModuleRegistry};
use assist_core::config::{Config, GeneratorConfig};
use std::path::Path;
use std::sync::Mutex;

pub fn run(root: &Path, task: &str, output: Option<&Path>, json: bool) -> anyhow::Result<()> {
    let config = Config::load(root).context("failed to load config")?;
    let registry = ModuleRegistry::for_project(root, &config.context_path(root));
    let module = registry
        .route(task)
        .ok_or_else(|| anyhow::anyhow!("no module can handle task '{task}'"))?;

    // Unprefixed coherence requests are answered locally, not by the generator.
    if module.name() == "chat" && assist_core::analyzer::can_handle(task) {
        tracing::debug!("task routed to coherence analysis");
        return super::analyze::run(root, None, &[], json);
    }

    let prompt = module
        .build_prompt(task)
        .with_context(|| format!("failed to build {} prompt", module.name()))?;

    let opts = generator_options(&config.generator, root);

    let stream_partials = !json && output.is_none();
    let outcome: Mutex<Option<Result<String, String>>> = Mutex::new(None);
    let record = |value: Result<String, String>| {
        if let Ok(mut slot) = outcome.lock() {
            *slot = Some(value);
        }
    };
    let mut callbacks = Callbacks::new(|text| record(Ok(text)), |msg| record(Err(msg)));
    if stream_partials {
        callbacks = callbacks.with_partial(|line| println!("{line}"));
    }

    let rt = tokio::runtime::Runtime::new().context("failed to start async runtime")?;
    rt.block_on(async move { dispatch(generate_stream(prompt, opts), callbacks).await });

    let outcome = outcome
        .into_inner()
        .map_err(|_| anyhow::anyhow!("generation result lock poisoned"))?;
    let text = match outcome {
        Some(Ok(text)) => text,
        Some(Err(msg)) => anyhow::bail!("generation failed: {msg}"),
        None => anyhow::bail!("generation produced no result"),
    };

    if let Some(path) = output {
        let path = assist_core::paths::resolve(root, path);
        assist_core::io::atomic_write(&path, text.as_bytes())
            .with_context(|| format!("failed to write {}", path.display()))?;
        if !json {
            println!("Wrote {}", path.display());
        }
    }

    if json {
        let value = serde_json::json!({
            "module": module.name(),
            "text": text,
            "output": output.map(|p| assist_core::paths::resolve(root, p)),
        });
        print_json(&value)?;
    }
    Ok(())
}

fn generator_options(cfg: &GeneratorConfig, root: &Path) -> GeneratorOptions {
    GeneratorOptions {
        program: cfg.program.clone(),
        args: cfg.args.clone(),
        env: cfg.env.clone(),
        cwd: Some(root.to_path_buf()),
    }
}
