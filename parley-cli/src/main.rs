//! `parley`: answer piped text once, or chat interactively.

mod cli;

use std::io::{self, BufRead, IsTerminal, Read, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result, anyhow};
use clap::Parser;
use parley::{
    AppSettings, Assistant, BackendRouter, ConfigStore, DEFAULT_CONFIG, FailureStage, ModelCatalog,
    OutputSink, PromptPresets,
};
use tracing_subscriber::EnvFilter;

use crate::cli::{Cli, is_exit_command, one_shot_prompt};

/// Prints streamed text as it arrives.
struct StdoutSink;

impl OutputSink for StdoutSink {
    fn on_chunk(&self, chunk: &str) {
        let mut stdout = io::stdout().lock();
        let _ = stdout.write_all(chunk.as_bytes());
        let _ = stdout.flush();
    }

    fn on_stream_end(&self) {
        println!();
    }
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(io::stderr)
        .compact()
        .init();
}

fn config_path(cli: &Cli) -> Result<PathBuf> {
    match &cli.config {
        Some(path) => Ok(path.clone()),
        None => ConfigStore::default_path().context("no per-user config directory available"),
    }
}

fn load_settings(path: &Path) -> Result<AppSettings> {
    let store = ConfigStore::bootstrap(DEFAULT_CONFIG, path)
        .with_context(|| format!("failed to prepare config at {}", path.display()))?;

    AppSettings::from_config(&store).context("invalid config")
}

fn load_presets(config_path: &Path) -> Result<PromptPresets> {
    let Some(dir) = PromptPresets::dir_for_config(config_path) else {
        return Ok(PromptPresets::default());
    };
    PromptPresets::load(&dir)
        .with_context(|| format!("failed to read prompt presets from {}", dir.display()))
}

fn build_router(settings: &AppSettings) -> Result<BackendRouter> {
    let mut router = BackendRouter::new().context("failed to build http client")?;
    if let Some(api_key) = &settings.openai_api_key {
        router = router
            .with_openai_api_key(api_key)
            .context("invalid remote_models.openai.api_key")?;
    }
    router
        .load_env_credentials()
        .context("failed to read remote credentials")?;
    Ok(router)
}

async fn pull_required_models(catalog: &dyn ModelCatalog, settings: &AppSettings) {
    if settings.models.is_empty() {
        return;
    }

    match catalog.ensure_models(&settings.models).await {
        Ok(pulled) if !pulled.is_empty() => {
            tracing::info!(models = %pulled.join(", "), "pulled missing models");
        }
        Ok(_) => {}
        Err(err) => tracing::warn!(error = %err, "could not check local models"),
    }
}

async fn one_shot(
    assistant: &mut Assistant,
    chosen_prompt: Option<&str>,
    text: &str,
) -> Result<()> {
    eprintln!("Processing...");
    let prompt = one_shot_prompt(chosen_prompt, assistant.settings()).map(str::to_string);
    if let Some(prompt) = prompt {
        assistant.set_system_prompt(&prompt);
    }

    let rendered = assistant
        .process(text)
        .await
        .context("model call failed")?;
    if !assistant.settings().stream {
        println!("{rendered}");
    }
    Ok(())
}

async fn interactive(assistant: &mut Assistant) -> Result<()> {
    let model = assistant.model_id().unwrap_or_default().to_string();
    println!("Chatting with {model}. Type 'exit' to leave.");

    let stdin = io::stdin();
    let mut lines = stdin.lock().lines();
    loop {
        print!("> ");
        io::stdout().flush().context("failed to flush stdout")?;

        let Some(line) = lines.next() else {
            println!();
            break;
        };
        let line = line.context("failed to read stdin")?;
        if is_exit_command(&line) {
            break;
        }
        if line.trim().is_empty() {
            continue;
        }

        match assistant.process(&line).await {
            Ok(rendered) => {
                if !assistant.settings().stream {
                    println!("{rendered}");
                }
            }
            Err(err) if err.provider_stage() == Some(FailureStage::Setup) => {
                eprintln!("error: {err}");
                eprintln!("check the model id and credentials, then restart");
                break;
            }
            Err(err) => eprintln!("error: {err}"),
        }
    }

    println!("Bye!");
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    init_tracing();
    let cli = Cli::parse();

    let config_file = config_path(&cli)?;
    let presets = load_presets(&config_file)?;
    if cli.list_presets {
        for name in presets.names() {
            println!("{name}");
        }
        return Ok(());
    }
    let chosen_prompt = cli.chosen_prompt(&presets).map_err(|message| anyhow!(message))?;

    let settings = load_settings(&config_file)?;
    let router = build_router(&settings)?;
    let catalog = router
        .model_catalog()
        .context("no local model store available")?;
    if !cli.skip_pull {
        pull_required_models(catalog.as_ref(), &settings).await;
    }

    let model = cli
        .model(&settings)
        .map(str::to_string)
        .ok_or_else(|| anyhow!("no model configured; pass --model or list one under 'models'"))?;

    let mut builder = Assistant::builder(Arc::new(router), catalog)
        .settings(settings)
        .sink(Arc::new(StdoutSink));
    if let Some(prompt) = chosen_prompt {
        builder = builder.system_prompt(prompt.to_string());
    }
    let mut assistant = builder.build();
    assistant
        .init_model(&model)
        .await
        .with_context(|| format!("failed to initialise model '{model}'"))?;

    if io::stdin().is_terminal() {
        return interactive(&mut assistant).await;
    }

    let mut text = String::new();
    io::stdin()
        .read_to_string(&mut text)
        .context("failed to read stdin")?;
    let text = text.trim();
    if text.is_empty() {
        return Ok(());
    }
    one_shot(&mut assistant, chosen_prompt, text).await
}
