//! Command-line arguments and the small decisions made from them.

use std::path::PathBuf;

use clap::Parser;
use parley::{AppSettings, PromptPresets};

const EXIT_COMMANDS: [&str; 3] = ["exit", "quit", "bye"];

/// Chat with local or remote language models.
///
/// Text piped on stdin is answered once. Otherwise an interactive session starts.
#[derive(Debug, Parser)]
#[command(name = "parley", version)]
pub struct Cli {
    /// System prompt for the conversation.
    #[arg(short, long, conflicts_with = "preset")]
    pub prompt: Option<String>,

    /// Use a saved system prompt from the `prompts` directory beside the config file.
    #[arg(long, value_name = "NAME")]
    pub preset: Option<String>,

    /// Print the saved system prompt names and exit.
    #[arg(long)]
    pub list_presets: bool,

    /// Model to use, e.g. `qwen3:4b` or `:openai:gpt-4o-mini`.
    #[arg(short, long)]
    pub model: Option<String>,

    /// Config file to use instead of the per-user one.
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Do not pull missing local models at startup.
    #[arg(long)]
    pub skip_pull: bool,
}

impl Cli {
    /// The flag wins, then the config's command-line model, then the first listed model.
    pub fn model<'a>(&'a self, settings: &'a AppSettings) -> Option<&'a str> {
        self.model
            .as_deref()
            .or(settings.command_line_model.as_deref())
            .or(settings.models.first().map(String::as_str))
    }

    /// The `--prompt` text, else the `--preset` text.
    pub fn chosen_prompt<'a>(
        &'a self,
        presets: &'a PromptPresets,
    ) -> Result<Option<&'a str>, String> {
        if let Some(prompt) = self.prompt.as_deref() {
            return Ok(Some(prompt));
        }
        let Some(name) = self.preset.as_deref() else {
            return Ok(None);
        };
        presets.get(name).map(Some).ok_or_else(|| {
            let known = presets.names();
            if known.is_empty() {
                format!("unknown preset '{name}'; no presets are saved")
            } else {
                format!("unknown preset '{name}'; saved presets: {}", known.join(", "))
            }
        })
    }
}

/// Prompt for piped input: the chosen prompt, else the config's command-line prompt.
pub fn one_shot_prompt<'a>(
    chosen: Option<&'a str>,
    settings: &'a AppSettings,
) -> Option<&'a str> {
    chosen.or(settings.command_line_prompt.as_deref())
}

pub fn is_exit_command(line: &str) -> bool {
    let line = line.trim();
    EXIT_COMMANDS
        .iter()
        .any(|command| line.eq_ignore_ascii_case(command))
}
