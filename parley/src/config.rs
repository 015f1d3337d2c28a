//! JSON-with-comments configuration: first-run bootstrap, key merging and typed settings.
//!
//! ```rust
//! use parley::config::{AppSettings, ConfigStore, DEFAULT_CONFIG};
//!
//! let store = ConfigStore::parse(DEFAULT_CONFIG).expect("default config parses");
//! let settings = AppSettings::from_config(&store).expect("default config is complete");
//! assert_eq!(settings.max_steps, 10);
//! assert!(settings.agents_enabled);
//! ```

use std::error::Error;
use std::fmt::{Display, Formatter};
use std::fs;
use std::path::{Path, PathBuf};

use pchat::DEFAULT_MAX_STEPS;
use serde_json::{Map, Value};

pub const DEFAULT_CONFIG: &str = include_str!("../config/default.jsonc");

const CONFIG_DIR_NAME: &str = "parley";
const CONFIG_FILE_NAME: &str = "config.jsonc";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigErrorKind {
    Io,
    Parse,
    MissingKey,
    InvalidValue,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfigError {
    pub kind: ConfigErrorKind,
    pub message: String,
}

impl ConfigError {
    pub fn new(kind: ConfigErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }

    pub fn io(path: &Path, error: std::io::Error) -> Self {
        Self::new(ConfigErrorKind::Io, format!("{}: {error}", path.display()))
    }

    pub fn parse(message: impl Into<String>) -> Self {
        Self::new(ConfigErrorKind::Parse, message)
    }

    pub fn missing_key(key: &str) -> Self {
        Self::new(
            ConfigErrorKind::MissingKey,
            format!("required config key '{key}' is missing"),
        )
    }

    pub fn invalid_value(key: &str, expected: &str) -> Self {
        Self::new(
            ConfigErrorKind::InvalidValue,
            format!("config key '{key}' must be {expected}"),
        )
    }
}

impl Display for ConfigError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:?}: {}", self.kind, self.message)
    }
}

impl Error for ConfigError {}

/// Removes `//` line comments. Slashes inside string literals are kept.
pub fn strip_comments(input: &str) -> String {
    let mut output = String::with_capacity(input.len());
    let mut chars = input.chars().peekable();
    let mut in_string = false;
    let mut escaped = false;

    while let Some(ch) = chars.next() {
        if in_string {
            output.push(ch);
            if escaped {
                escaped = false;
            } else if ch == '\\' {
                escaped = true;
            } else if ch == '"' {
                in_string = false;
            }
            continue;
        }

        match ch {
            '"' => {
                in_string = true;
                output.push(ch);
            }
            '/' if chars.peek() == Some(&'/') => {
                while let Some(&next) = chars.peek() {
                    if next == '\n' {
                        break;
                    }
                    chars.next();
                }
            }
            _ => output.push(ch),
        }
    }

    output
}

fn parse_document(text: &str) -> Result<Map<String, Value>, ConfigError> {
    let value: Value = serde_json::from_str(strip_comments(text).trim())
        .map_err(|err| ConfigError::parse(err.to_string()))?;

    match value {
        Value::Object(document) => Ok(document),
        _ => Err(ConfigError::new(
            ConfigErrorKind::InvalidValue,
            "config root must be an object",
        )),
    }
}

/// A parsed configuration document and the file it came from, if any.
#[derive(Debug, Clone, PartialEq)]
pub struct ConfigStore {
    path: Option<PathBuf>,
    document: Map<String, Value>,
}

impl ConfigStore {
    /// `<config dir>/parley/config.jsonc` for the current user.
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join(CONFIG_DIR_NAME).join(CONFIG_FILE_NAME))
    }

    pub fn parse(text: &str) -> Result<Self, ConfigError> {
        Ok(Self {
            path: None,
            document: parse_document(text)?,
        })
    }

    pub fn load(path: impl Into<PathBuf>) -> Result<Self, ConfigError> {
        let path = path.into();
        let text = fs::read_to_string(&path).map_err(|err| ConfigError::io(&path, err))?;
        Ok(Self {
            document: parse_document(&text)?,
            path: Some(path),
        })
    }

    /// Makes sure a user config exists at `user_path` and carries every top-level key of
    /// `default_text`.
    ///
    /// The first run copies the default document verbatim, comments included. Later runs
    /// add missing top-level keys and keep every user value. The file is only rewritten
    /// when a key was added.
    pub fn bootstrap(default_text: &str, user_path: impl Into<PathBuf>) -> Result<Self, ConfigError> {
        let user_path = user_path.into();
        let defaults = parse_document(default_text)?;

        if !user_path.exists() {
            if let Some(parent) = user_path.parent() {
                fs::create_dir_all(parent).map_err(|err| ConfigError::io(parent, err))?;
            }
            fs::write(&user_path, default_text).map_err(|err| ConfigError::io(&user_path, err))?;
            tracing::info!(path = %user_path.display(), "created user config from defaults");

            return Ok(Self {
                path: Some(user_path),
                document: defaults,
            });
        }

        let user = Self::load(&user_path)?;
        let added = defaults
            .keys()
            .filter(|key| !user.document.contains_key(*key))
            .cloned()
            .collect::<Vec<_>>();

        if added.is_empty() {
            tracing::debug!(path = %user_path.display(), "user config is up to date");
            return Ok(user);
        }

        let mut merged = defaults;
        merged.extend(user.document);
        write_pretty(&user_path, &merged)?;
        tracing::info!(
            path = %user_path.display(),
            added = %added.join(", "),
            "added new keys to user config"
        );

        Ok(Self {
            path: Some(user_path),
            document: merged,
        })
    }

    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    pub fn document(&self) -> &Map<String, Value> {
        &self.document
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.document.get(key)
    }

    /// Walks nested objects along a dot-separated path such as `agents.enabled`.
    pub fn get_path(&self, path: &str) -> Option<&Value> {
        let mut segments = path.split('.');
        let mut current = self.document.get(segments.next()?)?;
        for segment in segments {
            current = current.as_object()?.get(segment)?;
        }
        Some(current)
    }
}

fn write_pretty(path: &Path, document: &Map<String, Value>) -> Result<(), ConfigError> {
    use serde::Serialize;

    let mut buffer = Vec::new();
    let formatter = serde_json::ser::PrettyFormatter::with_indent(b"    ");
    let mut serializer = serde_json::Serializer::with_formatter(&mut buffer, formatter);
    document
        .serialize(&mut serializer)
        .map_err(|err| ConfigError::parse(err.to_string()))?;
    buffer.push(b'\n');

    fs::write(path, buffer).map_err(|err| ConfigError::io(path, err))
}

/// Typed view of the settings the assistant and the binary read.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppSettings {
    pub models: Vec<String>,
    pub agents_enabled: bool,
    /// `None` exposes every tool.
    pub agent_tools: Option<Vec<String>>,
    pub max_steps: u32,
    pub openai_api_key: Option<String>,
    pub language: Option<String>,
    pub stream: bool,
    pub command_line_model: Option<String>,
    pub command_line_prompt: Option<String>,
}

impl Default for AppSettings {
    fn default() -> Self {
        Self {
            models: Vec::new(),
            agents_enabled: false,
            agent_tools: None,
            max_steps: DEFAULT_MAX_STEPS,
            openai_api_key: None,
            language: None,
            stream: false,
            command_line_model: None,
            command_line_prompt: None,
        }
    }
}

impl AppSettings {
    /// Reads settings from `store`. Only `models` is required.
    pub fn from_config(store: &ConfigStore) -> Result<Self, ConfigError> {
        let models = store
            .get("models")
            .ok_or_else(|| ConfigError::missing_key("models"))
            .and_then(|value| string_list("models", value))?;

        let agent_tools = match store.get_path("agents.tools") {
            None | Some(Value::Null) => None,
            Some(value) => Some(string_list("agents.tools", value)?),
        };

        let max_steps = match store.get_path("agents.max_steps") {
            None | Some(Value::Null) => DEFAULT_MAX_STEPS,
            Some(value) => value
                .as_u64()
                .and_then(|steps| u32::try_from(steps).ok())
                .filter(|steps| *steps > 0)
                .ok_or_else(|| ConfigError::invalid_value("agents.max_steps", "a positive integer"))?,
        };

        Ok(Self {
            models,
            agents_enabled: optional_bool(store, "agents.enabled")?.unwrap_or(false),
            agent_tools,
            max_steps,
            openai_api_key: optional_string(store, "remote_models.openai.api_key")?,
            language: optional_string(store, "language")?,
            stream: optional_bool(store, "stream")?.unwrap_or(false),
            command_line_model: optional_string(store, "command_line.model")?,
            command_line_prompt: optional_string(store, "command_line.prompt")?,
        })
    }
}

fn string_list(key: &str, value: &Value) -> Result<Vec<String>, ConfigError> {
    let invalid = || ConfigError::invalid_value(key, "a list of strings");
    value
        .as_array()
        .ok_or_else(invalid)?
        .iter()
        .map(|entry| entry.as_str().map(str::to_string).ok_or_else(invalid))
        .collect()
}

fn optional_bool(store: &ConfigStore, key: &str) -> Result<Option<bool>, ConfigError> {
    match store.get_path(key) {
        None | Some(Value::Null) => Ok(None),
        Some(Value::Bool(value)) => Ok(Some(*value)),
        Some(_) => Err(ConfigError::invalid_value(key, "a boolean")),
    }
}

/// Blank strings read as absent.
fn optional_string(store: &ConfigStore, key: &str) -> Result<Option<String>, ConfigError> {
    match store.get_path(key) {
        None | Some(Value::Null) => Ok(None),
        Some(Value::String(value)) if value.trim().is_empty() => Ok(None),
        Some(Value::String(value)) => Ok(Some(value.trim().to_string())),
        Some(_) => Err(ConfigError::invalid_value(key, "a string")),
    }
}
