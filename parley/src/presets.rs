//! Named system prompts stored as `*.txt` files.
//!
//! A preset's name is its file name up to the first dot, so `pirate.txt` and
//! `pirate.v2.txt` both name `pirate`; the later one in name order wins.
//!
//! ```rust
//! use parley::PromptPresets;
//!
//! let dir = std::env::temp_dir().join("parley-presets-doc-missing");
//! let presets = PromptPresets::load(&dir).expect("a missing directory has no presets");
//! assert!(presets.is_empty());
//! ```

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use crate::config::ConfigError;

const PRESET_DIR_NAME: &str = "prompts";
const PRESET_EXTENSION: &str = "txt";

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PromptPresets {
    prompts: BTreeMap<String, String>,
}

impl PromptPresets {
    /// The `prompts` directory beside `config_path`.
    pub fn dir_for_config(config_path: &Path) -> Option<PathBuf> {
        config_path.parent().map(|dir| dir.join(PRESET_DIR_NAME))
    }

    /// Reads every `*.txt` file in `dir`. A missing directory yields no presets.
    pub fn load(dir: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let dir = dir.as_ref();
        if !dir.exists() {
            tracing::debug!(dir = %dir.display(), "no prompt preset directory");
            return Ok(Self::default());
        }

        let mut paths = fs::read_dir(dir)
            .map_err(|err| ConfigError::io(dir, err))?
            .map(|entry| entry.map(|entry| entry.path()))
            .collect::<Result<Vec<_>, _>>()
            .map_err(|err| ConfigError::io(dir, err))?;
        paths.retain(|path| {
            path.is_file()
                && path
                    .extension()
                    .is_some_and(|extension| extension == PRESET_EXTENSION)
        });
        paths.sort();

        let mut prompts = BTreeMap::new();
        for path in paths {
            let Some(name) = preset_name(&path) else {
                continue;
            };
            let text = fs::read_to_string(&path).map_err(|err| ConfigError::io(&path, err))?;
            prompts.insert(name, text.trim_end().to_string());
        }

        tracing::debug!(dir = %dir.display(), count = prompts.len(), "loaded prompt presets");
        Ok(Self { prompts })
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.prompts.get(name).map(String::as_str)
    }

    /// Preset names in sorted order.
    pub fn names(&self) -> Vec<&str> {
        self.prompts.keys().map(String::as_str).collect()
    }

    pub fn len(&self) -> usize {
        self.prompts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.prompts.is_empty()
    }
}

fn preset_name(path: &Path) -> Option<String> {
    let file_name = path.file_name()?.to_str()?;
    let name = file_name.split('.').next()?.trim();
    (!name.is_empty()).then(|| name.to_string())
}

#[cfg(test)]
mod tests {
    use std::fs;
    use std::path::Path;

    use super::PromptPresets;
    use crate::ConfigErrorKind;

    #[test]
    fn text_files_become_presets_named_by_stem() {
        let dir = tempfile::tempdir().expect("temp dir");
        fs::write(dir.path().join("pirate.txt"), "Talk like a pirate.\n").expect("write");
        fs::write(dir.path().join("concise.txt"), "Answer in one sentence.").expect("write");
        fs::write(dir.path().join("notes.md"), "not a preset").expect("write");
        fs::create_dir(dir.path().join("nested.txt")).expect("dir named like a preset");

        let presets = PromptPresets::load(dir.path()).expect("presets load");

        assert_eq!(presets.names(), vec!["concise", "pirate"]);
        assert_eq!(presets.get("pirate"), Some("Talk like a pirate."));
        assert_eq!(presets.get("notes"), None);
    }

    #[test]
    fn dotted_names_share_the_leading_segment() {
        let dir = tempfile::tempdir().expect("temp dir");
        fs::write(dir.path().join("pirate.txt"), "Arr.").expect("write");
        fs::write(dir.path().join("pirate.v2.txt"), "Arr, matey.").expect("write");
        fs::write(dir.path().join(".txt"), "nameless").expect("write");

        let presets = PromptPresets::load(dir.path()).expect("presets load");

        assert_eq!(presets.len(), 1);
        assert_eq!(presets.get("pirate"), Some("Arr, matey."));
    }

    #[test]
    fn missing_directory_is_empty_but_a_file_is_an_error() {
        let dir = tempfile::tempdir().expect("temp dir");
        assert!(
            PromptPresets::load(dir.path().join("absent"))
                .expect("missing dir")
                .is_empty()
        );

        let file = dir.path().join("prompts");
        fs::write(&file, "").expect("write");
        let error = PromptPresets::load(&file).expect_err("not a directory");
        assert_eq!(error.kind, ConfigErrorKind::Io);
    }

    #[test]
    fn presets_live_beside_the_config_file() {
        assert_eq!(
            PromptPresets::dir_for_config(Path::new("/home/user/.config/parley/config.jsonc")),
            Some(Path::new("/home/user/.config/parley/prompts").to_path_buf())
        );
    }
}
