// ABOUTME: User preference storage for terminal theme and font size
// Flat JSON key/value map under ~/.kube-term, shared with the log viewer

use crate::terminal::theme::{is_valid_font_size, TerminalTheme, DEFAULT_FONT_SIZE};
use anyhow::{Context, Result};
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

pub const THEME_KEY: &str = "terminal-theme";
/// Shared with the log viewer so both panes zoom together
pub const FONT_SIZE_KEY: &str = "log-font-size";

#[cfg_attr(test, mockall::automock)]
pub trait PreferenceStore: Send {
    fn get(&self, key: &str) -> Option<String>;
    fn set(&mut self, key: &str, value: &str) -> Result<()>;
}

/// Preferences persisted to a JSON file, written through on every `set`
pub struct FilePreferenceStore {
    path: PathBuf,
    values: BTreeMap<String, String>,
}

impl FilePreferenceStore {
    pub fn default_path() -> Result<PathBuf> {
        let home = dirs::home_dir().context("unable to determine home directory")?;
        Ok(home.join(".kube-term").join("preferences.json"))
    }

    pub fn open_default() -> Result<Self> {
        Self::open(Self::default_path()?)
    }

    /// Load the store at `path`. A missing file is an empty store; an
    /// unreadable one is logged and replaced on the next write.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        let values = if path.exists() {
            let raw = fs::read_to_string(&path)
                .with_context(|| format!("reading preferences from {}", path.display()))?;
            match serde_json::from_str(&raw) {
                Ok(values) => values,
                Err(e) => {
                    warn!("Ignoring corrupt preferences file {}: {}", path.display(), e);
                    BTreeMap::new()
                }
            }
        } else {
            BTreeMap::new()
        };
        debug!("Loaded {} preferences from {}", values.len(), path.display());
        Ok(Self { path, values })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn save(&self) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }
        let json = serde_json::to_string_pretty(&self.values)?;
        fs::write(&self.path, json)
            .with_context(|| format!("writing preferences to {}", self.path.display()))?;
        Ok(())
    }
}

impl PreferenceStore for FilePreferenceStore {
    fn get(&self, key: &str) -> Option<String> {
        self.values.get(key).cloned()
    }

    fn set(&mut self, key: &str, value: &str) -> Result<()> {
        self.values.insert(key.to_string(), value.to_string());
        self.save()
    }
}

/// In-process store used when no preference file is wanted
#[derive(Default)]
pub struct MemoryPreferenceStore {
    values: BTreeMap<String, String>,
}

impl PreferenceStore for MemoryPreferenceStore {
    fn get(&self, key: &str) -> Option<String> {
        self.values.get(key).cloned()
    }

    fn set(&mut self, key: &str, value: &str) -> Result<()> {
        self.values.insert(key.to_string(), value.to_string());
        Ok(())
    }
}

/// Typed view over a preference store
pub struct Preferences {
    store: Box<dyn PreferenceStore>,
}

impl Preferences {
    pub fn new(store: Box<dyn PreferenceStore>) -> Self {
        Self { store }
    }

    pub fn in_memory() -> Self {
        Self::new(Box::new(MemoryPreferenceStore::default()))
    }

    pub fn theme(&self) -> TerminalTheme {
        match self.store.get(THEME_KEY) {
            Some(raw) => raw.parse().unwrap_or_else(|_| {
                warn!("Unknown terminal theme '{}', using default", raw);
                TerminalTheme::default()
            }),
            None => TerminalTheme::default(),
        }
    }

    pub fn font_size(&self) -> u16 {
        self.store
            .get(FONT_SIZE_KEY)
            .and_then(|raw| raw.trim().parse::<u16>().ok())
            .filter(|size| is_valid_font_size(*size))
            .unwrap_or(DEFAULT_FONT_SIZE)
    }

    pub fn set_theme(&mut self, theme: TerminalTheme) -> Result<()> {
        self.store.set(THEME_KEY, theme.name())
    }

    pub fn set_font_size(&mut self, font_size: u16) -> Result<()> {
        if !is_valid_font_size(font_size) {
            anyhow::bail!("font size {} out of range", font_size);
        }
        self.store.set(FONT_SIZE_KEY, &font_size.to_string())
    }
}
