use crate::config::AriaConfig;
use crate::types::{Result, SETTINGS_STORAGE_KEY};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::sync::watch;

/// UI theme. Names other than `dark` and `light` are kept as given.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(from = "String", into = "String")]
pub enum Theme {
    #[default]
    Dark,
    Light,
    Other(String),
}

impl From<String> for Theme {
    fn from(name: String) -> Self {
        match name.as_str() {
            "dark" => Self::Dark,
            "light" => Self::Light,
            _ => Self::Other(name),
        }
    }
}

impl From<Theme> for String {
    fn from(theme: Theme) -> Self {
        match theme {
            Theme::Dark => "dark".to_string(),
            Theme::Light => "light".to_string(),
            Theme::Other(name) => name,
        }
    }
}

// A theme that is not a string resets only the theme.
fn theme_or_default<'de, D>(deserializer: D) -> std::result::Result<Theme, D::Error>
where
    D: serde::Deserializer<'de>,
{
    Ok(match serde_json::Value::deserialize(deserializer)? {
        serde_json::Value::String(name) => Theme::from(name),
        other => {
            tracing::warn!("Ignoring stored theme {}", other);
            Theme::default()
        }
    })
}

/// User preferences, persisted as one JSON record
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Settings {
    #[serde(deserialize_with = "theme_or_default")]
    pub theme: Theme,
    pub sidebar_collapsed: bool,
    pub notifications: bool,
    pub sound_enabled: bool,
    pub auto_scroll: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            theme: Theme::Dark,
            sidebar_collapsed: false,
            notifications: true,
            sound_enabled: true,
            auto_scroll: true,
        }
    }
}

/// `<config_dir>/aria/aria-settings.json`, or the working directory when
/// the platform has no config dir
pub fn default_settings_path() -> PathBuf {
    let file_name = format!("{}.json", SETTINGS_STORAGE_KEY);
    match dirs::config_dir() {
        Some(config_dir) => config_dir.join("aria").join(file_name),
        None => PathBuf::from(file_name),
    }
}

fn load(path: &Path) -> Settings {
    let content = match fs::read_to_string(path) {
        Ok(content) => content,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Settings::default(),
        Err(e) => {
            tracing::warn!("Failed to read settings at {:?}: {}", path, e);
            return Settings::default();
        }
    };

    if content.trim().is_empty() {
        return Settings::default();
    }

    serde_json::from_str(&content).unwrap_or_else(|e| {
        tracing::warn!("Ignoring corrupt settings at {:?}: {}", path, e);
        Settings::default()
    })
}

/// Persisted user preferences
#[derive(Clone)]
pub struct SettingsContainer {
    path: Arc<PathBuf>,
    state: Arc<watch::Sender<Settings>>,
}

impl SettingsContainer {
    /// Load settings from `path`, falling back to defaults when the file is
    /// missing or unreadable
    pub fn open(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let settings = load(&path);
        tracing::debug!("Loaded settings from {:?}", path);
        Self {
            path: Arc::new(path),
            state: Arc::new(watch::Sender::new(settings)),
        }
    }

    pub fn open_default() -> Self {
        Self::open(default_settings_path())
    }

    pub fn from_config(config: &AriaConfig) -> Self {
        match &config.settings_path {
            Some(path) => Self::open(path.clone()),
            None => Self::open_default(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn snapshot(&self) -> Settings {
        self.state.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<Settings> {
        self.state.subscribe()
    }

    pub fn set_theme(&self, theme: Theme) -> Result<()> {
        self.update(|settings| settings.theme = theme)
    }

    pub fn toggle_sidebar(&self) -> Result<()> {
        self.update(|settings| settings.sidebar_collapsed = !settings.sidebar_collapsed)
    }

    pub fn set_notifications(&self, enabled: bool) -> Result<()> {
        self.update(|settings| settings.notifications = enabled)
    }

    pub fn set_sound_enabled(&self, enabled: bool) -> Result<()> {
        self.update(|settings| settings.sound_enabled = enabled)
    }

    pub fn set_auto_scroll(&self, enabled: bool) -> Result<()> {
        self.update(|settings| settings.auto_scroll = enabled)
    }

    // The in-memory value is updated even when writing the file fails.
    fn update(&self, mutate: impl FnOnce(&mut Settings)) -> Result<()> {
        let mut updated = Settings::default();
        self.state.send_modify(|settings| {
            mutate(settings);
            updated = settings.clone();
        });
        self.persist(&updated)
    }

    fn persist(&self, settings: &Settings) -> Result<()> {
        if let Some(dir) = self.path.parent()
            && !dir.as_os_str().is_empty()
        {
            fs::create_dir_all(dir)?;
        }

        let json = serde_json::to_string_pretty(settings)?;
        fs::write(self.path.as_ref(), json).inspect_err(|e| {
            tracing::warn!("Failed to persist settings to {:?}: {}", self.path, e);
        })?;
        Ok(())
    }
}
