use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::{
    fs,
    path::{Path, PathBuf},
    sync::{RwLock, RwLockReadGuard, RwLockWriteGuard},
    time::Duration,
};

use crate::classifier::{DEFAULT_OLLAMA_MODEL, DEFAULT_OLLAMA_URL};
use crate::models::Buddy;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum Sensitivity {
    Low,
    #[default]
    Medium,
    High,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct FocusedHours {
    pub start: u32,
    pub end: u32,
}

impl Default for FocusedHours {
    fn default() -> Self {
        Self { start: 9, end: 17 }
    }
}

impl FocusedHours {
    pub fn contains(&self, hour: u32) -> bool {
        if self.start <= self.end {
            (self.start..self.end).contains(&hour)
        } else {
            // Overnight range such as 22..6.
            hour >= self.start || hour < self.end
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct AppSettings {
    pub productive_apps: Vec<String>,
    pub distracting_apps: Vec<String>,
    /// Seconds between captures.
    pub monitoring_interval: u64,
    /// Seconds between distraction notification attempts.
    pub notification_interval: u64,
    pub sensitivity: Sensitivity,
    pub focused_hours: FocusedHours,
    pub save_screenshots: bool,
    #[serde(alias = "accountability_buddies")]
    pub buddies: Vec<Buddy>,
    #[serde(alias = "snitch_mode")]
    pub snitch_mode_enabled: bool,
    pub ollama_url: String,
    pub ollama_model: String,
}

impl Default for AppSettings {
    fn default() -> Self {
        let names = |list: &[&str]| -> Vec<String> { list.iter().map(|name| name.to_string()).collect() };
        Self {
            productive_apps: names(&[
                "Visual Studio Code",
                "Xcode",
                "Terminal",
                "iTerm2",
                "Microsoft Word",
                "Microsoft Excel",
                "Notion",
            ]),
            distracting_apps: names(&[
                "YouTube", "Netflix", "Facebook", "Twitter", "Instagram", "TikTok", "Reddit",
            ]),
            monitoring_interval: 5,
            notification_interval: 15,
            sensitivity: Sensitivity::default(),
            focused_hours: FocusedHours::default(),
            save_screenshots: false,
            buddies: Vec::new(),
            snitch_mode_enabled: false,
            ollama_url: DEFAULT_OLLAMA_URL.to_string(),
            ollama_model: DEFAULT_OLLAMA_MODEL.to_string(),
        }
    }
}

/// JSON-backed settings with write-through persistence.
pub struct SettingsStore {
    path: PathBuf,
    data: RwLock<AppSettings>,
}

impl SettingsStore {
    /// Load from `path`. A missing file means defaults; an unreadable or
    /// malformed one is logged and also falls back to defaults.
    pub fn new(path: PathBuf) -> Result<Self> {
        let data = if path.exists() {
            let contents = fs::read_to_string(&path)
                .with_context(|| format!("Failed to read settings from {}", path.display()))?;
            match serde_json::from_str(&contents) {
                Ok(settings) => settings,
                Err(err) => {
                    log::warn!(
                        "Ignoring malformed settings at {}: {err}",
                        path.display()
                    );
                    AppSettings::default()
                }
            }
        } else {
            AppSettings::default()
        };

        Ok(Self {
            path,
            data: RwLock::new(data),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn read(&self) -> RwLockReadGuard<'_, AppSettings> {
        match self.data.read() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }

    fn write(&self) -> RwLockWriteGuard<'_, AppSettings> {
        match self.data.write() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }

    pub fn snapshot(&self) -> AppSettings {
        self.read().clone()
    }

    pub fn monitoring_interval(&self) -> Duration {
        Duration::from_secs(self.read().monitoring_interval.max(1))
    }

    pub fn notification_interval(&self) -> Duration {
        Duration::from_secs(self.read().notification_interval)
    }

    /// Apply `change` in memory, then write the whole file. The in-memory
    /// change stands even if the write fails.
    pub fn update<F>(&self, change: F) -> Result<()>
    where
        F: FnOnce(&mut AppSettings),
    {
        let mut guard = self.write();
        change(&mut *guard);
        self.persist(&guard)
    }

    pub fn update_accountability(&self, enabled: bool, buddies: Vec<Buddy>) -> Result<()> {
        self.update(|settings| {
            settings.snitch_mode_enabled = enabled;
            settings.buddies = buddies;
        })
    }

    /// Returns false when the app was already listed (case-insensitive).
    pub fn add_productive_app(&self, name: &str) -> Result<bool> {
        self.add_app(name, |settings| &mut settings.productive_apps)
    }

    pub fn add_distracting_app(&self, name: &str) -> Result<bool> {
        self.add_app(name, |settings| &mut settings.distracting_apps)
    }

    fn add_app<F>(&self, name: &str, list: F) -> Result<bool>
    where
        F: FnOnce(&mut AppSettings) -> &mut Vec<String>,
    {
        let name = name.trim();
        if name.is_empty() {
            return Ok(false);
        }

        let mut guard = self.write();
        let apps = list(&mut *guard);
        if apps.iter().any(|app| app.eq_ignore_ascii_case(name)) {
            return Ok(false);
        }
        apps.push(name.to_string());
        self.persist(&guard)?;
        Ok(true)
    }

    fn persist(&self, data: &AppSettings) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create {}", parent.display()))?;
        }
        let serialized = serde_json::to_string_pretty(data)?;
        fs::write(&self.path, serialized)
            .with_context(|| format!("Failed to write settings to {}", self.path.display()))
    }

    pub fn reload(&self) -> Result<()> {
        let contents = fs::read_to_string(&self.path)?;
        let data: AppSettings = serde_json::from_str(&contents)?;
        *self.write() = data;
        Ok(())
    }
}
