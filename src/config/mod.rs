use std::collections::BTreeMap;
use std::env;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};

use crate::config::palette::EmotionPalette;
use crate::insights::emotions::{Emotion, PositiveSet};
use crate::insights::InsightSettings;

pub mod palette;

const APP_DOMAIN: &str = "io";
const APP_ORG: &str = "WellnessInsights";
const APP_NAME: &str = "wellness";

pub const CONFIG_ENV: &str = "WELLNESS_CONFIG";
pub const DATA_ENV: &str = "WELLNESS_DATA";

pub struct ConfigLoader {
    paths: ConfigPaths,
}

impl ConfigLoader {
    pub fn discover() -> Result<Self> {
        let paths = ConfigPaths::discover()?;
        Ok(Self { paths })
    }

    pub fn from_paths(paths: ConfigPaths) -> Self {
        Self { paths }
    }

    pub fn paths(&self) -> &ConfigPaths {
        &self.paths
    }

    pub fn load_or_init(&self) -> Result<AppConfig> {
        self.paths.ensure_directories()?;
        if !self.paths.config_file.exists() {
            let mut default_cfg = AppConfig::default();
            default_cfg.post_load();
            self.write_default_config(&default_cfg)?;
            return Ok(default_cfg);
        }

        self.load()
    }

    pub fn load(&self) -> Result<AppConfig> {
        let raw = fs::read_to_string(&self.paths.config_file)
            .with_context(|| format!("reading config {}", self.paths.config_file.display()))?;
        let mut cfg: AppConfig = toml::from_str(&raw).context("parsing config toml")?;
        cfg.post_load();
        Ok(cfg)
    }

    fn write_default_config(&self, cfg: &AppConfig) -> Result<()> {
        let toml = toml::to_string_pretty(cfg).context("serializing default config")?;
        if let Some(parent) = self.paths.config_file.parent() {
            fs::create_dir_all(parent).with_context(|| format!("creating {}", parent.display()))?;
        }
        let mut file = fs::File::create(&self.paths.config_file)
            .with_context(|| format!("creating config {}", self.paths.config_file.display()))?;
        file.write_all(toml.as_bytes())
            .context("writing default config")?;
        Ok(())
    }
}

#[derive(Debug, Clone)]
pub struct ConfigPaths {
    pub config_dir: PathBuf,
    pub config_file: PathBuf,
    pub data_dir: PathBuf,
    /// Snapshot read when no `--data` is given and stdin is a terminal.
    pub snapshot_path: PathBuf,
}

impl ConfigPaths {
    pub fn discover() -> Result<Self> {
        let override_config = env::var(CONFIG_ENV).ok().map(PathBuf::from);
        let override_data = env::var(DATA_ENV).ok().map(PathBuf::from);

        let project_dirs = ProjectDirs::from(APP_DOMAIN, APP_ORG, APP_NAME)
            .context("resolving XDG project directories")?;

        let config_dir = override_config
            .clone()
            .map(|p| {
                if p.is_dir() {
                    p
                } else {
                    p.parent().map(Path::to_path_buf).unwrap_or(p)
                }
            })
            .unwrap_or_else(|| project_dirs.config_dir().to_path_buf());

        let config_file = override_config
            .filter(|p| p.is_file() || p.extension().is_some())
            .unwrap_or_else(|| config_dir.join("config.toml"));

        let data_dir = override_data.unwrap_or_else(|| project_dirs.data_dir().to_path_buf());
        let snapshot_path = data_dir.join("snapshot.json");

        Ok(Self {
            config_dir,
            config_file,
            data_dir,
            snapshot_path,
        })
    }

    pub fn under(root: &Path) -> Self {
        let config_dir = root.join("config");
        let data_dir = root.join("data");
        Self {
            config_file: config_dir.join("config.toml"),
            config_dir,
            snapshot_path: data_dir.join("snapshot.json"),
            data_dir,
        }
    }

    pub fn ensure_directories(&self) -> Result<()> {
        for dir in [&self.config_dir, &self.data_dir] {
            fs::create_dir_all(dir)
                .with_context(|| format!("creating application directory {}", dir.display()))?;
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Fixed offset from UTC used to decide which calendar day an entry
    /// belongs to. Unset means the system local offset.
    pub utc_offset_minutes: Option<i32>,
    /// How many recent journal entries the positivity score looks at
    /// (0 = all of them).
    pub positivity_window: usize,
    pub positive_emotions: Vec<String>,
    /// Label -> `#RRGGBB` overrides for the emotion chart.
    pub palette: BTreeMap<String, String>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            utc_offset_minutes: None,
            positivity_window: 10,
            positive_emotions: default_positive_emotions(),
            palette: BTreeMap::new(),
        }
    }
}

impl AppConfig {
    fn post_load(&mut self) {
        self.positive_emotions.retain(|label| !label.trim().is_empty());
        if self.positive_emotions.is_empty() {
            tracing::warn!("no positive emotions configured, falling back to defaults");
            self.positive_emotions = default_positive_emotions();
        }
    }

    pub fn insight_settings(&self) -> InsightSettings {
        InsightSettings {
            palette: EmotionPalette::default().with_overrides(&self.palette),
            positive: PositiveSet::from_labels(&self.positive_emotions),
            positivity_window: self.positivity_window,
        }
    }
}

fn default_positive_emotions() -> Vec<String> {
    [Emotion::Joy, Emotion::Love, Emotion::Surprise]
        .iter()
        .map(|emotion| emotion.to_string())
        .collect()
}
