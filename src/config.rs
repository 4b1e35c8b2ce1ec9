use crate::app_dirs::AppDirs;
use crate::assistance::AssistanceThresholds;
use crate::content::ContentThresholds;
use crate::feedback::{AccuracyThresholds, FeedbackThresholds, FocusThresholds};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::warn;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct Config {
    /// Difficulty used for the first round of a fresh learner.
    pub initial_difficulty: f64,
    pub accuracy_thresholds: AccuracyThresholds,
    pub focus_thresholds: FocusThresholds,
    pub assistance_thresholds: AssistanceThresholds,
    pub content_thresholds: ContentThresholds,
    /// Overrides the platform location of the model artifact.
    pub model_path: Option<PathBuf>,
    /// Overrides the platform location of the round history database.
    pub history_path: Option<PathBuf>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            initial_difficulty: 0.5,
            accuracy_thresholds: AccuracyThresholds::default(),
            focus_thresholds: FocusThresholds::default(),
            assistance_thresholds: AssistanceThresholds::default(),
            content_thresholds: ContentThresholds::default(),
            model_path: None,
            history_path: None,
        }
    }
}

impl Config {
    pub fn model_path(&self) -> PathBuf {
        self.model_path.clone().unwrap_or_else(AppDirs::model_path)
    }

    pub fn history_path(&self) -> PathBuf {
        self.history_path.clone().unwrap_or_else(AppDirs::history_path)
    }

    pub fn feedback_thresholds(&self) -> FeedbackThresholds {
        FeedbackThresholds {
            accuracy: self.accuracy_thresholds,
            focus: self.focus_thresholds,
        }
    }
}

pub trait ConfigStore {
    fn load(&self) -> Config;
    fn save(&self, cfg: &Config) -> std::io::Result<()>;
}

#[derive(Debug, Clone)]
pub struct FileConfigStore {
    path: PathBuf,
}

impl FileConfigStore {
    pub fn new() -> Self {
        Self {
            path: AppDirs::config_path(),
        }
    }

    pub fn with_path<P: AsRef<Path>>(p: P) -> Self {
        Self {
            path: p.as_ref().to_path_buf(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Default for FileConfigStore {
    fn default() -> Self {
        Self::new()
    }
}

impl ConfigStore for FileConfigStore {
    /// Missing or unreadable config falls back to defaults.
    fn load(&self) -> Config {
        let Ok(bytes) = fs::read(&self.path) else {
            return Config::default();
        };
        match serde_json::from_slice::<Config>(&bytes) {
            Ok(cfg) => cfg,
            Err(e) => {
                warn!(path = %self.path.display(), error = %e, "ignoring unparsable config");
                Config::default()
            }
        }
    }

    fn save(&self, cfg: &Config) -> std::io::Result<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }
        let data = serde_json::to_vec_pretty(cfg)?;
        fs::write(&self.path, data)
    }
}
