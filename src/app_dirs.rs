use directories::ProjectDirs;
use std::path::PathBuf;

const APP_NAME: &str = "readadapt";

/// Centralized application directory resolution
pub struct AppDirs;

impl AppDirs {
    fn project() -> Option<ProjectDirs> {
        ProjectDirs::from("", "", APP_NAME)
    }

    /// `$HOME/.local/state/readadapt`, or the platform data dir without `$HOME`.
    pub fn state_dir() -> PathBuf {
        if let Ok(home) = std::env::var("HOME") {
            PathBuf::from(home).join(".local").join("state").join(APP_NAME)
        } else if let Some(proj_dirs) = Self::project() {
            proj_dirs.data_local_dir().to_path_buf()
        } else {
            PathBuf::from(".")
        }
    }

    pub fn model_path() -> PathBuf {
        Self::state_dir().join("difficulty_model.json")
    }

    pub fn history_path() -> PathBuf {
        Self::state_dir().join("history.db")
    }

    pub fn config_path() -> PathBuf {
        Self::project()
            .map(|pd| pd.config_dir().join("config.json"))
            .unwrap_or_else(|| PathBuf::from("readadapt_config.json"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn artifacts_share_the_state_dir() {
        let state = AppDirs::state_dir();
        assert_eq!(AppDirs::model_path().parent(), Some(state.as_path()));
        assert_eq!(AppDirs::history_path().parent(), Some(state.as_path()));
        assert!(AppDirs::config_path().ends_with("config.json"));
    }
}
