use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

use crate::error::ConfigError;
use crate::process::ProcessSettings;
use crate::state::DesktopSettings;

pub const BOOT_FILE: &str = "boot.json";

/// Boot configuration of the shell
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ShellConfig {
    pub user: String,
    /// Default `EnvFilter` directive; `RUST_LOG` wins when set
    pub log_filter: String,
    pub log_file: PathBuf,
    pub desktop: DesktopSettings,
    pub processes: ProcessSettings,
}

impl Default for ShellConfig {
    fn default() -> Self {
        Self {
            user: "guest".to_string(),
            log_filter: "info".to_string(),
            log_file: PathBuf::from("termdesk.log"),
            desktop: DesktopSettings::default(),
            processes: ProcessSettings::default(),
        }
    }
}

impl ShellConfig {
    pub async fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let raw = tokio::fs::read_to_string(path.as_ref()).await?;
        let config: ShellConfig = serde_json::from_str(&raw)?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.processes.min_id > self.processes.max_id {
            return Err(ConfigError::Invalid(format!(
                "processes.min_id ({}) is greater than processes.max_id ({})",
                self.processes.min_id, self.processes.max_id
            )));
        }
        if self.desktop.frame_ms == 0 {
            return Err(ConfigError::Invalid("desktop.frame_ms must be positive".to_string()));
        }
        Ok(())
    }

    /// Search `dir` and its subdirectories for a file called `name`
    pub async fn locate(name: &str, dir: impl AsRef<Path>) -> Option<PathBuf> {
        let mut pending = VecDeque::from([dir.as_ref().to_path_buf()]);

        while let Some(current) = pending.pop_front() {
            let Ok(mut entries) = tokio::fs::read_dir(&current).await else {
                continue;
            };
            let mut subdirs = Vec::new();

            while let Ok(Some(entry)) = entries.next_entry().await {
                let Ok(file_type) = entry.file_type().await else {
                    continue;
                };
                if file_type.is_file() && entry.file_name() == name {
                    return Some(entry.path());
                }
                if file_type.is_dir() {
                    subdirs.push(entry.path());
                }
            }

            // Shallow matches are found before deeper ones
            subdirs.sort();
            pending.extend(subdirs);
        }
        None
    }

    /// Load `explicit` if given, else the first boot file under `dir`, else defaults
    pub async fn discover(explicit: Option<PathBuf>, dir: impl AsRef<Path>) -> Result<Self, ConfigError> {
        if let Some(path) = explicit {
            info!(path = %path.display(), "Loading boot config");
            return Self::load(path).await;
        }

        match Self::locate(BOOT_FILE, dir.as_ref()).await {
            Some(path) => {
                info!(path = %path.display(), "Found boot config");
                Self::load(path).await
            }
            None => {
                warn!(dir = %dir.as_ref().display(), "No boot config found, using defaults");
                Ok(Self::default())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    async fn scratch_dir() -> PathBuf {
        let dir = std::env::temp_dir().join(format!("termdesk-{}", Uuid::new_v4().simple()));
        tokio::fs::create_dir_all(&dir).await.unwrap();
        dir
    }

    #[tokio::test]
    async fn test_partial_file_keeps_defaults() {
        let dir = scratch_dir().await;
        let path = dir.join(BOOT_FILE);
        tokio::fs::write(&path, r#"{"user": "ada", "desktop": {"animation_ms": 100}}"#)
            .await
            .unwrap();

        let config = ShellConfig::load(&path).await.unwrap();
        assert_eq!(config.user, "ada");
        assert_eq!(config.desktop.animation_ms, 100);
        assert_eq!(config.desktop.frame_ms, 33);
        assert_eq!(config.processes, ProcessSettings::default());

        tokio::fs::remove_dir_all(dir).await.unwrap();
    }

    #[tokio::test]
    async fn test_invalid_values_are_rejected() {
        let dir = scratch_dir().await;
        let path = dir.join(BOOT_FILE);

        tokio::fs::write(&path, r#"{"processes": {"min_id": 10, "max_id": 1}}"#)
            .await
            .unwrap();
        assert!(matches!(ShellConfig::load(&path).await, Err(ConfigError::Invalid(_))));

        tokio::fs::write(&path, r#"{"desktop": {"frame_ms": 0}}"#).await.unwrap();
        assert!(matches!(ShellConfig::load(&path).await, Err(ConfigError::Invalid(_))));

        tokio::fs::write(&path, "{ not json").await.unwrap();
        assert!(matches!(ShellConfig::load(&path).await, Err(ConfigError::Parse(_))));

        tokio::fs::remove_dir_all(dir).await.unwrap();
    }

    #[tokio::test]
    async fn test_locate_searches_subdirectories() {
        let dir = scratch_dir().await;
        let nested = dir.join("a").join("b");
        tokio::fs::create_dir_all(&nested).await.unwrap();
        tokio::fs::write(nested.join(BOOT_FILE), "{}").await.unwrap();

        assert_eq!(
            ShellConfig::locate(BOOT_FILE, &dir).await,
            Some(nested.join(BOOT_FILE))
        );
        assert_eq!(ShellConfig::locate("missing.json", &dir).await, None);

        tokio::fs::remove_dir_all(dir).await.unwrap();
    }

    #[tokio::test]
    async fn test_discover_falls_back_to_defaults() {
        let dir = scratch_dir().await;
        let config = ShellConfig::discover(None, &dir).await.unwrap();
        assert_eq!(config, ShellConfig::default());

        let missing = dir.join("nope.json");
        assert!(matches!(
            ShellConfig::discover(Some(missing), &dir).await,
            Err(ConfigError::Io(_))
        ));

        tokio::fs::remove_dir_all(dir).await.unwrap();
    }
}
