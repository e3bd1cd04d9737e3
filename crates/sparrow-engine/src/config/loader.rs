use super::schema::SparrowConfig;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::debug;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),
    #[error("Failed to parse config file: {0}")]
    Parse(#[from] serde_yaml::Error),
}

pub struct ConfigLoader;

impl ConfigLoader {
    /// First existing candidate wins: `./sparrow.yaml`, then
    /// `~/.sparrow/config.yaml`, else the built-in defaults.
    pub async fn load_default() -> Result<SparrowConfig, ConfigError> {
        for path in Self::candidates() {
            if path.exists() {
                debug!(path = %path.display(), "loading config");
                return Self::load_from(&path).await;
            }
        }
        Ok(SparrowConfig::default())
    }

    pub async fn load_from(path: &Path) -> Result<SparrowConfig, ConfigError> {
        let content = tokio::fs::read_to_string(path).await?;
        Ok(serde_yaml::from_str(&content)?)
    }

    fn candidates() -> Vec<PathBuf> {
        let mut paths = vec![PathBuf::from("./sparrow.yaml")];
        if let Some(home) = dirs::home_dir() {
            paths.push(home.join(".sparrow").join("config.yaml"));
        }
        paths
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn partial_yaml_fills_the_rest_from_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("sparrow.yaml");
        std::fs::write(&path, "timing:\n  scroll_rounds: 7\n").unwrap();

        let config = ConfigLoader::load_from(&path).await.unwrap();
        assert_eq!(config.timing.scroll_rounds, 7);
        assert_eq!(
            config.site.dashboard_url,
            SparrowConfig::default().site.dashboard_url
        );
    }

    #[tokio::test]
    async fn malformed_yaml_is_a_parse_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("sparrow.yaml");
        std::fs::write(&path, "timing: [not a map").unwrap();

        let err = ConfigLoader::load_from(&path).await.unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
    }
}
