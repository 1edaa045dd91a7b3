//! Configuration model loaded from external sources.
use std::path::{Path, PathBuf};

use serde::Deserialize;
use thiserror::Error;

use crate::ASSET_DIR_NAME;
use crate::domain::{RootDirectory, TypeConstraintError};

#[derive(Clone, Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
/// Raw settings as read from `config.yml` and the environment.
pub struct Settings {
    #[serde(default = "default_address")]
    pub address: String,
    #[serde(default = "default_port")]
    pub port: u16,
    #[serde(default = "default_serve")]
    pub serve: String,
    #[serde(default = "default_site_name", alias = "sitename")]
    pub site_name: String,
    #[serde(default, alias = "backgroundimage")]
    pub background_image: Option<String>,
}

fn default_address() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    36090
}

fn default_serve() -> String {
    "public".to_string()
}

fn default_site_name() -> String {
    "文件站".to_string()
}

#[derive(Clone, Debug)]
/// Resolved, immutable configuration shared read-only by every worker.
pub struct ServerConfig {
    pub address: String,
    pub port: u16,
    pub root_directory: RootDirectory,
    pub site_name: String,
    pub background_image: Option<String>,
    /// Directory holding bundled assets, beside the executable's working dir.
    pub assets_dir: PathBuf,
}

impl ServerConfig {
    /// Resolve relative paths in `settings` against `working_dir`.
    pub fn from_settings(settings: Settings, working_dir: &Path) -> Result<Self, ConfigError> {
        let root_directory = RootDirectory::try_new(working_dir.join(&settings.serve))?;
        let background_image = settings
            .background_image
            .map(|image| image.trim().to_string())
            .filter(|image| !image.is_empty());

        Ok(Self {
            address: settings.address,
            port: settings.port,
            root_directory,
            site_name: settings.site_name,
            background_image,
            assets_dir: working_dir.join(ASSET_DIR_NAME),
        })
    }
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to load settings")]
    Load(#[from] ::config::ConfigError),
    #[error("invalid settings")]
    Invalid(#[from] TypeConstraintError),
    #[error("failed to prepare {path}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("serve root is not a directory: {0}")]
    RootNotDirectory(PathBuf),
}

#[cfg(test)]
mod tests {
    use super::*;

    fn settings(serve: &str, background_image: Option<&str>) -> Settings {
        Settings {
            address: default_address(),
            port: default_port(),
            serve: serve.to_string(),
            site_name: default_site_name(),
            background_image: background_image.map(str::to_string),
        }
    }

    #[test]
    fn relative_serve_is_joined_and_normalized() {
        let config =
            ServerConfig::from_settings(settings("./data/../public", None), Path::new("/opt/app"))
                .unwrap();
        assert_eq!(config.root_directory.as_path(), Path::new("/opt/app/public"));
        assert_eq!(config.assets_dir, PathBuf::from("/opt/app/Resources"));
    }

    #[test]
    fn absolute_serve_is_kept() {
        let config =
            ServerConfig::from_settings(settings("/srv/share", None), Path::new("/opt/app"))
                .unwrap();
        assert_eq!(config.root_directory.as_path(), Path::new("/srv/share"));
    }

    #[test]
    fn blank_background_image_is_dropped() {
        let config =
            ServerConfig::from_settings(settings("public", Some("  ")), Path::new("/opt/app"))
                .unwrap();
        assert_eq!(config.background_image, None);

        let config = ServerConfig::from_settings(
            settings("public", Some("/Resources/img/background.svg")),
            Path::new("/opt/app"),
        )
        .unwrap();
        assert_eq!(
            config.background_image.as_deref(),
            Some("/Resources/img/background.svg")
        );
    }
}
