//! First-run preparation: default config, bundled assets and the serve root.
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use config::{Config, FileFormat};
use log::info;

use crate::ASSET_DIR_NAME;
use crate::models::config::{ConfigError, ServerConfig, Settings};

pub const CONFIG_FILE: &str = "config.yml";

const DEFAULT_CONFIG: &str = "\
# 修改监听端口
port: 36090

# 服务目录
serve: public

# 网站名称
siteName: 我的文件站

# 背景图片
backgroundImage: /Resources/img/background.svg
";

struct BundledAsset {
    path: &'static str,
    bytes: &'static [u8],
}

const BUNDLED_ASSETS: [BundledAsset; 3] = [
    BundledAsset {
        path: "img/background.svg",
        bytes: include_bytes!("../assets/img/background.svg"),
    },
    BundledAsset {
        path: "img/file.svg",
        bytes: include_bytes!("../assets/img/file.svg"),
    },
    BundledAsset {
        path: "img/folder.svg",
        bytes: include_bytes!("../assets/img/folder.svg"),
    },
];

fn io_error(path: &Path) -> impl FnOnce(io::Error) -> ConfigError + '_ {
    move |source| ConfigError::Io {
        path: path.to_path_buf(),
        source,
    }
}

/// Run every first-run step inside `working_dir` and resolve the config.
pub fn prepare(working_dir: &Path) -> Result<ServerConfig, ConfigError> {
    let config_path = ensure_config_file(working_dir)?;
    extract_assets(&working_dir.join(ASSET_DIR_NAME))?;

    let settings = load_settings(&config_path)?;
    let server_config = ServerConfig::from_settings(settings, working_dir)?;
    ensure_root(server_config.root_directory.as_path())?;

    Ok(server_config)
}

/// Write the default `config.yml` unless one already exists.
pub fn ensure_config_file(working_dir: &Path) -> Result<PathBuf, ConfigError> {
    let config_path = working_dir.join(CONFIG_FILE);
    if !config_path.exists() {
        fs::write(&config_path, DEFAULT_CONFIG).map_err(io_error(&config_path))?;
        info!("Created default config file: {}", config_path.display());
    }
    Ok(config_path)
}

/// Copy bundled assets into `assets_dir`, leaving existing files untouched.
pub fn extract_assets(assets_dir: &Path) -> Result<(), ConfigError> {
    for asset in &BUNDLED_ASSETS {
        let target = assets_dir.join(asset.path);
        if target.exists() {
            continue;
        }
        if let Some(parent) = target.parent() {
            fs::create_dir_all(parent).map_err(io_error(parent))?;
        }
        fs::write(&target, asset.bytes).map_err(io_error(&target))?;
        info!("Extracted bundled asset: {}", target.display());
    }
    Ok(())
}

/// Layer `config_path` (YAML) and `APP_*` environment overrides.
pub fn load_settings(config_path: &Path) -> Result<Settings, ConfigError> {
    let settings = Config::builder()
        .add_source(config::File::from(config_path).format(FileFormat::Yaml))
        .add_source(config::Environment::with_prefix("APP"))
        .build()?;

    Ok(settings.try_deserialize::<Settings>()?)
}

/// Create the serve root if missing; refuse a root that is not a directory.
pub fn ensure_root(root: &Path) -> Result<(), ConfigError> {
    if !root.exists() {
        fs::create_dir_all(root).map_err(io_error(root))?;
        info!("Created serve directory: {}", root.display());
    } else if !root.is_dir() {
        return Err(ConfigError::RootNotDirectory(root.to_path_buf()));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn first_run_creates_everything() {
        let dir = tempdir().unwrap();

        let config = prepare(dir.path()).unwrap();

        assert!(dir.path().join(CONFIG_FILE).is_file());
        for asset in &BUNDLED_ASSETS {
            assert!(dir.path().join("Resources").join(asset.path).is_file());
        }
        assert!(dir.path().join("public").is_dir());
        assert_eq!(config.root_directory.as_path(), dir.path().join("public"));
        assert_eq!(config.port, 36090);
        assert_eq!(config.site_name, "我的文件站");
        assert_eq!(
            config.background_image.as_deref(),
            Some("/Resources/img/background.svg")
        );
    }

    #[test]
    fn existing_config_and_assets_are_kept() {
        let dir = tempdir().unwrap();
        fs::write(
            dir.path().join(CONFIG_FILE),
            "port: 8080\nserve: share\nsiteName: Drop Box\n",
        )
        .unwrap();
        let custom_icon = dir.path().join("Resources/img/file.svg");
        fs::create_dir_all(custom_icon.parent().unwrap()).unwrap();
        fs::write(&custom_icon, b"custom").unwrap();

        let config = prepare(dir.path()).unwrap();

        assert_eq!(config.port, 8080);
        assert_eq!(config.site_name, "Drop Box");
        assert_eq!(config.background_image, None);
        assert!(dir.path().join("share").is_dir());
        assert_eq!(fs::read(&custom_icon).unwrap(), b"custom");
        assert!(dir.path().join("Resources/img/folder.svg").is_file());
    }

    #[test]
    fn root_that_is_a_file_is_rejected() {
        let dir = tempdir().unwrap();
        fs::write(dir.path().join(CONFIG_FILE), "serve: blocked\n").unwrap();
        fs::write(dir.path().join("blocked"), b"not a dir").unwrap();

        let err = prepare(dir.path()).unwrap_err();
        assert!(matches!(err, ConfigError::RootNotDirectory(_)));
    }
}
