//! Lookup of bundled page furniture served under [`ASSET_PREFIX`].
use std::path::{Path, PathBuf};

use crate::ASSET_PREFIX;
use crate::domain::ResolvedTarget;
use crate::services::ServiceResult;
use crate::services::resolver::{classify, confine};

pub fn is_asset_path(request_path: &str) -> bool {
    request_path.starts_with(ASSET_PREFIX)
}

/// Resolve an asset request inside `assets_dir`.
///
/// Returns `Ok(None)` for paths outside the prefix, paths escaping the asset
/// directory, and anything that is not a regular file.
pub fn lookup_asset(assets_dir: &Path, request_path: &str) -> ServiceResult<Option<PathBuf>> {
    let Some(relative) = request_path.strip_prefix(ASSET_PREFIX) else {
        return Ok(None);
    };
    let Some(candidate) = confine(assets_dir, relative) else {
        return Ok(None);
    };

    match classify(assets_dir, candidate)? {
        ResolvedTarget::File(path) => Ok(Some(path)),
        _ => Ok(None),
    }
}

#[cfg(test)]
mod tests {
    use std::fs;

    use super::*;
    use tempfile::tempdir;

    #[test]
    fn prefix_is_matched_structurally() {
        assert!(is_asset_path("/Resources/img/file.svg"));
        assert!(is_asset_path("/Resources/missing"));
        assert!(!is_asset_path("/Resources"));
        assert!(!is_asset_path("/docs/Resources/img/file.svg"));
        assert!(!is_asset_path("/resources/img/file.svg"));
    }

    #[test]
    fn finds_bundled_files_only() {
        let dir = tempdir().unwrap();
        let assets = dir.path().join("Resources");
        fs::create_dir_all(assets.join("img")).unwrap();
        fs::write(assets.join("img/file.svg"), b"<svg/>").unwrap();
        fs::write(dir.path().join("config.yml"), b"port: 1").unwrap();

        assert_eq!(
            lookup_asset(&assets, "/Resources/img/file.svg").unwrap(),
            Some(assets.join("img/file.svg"))
        );
        assert_eq!(lookup_asset(&assets, "/Resources/img/").unwrap(), None);
        assert_eq!(lookup_asset(&assets, "/Resources/img/none.png").unwrap(), None);
        assert_eq!(lookup_asset(&assets, "/Resources/../config.yml").unwrap(), None);
        assert_eq!(lookup_asset(&assets, "/elsewhere/file.svg").unwrap(), None);
    }
}
