//! Maps request paths onto the filesystem without leaving a confinement root.
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use percent_encoding::percent_decode_str;
use strict_path::{PathBoundary, StrictPathError};

use crate::domain::{ResolvedTarget, RootDirectory, normalize_lexically};
use crate::services::{ServiceError, ServiceResult};

/// Percent-decode a raw request path. Invalid UTF-8 is replaced, never rejected.
pub fn decode_request_path(raw: &str) -> String {
    percent_decode_str(raw).decode_utf8_lossy().into_owned()
}

/// Join `request_path` onto `base` and normalize it lexically.
///
/// Returns `None` when the result is not `base` itself or a descendant of it.
pub fn confine(base: &Path, request_path: &str) -> Option<PathBuf> {
    let relative = request_path.trim_start_matches('/');
    let candidate = normalize_lexically(&base.join(relative));
    candidate.starts_with(base).then_some(candidate)
}

/// Resolve a decoded request path against the configured root.
pub fn resolve(root: &RootDirectory, request_path: &str) -> ServiceResult<ResolvedTarget> {
    match confine(root.as_path(), request_path) {
        Some(candidate) => classify(root.as_path(), candidate),
        None => Ok(ResolvedTarget::Forbidden),
    }
}

/// Stat an already confined path and report what it is.
///
/// The lexical check in [`confine`] never touches the disk; here the target is
/// also resolved through symlinks and must stay below `base`.
pub fn classify(base: &Path, candidate: PathBuf) -> ServiceResult<ResolvedTarget> {
    let metadata = match fs::metadata(&candidate) {
        Ok(metadata) => metadata,
        Err(err) if err.kind() == ErrorKind::PermissionDenied => {
            return Err(ServiceError::ReadMetadata(err));
        }
        Err(_) => return Ok(ResolvedTarget::NotFound),
    };

    if !metadata.is_dir() && !metadata.is_file() {
        return Ok(ResolvedTarget::NotFound);
    }

    // Symlinks inside the root must still land inside it.
    let boundary = PathBoundary::<()>::try_new(base).map_err(ServiceError::Boundary)?;
    match boundary.strict_join(&candidate) {
        Ok(_) => {}
        Err(StrictPathError::PathEscapesBoundary { .. }) => return Ok(ResolvedTarget::Forbidden),
        Err(StrictPathError::PathResolutionError { .. }) => return Ok(ResolvedTarget::NotFound),
        Err(err) => return Err(ServiceError::Boundary(err)),
    }

    if metadata.is_dir() {
        Ok(ResolvedTarget::Directory(candidate))
    } else {
        Ok(ResolvedTarget::File(candidate))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn root_of(dir: &Path) -> RootDirectory {
        RootDirectory::try_new(dir.to_path_buf()).unwrap()
    }

    #[test]
    fn decodes_percent_escapes() {
        assert_eq!(decode_request_path("/my%20docs/%E6%96%87.txt"), "/my docs/文.txt");
        assert_eq!(decode_request_path("/%2e%2e/secret"), "/../secret");
    }

    #[test]
    fn resolves_directories_and_files() {
        let dir = tempdir().unwrap();
        fs::create_dir(dir.path().join("docs")).unwrap();
        fs::write(dir.path().join("docs/a.txt"), b"hello").unwrap();
        let root = root_of(dir.path());

        assert_eq!(
            resolve(&root, "/").unwrap(),
            ResolvedTarget::Directory(dir.path().to_path_buf())
        );
        assert_eq!(
            resolve(&root, "/docs/").unwrap(),
            ResolvedTarget::Directory(dir.path().join("docs"))
        );
        assert_eq!(
            resolve(&root, "/docs/./a.txt").unwrap(),
            ResolvedTarget::File(dir.path().join("docs/a.txt"))
        );
        assert_eq!(
            resolve(&root, "/docs/missing.txt").unwrap(),
            ResolvedTarget::NotFound
        );
    }

    #[test]
    fn dot_dot_inside_root_is_allowed() {
        let dir = tempdir().unwrap();
        fs::create_dir(dir.path().join("docs")).unwrap();
        fs::write(dir.path().join("top.txt"), b"top").unwrap();
        let root = root_of(dir.path());

        assert_eq!(
            resolve(&root, "/docs/../top.txt").unwrap(),
            ResolvedTarget::File(dir.path().join("top.txt"))
        );
    }

    #[test]
    fn escaping_paths_are_forbidden() {
        let dir = tempdir().unwrap();
        let root_path = dir.path().join("public");
        fs::create_dir(&root_path).unwrap();
        fs::write(dir.path().join("outside.txt"), b"nope").unwrap();
        fs::create_dir(dir.path().join("public-sibling")).unwrap();
        let root = root_of(&root_path);

        for attempt in [
            "/../outside.txt",
            "/../../etc/passwd",
            "/a/../../outside.txt",
            "/../public-sibling",
            "//../outside.txt",
        ] {
            assert_eq!(
                resolve(&root, attempt).unwrap(),
                ResolvedTarget::Forbidden,
                "{attempt}"
            );
        }
    }

    #[cfg(unix)]
    #[test]
    fn symlink_leaving_root_is_forbidden() {
        let dir = tempdir().unwrap();
        let root_path = dir.path().join("public");
        fs::create_dir(&root_path).unwrap();
        fs::write(dir.path().join("secret.txt"), b"nope").unwrap();
        std::os::unix::fs::symlink(dir.path().join("secret.txt"), root_path.join("link.txt"))
            .unwrap();
        let root = root_of(&root_path);

        assert_eq!(
            resolve(&root, "/link.txt").unwrap(),
            ResolvedTarget::Forbidden
        );
    }

    #[cfg(unix)]
    #[test]
    fn symlink_within_root_is_followed() {
        let dir = tempdir().unwrap();
        fs::create_dir(dir.path().join("docs")).unwrap();
        fs::write(dir.path().join("docs/a.txt"), b"hello").unwrap();
        std::os::unix::fs::symlink(dir.path().join("docs"), dir.path().join("alias")).unwrap();
        let root = root_of(dir.path());

        assert_eq!(
            resolve(&root, "/alias/a.txt").unwrap(),
            ResolvedTarget::File(dir.path().join("alias/a.txt"))
        );
        assert_eq!(
            resolve(&root, "/alias").unwrap(),
            ResolvedTarget::Directory(dir.path().join("alias"))
        );
    }

    #[cfg(unix)]
    #[test]
    fn directory_symlink_leaving_root_is_forbidden() {
        let dir = tempdir().unwrap();
        let root_path = dir.path().join("public");
        fs::create_dir_all(dir.path().join("private")).unwrap();
        fs::write(dir.path().join("private/key.txt"), b"nope").unwrap();
        fs::create_dir(&root_path).unwrap();
        std::os::unix::fs::symlink(dir.path().join("private"), root_path.join("door")).unwrap();
        let root = root_of(&root_path);

        assert_eq!(resolve(&root, "/door").unwrap(), ResolvedTarget::Forbidden);
        assert_eq!(
            resolve(&root, "/door/key.txt").unwrap(),
            ResolvedTarget::Forbidden
        );
    }

    #[test]
    fn confine_keeps_base_itself() {
        let base = Path::new("/srv/assets");
        assert_eq!(confine(base, "/"), Some(PathBuf::from("/srv/assets")));
        assert_eq!(
            confine(base, "img/../img/file.svg"),
            Some(PathBuf::from("/srv/assets/img/file.svg"))
        );
        assert_eq!(confine(base, "/../config.yml"), None);
        assert_eq!(confine(base, "../assets-old/x.svg"), None);
    }
}
