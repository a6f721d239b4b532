//! Path Security
//!
//! Defense-in-depth for every path skillbox builds:
//! - segment sanitizing (even for names that already passed validation)
//! - base-directory jail (lexical, plus canonical for the part that exists)
//! - readable-directory checks for `localhost@` sources

use skillbox_foundation::{Error, Result};
use std::path::{Component, Path, PathBuf};

/// Lexical normalization: drops `.`, resolves `..` against earlier
/// components, never pops past the root.
pub fn normalize_path(path: &Path) -> PathBuf {
    let mut components: Vec<Component<'_>> = Vec::new();

    for component in path.components() {
        match component {
            Component::ParentDir => match components.last() {
                Some(Component::Normal(_)) => {
                    components.pop();
                }
                Some(Component::RootDir) | Some(Component::Prefix(_)) => {}
                _ => components.push(component),
            },
            Component::CurDir => {}
            _ => components.push(component),
        }
    }

    components.iter().collect()
}

/// Strip anything that could move a single path segment outside its parent.
///
/// Removes null bytes and every `..`, trims dots and whitespace at both
/// ends, replaces separators with `-`. Fails when nothing is left.
pub fn sanitize_path_segment(segment: &str) -> Result<String> {
    let cleaned = segment.replace('\0', "").replace("..", "");
    let cleaned = cleaned
        .trim_matches(|c: char| c == '.' || c.is_whitespace())
        .replace(['/', '\\'], "-");

    if cleaned.is_empty() {
        return Err(Error::invalid_reference(
            segment,
            "path segment is empty after sanitizing",
        ));
    }

    Ok(cleaned)
}

fn absolutize(path: &Path) -> Result<PathBuf> {
    if path.is_absolute() {
        return Ok(normalize_path(path));
    }
    let cwd = std::env::current_dir()
        .map_err(|e| Error::Config(format!("Cannot get current directory: {}", e)))?;
    Ok(normalize_path(&cwd.join(path)))
}

/// Require `target` to resolve inside `base`; returns the normalized target
pub fn validate_path_within_base(target: &Path, base: &Path) -> Result<PathBuf> {
    let target = absolutize(target)?;
    let base = absolutize(base)?;

    if !target.starts_with(&base) {
        return Err(Error::PathTraversal);
    }

    // Symlinks inside the base: resolve the deepest part that exists on disk
    if let Some(existing) = deepest_existing(&target).filter(|p| p.starts_with(&base)) {
        let real_base = base.canonicalize().map_err(|e| Error::at_path(&base, e))?;
        // 끊어진 링크도 거부
        let real = existing.canonicalize().map_err(|_| Error::PathTraversal)?;
        if !real.starts_with(&real_base) {
            return Err(Error::PathTraversal);
        }
    }

    Ok(target)
}

/// `path` itself or its nearest ancestor present on disk (links not followed)
fn deepest_existing(path: &Path) -> Option<&Path> {
    path.ancestors()
        .find(|p| std::fs::symlink_metadata(p).is_ok())
}

/// A `localhost@` source must be an existing, readable directory
pub fn validate_local_path(path: &Path) -> Result<()> {
    let metadata = std::fs::metadata(path).map_err(|e| match e.kind() {
        std::io::ErrorKind::NotFound => {
            Error::NotFound(format!("Local path '{}'", path.display()))
        }
        std::io::ErrorKind::PermissionDenied => Error::PermissionDenied(path.to_path_buf()),
        _ => Error::at_path(path, e),
    })?;

    if !metadata.is_dir() {
        return Err(Error::NotADirectory(path.to_path_buf()));
    }

    std::fs::read_dir(path).map_err(|e| match e.kind() {
        std::io::ErrorKind::PermissionDenied => Error::PermissionDenied(path.to_path_buf()),
        _ => Error::at_path(path, e),
    })?;

    Ok(())
}
