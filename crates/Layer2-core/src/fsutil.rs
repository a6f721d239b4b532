//! File helpers shared by the commands: recursive copy and binary detection

use skillbox_foundation::{Error, Result};
use std::io::Read;
use std::path::Path;
use tokio::fs;
use tracing::debug;

/// Version-control metadata never copied between trees
pub const VCS_DIRS: &[&str] = &[".git", ".hg", ".svn"];

const BINARY_EXTENSIONS: &[&str] = &[
    "png", "jpg", "jpeg", "gif", "bmp", "ico", "webp", // 이미지
    "pdf", "doc", "docx", "xls", "xlsx", "ppt", "pptx", // 문서
    "zip", "tar", "gz", "rar", "7z", // 압축
    "exe", "dll", "so", "dylib", "wasm", // 실행
    "mp3", "mp4", "avi", "mov", "mkv", // 미디어
    "woff", "woff2", "ttf", "otf", // 폰트
];

const SNIFF_BYTES: usize = 8000;

/// Copy `src` into `dest` (created if missing), skipping VCS metadata and
/// symlinks. Returns the number of files copied.
pub async fn copy_dir_recursive(src: &Path, dest: &Path) -> Result<usize> {
    fs::create_dir_all(dest)
        .await
        .map_err(|e| Error::at_path(dest, e))?;

    let mut copied = 0;
    let mut entries = fs::read_dir(src).await.map_err(|e| Error::at_path(src, e))?;

    while let Some(entry) = entries
        .next_entry()
        .await
        .map_err(|e| Error::at_path(src, e))?
    {
        let src_path = entry.path();
        let file_name = entry.file_name();
        let file_type = entry
            .file_type()
            .await
            .map_err(|e| Error::at_path(&src_path, e))?;

        if file_type.is_symlink() {
            debug!("Skipping symlink {}", src_path.display());
            continue;
        }

        let dest_path = dest.join(&file_name);
        if file_type.is_dir() {
            if file_name.to_str().is_some_and(|n| VCS_DIRS.contains(&n)) {
                continue;
            }
            copied += Box::pin(copy_dir_recursive(&src_path, &dest_path)).await?;
        } else {
            fs::copy(&src_path, &dest_path)
                .await
                .map_err(|e| Error::at_path(&src_path, e))?;
            copied += 1;
        }
    }

    Ok(copied)
}

/// Known binary extension, or a null byte within the first few KB
pub fn is_binary_file(path: &Path) -> Result<bool> {
    let by_extension = path
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| BINARY_EXTENSIONS.contains(&e.to_lowercase().as_str()))
        .unwrap_or(false);
    if by_extension {
        return Ok(true);
    }

    let mut file = std::fs::File::open(path).map_err(|e| Error::at_path(path, e))?;
    let mut buf = vec![0u8; SNIFF_BYTES];
    let read = file.read(&mut buf).map_err(|e| Error::at_path(path, e))?;
    Ok(buf[..read].contains(&0))
}
