use std::fs;
use std::path::{Path, PathBuf};

use crate::shared::constants::IMAGE_EXTENSIONS;

/// True when the extension is one of [`IMAGE_EXTENSIONS`], case-insensitively.
pub fn is_image(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| IMAGE_EXTENSIONS.contains(&ext.to_lowercase().as_str()))
        .unwrap_or(false)
}

/// Expand an input path into the image files it names.
///
/// A file is returned as-is, whatever its extension. A directory is walked
/// recursively and yields only image files, sorted by path.
pub fn collect_images(path: &Path) -> std::io::Result<Vec<PathBuf>> {
    if !path.is_dir() {
        if !path.exists() {
            return Err(std::io::Error::new(
                std::io::ErrorKind::NotFound,
                format!("input not found: {}", path.display()),
            ));
        }
        return Ok(vec![path.to_path_buf()]);
    }

    let mut images = Vec::new();
    walk(path, &mut images)?;
    images.sort();
    Ok(images)
}

fn walk(dir: &Path, images: &mut Vec<PathBuf>) -> std::io::Result<()> {
    for entry in fs::read_dir(dir)? {
        let path = entry?.path();
        if path.is_dir() {
            walk(&path, images)?;
        } else if is_image(&path) {
            images.push(path);
        }
    }
    Ok(())
}
