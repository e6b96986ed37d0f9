//! Directory walking for ingestion.

use std::io;
use std::path::{Path, PathBuf};
use tracing::debug;
use walkdir::WalkDir;

/// Markdown file extensions recognized by the walker.
const MARKDOWN_EXTENSIONS: [&str; 2] = ["md", "markdown"];

/// Recursively collect Markdown files under `root`, sorted by path.
///
/// Sorting makes ingestion order (and therefore positional record ids)
/// deterministic across runs on the same tree. A missing or unreadable root
/// is an error; unreadable entries below it are as well.
pub fn markdown_files(root: &Path) -> io::Result<Vec<PathBuf>> {
    if !root.is_dir() {
        return Err(io::Error::new(
            io::ErrorKind::NotFound,
            format!("document root {} is not a directory", root.display()),
        ));
    }

    let mut files = Vec::new();
    for entry in WalkDir::new(root) {
        let entry = entry.map_err(|e| {
            io::Error::other(format!("failed to walk {}: {e}", root.display()))
        })?;
        if !entry.file_type().is_file() {
            continue;
        }
        let is_markdown = entry
            .path()
            .extension()
            .and_then(|ext| ext.to_str())
            .is_some_and(|ext| {
                let ext = ext.to_ascii_lowercase();
                MARKDOWN_EXTENSIONS.contains(&ext.as_str())
            });
        if is_markdown {
            files.push(entry.into_path());
        }
    }

    files.sort();
    debug!(root = %root.display(), count = files.len(), "collected markdown files");
    Ok(files)
}
