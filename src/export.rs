use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ExportError {
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error(transparent)]
    Composite(#[from] crate::compositor::CompositeError),
}

/// `cover-<title>-<id>.png`, with the title lowercased, whitespace runs
/// collapsed to `-`, and characters that are unsafe in file names removed.
pub fn export_file_name(title: &str, short_id: &str) -> String {
    let slug = title
        .split_whitespace()
        .map(|word| {
            word.chars()
                .filter(|c| !matches!(c, '/' | '\\' | ':' | '*' | '?' | '"' | '<' | '>' | '|'))
                .flat_map(char::to_lowercase)
                .collect::<String>()
        })
        .filter(|word| !word.is_empty())
        .collect::<Vec<_>>()
        .join("-");

    if slug.is_empty() {
        format!("cover-{}.png", short_id)
    } else {
        format!("cover-{}-{}.png", slug, short_id)
    }
}

/// Writes an encoded cover, creating missing parent folders.
pub async fn write_export(path: &Path, png: &[u8]) -> Result<PathBuf, ExportError> {
    if let Some(parent) = path.parent() {
        tokio::fs::create_dir_all(parent).await?;
    }
    tokio::fs::write(path, png).await?;
    log::info!("Exported {} bytes to {}", png.len(), path.display());
    Ok(path.to_path_buf())
}
